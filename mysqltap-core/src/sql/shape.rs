//! Literal-insensitive statement shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lexer::{tokenize, LexError, Token, TokenKind};

/// Value that replaces every number and string literal in a shape.
pub const PLACEHOLDER: &str = "?";

/// Grouping key for structurally identical statements.
///
/// Holds the normalized token sequence: comments and `,` symbols removed,
/// literals replaced by [`PLACEHOLDER`] (keeping their kind) and runs of
/// placeholders collapsed to one. Equality, hashing and ordering all follow
/// the sequence. Use [`ShapeKey::render`] for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeKey(Vec<Token>);

impl ShapeKey {
    /// Normalize a token sequence.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a Token>,
    {
        let mut shape: Vec<Token> = Vec::new();

        for token in tokens {
            let normalized = match token.kind {
                TokenKind::Comment => continue,
                TokenKind::Symbol if token.value == "," => continue,
                TokenKind::Number | TokenKind::String => Token::new(token.kind, PLACEHOLDER),
                _ => token.clone(),
            };

            if is_placeholder(&normalized) && shape.last().is_some_and(is_placeholder) {
                continue;
            }
            shape.push(normalized);
        }

        Self(shape)
    }

    /// Shape of raw SQL text.
    pub fn of(sql: &str) -> Self {
        let (tokens, _) = tokenize(sql);
        Self::from_tokens(&tokens)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space-joined token values.
    pub fn render(&self) -> String {
        join_values(&self.0)
    }
}

fn is_placeholder(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Number | TokenKind::String) && token.value == PLACEHOLDER
}

fn join_values(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&token.value);
    }
    out
}

/// A tokenized SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl Statement {
    pub fn parse(sql: &str) -> Self {
        let (tokens, errors) = tokenize(sql);
        Self { tokens, errors }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Lexing problems; the tokens are still a best-effort reading.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Statement kind: the first keyword, e.g. `SELECT`.
    pub fn kind(&self) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.kind == TokenKind::Keyword)
            .map(|t| t.value.as_str())
    }

    /// Identifiers between the first `SELECT` and the next `WHERE`.
    ///
    /// Empty unless the statement is a `SELECT`.
    pub fn tables(&self) -> Vec<&str> {
        if self.kind() != Some("SELECT") {
            return Vec::new();
        }

        let is_keyword = |t: &Token, word: &str| t.kind == TokenKind::Keyword && t.value == word;
        let Some(start) = self.tokens.iter().position(|t| is_keyword(t, "SELECT")) else {
            return Vec::new();
        };
        let end = self.tokens[start..]
            .iter()
            .position(|t| is_keyword(t, "WHERE"))
            .map_or(self.tokens.len(), |offset| start + offset);

        self.tokens[start..end]
            .iter()
            .filter(|t| t.kind == TokenKind::Token)
            .map(|t| t.value.as_str())
            .collect()
    }

    pub fn shape(&self) -> ShapeKey {
        ShapeKey::from_tokens(&self.tokens)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_values(&self.tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REAL_SQL: &str = "/* Crons */ /*shard db://nrt-readonly */ SELECT COUNT(*) as count \
        FROM customers WHERE customers_id = 39 /* /catalog/admin-scripts/crons/trigger_messages.php */";

    #[test]
    fn test_literals_share_shape() {
        assert_eq!(
            ShapeKey::of("SELECT * FROM t WHERE id = 39"),
            ShapeKey::of("SELECT * FROM t WHERE id = 104")
        );
        assert_eq!(
            ShapeKey::of("SELECT * FROM t WHERE name = 'bob'").render(),
            "SELECT * FROM t WHERE name = ?"
        );
    }

    #[test]
    fn test_in_lists_collapse() {
        let three = ShapeKey::of("SELECT * FROM t WHERE id IN (1,2,3)");
        let one = ShapeKey::of("SELECT * FROM t WHERE id IN (7)");
        assert_eq!(three, one);
        assert_eq!(three.render(), "SELECT * FROM t WHERE id IN ( ? )");
    }

    #[test]
    fn test_mixed_literal_kinds_collapse() {
        let shape = ShapeKey::of("INSERT INTO t VALUES (1, 'a', 2.5)");
        assert_eq!(shape.render(), "INSERT INTO t VALUES ( ? )");
        assert_eq!(shape.tokens()[5], Token::new(TokenKind::Number, "?"));
    }

    #[test]
    fn test_placeholder_keeps_kind() {
        assert_ne!(ShapeKey::of("SELECT 1"), ShapeKey::of("SELECT '1'"));
    }

    #[test]
    fn test_comments_do_not_change_shape() {
        let plain = ShapeKey::of("SELECT COUNT(*) as count FROM customers WHERE customers_id = 12");
        assert_eq!(ShapeKey::of(REAL_SQL), plain);
        assert_eq!(
            plain.render(),
            "SELECT COUNT ( * ) AS COUNT FROM customers WHERE customers_id = ?"
        );
    }

    #[test]
    fn test_non_literal_separation_blocks_collapse() {
        let shape = ShapeKey::of("SELECT a FROM t WHERE x = 1 AND y = 2");
        assert_eq!(shape.render(), "SELECT a FROM t WHERE x = ? AND y = ?");
    }

    #[test]
    fn test_identifiers_distinguish_shapes() {
        assert_ne!(
            ShapeKey::of("SELECT * FROM a WHERE id = 1"),
            ShapeKey::of("SELECT * FROM b WHERE id = 1")
        );
    }

    #[test]
    fn test_statement_kind() {
        assert_eq!(Statement::parse(REAL_SQL).kind(), Some("SELECT"));
        assert_eq!(Statement::parse("update t set a = 1").kind(), Some("UPDATE"));
        assert_eq!(Statement::parse("foo bar").kind(), None);
        assert_eq!(Statement::parse("").kind(), None);
    }

    #[test]
    fn test_tables() {
        let statement = Statement::parse(
            "SELECT DISTINCT CW.products_id FROM customers_wishlist CW, products P \
             WHERE 1 AND CW.products_id = P.products_id",
        );
        assert_eq!(
            statement.tables(),
            vec!["CW.products_id", "customers_wishlist", "CW", "products", "P"]
        );

        let no_where = Statement::parse("SELECT a FROM t");
        assert_eq!(no_where.tables(), vec!["a", "t"]);

        assert!(Statement::parse("DELETE FROM t").tables().is_empty());
    }

    #[test]
    fn test_display_joins_tokens() {
        let statement = Statement::parse("select  count(*)\nfrom t");
        assert_eq!(statement.to_string(), "SELECT COUNT ( * ) FROM t");
    }

    #[test]
    fn test_unterminated_literal_still_has_shape() {
        let statement = Statement::parse("SELECT * FROM t WHERE a = 'oops");
        assert!(!statement.is_clean());
        assert_eq!(statement.shape().render(), "SELECT * FROM t WHERE a = ?");
    }
}
