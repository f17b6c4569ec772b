//! SQL tokenizing and shape derivation.
//!
//! ```rust
//! use mysqltap_core::sql::ShapeKey;
//!
//! let a = ShapeKey::of("SELECT * FROM t WHERE id IN (1, 2, 3)");
//! let b = ShapeKey::of("SELECT * FROM t WHERE id IN (42) /* retry */");
//! assert_eq!(a, b);
//! assert_eq!(a.render(), "SELECT * FROM t WHERE id IN ( ? )");
//! ```

mod lexer;
mod shape;

pub use lexer::{is_keyword, tokenize, LexError, Lexer, Token, TokenKind, KEYWORDS};
pub use shape::{ShapeKey, Statement, PLACEHOLDER};
