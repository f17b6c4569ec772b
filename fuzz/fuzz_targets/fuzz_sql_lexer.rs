//! Fuzz target for the SQL tokenizer and shape derivation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mysqltap_core::sql::{Statement, TokenKind};

fuzz_target!(|data: &[u8]| {
    let sql = String::from_utf8_lossy(data);
    let statement = Statement::parse(&sql);

    let shape = statement.shape();
    assert!(shape.tokens().len() <= statement.tokens().len());
    assert!(shape.tokens().iter().all(|t| t.kind != TokenKind::Comment));

    let _ = statement.kind();
    let _ = statement.tables();
    let _ = shape.render();
});
