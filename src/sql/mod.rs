//! SQL identifier extractor (§4.7): a dialect-agnostic lexer plus a
//! parser-plus-regex table-reference extractor feeding the enrichment
//! engine.

pub mod lexer;
pub mod tables;

pub use lexer::extract_identifiers;
pub use tables::{extract_table_references, split_qualified_name, ReferenceSource, TableReference};
