//! LazyLang compiler frontend
//!
//! This module contains all frontend components:
//! - `lexer`: tokenization with INDENT/DEDENT block structure
//! - `ast`: abstract syntax tree definitions
//! - `parser`: recursive-descent parsing into the AST
//! - `sema`: semantic analysis (scopes, flow modes, backend restrictions)
//! - `diagnostics`: located error values shared by every stage

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod sema;
