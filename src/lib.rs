//! LazyLang compiler
//!
//! LazyLang is a small, statically typed, indentation-sensitive language that
//! compiles to portable C linked against a minimal runtime. This crate
//! provides the full pipeline: frontend (lexer, parser, semantic analyzer),
//! backend (C code generation, external compiler invocation), and the CLI.
//!
//! Data flows strictly forward: source bytes → tokens → AST → validated AST
//! → C text. Every stage aborts the compilation on its first error.

pub mod backend;
pub mod cli;
pub mod frontend;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::lexer;
pub use frontend::parser;
pub use frontend::sema;

pub use backend::codegen;
