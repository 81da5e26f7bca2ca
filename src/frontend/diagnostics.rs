//! Diagnostics for the LazyLang compiler
//!
//! Every stage reports its first error as a [`CompileError`]; the CLI renders
//! it to stderr and aborts the compilation. There is no multi-error batching.

use std::fmt;

use crate::frontend::ast::Span;

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    Sema,
    Codegen,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lex => write!(f, "Lexical"),
            Stage::Parse => write!(f, "Parse"),
            Stage::Sema => write!(f, "Semantic"),
            Stage::Codegen => write!(f, "Codegen"),
        }
    }
}

/// A compile-time error with location information.
///
/// Rendered as `[line L:C] <Stage> error: <message>`. Lexer messages carry
/// their own location text (`Indentation error at line L`,
/// `Unexpected '<c>' at line L, column C`) and are rendered verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub stage: Stage,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl CompileError {
    pub fn lex(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            stage: Stage::Lex,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self {
            stage: Stage::Parse,
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn sema(message: impl Into<String>, span: Span) -> Self {
        Self {
            stage: Stage::Sema,
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn codegen(message: impl Into<String>, span: Span) -> Self {
        Self {
            stage: Stage::Codegen,
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    /// Location of the offending token.
    pub fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stage == Stage::Lex {
            write!(f, "{}", self.message)
        } else {
            write!(
                f,
                "[line {}:{}] {} error: {}",
                self.line, self.column, self.stage, self.message
            )
        }
    }
}

impl std::error::Error for CompileError {}
