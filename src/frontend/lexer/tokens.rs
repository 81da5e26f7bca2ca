//! Token types for the LazyLang lexer

use phf::phf_map;

use crate::frontend::ast::Span;

/// Token kinds produced by the lexer.
///
/// `Newline`, `Indent` and `Dedent` encode block structure; the parser treats
/// them as ordinary terminals. The lexeme lives on [`Token`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Newline,
    Indent,
    Dedent,

    Ident,
    Int,
    Float,
    Str,

    // ========== Keywords ==========
    If,
    Else,
    For,
    In,
    Struct,
    Mut,
    Pub,
    Import,
    Task,
    Return,
    True,
    False,
    Null,

    // ========== Symbols ==========
    Colon,    // :
    Comma,    // ,
    Eq,       // =
    EqEq,     // ==
    BangEq,   // !=
    Arrow,    // ->
    LParen,   // (
    RParen,   // )
    Dot,      // .
    LBracket, // [
    RBracket, // ]
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Lt,       // <
    LtEq,     // <=
    Gt,       // >
    GtEq,     // >=
}

/// Keyword lookup table using a perfect hash map for O(1) lookup with zero
/// runtime initialization. Map keys are LazyLang source text.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "for" => TokenKind::For,
    "in" => TokenKind::In,
    "struct" => TokenKind::Struct,
    "mut" => TokenKind::Mut,
    "pub" => TokenKind::Pub,
    "import" => TokenKind::Import,
    "task" => TokenKind::Task,
    "return" => TokenKind::Return,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "null" => TokenKind::Null,
};

/// A token with its kind, lexeme and source position.
///
/// The lexeme borrows from the source buffer, which the driver keeps alive for
/// the whole compilation; tokens never own text. `line` and `column` are
/// 1-based and point at the first character of the token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub line: usize,
    pub column: usize,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, lexeme: &'src str, line: usize, column: usize) -> Self {
        Self {
            kind,
            lexeme,
            line,
            column,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }
}
