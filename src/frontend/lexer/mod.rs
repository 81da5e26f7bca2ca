//! Lexer for the LazyLang programming language
//!
//! Converts the source buffer into a token stream with explicit block
//! structure. This module is the sole producer of `Indent`, `Dedent` and
//! `Newline` tokens; the parser treats them as ordinary terminals.
//!
//! ## Module structure
//!
//! - `tokens` - token types (`TokenKind`, `Token`) and the keyword map
//! - `indent` - INDENT/DEDENT handling at line starts

mod indent;
pub mod tokens;

pub use tokens::{Token, TokenKind, KEYWORDS};

use crate::frontend::diagnostics::CompileError;

/// Lexer state over a borrowed source buffer.
///
/// Tokens reference the buffer directly; the driver keeps the buffer alive
/// for the whole compilation.
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    line: usize,
    col: usize,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
    tokens: Vec<Token<'src>>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source buffer.
    ///
    /// Stops at the first error. On success the stream ends with one `Dedent`
    /// per still-open indent level followed by `Eof`, so INDENT and DEDENT
    /// counts always balance.
    pub fn tokenize(mut self) -> Result<Vec<Token<'src>>, CompileError> {
        while !self.is_at_end() || self.pending_dedents > 0 {
            self.scan_token()?;
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_structural(TokenKind::Dedent);
        }
        self.push_structural(TokenKind::Eof);

        Ok(self.tokens)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Structural tokens (NEWLINE excepted) carry an empty lexeme.
    fn push_structural(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, "", self.line, self.col));
    }

    fn add_token(&mut self, kind: TokenKind, start: usize, line: usize, col: usize) {
        let lexeme = &self.src[start..self.pos];
        self.tokens.push(Token::new(kind, lexeme, line, col));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) -> Result<(), CompileError> {
        // Drain pending dedents one per step before touching further input.
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            self.push_structural(TokenKind::Dedent);
            return Ok(());
        }

        if self.at_line_start {
            return self.handle_indentation();
        }

        // Skip whitespace between tokens on the same line.
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.bump();
            } else {
                break;
            }
        }

        let line = self.line;
        let col = self.col;
        let start = self.pos;

        let Some(c) = self.bump() else {
            return Ok(());
        };

        match c {
            // Comments run to end of line and behave as trailing whitespace.
            '#' => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            }

            '\n' => {
                let lexeme = &self.src[start..self.pos];
                self.tokens.push(Token::new(TokenKind::Newline, lexeme, line, col));
                self.at_line_start = true;
            }

            ':' => self.add_token(TokenKind::Colon, start, line, col),
            ',' => self.add_token(TokenKind::Comma, start, line, col),
            '(' => self.add_token(TokenKind::LParen, start, line, col),
            ')' => self.add_token(TokenKind::RParen, start, line, col),
            '.' => self.add_token(TokenKind::Dot, start, line, col),
            '[' => self.add_token(TokenKind::LBracket, start, line, col),
            ']' => self.add_token(TokenKind::RBracket, start, line, col),
            '+' => self.add_token(TokenKind::Plus, start, line, col),
            '*' => self.add_token(TokenKind::Star, start, line, col),
            '/' => self.add_token(TokenKind::Slash, start, line, col),

            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                };
                self.add_token(kind, start, line, col);
            }
            '-' => {
                let kind = if self.match_char('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                };
                self.add_token(kind, start, line, col);
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                };
                self.add_token(kind, start, line, col);
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                };
                self.add_token(kind, start, line, col);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::BangEq, start, line, col);
                } else {
                    return Err(CompileError::lex(
                        format!("Unexpected '!' at line {}, column {}", line, col),
                        line,
                        col,
                    ));
                }
            }

            '"' => self.scan_string(line, col),

            '0'..='9' => self.scan_number(start, line, col),

            _ if is_ident_start(c) => self.scan_identifier(start, line, col),

            _ => {
                return Err(CompileError::lex(
                    format!("Unexpected '{}' at line {}, column {}", c, line, col),
                    line,
                    col,
                ));
            }
        }

        Ok(())
    }

    // ========================================================================
    // Literal and identifier scanning
    // ========================================================================

    /// The lexeme excludes the quotes. An unterminated string runs to EOF.
    fn scan_string(&mut self, line: usize, col: usize) {
        let content_start = self.pos;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.bump();
        }
        let lexeme = &self.src[content_start..self.pos];
        if self.peek() == Some('"') {
            self.bump();
        }
        self.tokens.push(Token::new(TokenKind::Str, lexeme, line, col));
    }

    /// Digit run; an embedded `.` turns the token into a float.
    fn scan_number(&mut self, start: usize, line: usize, col: usize) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') {
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.bump();
                } else {
                    break;
                }
            }
            self.add_token(TokenKind::Float, start, line, col);
            return;
        }

        self.add_token(TokenKind::Int, start, line, col);
    }

    fn scan_identifier(&mut self, start: usize, line: usize, col: usize) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }

        let text = &self.src[start..self.pos];
        let kind = KEYWORDS.get(text).copied().unwrap_or(TokenKind::Ident);
        self.tokens.push(Token::new(kind, text, line, col));
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience function to lex a source string.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token<'_>>, CompileError> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lex should succeed")
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords() {
        let tokens = lex("if else for in struct mut pub import task return true false null")
            .expect("lex should succeed");
        let expected = [
            TokenKind::If,
            TokenKind::Else,
            TokenKind::For,
            TokenKind::In,
            TokenKind::Struct,
            TokenKind::Mut,
            TokenKind::Pub,
            TokenKind::Import,
            TokenKind::Task,
            TokenKind::Return,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
        ];
        for (tok, kind) in tokens.iter().zip(expected) {
            assert_eq!(tok.kind, kind);
        }
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds(": , = == != -> ( ) . [ ] + - * / < <= > >="),
            vec![
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::Arrow,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Dot,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 3.14 7.").expect("lex should succeed");
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[1].lexeme, "3.14");
        assert_eq!(tokens[2].kind, TokenKind::Float);
        assert_eq!(tokens[2].lexeme, "7.");
    }

    #[test]
    fn test_string_lexeme_excludes_quotes() {
        let tokens = lex("\"hello\"").expect("lex should succeed");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "hello");
    }

    #[test]
    fn test_token_positions_are_one_based_token_starts() {
        let tokens = lex("    x = 2").expect("lex should succeed");
        let x = tokens.iter().find(|t| t.lexeme == "x").expect("x token");
        assert_eq!((x.line, x.column), (1, 5));
    }

    #[test]
    fn test_indentation() {
        let source = "main: () -> null = ()\n    log(\"hi\")\n";
        let tokens = lex(source).expect("lex should succeed");
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_multiple_dedents_on_one_line() {
        let source = "a\n    b\n        c\nd\n";
        let tokens = lex(source).expect("lex should succeed");
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);
    }

    #[test]
    fn test_eof_drains_open_indent_levels() {
        let source = "a\n    b\n        c";
        let tokens = lex(source).expect("lex should succeed");
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, dedents);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_blank_lines_are_invisible_to_block_structure() {
        let with_blank = "a\n    b\n\n    c\nd\n";
        let tokens = lex(with_blank).expect("lex should succeed");
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_comment_only_line_is_invisible() {
        let source = "a\n    b\n# note\n    c\n";
        let tokens = lex(source).expect("lex should succeed");
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_trailing_comment_is_whitespace() {
        let tokens = lex("x = 1 # bound once\n").expect("lex should succeed");
        assert!(tokens.iter().all(|t| t.lexeme != "#"));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Newline));
    }

    #[test]
    fn test_misaligned_dedent_is_an_error() {
        // Dedenting to width 2 when the stack holds [0, 4].
        let source = "a\n    b\n  c\n";
        let err = lex(source).unwrap_err();
        assert_eq!(err.to_string(), "Indentation error at line 3");
    }

    #[test]
    fn test_stray_bang_is_an_error() {
        let err = lex("x ! y").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected '!' at line 1, column 3");
    }

    #[test]
    fn test_unexpected_character_is_an_error() {
        let err = lex("a $ b").unwrap_err();
        assert!(err.to_string().contains("Unexpected '$'"));
    }

    #[test]
    fn test_carriage_returns_are_skipped() {
        let tokens = lex("a\r\nb\r\n").expect("lex should succeed");
        let idents = tokens.iter().filter(|t| t.kind == TokenKind::Ident).count();
        assert_eq!(idents, 2);
    }
}
