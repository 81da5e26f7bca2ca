//! Indentation handling for the LazyLang lexer
//!
//! Implements the INDENT/DEDENT discipline: a stack of indent widths starts at
//! `[0]`; a wider line pushes and emits one INDENT, a narrower line pops until
//! it lands on a recorded width and emits one DEDENT per pop. Landing between
//! recorded widths is a fatal indentation error.

use super::Lexer;
use super::tokens::TokenKind;
use crate::frontend::diagnostics::CompileError;

impl<'src> Lexer<'src> {
    /// Measure the indentation of the line starting at the current position
    /// and emit the structural tokens it implies.
    ///
    /// Spaces and tabs each count as one unit. Blank lines and comment-only
    /// lines are invisible to block structure: they are skipped while the
    /// lexer stays logically at line start.
    pub(super) fn handle_indentation(&mut self) -> Result<(), CompileError> {
        let mut indent = 0usize;

        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' => {
                    indent += 1;
                    self.bump();
                }
                '#' => {
                    // Comment-only line: consume it and stay at line start.
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    return Ok(());
                }
                '\n' => {
                    // Blank line: skip, stay at line start.
                    self.bump();
                    return Ok(());
                }
                '\r' => {
                    self.bump();
                }
                _ => break,
            }
        }

        if self.is_at_end() {
            self.at_line_start = false;
            return Ok(());
        }

        let current = *self.indent_stack.last().unwrap_or(&0);

        if indent > current {
            self.indent_stack.push(indent);
            self.push_structural(TokenKind::Indent);
        } else if indent < current {
            let mut count = 0usize;
            while self.indent_stack.len() > 1 {
                let top = *self.indent_stack.last().unwrap_or(&0);
                if indent >= top {
                    break;
                }
                self.indent_stack.pop();
                count += 1;
            }

            // The narrower line must land exactly on a recorded indent width.
            let landed = *self.indent_stack.last().unwrap_or(&0);
            if indent != landed {
                return Err(CompileError::lex(
                    format!("Indentation error at line {}", self.line),
                    self.line,
                    self.col,
                ));
            }

            self.push_structural(TokenKind::Dedent);
            self.pending_dedents = count - 1;
        }

        self.at_line_start = false;
        Ok(())
    }
}
