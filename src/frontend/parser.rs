//! Parser for the LazyLang programming language
//!
//! Recursive descent over the token stream. The parser fails fast: the first
//! syntax error aborts the compilation, there is no recovery.
//!
//! Compound types (`result[T, E]`, `maybe[User]`) are not parsed into a type
//! tree. [`Parser::collect_type`] concatenates token lexemes into an opaque
//! fragment until it reaches a context-dependent terminator at bracket depth
//! zero; later stages interpret the fragment by prefix only.

use crate::frontend::ast::*;
use crate::frontend::diagnostics::CompileError;
use crate::frontend::lexer::{Token, TokenKind};

type PResult<T> = Result<T, CompileError>;

/// Parser state.
///
/// `peek`/`peek_next` give the two-token lookahead needed to tell a variable
/// declaration (`x :`) from an assignment (`x =`) from a bare expression.
pub struct Parser<'t, 'src> {
    tokens: &'t [Token<'src>],
    pos: usize,
}

impl<'t, 'src> Parser<'t, 'src> {
    pub fn new(tokens: &'t [Token<'src>]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the entire token stream into a program.
    ///
    /// All imports must precede the first declaration.
    pub fn parse(mut self) -> PResult<Program> {
        let mut imports = Vec::new();
        let mut declarations = Vec::new();
        let mut accepting_imports = true;

        self.skip_newlines();
        while !self.check(TokenKind::Eof) {
            if self.check(TokenKind::Import) {
                if !accepting_imports {
                    return self.error("imports must appear before declarations");
                }
                imports.push(self.import_decl()?);
            } else {
                accepting_imports = false;
                declarations.push(self.declaration()?);
            }
            self.skip_newlines();
        }

        Ok(Program {
            imports,
            declarations,
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn peek(&self) -> Token<'src> {
        self.tokens[self.pos]
    }

    fn peek_next(&self) -> Token<'src> {
        if self.pos + 1 < self.tokens.len() {
            self.tokens[self.pos + 1]
        } else {
            self.tokens[self.tokens.len() - 1]
        }
    }

    fn previous(&self) -> Token<'src> {
        self.tokens[self.pos - 1]
    }

    fn advance(&mut self) -> Token<'src> {
        if !self.check(TokenKind::Eof) {
            self.pos += 1;
        }
        self.tokens[self.pos - 1]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> PResult<Token<'src>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error(message)
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> PResult<T> {
        Err(CompileError::parse(message, self.peek().span()))
    }

    fn skip_newlines(&mut self) {
        while self.match_token(TokenKind::Newline) {}
    }

    /// A statement-terminating line break: a NEWLINE run, or an upcoming
    /// DEDENT/EOF that will close the block on its own.
    fn require_line_break(&mut self, message: &str) -> PResult<()> {
        if self.match_token(TokenKind::Newline) {
            self.skip_newlines();
            return Ok(());
        }
        if self.check(TokenKind::Dedent) || self.check(TokenKind::Eof) {
            return Ok(());
        }
        self.error(message)
    }

    // ========================================================================
    // Type fragments
    // ========================================================================

    /// Concatenate token lexemes into an opaque type fragment.
    ///
    /// Collection stops at any of `terminators` seen at bracket depth zero.
    /// Only IDENT, `null`, `,`, `[`, `]` and `.` may appear in a fragment;
    /// inside brackets a line break is an implicit continuation, at depth
    /// zero a non-terminator line break is an error.
    fn collect_type(&mut self, terminators: &[TokenKind]) -> PResult<String> {
        let mut fragment = String::new();
        let mut bracket_depth = 0usize;

        loop {
            let token = self.peek();
            if token.kind == TokenKind::Eof {
                break;
            }

            let is_terminator = terminators.contains(&token.kind);

            if matches!(token.kind, TokenKind::Newline | TokenKind::Dedent) {
                if bracket_depth == 0 {
                    if is_terminator {
                        break;
                    }
                    return self.error("unexpected line break in type");
                }
                self.advance();
                continue;
            }

            if is_terminator && bracket_depth == 0 {
                break;
            }

            match token.kind {
                TokenKind::LBracket => bracket_depth += 1,
                TokenKind::RBracket => {
                    if bracket_depth == 0 {
                        return self.error("unmatched ']' in type");
                    }
                    bracket_depth -= 1;
                }
                TokenKind::Ident
                | TokenKind::Null
                | TokenKind::Comma
                | TokenKind::Dot => {}
                _ => return self.error("unexpected token in type"),
            }

            fragment.push_str(token.lexeme);
            self.advance();
        }

        if fragment.is_empty() {
            return self.error("expected type name");
        }
        Ok(fragment)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn import_decl(&mut self) -> PResult<Import> {
        let import_token = self.expect(TokenKind::Import, "expected 'import'")?;

        let mut segments = Vec::new();
        loop {
            let segment = self.expect(TokenKind::Ident, "expected identifier in import path")?;
            segments.push(segment.lexeme.to_string());
            if !self.match_token(TokenKind::Dot) {
                break;
            }
        }

        self.require_line_break("expected newline after import statement")?;
        Ok(Import {
            segments,
            span: import_token.span(),
        })
    }

    fn declaration(&mut self) -> PResult<Declaration> {
        let is_public = self.match_token(TokenKind::Pub);

        if self.check(TokenKind::Struct) {
            return Ok(Declaration::Struct(self.struct_decl(is_public)?));
        }

        let name = self.expect(TokenKind::Ident, "expected identifier for declaration")?;
        Ok(Declaration::Function(self.function_decl(is_public, name)?))
    }

    /// `name: (t1, t2, ...) -> ret = (p1, p2, ...)` with two parenthesized
    /// lists. Types are collected first, then each name binds positionally.
    fn function_decl(&mut self, is_public: bool, name_token: Token<'src>) -> PResult<FunctionDecl> {
        let type_terminators = [TokenKind::Comma, TokenKind::RParen];

        self.expect(TokenKind::Colon, "expected ':' after function name")?;
        self.expect(TokenKind::LParen, "expected '(' before parameter type list")?;

        let mut type_names = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                type_names.push(self.collect_type(&type_terminators)?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameter types")?;

        self.expect(TokenKind::Arrow, "expected '->' before return type")?;
        let return_type = self.collect_type(&[TokenKind::Eq])?;

        self.expect(TokenKind::Eq, "expected '=' before parameter names")?;
        self.expect(TokenKind::LParen, "expected '(' before parameter names")?;

        let mut params: Vec<Param> = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let name = self.expect(TokenKind::Ident, "expected parameter name")?;
                if params.len() >= type_names.len() {
                    return Err(CompileError::parse("missing parameter type", name.span()));
                }
                let type_name = type_names[params.len()].clone();
                params.push(Param {
                    name: name.lexeme.to_string(),
                    type_name,
                    span: name.span(),
                });
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameter names")?;

        if params.len() != type_names.len() {
            return self.error("mismatched parameter types and names");
        }

        let body = self.block()?;
        Ok(FunctionDecl {
            is_public,
            name: name_token.lexeme.to_string(),
            params,
            return_type,
            body,
            span: name_token.span(),
        })
    }

    fn struct_decl(&mut self, is_public: bool) -> PResult<StructDecl> {
        self.expect(TokenKind::Struct, "expected 'struct'")?;
        let name = self.expect(TokenKind::Ident, "expected struct name")?;

        self.expect(TokenKind::Newline, "expected newline after struct name")?;
        self.expect(TokenKind::Indent, "expected indent before struct body")?;
        self.skip_newlines();

        let field_terminators = [TokenKind::Newline, TokenKind::Dedent];
        let mut fields = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.check(TokenKind::Eof) {
            let field_name = self.expect(TokenKind::Ident, "expected field name")?;
            self.expect(TokenKind::Colon, "expected ':' after field name")?;
            let type_name = self.collect_type(&field_terminators)?;
            fields.push(Field {
                name: field_name.lexeme.to_string(),
                type_name,
                span: field_name.span(),
            });
            self.require_line_break("expected newline after struct field")?;
            self.skip_newlines();
        }

        self.expect(TokenKind::Dedent, "expected dedent after struct body")?;
        Ok(StructDecl {
            is_public,
            name: name.lexeme.to_string(),
            fields,
            span: name.span(),
        })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn block(&mut self) -> PResult<Block> {
        self.expect(TokenKind::Newline, "expected newline before block")?;
        let indent = self.expect(TokenKind::Indent, "expected indentation to start block")?;

        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::Dedent) && !self.check(TokenKind::Eof) {
            statements.push(self.statement()?);
            self.skip_newlines();
        }

        self.expect(TokenKind::Dedent, "expected dedent to close block")?;
        Ok(Block {
            statements,
            span: indent.span(),
        })
    }

    fn statement(&mut self) -> PResult<Stmt> {
        if self.match_token(TokenKind::If) {
            return self.if_stmt();
        }
        if self.match_token(TokenKind::For) {
            return self.for_stmt();
        }
        if self.match_token(TokenKind::Mut) {
            return self.var_decl(true);
        }
        if self.match_token(TokenKind::Return) {
            return self.return_stmt();
        }
        if self.check(TokenKind::Ident) {
            // One token past current decides the statement form.
            match self.peek_next().kind {
                TokenKind::Colon => return self.var_decl(false),
                TokenKind::Eq => return self.assignment(),
                _ => {}
            }
        }
        self.expr_stmt()
    }

    fn if_stmt(&mut self) -> PResult<Stmt> {
        let if_token = self.previous();
        let condition = self.expression()?;
        let then_block = self.block()?;

        self.skip_newlines();
        let else_block = if self.match_token(TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_block,
            else_block,
            span: if_token.span(),
        })
    }

    fn for_stmt(&mut self) -> PResult<Stmt> {
        let for_token = self.previous();
        let iterator = self.expect(TokenKind::Ident, "expected loop iterator name")?;
        self.expect(TokenKind::In, "expected 'in' after loop iterator")?;
        let iterable = self.expression()?;
        let body = self.block()?;

        Ok(Stmt::For {
            iterator: iterator.lexeme.to_string(),
            iterable,
            body,
            span: for_token.span(),
        })
    }

    fn var_decl(&mut self, is_mutable: bool) -> PResult<Stmt> {
        let message = if is_mutable {
            "expected identifier after 'mut'"
        } else {
            "expected identifier in variable declaration"
        };
        let name = self.expect(TokenKind::Ident, message)?;
        self.expect(TokenKind::Colon, "expected ':' in variable declaration")?;

        let type_name = self.collect_type(&[TokenKind::Eq])?;
        self.expect(TokenKind::Eq, "expected '=' before initializer")?;
        let initializer = self.expression()?;
        self.require_line_break("expected newline after variable declaration")?;

        Ok(Stmt::VarDecl {
            is_mutable,
            name: name.lexeme.to_string(),
            type_name,
            initializer,
            span: name.span(),
        })
    }

    fn assignment(&mut self) -> PResult<Stmt> {
        let name = self.expect(TokenKind::Ident, "expected identifier for assignment")?;
        self.expect(TokenKind::Eq, "expected '=' in assignment")?;
        let value = self.expression()?;
        self.require_line_break("expected newline after assignment")?;

        Ok(Stmt::Assign {
            target: name.lexeme.to_string(),
            value,
            span: name.span(),
        })
    }

    fn return_stmt(&mut self) -> PResult<Stmt> {
        let return_token = self.previous();
        let value = if !self.check(TokenKind::Newline)
            && !self.check(TokenKind::Dedent)
            && !self.check(TokenKind::Eof)
        {
            Some(self.expression()?)
        } else {
            None
        };
        self.require_line_break("expected newline after return")?;

        Ok(Stmt::Return {
            value,
            span: return_token.span(),
        })
    }

    fn expr_stmt(&mut self) -> PResult<Stmt> {
        let expr = self.expression()?;
        self.require_line_break("expected newline after expression")?;
        Ok(Stmt::Expr(expr))
    }

    // ========================================================================
    // Expressions (precedence ladder, all levels left-associative)
    // ========================================================================

    fn expression(&mut self) -> PResult<Expr> {
        self.equality()
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut expr = self.comparison()?;
        while matches!(self.peek().kind, TokenKind::EqEq | TokenKind::BangEq) {
            let op = self.advance();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: op.kind,
                right: Box::new(right),
                span: op.span(),
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut expr = self.term()?;
        while matches!(
            self.peek().kind,
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
        ) {
            let op = self.advance();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: op.kind,
                right: Box::new(right),
                span: op.span(),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut expr = self.factor()?;
        while matches!(self.peek().kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.advance();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: op.kind,
                right: Box::new(right),
                span: op.span(),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut expr = self.call()?;
        while matches!(self.peek().kind, TokenKind::Star | TokenKind::Slash) {
            let op = self.advance();
            let right = self.call()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: op.kind,
                right: Box::new(right),
                span: op.span(),
            };
        }
        Ok(expr)
    }

    fn call(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        while self.match_token(TokenKind::LParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> PResult<Expr> {
        let lparen = self.previous();

        let mut arguments = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen, "expected ')' after arguments")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            arguments,
            span: lparen.span(),
        })
    }

    fn primary(&mut self) -> PResult<Expr> {
        let token = self.peek();
        match token.kind {
            TokenKind::Int => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Int(token.lexeme.to_string()),
                    span: token.span(),
                })
            }
            TokenKind::Float => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Float(token.lexeme.to_string()),
                    span: token.span(),
                })
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Str(token.lexeme.to_string()),
                    span: token.span(),
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(true),
                    span: token.span(),
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(false),
                    span: token.span(),
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Null,
                    span: token.span(),
                })
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Expr::Identifier {
                    name: token.lexeme.to_string(),
                    span: token.span(),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            _ => self.error("unexpected token in expression"),
        }
    }
}

/// Convenience function to parse a token stream.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token<'_>]) -> Result<Program, CompileError> {
    Parser::new(tokens).parse()
}

// ============================================================================
// TESTS
// ============================================================================
