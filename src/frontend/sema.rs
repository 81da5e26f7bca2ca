//! Semantic analysis for LazyLang
//!
//! Enforces scoping, immutability, typed-flow consistency, the unused-result
//! discipline, and the restrictions of the current C backend. The analyzer
//! never mutates the AST and never assigns concrete types to expressions;
//! type names stay the opaque strings the parser built.
//!
//! Analysis runs in two passes: first every top-level function (and the
//! builtins before them) is registered in a flat, program-global function
//! table, then each declaration body is walked. The first violation aborts
//! with a located error.

use std::collections::HashMap;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::CompileError;

type SResult<T> = Result<T, CompileError>;

/// Builtin functions pre-registered in the function table, with their
/// return types.
const BUILTINS: &[(&str, &str)] = &[("log", "null")];

/// Per-function success/absence classification.
///
/// Derived from `maybe`/`result` type prefixes; within one function every
/// contributing type must agree. `NONE` is absorbed by either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowMode {
    None,
    Maybe,
    Result,
}

#[derive(Debug, Clone)]
struct VarSymbol {
    name: String,
    is_mutable: bool,
    type_name: String,
    span: Span,
}

#[derive(Debug, Clone)]
struct FunctionSymbol {
    return_type: String,
    span: Span,
}

struct Analyzer {
    functions: HashMap<String, FunctionSymbol>,
    scopes: Vec<Vec<VarSymbol>>,
    in_function: bool,
    current_flow: FlowMode,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            functions: HashMap::new(),
            scopes: Vec::new(),
            in_function: false,
            current_flow: FlowMode::None,
        }
    }

    // ========================================================================
    // Symbol tables
    // ========================================================================

    fn register_builtins(&mut self) {
        for (name, return_type) in BUILTINS {
            self.functions.insert(
                (*name).to_string(),
                FunctionSymbol {
                    return_type: (*return_type).to_string(),
                    span: Span::default(),
                },
            );
        }
    }

    fn register_function(&mut self, decl: &FunctionDecl) -> SResult<()> {
        if self.functions.contains_key(&decl.name) {
            return Err(CompileError::sema("function already declared", decl.span));
        }
        self.functions.insert(
            decl.name.clone(),
            FunctionSymbol {
                return_type: decl.return_type.clone(),
                span: decl.span,
            },
        );
        Ok(())
    }

    fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn add_var(
        &mut self,
        name: &str,
        is_mutable: bool,
        type_name: &str,
        span: Span,
    ) -> SResult<()> {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Ok(()),
        };
        if scope.iter().any(|symbol| symbol.name == name) {
            return Err(CompileError::sema(
                "symbol already declared in this scope",
                span,
            ));
        }
        scope.push(VarSymbol {
            name: name.to_string(),
            is_mutable,
            type_name: type_name.to_string(),
            span,
        });
        Ok(())
    }

    /// Innermost-first variable lookup across the scope stack.
    fn lookup_var(&self, name: &str) -> Option<&VarSymbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().find(|symbol| symbol.name == name))
    }

    fn lookup_function(&self, name: &str) -> Option<&FunctionSymbol> {
        self.functions.get(name)
    }

    // ========================================================================
    // Flow modes
    // ========================================================================

    fn note_flow_usage(&mut self, mode: FlowMode, span: Span) -> SResult<()> {
        if mode == FlowMode::None {
            return Ok(());
        }
        if self.current_flow == FlowMode::None {
            self.current_flow = mode;
            return Ok(());
        }
        if self.current_flow != mode {
            return Err(CompileError::sema(
                "cannot mix maybe and result in the same function",
                span,
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Type support checks
    // ========================================================================

    fn require_supported_type(
        &self,
        type_name: &str,
        span: Span,
        allow_complex: bool,
    ) -> SResult<()> {
        if type_is_concurrency(type_name) {
            return Err(CompileError::sema(
                "concurrency is not supported by the current backend",
                span,
            ));
        }
        if !allow_complex {
            if type_is_result(type_name) || type_is_maybe(type_name) || !type_is_primitive(type_name)
            {
                return Err(CompileError::sema(
                    "struct contains unsupported field type for current backend",
                    span,
                ));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn check_declaration(&mut self, decl: &Declaration) -> SResult<()> {
        match decl {
            Declaration::Function(f) => self.check_function(f),
            Declaration::Struct(s) => self.check_struct(s),
        }
    }

    fn check_function(&mut self, decl: &FunctionDecl) -> SResult<()> {
        let previous_in_function = self.in_function;
        let previous_flow = self.current_flow;
        self.in_function = true;
        self.current_flow = flow_mode_from_type(&decl.return_type);

        self.require_supported_type(&decl.return_type, decl.span, true)?;
        if decl.name == "main" && type_is_result(&decl.return_type) {
            return Err(CompileError::sema("main cannot return result type", decl.span));
        }

        self.push_scope();
        for param in &decl.params {
            self.require_supported_type(&param.type_name, param.span, true)?;
            self.note_flow_usage(flow_mode_from_type(&param.type_name), param.span)?;
            self.add_var(&param.name, false, &param.type_name, param.span)?;
        }
        self.check_block(&decl.body, false)?;
        self.pop_scope();

        self.in_function = previous_in_function;
        self.current_flow = previous_flow;
        Ok(())
    }

    fn check_struct(&mut self, decl: &StructDecl) -> SResult<()> {
        for (i, field) in decl.fields.iter().enumerate() {
            for later in &decl.fields[i + 1..] {
                if field.name == later.name {
                    return Err(CompileError::sema(
                        "duplicate field name in struct",
                        later.span,
                    ));
                }
            }
            self.require_supported_type(&field.type_name, field.span, false)?;
            if field.type_name == decl.name {
                return Err(CompileError::sema(
                    "struct contains unsupported field type for current backend",
                    field.span,
                ));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn check_block(&mut self, block: &Block, owns_scope: bool) -> SResult<()> {
        if owns_scope {
            self.push_scope();
        }
        for statement in &block.statements {
            self.check_statement(statement)?;
        }
        if owns_scope {
            self.pop_scope();
        }
        Ok(())
    }

    fn check_statement(&mut self, statement: &Stmt) -> SResult<()> {
        match statement {
            Stmt::VarDecl {
                is_mutable,
                name,
                type_name,
                initializer,
                span,
            } => {
                self.require_supported_type(type_name, *span, true)?;
                self.note_flow_usage(flow_mode_from_type(type_name), *span)?;
                self.add_var(name, *is_mutable, type_name, *span)?;
                self.check_expression(initializer)
            }
            Stmt::Assign { target, value, span } => {
                let symbol = match self.lookup_var(target) {
                    Some(symbol) => symbol,
                    None => {
                        return Err(CompileError::sema(
                            "assignment to undeclared variable",
                            *span,
                        ))
                    }
                };
                if !symbol.is_mutable {
                    return Err(CompileError::sema(
                        "cannot assign to immutable variable",
                        *span,
                    ));
                }
                self.check_expression(value)
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                self.check_expression(condition)?;
                self.check_block(then_block, true)?;
                if let Some(else_block) = else_block {
                    self.check_block(else_block, true)?;
                }
                Ok(())
            }
            Stmt::For { span, .. } => Err(CompileError::sema(
                "'for in' is not yet supported for this type",
                *span,
            )),
            Stmt::Return { value, span } => {
                if !self.in_function {
                    return Err(CompileError::sema("return outside of function", *span));
                }
                if let Some(value) = value {
                    self.check_expression(value)?;
                }
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.check_expression(expr)?;
                self.check_unused_result(expr)
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn check_expression(&mut self, expr: &Expr) -> SResult<()> {
        match expr {
            Expr::Literal { .. } => Ok(()),
            Expr::Identifier { name, span } => {
                if is_concurrency_keyword(name) {
                    return Err(CompileError::sema(
                        "concurrency is not supported by the current backend",
                        *span,
                    ));
                }
                if self.lookup_var(name).is_some() {
                    return Ok(());
                }
                if self.lookup_function(name).is_none() {
                    return Err(CompileError::sema("undeclared identifier", *span));
                }
                Ok(())
            }
            Expr::Call {
                callee,
                arguments,
                span,
            } => {
                if let Expr::Identifier { name, span: callee_span } = callee.as_ref() {
                    if is_concurrency_keyword(name) {
                        return Err(CompileError::sema(
                            "concurrency is not supported by the current backend",
                            *span,
                        ));
                    }
                    if self.lookup_function(name).is_none() && self.lookup_var(name).is_none() {
                        return Err(CompileError::sema(
                            "call to undefined function",
                            *callee_span,
                        ));
                    }
                } else {
                    self.check_expression(callee)?;
                }
                for argument in arguments {
                    self.check_expression(argument)?;
                }
                self.check_builtin_call(callee, arguments, *span)
            }
            Expr::Binary { left, right, .. } => {
                self.check_expression(left)?;
                self.check_expression(right)
            }
        }
    }

    fn check_builtin_call(&self, callee: &Expr, arguments: &[Expr], span: Span) -> SResult<()> {
        if let Expr::Identifier { name, .. } = callee {
            if name == "log" && arguments.len() != 1 {
                return Err(CompileError::sema("log expects exactly one argument", span));
            }
        }
        Ok(())
    }

    /// An expression statement may not discard a `result`-returning call.
    fn check_unused_result(&self, expr: &Expr) -> SResult<()> {
        let Expr::Call { callee, span, .. } = expr else {
            return Ok(());
        };
        let Expr::Identifier { name, .. } = callee.as_ref() else {
            return Ok(());
        };
        if let Some(function) = self.lookup_function(name) {
            if type_is_result(&function.return_type) {
                return Err(CompileError::sema(
                    "result-returning function must not be ignored",
                    *span,
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Type-name predicates
// ============================================================================

/// True when `type_name` is `prefix` or `prefix[...]`.
fn type_starts_with(type_name: &str, prefix: &str) -> bool {
    match type_name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('['),
        None => false,
    }
}

fn type_is_maybe(type_name: &str) -> bool {
    type_starts_with(type_name, "maybe")
}

fn type_is_result(type_name: &str) -> bool {
    type_starts_with(type_name, "result")
}

fn type_is_primitive(type_name: &str) -> bool {
    matches!(type_name, "int" | "float" | "bool" | "string" | "null")
}

fn type_is_concurrency(type_name: &str) -> bool {
    type_starts_with(type_name, "future") || type_starts_with(type_name, "chan")
}

fn is_concurrency_keyword(name: &str) -> bool {
    matches!(name, "task" | "future" | "chan")
}

fn flow_mode_from_type(type_name: &str) -> FlowMode {
    if type_is_result(type_name) {
        FlowMode::Result
    } else if type_is_maybe(type_name) {
        FlowMode::Maybe
    } else {
        FlowMode::None
    }
}

/// Validate a parsed program.
///
/// Running this twice over the same AST yields the same answer; the AST is
/// never mutated.
#[tracing::instrument(skip_all)]
pub fn check(program: &Program) -> Result<(), CompileError> {
    let mut analyzer = Analyzer::new();
    analyzer.register_builtins();

    for decl in &program.declarations {
        if let Declaration::Function(f) = decl {
            analyzer.register_function(f)?;
        }
    }

    for decl in &program.declarations {
        analyzer.check_declaration(decl)?;
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{lexer, parser};

    fn analyze(source: &str) -> Result<(), CompileError> {
        let tokens = lexer::lex(source).expect("lex should succeed");
        let program = parser::parse(&tokens).expect("parse should succeed");
        check(&program)
    }

    #[test]
    fn test_minimal_program_is_accepted() {
        analyze("main: () -> null = ()\n    log(\"Hello\")\n").expect("sema should accept");
    }

    #[test]
    fn test_immutable_assignment_is_rejected() {
        let err = analyze("main: () -> null = ()\n    x: int = 1\n    x = 2\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[line 3:5] Semantic error: cannot assign to immutable variable"
        );
    }

    #[test]
    fn test_mutable_assignment_is_accepted() {
        analyze("main: () -> null = ()\n    mut x: int = 1\n    x = 2\n")
            .expect("sema should accept");
    }

    #[test]
    fn test_assignment_to_undeclared_is_rejected() {
        let err = analyze("main: () -> null = ()\n    x = 2\n").unwrap_err();
        assert!(err.to_string().contains("assignment to undeclared variable"));
    }

    #[test]
    fn test_redeclaration_in_same_scope_is_rejected() {
        let err = analyze("main: () -> null = ()\n    x: int = 1\n    x: int = 2\n").unwrap_err();
        assert!(err.to_string().contains("symbol already declared in this scope"));
    }

    #[test]
    fn test_shadowing_in_inner_scope_is_accepted() {
        let source = "main: () -> null = ()\n    x: int = 1\n    if x > 0\n        x: int = 2\n        log(\"inner\")\n";
        analyze(source).expect("sema should accept");
    }

    #[test]
    fn test_undeclared_identifier_is_rejected() {
        let err = analyze("main: () -> null = ()\n    y: int = ghost\n").unwrap_err();
        assert!(err.to_string().contains("undeclared identifier"));
    }

    #[test]
    fn test_call_to_undefined_function_is_rejected() {
        let err = analyze("main: () -> null = ()\n    missing()\n").unwrap_err();
        assert!(err.to_string().contains("call to undefined function"));
    }

    #[test]
    fn test_function_redeclaration_is_rejected() {
        let source = "f: () -> null = ()\n    log(\"a\")\nf: () -> null = ()\n    log(\"b\")\n";
        let err = analyze(source).unwrap_err();
        assert!(err.to_string().contains("function already declared"));
    }

    #[test]
    fn test_user_function_named_log_is_rejected() {
        let err = analyze("log: () -> null = ()\n    return\n").unwrap_err();
        assert!(err.to_string().contains("function already declared"));
    }

    #[test]
    fn test_unused_result_is_rejected() {
        let source = "f: () -> result[int,int] = ()\n    return 1\nmain: () -> null = ()\n    f()\n";
        let err = analyze(source).unwrap_err();
        assert!(err
            .to_string()
            .contains("result-returning function must not be ignored"));
    }

    #[test]
    fn test_flow_mode_mix_is_rejected() {
        let source = "f: (maybe[int]) -> result[int,int] = (x)\n    return 1\n";
        let err = analyze(source).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot mix maybe and result in the same function"));
    }

    #[test]
    fn test_matching_flow_modes_are_accepted() {
        let source = "f: (maybe[int]) -> maybe[int] = (x)\n    return x\n";
        analyze(source).expect("sema should accept");
    }

    #[test]
    fn test_flow_mode_local_contribution() {
        let source = "f: () -> result[int,int] = ()\n    m: maybe[int] = null\n    return 1\n";
        let err = analyze(source).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot mix maybe and result in the same function"));
    }

    #[test]
    fn test_main_returning_result_is_rejected() {
        let err = analyze("main: () -> result[int,int] = ()\n    return 1\n").unwrap_err();
        assert!(err.to_string().contains("main cannot return result type"));
    }

    #[test]
    fn test_concurrency_types_are_rejected() {
        let err = analyze("f: (chan[int]) -> null = (c)\n    return\n").unwrap_err();
        assert!(err
            .to_string()
            .contains("concurrency is not supported by the current backend"));
    }

    #[test]
    fn test_concurrency_identifiers_are_rejected() {
        let err = analyze("main: () -> null = ()\n    x: int = future\n").unwrap_err();
        assert!(err
            .to_string()
            .contains("concurrency is not supported by the current backend"));
    }

    #[test]
    fn test_duplicate_struct_field_is_rejected() {
        let err = analyze("struct P\n    x: int\n    x: float\n").unwrap_err();
        assert!(err.to_string().contains("duplicate field name in struct"));
    }

    #[test]
    fn test_complex_struct_field_is_rejected() {
        let err = analyze("struct P\n    r: result[int,int]\n").unwrap_err();
        assert!(err
            .to_string()
            .contains("struct contains unsupported field type for current backend"));
    }

    #[test]
    fn test_recursive_struct_field_is_rejected() {
        let err = analyze("struct P\n    next: P\n").unwrap_err();
        assert!(err
            .to_string()
            .contains("struct contains unsupported field type for current backend"));
    }

    #[test]
    fn test_primitive_struct_fields_are_accepted() {
        analyze("struct P\n    a: int\n    b: float\n    c: bool\n    d: string\n")
            .expect("sema should accept");
    }

    #[test]
    fn test_log_arity_is_checked() {
        let err = analyze("main: () -> null = ()\n    log(\"a\", \"b\")\n").unwrap_err();
        assert!(err.to_string().contains("log expects exactly one argument"));
    }

    #[test]
    fn test_for_in_is_rejected() {
        let source = "main: () -> null = ()\n    for x in items\n        log(\"x\")\n";
        let err = analyze(source).unwrap_err();
        assert!(err
            .to_string()
            .contains("'for in' is not yet supported for this type"));
    }

    #[test]
    fn test_sema_is_idempotent_on_success() {
        let source = "main: () -> null = ()\n    log(\"Hello\")\n";
        let tokens = lexer::lex(source).expect("lex should succeed");
        let program = parser::parse(&tokens).expect("parse should succeed");
        check(&program).expect("first run should accept");
        check(&program).expect("second run should accept");
    }
}
