//! C code generator for LazyLang
//!
//! Lowers a validated AST into a single self-contained C translation unit
//! that includes the runtime header and routes every observable write through
//! a runtime assignment helper.
//!
//! Emission phases, in order: file header, includes, struct forward
//! declarations, struct definitions, per-struct assign helpers, function
//! prototypes, function bodies, and the C `main` entry point.
//!
//! When a function returns a value but its body does not end in `return`, the
//! generator declares a `__lz_ret` slot and threads a tail slot down the
//! block tree: the final statement of the body (and, through `if`/`else`,
//! the final statement of each branch) is rewritten into an assignment to
//! the slot, followed by a single `return __lz_ret;`.

use crate::backend::c_emitter::{
    binary_op_symbol, c_return_type, c_value_type, escape_c_string, type_is_maybe, type_is_result,
    CEmitter,
};
use crate::frontend::ast::*;
use crate::frontend::diagnostics::CompileError;

type CResult<T> = Result<T, CompileError>;

/// The out-parameter a block's last statement must assign to:
/// `(slot variable, assignment helper)`.
type TailSlot<'s> = Option<(&'s str, &'s str)>;

struct StructInfo<'a> {
    decl: &'a StructDecl,
    assign_helper: String,
}

struct FunctionInfo<'a> {
    decl: &'a FunctionDecl,
    c_name: String,
}

struct VarBinding {
    name: String,
    type_name: String,
}

/// Code generation state for one translation unit.
///
/// Struct and function tables keep source order; the scope stack mirrors
/// sema's so identifier rewriting can tell locals from functions.
struct Codegen<'a> {
    out: CEmitter,
    program: &'a Program,
    structs: Vec<StructInfo<'a>>,
    functions: Vec<FunctionInfo<'a>>,
    scopes: Vec<Vec<VarBinding>>,
}

impl<'a> Codegen<'a> {
    fn new(program: &'a Program) -> Self {
        Self {
            out: CEmitter::new(),
            program,
            structs: Vec::new(),
            functions: Vec::new(),
            scopes: Vec::new(),
        }
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    fn collect_metadata(&mut self) {
        for decl in &self.program.declarations {
            match decl {
                Declaration::Struct(s) => self.structs.push(StructInfo {
                    decl: s,
                    assign_helper: format!("lz_assign_struct_{}", s.name),
                }),
                Declaration::Function(f) => self.functions.push(FunctionInfo {
                    decl: f,
                    c_name: format!("lz_fn_{}", f.name),
                }),
            }
        }
    }

    fn find_struct(&self, name: &str) -> Option<&StructInfo<'a>> {
        self.structs.iter().find(|info| info.decl.name == name)
    }

    fn find_function(&self, name: &str) -> Option<&FunctionInfo<'a>> {
        self.functions.iter().find(|info| info.decl.name == name)
    }

    /// Assignment funnel for a type: scalar helpers for primitives, the
    /// result/maybe helpers for flow types, the per-struct helper for known
    /// structs, and the pointer funnel otherwise.
    fn assign_helper_for(&self, type_name: &str) -> String {
        match type_name {
            "int" => "lz_assign_int64".to_string(),
            "float" => "lz_assign_double".to_string(),
            "bool" => "lz_assign_bool".to_string(),
            "string" => "lz_assign_string".to_string(),
            _ if type_is_result(type_name) => "lz_assign_result".to_string(),
            _ if type_is_maybe(type_name) => "lz_assign_maybe".to_string(),
            _ => match self.find_struct(type_name) {
                Some(info) => info.assign_helper.clone(),
                None => "lz_assign_ptr".to_string(),
            },
        }
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn add_binding(&mut self, name: &str, type_name: &str) {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(VarBinding {
                name: name.to_string(),
                type_name: type_name.to_string(),
            });
        }
    }

    fn lookup_binding(&self, name: &str) -> Option<&VarBinding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().find(|binding| binding.name == name))
    }

    // ========================================================================
    // Program emission
    // ========================================================================

    fn emit_program(mut self) -> CResult<String> {
        self.collect_metadata();
        self.emit_file_header();
        self.emit_includes();
        self.out.blank_line();
        self.emit_struct_forward_decls();
        self.out.blank_line();
        self.emit_structs();
        self.out.blank_line();
        self.emit_struct_assign_helpers();
        self.out.blank_line();
        self.emit_function_prototypes();
        self.out.blank_line();
        self.emit_function_definitions()?;
        self.out.blank_line();
        self.emit_entrypoint();
        Ok(self.out.finish())
    }

    fn emit_file_header(&mut self) {
        self.out.line("/* Auto-generated C output from lazylang */");
    }

    fn emit_includes(&mut self) {
        self.out.line("#include <stdint.h>");
        self.out.line("#include <stdbool.h>");
        self.out.line("#include <stddef.h>");
        self.out.line("#include <stdio.h>");
        self.out.line("#include <stdlib.h>");
        self.out.line("#include <string.h>");
        self.out.line("#if defined(__GNUC__) || defined(__clang__)");
        self.out.line("#define LZ_UNUSED __attribute__((unused))");
        self.out.line("#else");
        self.out.line("#define LZ_UNUSED");
        self.out.line("#endif");
        self.out.line("#define LZ_RUNTIME_DEFINE_STRUCTS");
        self.out.line("#include \"src/runtime/runtime.h\"");
    }

    fn emit_struct_forward_decls(&mut self) {
        for info in &self.structs {
            self.out
                .line(&format!("typedef struct {} {};", info.decl.name, info.decl.name));
        }
    }

    fn emit_structs(&mut self) {
        for i in 0..self.structs.len() {
            let decl = self.structs[i].decl;
            self.out.line(&format!("struct {} {{", decl.name));
            self.out.indent();
            for field in &decl.fields {
                self.out
                    .line(&format!("{} {};", c_value_type(&field.type_name), field.name));
            }
            self.out.dedent();
            self.out.line("};");
            self.out.blank_line();
        }
    }

    fn emit_struct_assign_helpers(&mut self) {
        for i in 0..self.structs.len() {
            let name = self.structs[i].decl.name.clone();
            let helper = self.structs[i].assign_helper.clone();
            self.out.line(&format!(
                "static void LZ_UNUSED {}({} *dst, {} value) {{",
                helper, name, name
            ));
            self.out.indent();
            self.out.line("*dst = value;");
            self.out.dedent();
            self.out.line("}");
            self.out.blank_line();
        }
    }

    fn function_signature(&self, info: &FunctionInfo<'a>, prototype: bool) -> String {
        let decl = info.decl;
        let mut sig = format!(
            "static {} {}(",
            c_return_type(&decl.return_type),
            info.c_name
        );
        if decl.params.is_empty() {
            sig.push_str("void");
        } else {
            for (i, param) in decl.params.iter().enumerate() {
                if i > 0 {
                    sig.push_str(", ");
                }
                sig.push_str(c_value_type(&param.type_name));
                sig.push(' ');
                sig.push_str(&param.name);
            }
        }
        sig.push(')');
        if prototype {
            sig.push(';');
        }
        sig
    }

    fn emit_function_prototypes(&mut self) {
        for i in 0..self.functions.len() {
            let sig = self.function_signature(&self.functions[i], true);
            self.out.line(&sig);
        }
    }

    fn emit_function_definitions(&mut self) -> CResult<()> {
        for i in 0..self.functions.len() {
            let decl = self.functions[i].decl;
            let sig = self.function_signature(&self.functions[i], false);
            self.out.line(&sig);
            self.emit_function_body(decl)?;
            self.out.blank_line();
        }
        Ok(())
    }

    fn emit_function_body(&mut self, decl: &FunctionDecl) -> CResult<()> {
        self.out.line("{");
        self.out.indent();
        self.push_scope();
        for param in &decl.params {
            self.add_binding(&param.name, &param.type_name);
        }

        let returns_value = c_return_type(&decl.return_type) != "void";
        let last_is_return = matches!(decl.body.statements.last(), Some(Stmt::Return { .. }));
        let needs_tail_return = returns_value && !last_is_return;

        let tail_helper;
        let tail: TailSlot<'_> = if needs_tail_return {
            let storage = c_value_type(&decl.return_type);
            self.out.line(&format!("{} __lz_ret = {{0}};", storage));
            tail_helper = self.assign_helper_for(&decl.return_type);
            Some(("__lz_ret", tail_helper.as_str()))
        } else {
            None
        };

        let count = decl.body.statements.len();
        for (i, statement) in decl.body.statements.iter().enumerate() {
            let slot = if i + 1 == count { tail } else { None };
            self.emit_statement(statement, slot)?;
        }

        if needs_tail_return {
            self.out.line("return __lz_ret;");
        }

        self.pop_scope();
        self.out.dedent();
        self.out.line("}");
        Ok(())
    }

    fn emit_entrypoint(&mut self) {
        let main_fn = self
            .functions
            .iter()
            .find(|info| info.decl.name == "main")
            .map(|info| (info.c_name.clone(), info.decl.params.len()));

        self.out.line("int main(void) {");
        self.out.indent();
        match main_fn {
            Some((c_name, param_count)) => {
                if param_count > 0 {
                    self.out.line("/* TODO: pass CLI arguments to main */");
                }
                self.out.line(&format!("{}();", c_name));
                self.out.line("return 0;");
            }
            None => {
                self.out
                    .line("fprintf(stderr, \"no entry point defined\\n\");");
                self.out.line("return 1;");
            }
        }
        self.out.dedent();
        self.out.line("}");
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn emit_block(&mut self, block: &Block, tail: TailSlot<'_>) -> CResult<()> {
        self.out.line("{");
        self.out.indent();
        self.push_scope();

        let count = block.statements.len();
        for (i, statement) in block.statements.iter().enumerate() {
            let slot = if i + 1 == count { tail } else { None };
            self.emit_statement(statement, slot)?;
        }

        self.pop_scope();
        self.out.dedent();
        self.out.line("}");
        Ok(())
    }

    fn emit_statement(&mut self, statement: &Stmt, tail: TailSlot<'_>) -> CResult<()> {
        match statement {
            Stmt::VarDecl {
                name,
                type_name,
                initializer,
                ..
            } => self.emit_var_decl(name, type_name, initializer),
            Stmt::Assign { target, value, span } => self.emit_assignment(target, value, *span),
            Stmt::If {
                condition,
                then_block,
                else_block,
                ..
            } => self.emit_if(condition, then_block, else_block.as_ref(), tail),
            Stmt::Return { value, .. } => self.emit_return(value.as_ref()),
            Stmt::Expr(expr) => self.emit_expr_stmt(expr, tail),
            Stmt::For { span, .. } => Err(CompileError::codegen(
                "for-in loops are not supported yet",
                *span,
            )),
        }
    }

    /// Zero-initialize the slot, then route the initializer through the
    /// assignment funnel.
    fn emit_var_decl(&mut self, name: &str, type_name: &str, initializer: &Expr) -> CResult<()> {
        self.out
            .line(&format!("{} {} = {{0}};", c_value_type(type_name), name));
        self.add_binding(name, type_name);
        self.emit_assignment_call(name, type_name, initializer)
    }

    fn emit_assignment(&mut self, target: &str, value: &Expr, span: Span) -> CResult<()> {
        let type_name = match self.lookup_binding(target) {
            Some(binding) => binding.type_name.clone(),
            None => {
                return Err(CompileError::codegen("assignment to unknown symbol", span));
            }
        };
        self.emit_assignment_call(target, &type_name, value)
    }

    fn emit_assignment_call(&mut self, target: &str, type_name: &str, value: &Expr) -> CResult<()> {
        let helper = self.assign_helper_for(type_name);
        self.out.write_indent();
        self.out.write(&format!("{}(&{}, ", helper, target));
        self.emit_expression(value)?;
        self.out.write(");");
        self.out.end_line();
        Ok(())
    }

    fn emit_if(
        &mut self,
        condition: &Expr,
        then_block: &Block,
        else_block: Option<&Block>,
        tail: TailSlot<'_>,
    ) -> CResult<()> {
        self.out.write_indent();
        self.out.write("if (");
        self.emit_expression(condition)?;
        self.out.write(") ");
        self.out.end_line();
        self.emit_block(then_block, tail)?;
        if let Some(else_block) = else_block {
            self.out.line("else");
            self.emit_block(else_block, tail)?;
        }
        Ok(())
    }

    fn emit_return(&mut self, value: Option<&Expr>) -> CResult<()> {
        self.out.write_indent();
        self.out.write("return");
        if let Some(value) = value {
            self.out.write(" ");
            self.emit_expression(value)?;
        }
        self.out.write(";");
        self.out.end_line();
        Ok(())
    }

    /// When a tail slot is active, the final expression statement becomes an
    /// assignment into the function's return slot.
    fn emit_expr_stmt(&mut self, expr: &Expr, tail: TailSlot<'_>) -> CResult<()> {
        self.out.write_indent();
        if let Some((var, helper)) = tail {
            self.out.write(&format!("{}(&{}, ", helper, var));
            self.emit_expression(expr)?;
            self.out.write(");");
        } else {
            self.emit_expression(expr)?;
            self.out.write(";");
        }
        self.out.end_line();
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn emit_expression(&mut self, expr: &Expr) -> CResult<()> {
        match expr {
            Expr::Literal { value, .. } => {
                self.emit_literal(value);
                Ok(())
            }
            Expr::Identifier { name, .. } => {
                self.emit_identifier(name);
                Ok(())
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.emit_expression(callee)?;
                self.out.write("(");
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        self.out.write(", ");
                    }
                    self.emit_expression(argument)?;
                }
                self.out.write(")");
                Ok(())
            }
            Expr::Binary {
                left, op, right, ..
            } => {
                // Fully parenthesized to sidestep C precedence surprises.
                self.out.write("(");
                self.emit_expression(left)?;
                self.out.write(&format!(" {} ", binary_op_symbol(*op)));
                self.emit_expression(right)?;
                self.out.write(")");
                Ok(())
            }
        }
    }

    fn emit_literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Int(text) | Literal::Float(text) => self.out.write(text),
            Literal::Bool(true) => self.out.write("true"),
            Literal::Bool(false) => self.out.write("false"),
            Literal::Str(text) => {
                let escaped = escape_c_string(text);
                self.out
                    .write(&format!("lz_string_from_literal(\"{}\")", escaped));
            }
            Literal::Null => self.out.write("NULL"),
        }
    }

    /// Identifier rewriting: the `log` builtin maps to the runtime logger,
    /// locals stay verbatim, user functions get their `lz_fn_` name, and
    /// anything else passes through for forward-declared C-level names.
    fn emit_identifier(&mut self, name: &str) {
        if name == "log" {
            self.out.write("lz_runtime_log");
            return;
        }
        if self.lookup_binding(name).is_some() {
            self.out.write(name);
            return;
        }
        let rewritten = self.find_function(name).map(|info| info.c_name.clone());
        match rewritten {
            Some(c_name) => self.out.write(&c_name),
            None => self.out.write(name),
        }
    }
}

/// Generate the C translation unit for a validated program.
///
/// Output is deterministic: identical ASTs produce byte-identical C.
#[tracing::instrument(skip_all)]
pub fn generate(program: &Program) -> Result<String, CompileError> {
    Codegen::new(program).emit_program()
}

// ============================================================================
// TESTS
// ============================================================================
