//! Integration tests for the LazyLang compiler pipeline
//!
//! Each test drives source text through lexing, parsing and semantic
//! analysis (and codegen where the generated C matters), the same way the
//! CLI sequences the stages.

use lazylang::backend::codegen;
use lazylang::frontend::{lexer, parser, sema};

/// Helper to run lex + parse + sema on a source string.
fn analyze(source: &str) -> Result<(), String> {
    let tokens = lexer::lex(source).map_err(|e| e.to_string())?;
    let program = parser::parse(&tokens).map_err(|e| e.to_string())?;
    sema::check(&program).map_err(|e| e.to_string())?;
    Ok(())
}

/// Helper to run the full pipeline down to C text.
fn compile_to_c(source: &str) -> Result<String, String> {
    let tokens = lexer::lex(source).map_err(|e| e.to_string())?;
    let program = parser::parse(&tokens).map_err(|e| e.to_string())?;
    sema::check(&program).map_err(|e| e.to_string())?;
    codegen::generate(&program).map_err(|e| e.to_string())
}

#[test]
fn test_minimal_program() {
    let source = "main: () -> null = ()\n    log(\"Hello\")\n";
    let c = compile_to_c(source).expect("pipeline should succeed");
    assert!(c.contains("static void lz_fn_main(void)"));
    assert!(c.contains("lz_runtime_log(lz_string_from_literal(\"Hello\"));"));
    assert!(c.contains("int main(void) {"));
    assert!(c.contains("lz_fn_main();"));
}

#[test]
fn test_tail_expression_return() {
    let source = "is_positive: (int) -> bool = (x)\n    if x > 0\n        true\n    else\n        false\n";
    let c = compile_to_c(source).expect("pipeline should succeed");
    assert!(c.contains("bool __lz_ret = {0};"));
    assert!(c.contains("lz_assign_bool(&__lz_ret, true);"));
    assert!(c.contains("lz_assign_bool(&__lz_ret, false);"));
    assert!(c.contains("return __lz_ret;"));
}

#[test]
fn test_immutable_assignment_rejection() {
    let source = "main: () -> null = ()\n    x: int = 1\n    x = 2\n";
    let err = analyze(source).unwrap_err();
    assert_eq!(
        err,
        "[line 3:5] Semantic error: cannot assign to immutable variable"
    );
}

#[test]
fn test_unused_result_rejection() {
    let source = "f: () -> result[int,int] = ()\n    return 1\nmain: () -> null = ()\n    f()\n";
    let err = analyze(source).unwrap_err();
    assert!(err.contains("result-returning function must not be ignored"));
}

#[test]
fn test_flow_mode_mix_rejection() {
    let source = "f: (maybe[int]) -> result[int,int] = (x)\n    return 1\n";
    let err = analyze(source).unwrap_err();
    assert!(err.contains("cannot mix maybe and result in the same function"));
}

#[test]
fn test_indentation_error() {
    let source = "main: () -> null = ()\n    x: int = 1\n  x = 2\n";
    let err = lexer::lex(source).unwrap_err();
    assert_eq!(err.to_string(), "Indentation error at line 3");
}

#[test]
fn test_import_counts() {
    let source = "import std.io\nimport net.http\nmain: () -> null = ()\n    log(\"x\")\n";
    let tokens = lexer::lex(source).expect("lex should succeed");
    let program = parser::parse(&tokens).expect("parse should succeed");
    assert_eq!(program.imports.len(), 2);
    assert_eq!(program.declarations.len(), 1);
    assert_eq!(program.imports[1].segments, vec!["net", "http"]);
}

#[test]
fn test_import_ordering_enforced() {
    let source = "main: () -> null = ()\n    log(\"x\")\nimport std\n";
    let tokens = lexer::lex(source).expect("lex should succeed");
    let err = parser::parse(&tokens).unwrap_err();
    assert!(err.to_string().contains("imports must appear before declarations"));
}

#[test]
fn test_token_stack_balance() {
    let source = "a: () -> null = ()\n    if true\n        log(\"deep\")\n    log(\"shallow\")\nb: () -> null = ()\n    log(\"b\")\n";
    let tokens = lexer::lex(source).expect("lex should succeed");
    let indents = tokens
        .iter()
        .filter(|t| t.kind == lexer::TokenKind::Indent)
        .count();
    let dedents = tokens
        .iter()
        .filter(|t| t.kind == lexer::TokenKind::Dedent)
        .count();
    assert_eq!(indents, dedents);
}

#[test]
fn test_structs_flow_through_codegen() {
    let source = "\
struct User
    name: string
    age: int

greet: (User) -> null = (u)
    log(\"hello\")

main: () -> null = ()
    log(\"start\")
";
    let c = compile_to_c(source).expect("pipeline should succeed");
    assert!(c.contains("typedef struct User User;"));
    assert!(c.contains("struct User {"));
    assert!(c.contains("static void LZ_UNUSED lz_assign_struct_User(User *dst, User value) {"));
    assert!(c.contains("static void lz_fn_greet(User u);"));
}

#[test]
fn test_comments_and_blank_lines() {
    let source = "\
# entry point
main: () -> null = ()
    # a local
    x: int = 1

    log(\"done\") # trailing
";
    analyze(source).expect("pipeline should accept comments and blank lines");
}

#[test]
fn test_concurrency_syntax_is_rejected() {
    let err = analyze("f: () -> future[int] = ()\n    return 1\n").unwrap_err();
    assert!(err.contains("concurrency is not supported by the current backend"));
}

#[test]
fn test_chained_compound_types() {
    let source = "\
open: (string) -> result[string,FileError] = (path)
    return null

run: (string) -> result[string,FileError] = (path)
    return open(path)

main: () -> null = ()
    log(\"ok\")
";
    analyze(source).expect("compound result types should flow through");
}

#[test]
fn test_mutable_rebinding_program() {
    let source = "\
count: () -> int = ()
    mut total: int = 0
    total = total + 1
    total = total * 2
    return total

main: () -> null = ()
    log(\"ok\")
";
    let c = compile_to_c(source).expect("pipeline should succeed");
    assert!(c.contains("lz_assign_int64(&total, 0);"));
    assert!(c.contains("lz_assign_int64(&total, (total + 1));"));
    assert!(c.contains("lz_assign_int64(&total, (total * 2));"));
}

#[test]
fn test_empty_source_parses_to_empty_program() {
    let tokens = lexer::lex("").expect("lex should succeed");
    let program = parser::parse(&tokens).expect("parse should succeed");
    assert!(program.imports.is_empty());
    assert!(program.declarations.is_empty());
    sema::check(&program).expect("sema should accept an empty program");
}

#[test]
fn test_codegen_handles_missing_main() {
    let c = compile_to_c("f: () -> null = ()\n    log(\"x\")\n").expect("pipeline should succeed");
    assert!(c.contains("no entry point defined"));
}
