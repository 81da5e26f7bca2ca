//! C text emission utilities
//!
//! A buffer for building the generated translation unit with proper
//! indentation, plus the pure LazyLang-to-C mapping helpers shared by the
//! code generator.

use crate::frontend::lexer::TokenKind;

/// A buffer for building C source code with four-space indentation.
#[derive(Debug, Default)]
pub struct CEmitter {
    buffer: String,
    indent_level: usize,
}

impl CEmitter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
        }
    }

    /// Get the generated code.
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Write a full line with current indentation.
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write text without a newline.
    pub fn write(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    /// Write indentation only; used to open a line built from pieces.
    pub fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str("    ");
        }
    }

    /// Terminate a line built from pieces.
    pub fn end_line(&mut self) {
        self.buffer.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }
}

// ============================================================================
// Type mapping
// ============================================================================

/// True when `type_name` begins with `prefix` (codegen matches on the bare
/// prefix; bracketed arguments are opaque).
pub fn type_is_result(type_name: &str) -> bool {
    type_name.starts_with("result")
}

pub fn type_is_maybe(type_name: &str) -> bool {
    type_name.starts_with("maybe")
}

/// Map a LazyLang type to the C type used for value slots.
///
/// User struct names and anything unknown pass through verbatim; the emitted
/// forward declarations make struct names valid C type names.
pub fn c_value_type(type_name: &str) -> &str {
    match type_name {
        "int" => "int64_t",
        "float" => "double",
        "bool" => "bool",
        "string" => "struct lz_string *",
        "null" => "void *",
        _ if type_is_result(type_name) => "lz_result",
        _ if type_is_maybe(type_name) => "lz_maybe",
        _ => type_name,
    }
}

/// Map a LazyLang return type to a C return type; `null` returns become
/// `void`.
pub fn c_return_type(type_name: &str) -> &str {
    if type_name == "null" {
        "void"
    } else {
        c_value_type(type_name)
    }
}

/// Map a binary operator token one-to-one onto its C spelling.
pub fn binary_op_symbol(op: TokenKind) -> &'static str {
    match op {
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::EqEq => "==",
        TokenKind::BangEq => "!=",
        TokenKind::Lt => "<",
        TokenKind::LtEq => "<=",
        TokenKind::Gt => ">",
        TokenKind::GtEq => ">=",
        _ => "/*?*/",
    }
}

/// Escape a string literal body for emission inside C double quotes.
///
/// `\`, `"`, newline, carriage return and tab get their short escapes;
/// other non-printable bytes become `\xHH`.
pub fn escape_c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &byte in text.as_bytes() {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\x{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mapping() {
        assert_eq!(c_value_type("int"), "int64_t");
        assert_eq!(c_value_type("float"), "double");
        assert_eq!(c_value_type("bool"), "bool");
        assert_eq!(c_value_type("string"), "struct lz_string *");
        assert_eq!(c_value_type("null"), "void *");
        assert_eq!(c_value_type("result[int,int]"), "lz_result");
        assert_eq!(c_value_type("maybe[User]"), "lz_maybe");
        assert_eq!(c_value_type("User"), "User");
    }

    #[test]
    fn test_return_type_mapping() {
        assert_eq!(c_return_type("null"), "void");
        assert_eq!(c_return_type("int"), "int64_t");
        assert_eq!(c_return_type("result[int,int]"), "lz_result");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_c_string("plain"), "plain");
        assert_eq!(escape_c_string("a\"b"), "a\\\"b");
        assert_eq!(escape_c_string("a\\b"), "a\\\\b");
        assert_eq!(escape_c_string("line\nbreak\t"), "line\\nbreak\\t");
        assert_eq!(escape_c_string("\u{1}"), "\\x01");
    }

    #[test]
    fn test_emitter_indentation() {
        let mut e = CEmitter::new();
        e.line("int main(void) {");
        e.indent();
        e.line("return 0;");
        e.dedent();
        e.line("}");
        assert_eq!(e.finish(), "int main(void) {\n    return 0;\n}\n");
    }

    #[test]
    fn test_binary_op_symbols() {
        assert_eq!(binary_op_symbol(TokenKind::Plus), "+");
        assert_eq!(binary_op_symbol(TokenKind::BangEq), "!=");
        assert_eq!(binary_op_symbol(TokenKind::LtEq), "<=");
    }
}
