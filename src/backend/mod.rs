//! LazyLang compiler backend
//!
//! Lowers the validated AST into a single C translation unit and, unless
//! asked to stop at C, invokes an external C compiler (`clang`, falling back
//! to `cc`) to link the result against the runtime.
//!
//! ## Module organization
//!
//! - `c_emitter` - indentation-aware text buffer and type/operator mapping
//! - `codegen` - AST to C translation (emission phases, tail slots, funnels)
//! - `project` - C file output and external compiler invocation

pub mod c_emitter;
pub mod codegen;
pub mod project;

pub use codegen::generate;
pub use project::{build_binary, BuildError, DEFAULT_BINARY_OUTPUT, DEFAULT_C_OUTPUT};
