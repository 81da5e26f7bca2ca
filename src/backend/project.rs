//! Output handling: writes the generated C file and drives the external C
//! compiler to produce the final binary.
//!
//! `clang` is preferred; when absent the build falls back to `cc`. Produced
//! binaries link the runtime translation unit shipped with the compiler.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

pub const DEFAULT_C_OUTPUT: &str = "lazylang_out.c";
pub const DEFAULT_BINARY_OUTPUT: &str = "lazylang_out";

/// Runtime implementation compiled into every produced binary. The generated
/// C includes the matching header under the same directory.
const RUNTIME_SOURCE: &str = "src/runtime/runtime.c";

/// Error produced while turning generated C into a binary.
#[derive(Debug)]
pub enum BuildError {
    Io(io::Error),
    CompilerFailed {
        compiler: &'static str,
        binary: String,
    },
    NoCompiler,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Io(e) => write!(f, "failed to run C compiler: {}", e),
            BuildError::CompilerFailed { compiler, binary } => {
                write!(f, "{} failed while building '{}'", compiler, binary)
            }
            BuildError::NoCompiler => {
                write!(f, "no suitable C compiler found (missing clang and cc)")
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<io::Error> for BuildError {
    fn from(e: io::Error) -> Self {
        BuildError::Io(e)
    }
}

/// Write the generated translation unit. Generation happens fully in memory,
/// so nothing is written when an earlier stage failed.
pub fn write_c_file(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}

/// Compile the generated C and the runtime into a binary.
pub fn build_binary(c_path: &Path, binary_path: &Path) -> Result<(), BuildError> {
    if command_exists("clang") {
        return invoke_compiler("clang", c_path, binary_path);
    }
    eprintln!("clang not found; attempting to use cc instead");
    if command_exists("cc") {
        return invoke_compiler("cc", c_path, binary_path);
    }
    Err(BuildError::NoCompiler)
}

fn command_exists(command: &str) -> bool {
    Command::new(command)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn invoke_compiler(
    compiler: &'static str,
    c_path: &Path,
    binary_path: &Path,
) -> Result<(), BuildError> {
    tracing::debug!(compiler, c_path = %c_path.display(), "invoking C compiler");
    let status = Command::new(compiler)
        .arg("-std=c11")
        .arg("-Wall")
        .arg("-Wextra")
        .arg(c_path)
        .arg(RUNTIME_SOURCE)
        .arg("-o")
        .arg(binary_path)
        .status()?;

    if !status.success() {
        return Err(BuildError::CompilerFailed {
            compiler,
            binary: binary_path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_C_OUTPUT, "lazylang_out.c");
        assert_eq!(DEFAULT_BINARY_OUTPUT, "lazylang_out");
    }

    #[test]
    fn test_missing_compiler_is_not_detected_as_present() {
        assert!(!command_exists("definitely-not-a-real-compiler-3983"));
    }
}
