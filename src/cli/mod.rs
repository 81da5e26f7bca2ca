//! CLI for the LazyLang compiler
//!
//! ## Usage
//!
//! `lazylang <source.lz> [<c-output-path> [<binary-output-path>]]`
//!
//! Exit codes: 0 on success, 1 on any stage failure or missing C compiler.
//!
//! ## Design
//!
//! Argument parsing uses clap with derive macros. Command functions return
//! `CliResult<T>` instead of calling `process::exit`; only the top-level
//! [`run`] function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::backend::{DEFAULT_BINARY_OUTPUT, DEFAULT_C_OUTPUT};

// ============================================================================
// CLI error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message to stderr, and exits with the
/// code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The LazyLang compiler
#[derive(Parser, Debug)]
#[command(name = "lazylang")]
#[command(version = VERSION)]
#[command(about = "Compiles LazyLang source files to portable C", long_about = None)]
pub struct Cli {
    /// LazyLang source file to compile
    pub source: PathBuf,

    /// Path for the generated C translation unit
    #[arg(default_value = DEFAULT_C_OUTPUT)]
    pub c_output: PathBuf,

    /// Path for the produced binary
    #[arg(default_value = DEFAULT_BINARY_OUTPUT)]
    pub binary_output: PathBuf,

    /// Stop after writing the C file (skip the external C compiler)
    #[arg(long)]
    pub emit_c_only: bool,

    /// Dump the token stream and exit (debug)
    #[arg(long)]
    pub tokens: bool,
}

/// Parse arguments, run the pipeline, and exit on failure.
pub fn run() {
    let cli = Cli::parse();
    if let Err(error) = commands::compile(&cli) {
        eprintln!("{}", error.message);
        process::exit(error.exit_code.0);
    }
}
