//! CLI command implementations

use std::fs;

use tracing::debug;

use crate::backend::{self, project};
use crate::frontend::{lexer, parser, sema};

use super::{Cli, CliError, CliResult};

/// Run the full pipeline: read, lex, parse, analyze, generate, build.
///
/// Each stage consumes the previous stage's output; the first error aborts
/// with its located diagnostic.
pub fn compile(cli: &Cli) -> CliResult<()> {
    let source = fs::read_to_string(&cli.source).map_err(|e| {
        CliError::failure(format!("failed to open '{}': {}", cli.source.display(), e))
    })?;

    let tokens = lexer::lex(&source).map_err(|e| CliError::failure(e.to_string()))?;
    debug!(token_count = tokens.len(), "lexing finished");

    if cli.tokens {
        for token in &tokens {
            println!("{:?}", token);
        }
        return Ok(());
    }

    let program = parser::parse(&tokens).map_err(|e| CliError::failure(e.to_string()))?;
    println!(
        "Parsed {} import(s) and {} declaration(s)",
        program.imports.len(),
        program.declarations.len()
    );

    sema::check(&program).map_err(|e| CliError::failure(e.to_string()))?;
    println!("Semantic analysis completed successfully");

    let c_source = backend::generate(&program).map_err(|e| CliError::failure(e.to_string()))?;
    project::write_c_file(&cli.c_output, &c_source).map_err(|e| {
        CliError::failure(format!(
            "failed to write '{}': {}",
            cli.c_output.display(),
            e
        ))
    })?;

    if cli.emit_c_only {
        println!("Code generation completed: {}", cli.c_output.display());
        return Ok(());
    }

    project::build_binary(&cli.c_output, &cli.binary_output)
        .map_err(|e| CliError::failure(e.to_string()))?;
    println!(
        "Code generation completed: {} -> {}",
        cli.c_output.display(),
        cli.binary_output.display()
    );
    Ok(())
}
