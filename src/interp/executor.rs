//! Program execution API
//!
//! Convenience layer over `Env` for running a statement tree as one
//! top-level evaluation unit with configurable limits and output capture.
//! The integration tests drive the engine through this module.

use crate::core::value::Val;
use crate::interp::env::{Env, SharedBufferWriter};
use crate::interp::error::{CollectingErrorHandler, EngineError, ErrorLevel};
use crate::interp::stmt::{Signal, StmtNode};
use crate::runtime::context::EngineContext;
use std::time::Duration;

/// Configuration for one top-level run.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Maximum execution time in milliseconds (0 = unlimited).
    pub timeout_ms: u64,
    /// Capture output and diagnostics instead of writing to stdio.
    pub capture_output: bool,
    /// Initial global variables.
    pub globals: Vec<(Vec<u8>, Val)>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            capture_output: true,
            globals: Vec::new(),
        }
    }
}

/// Result of a captured run.
#[derive(Debug)]
pub struct ExecutionResult {
    /// The script's return value (null when it ran to the end).
    pub value: Val,
    /// Captured output bytes.
    pub stdout: Vec<u8>,
    /// Captured diagnostics, in emission order.
    pub diagnostics: Vec<(ErrorLevel, String)>,
}

/// Run a statement list as the top-level unit of an existing environment.
///
/// A `return` truncates the script; `break`/`continue` reaching the top is
/// a fatal error.
pub fn run_program(env: &mut Env, program: &[StmtNode]) -> Result<Val, EngineError> {
    for stmt in program {
        match stmt.execute(env)? {
            Signal::Next => {}
            Signal::Return(value) => return Ok(value),
            Signal::Break | Signal::Continue => {
                return Err(EngineError::Fatal(
                    "Cannot break/continue outside of a loop".into(),
                ));
            }
        }
    }
    Ok(Val::Null)
}

/// Build a fresh environment per the configuration and run the program.
pub fn execute_program(
    program: &[StmtNode],
    config: ExecutionConfig,
) -> Result<ExecutionResult, EngineError> {
    let mut env = Env::new(EngineContext::new());

    let writer = SharedBufferWriter::new();
    let handler = CollectingErrorHandler::new();
    if config.capture_output {
        env.set_output_writer(Box::new(writer.clone()));
        env.set_error_handler(Box::new(handler.clone()));
    }

    if config.timeout_ms > 0 {
        env.set_time_limit(Some(Duration::from_millis(config.timeout_ms)));
    }

    for (name, value) in &config.globals {
        let sym = env.intern(name);
        env.set_var(sym, value.clone());
    }

    let value = run_program(&mut env, program)?;

    Ok(ExecutionResult {
        value,
        stdout: writer.contents(),
        diagnostics: handler.entries(),
    })
}

/// Run with default configuration.
pub fn execute(program: &[StmtNode]) -> Result<ExecutionResult, EngineError> {
    execute_program(program, ExecutionConfig::default())
}
