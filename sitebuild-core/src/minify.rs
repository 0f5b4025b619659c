//! Minifiers - External Tools Behind a Trait
//!
//! The pipeline only sees `Minifier`. Production runs shell out to the
//! configured command; tests swap in in-process fakes.

use std::io;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::config::{MinifierCommand, INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};

#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {}: {stderr}", describe_exit(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{0}")]
    Other(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

/// Turns one source file into its minified artifact
pub trait Minifier {
    fn name(&self) -> &str;
    fn minify(&self, input: &Path, output: &Path) -> Result<(), MinifyError>;
}

/// Runs an external program synchronously, blocking until it exits
#[derive(Debug, Clone)]
pub struct CommandMinifier {
    name: String,
    command: MinifierCommand,
}

impl CommandMinifier {
    pub fn new(name: impl Into<String>, command: MinifierCommand) -> Self {
        Self { name: name.into(), command }
    }

    pub fn clean_css() -> Self {
        Self::new("cleancss", MinifierCommand::clean_css())
    }

    pub fn uglify_js() -> Self {
        Self::new("uglifyjs", MinifierCommand::uglify_js())
    }

    /// Argument list with placeholders filled in
    pub fn args_for(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.command
            .args
            .iter()
            .map(|arg| arg.replace(INPUT_PLACEHOLDER, &input).replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

impl Minifier for CommandMinifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn minify(&self, input: &Path, output: &Path) -> Result<(), MinifyError> {
        let args = self.args_for(input, output);
        debug!(program = %self.command.program, ?args, "running minifier");

        let result = Command::new(&self.command.program)
            .args(&args)
            .output()
            .map_err(|source| MinifyError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        if result.status.success() {
            Ok(())
        } else {
            Err(MinifyError::Exit {
                program: self.command.program.clone(),
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            })
        }
    }
}
