//! Runs generated JavaScript artifacts with an external runtime.
//!
//! The artifact is written to a temporary script together with a console
//! prelude and a call to the entry point, then executed with the configured
//! program (normally `node`) inheriting this process's stdio.

use std::io::Write;
use std::process::Command;

use wylab_session::{ExecutionError, ExecutionSink};

/// Host functions the generated code expects to find.
pub const CONSOLE_PRELUDE: &str = "function println_n6string(str) { console.log(String(str)); }";

#[derive(Debug, Clone)]
pub struct NodeSink {
    program: String,
}

impl NodeSink {
    pub fn new(program: impl Into<String>) -> Self {
        NodeSink {
            program: program.into(),
        }
    }

    /// The full script executed for `artifact`.
    pub fn script(&self, artifact: &str, entry_point: &str) -> String {
        format!("{}\n{}\n{}();\n", CONSOLE_PRELUDE, artifact, entry_point)
    }
}

impl ExecutionSink for NodeSink {
    fn execute(&mut self, artifact: &str, entry_point: &str) -> Result<(), ExecutionError> {
        let mut file = tempfile::Builder::new()
            .prefix("wylab-")
            .suffix(".js")
            .tempfile()?;
        file.write_all(self.script(artifact, entry_point).as_bytes())?;
        file.flush()?;

        let status = Command::new(&self.program)
            .arg(file.path())
            .status()
            .map_err(|source| ExecutionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ExecutionError::Failed {
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
