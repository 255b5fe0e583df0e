//! Running external commands for the search and git tools.

use patchloom_core::error::ToolError;
use tokio::process::Command;
use tracing::debug;

/// Run a program with the given arguments, capturing stdout.
///
/// Non-zero exit is an error carrying stderr — the dispatch layer turns it
/// into data for the model.
pub async fn run(program: &str, args: &[&str]) -> Result<String, ToolError> {
    debug!(program = %program, ?args, "Running command");

    let output = Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: program.to_string(),
            reason: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(ToolError::CommandFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: format!("{stderr}{stdout}"),
        });
    }

    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let out = run("echo", &["hello"]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_error() {
        let err = run("false", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn failure_carries_stderr_text() {
        let err = run("sh", &["-c", "echo boom >&2; exit 3"]).await.unwrap_err();
        match err {
            ToolError::CommandFailed { status, stderr } => {
                assert_eq!(status, 3);
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_error() {
        let err = run("patchloom-no-such-program", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
