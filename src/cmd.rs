use crate::context::Context;
use crate::error::Error;
use crate::platform::Platform;
use crate::result::Result;
use std::process::{Command, Stdio};

/// Run an opaque command string through the host shell inside the project root.
///
/// In verbose mode the child inherits stdout/stderr so build output streams
/// straight to the terminal; otherwise output is captured and only surfaced
/// (via [`Error::CommandFailed`]) when the command fails.
pub fn execute(ctx: &Context, command: &str) -> Result<()> {
    if ctx.verbose {
        println!("Executing: {}", command);
    }

    let (shell, flag) = Platform::current().shell();
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command).current_dir(&ctx.base_dir);

    let (status, output) = if ctx.verbose {
        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        (status, String::new())
    } else {
        let output = cmd.stdin(Stdio::null()).output()?;
        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        (output.status, text)
    };

    if !status.success() {
        return Err(Error::CommandFailed {
            command: command.to_string(),
            code: status.code(),
            output,
        });
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn ctx(dir: &std::path::Path) -> Context {
        Context::new(dir.to_path_buf(), false)
    }

    #[test]
    fn test_runs_inside_project_root() {
        let dir = tempfile::tempdir().unwrap();
        execute(&ctx(dir.path()), "echo built > marker.txt").unwrap();
        let marker = std::fs::read_to_string(dir.path().join("marker.txt")).unwrap();
        assert_eq!(marker.trim(), "built");
    }

    #[test]
    fn test_non_zero_exit_is_reported_with_code_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(&ctx(dir.path()), "echo boom >&2; exit 7").unwrap_err();
        match err {
            Error::CommandFailed { code, output, .. } => {
                assert_eq!(code, Some(7));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
