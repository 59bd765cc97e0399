use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use log::{debug, info};

use super::command_to_string;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Run an external command to completion. The command line is logged
/// before launch, stderr is captured and surfaced in the error on non-zero
/// exit. With a timeout the child is polled and killed on expiry; without
/// one we wait for as long as it takes.
pub fn run_logged(cmd: &mut Command, timeout: Option<Duration>) -> Result<()> {
    info!("Running: {}", command_to_string(cmd));
    let program = cmd.get_program().to_string_lossy().into_owned();

    cmd.stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .map_err(|e| anyhow!("failed to launch '{}': {}", program, e))?;

    // Drain stderr on a separate thread so a chatty child cannot fill the
    // pipe and deadlock against our wait
    let mut stderr_pipe = child.stderr.take();
    let stderr_thread = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let status = match timeout {
        None => child
            .wait()
            .map_err(|e| anyhow!("failed to wait for '{}': {}", program, e)),
        Some(limit) => wait_with_deadline(&mut child, &program, limit),
    };
    let stderr = stderr_thread.join().unwrap_or_default();
    let status = status?;

    if !stderr.is_empty() {
        debug!("{} stderr: {}", program, stderr.trim_end());
    }
    if !status.success() {
        bail!("'{}' exited with {}: {}", program, status, stderr.trim_end());
    }
    Ok(())
}

/// Like [`run_logged`] but with the child's stdout redirected to a file.
pub fn run_logged_to_file(
    cmd: &mut Command,
    stdout_path: &Path,
    timeout: Option<Duration>,
) -> Result<()> {
    let out = File::create(stdout_path)
        .map_err(|e| anyhow!("failed to create {}: {}", stdout_path.display(), e))?;
    cmd.stdout(out);
    run_logged(cmd, timeout)
}

fn wait_with_deadline(child: &mut Child, program: &str, limit: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!(
                "'{}' did not finish within {}s and was killed",
                program,
                limit.as_secs()
            );
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("true");
        run_logged(&mut cmd, None).unwrap();
    }

    #[test]
    fn test_nonzero_exit_surfaces_stderr() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo bad input >&2; exit 3");
        let err = run_logged(&mut cmd, None).unwrap_err().to_string();
        assert!(err.contains("bad input"));
        assert!(err.contains("sh"));
    }

    #[test]
    fn test_missing_program() {
        let mut cmd = Command::new("definitely-not-a-real-tool-xyz");
        let err = run_logged(&mut cmd, None).unwrap_err().to_string();
        assert!(err.contains("failed to launch"));
    }

    #[test]
    fn test_timeout_kills_the_child() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("sleep 30");
        let start = Instant::now();
        let err = run_logged(&mut cmd, Some(Duration::from_millis(300))).unwrap_err();
        assert!(err.to_string().contains("killed"));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_stdout_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo hello");
        run_logged_to_file(&mut cmd, &out, None).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "hello\n");
    }
}
