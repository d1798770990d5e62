//! One-shot engine process execution.
//!
//! Every call spawns a fresh `<launcher> run [--dir <scope>] <module>` child,
//! feeds it one request on stdin and collects everything it writes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::error::{captured, Error, Result};

/// Filesystem root the engine may access during one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityScope(PathBuf);

impl CapabilityScope {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    /// Unrestricted access, so includes may use `..` and absolute paths.
    pub fn root() -> Self {
        Self(PathBuf::from("/"))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Everything a finished engine process produced.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub pid: Option<u32>,
}

impl ProcessOutput {
    /// Captured stderr, or the exit code when stderr is empty.
    pub fn diagnostic(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.exit_code {
            Some(code) => format!("Exit code {}", code),
            None => "Terminated by signal".to_string(),
        }
    }
}

/// Spawns engine processes through a resolved launcher.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    launcher: PathBuf,
}

impl ProcessInvoker {
    pub fn new(launcher: PathBuf) -> Self {
        Self { launcher }
    }

    pub fn launcher(&self) -> &Path {
        &self.launcher
    }

    /// Build the argument list for one invocation.
    pub fn args(binary: &Path, scope: Option<&CapabilityScope>) -> Vec<PathBuf> {
        let mut args = vec![PathBuf::from("run")];
        if let Some(scope) = scope {
            args.push(PathBuf::from("--dir"));
            args.push(scope.path().to_path_buf());
        }
        args.push(binary.to_path_buf());
        args
    }

    /// Run the engine once and collect its output.
    ///
    /// The exit status is returned as-is; the engine reports failures inside
    /// the JSON body, so judging success is left to the caller.
    pub async fn invoke(
        &self,
        binary: &Path,
        request: &[u8],
        scope: Option<&CapabilityScope>,
        timeout: Duration,
    ) -> Result<ProcessOutput> {
        let mut child = Command::new(&self.launcher)
            .args(Self::args(binary, scope))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Launch {
                launcher: self.launcher.display().to_string(),
                source,
            })?;

        let pid = child.id();

        // Lives outside the timeout so a killed engine still leaves its stderr.
        let mut stderr = Vec::new();
        let outcome =
            tokio::time::timeout(timeout, communicate(&mut child, request, &mut stderr)).await;
        match outcome {
            Ok(result) => {
                let mut output = result?;
                output.stderr = stderr;
                output.pid = pid;
                Ok(output)
            }
            Err(_) => {
                log::debug!("Engine process {:?} exceeded {:?}, killing", pid, timeout);
                // kill() also reaps, so the pid is gone once this returns.
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill engine process {:?}: {}", pid, e);
                }
                Err(Error::Timeout {
                    timeout,
                    pid,
                    stderr: captured(&stderr),
                })
            }
        }
    }
}

async fn communicate(
    child: &mut Child,
    request: &[u8],
    stderr_buf: &mut Vec<u8>,
) -> Result<ProcessOutput> {
    let stdin = child.stdin.take();
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    let write = async move {
        if let Some(mut pipe) = stdin {
            match pipe.write_all(request).await {
                Ok(()) => {}
                // The engine may exit before reading everything; its output still counts.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    log::warn!("Engine closed stdin early");
                }
                Err(e) => return Err(e),
            }
            // Dropping the pipe closes stdin and signals end of request.
            drop(pipe);
        }
        Ok(())
    };

    let mut stdout_buf = Vec::new();
    let read_out = read_into(stdout.as_mut(), &mut stdout_buf);
    let read_err = read_into(stderr.as_mut(), stderr_buf);

    let (written, out, err) = tokio::join!(write, read_out, read_err);
    written?;
    out?;
    err?;

    let status = child.wait().await?;

    Ok(ProcessOutput {
        stdout: stdout_buf,
        stderr: Vec::new(),
        exit_code: status.code(),
        pid: None,
    })
}

/// Append everything `pipe` yields to `buf`.
///
/// Each chunk lands in `buf` as soon as it is read, so a cancelled read keeps
/// what arrived before.
async fn read_into<R>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    if let Some(pipe) = pipe {
        let mut chunk = [0u8; 8192];
        loop {
            let n = pipe.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
    Ok(())
}

/// Check if a process is still alive.
pub fn pid_is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }

    #[cfg(unix)]
    {
        // Signal 0 doesn't send a signal but checks if the process exists
        let result = unsafe { libc::kill(pid as libc::pid_t, 0) };
        if result == 0 {
            return true;
        }
        // EPERM means it exists but we don't have permission
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    #[cfg(not(unix))]
    {
        true
    }
}
