use crate::error::ToolError;
use log::{debug, warn};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 輪詢子程序狀態的間隔
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// 外部程序的執行結果
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// 帶逾時與中斷檢查的外部程序執行器
///
/// 子程序的 stdout / stderr 由背景執行緒讀取，避免管線緩衝區塞滿造成卡死。
/// 逾時或收到中斷信號時會終止子程序。
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
    shutdown_signal: Arc<AtomicBool>,
}

impl ToolRunner {
    #[must_use]
    pub const fn new(timeout: Duration, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            timeout,
            shutdown_signal,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn shutdown_signal(&self) -> &Arc<AtomicBool> {
        &self.shutdown_signal
    }

    /// 執行命令並要求結束碼為 0
    pub fn run(&self, command: Command) -> Result<ToolOutput, ToolError> {
        let program = program_name(&command);
        let output = self.run_unchecked(command)?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program,
                code: output.status.code(),
                stderr: output.stderr_lossy().trim().to_string(),
            });
        }

        Ok(output)
    }

    /// 執行命令，不檢查結束碼
    pub fn run_unchecked(&self, mut command: Command) -> Result<ToolOutput, ToolError> {
        let program = program_name(&command);

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

        debug!("啟動 {program} [{}]", child.id());

        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = self.wait_with_deadline(&mut child, &program);

        let stdout = join_pipe_reader(stdout_reader);
        let stderr = join_pipe_reader(stderr_reader);

        Ok(ToolOutput {
            status: status?,
            stdout,
            stderr,
        })
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        program: &str,
    ) -> Result<ExitStatus, ToolError> {
        let started = Instant::now();

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    warn!("無法檢查程序狀態 [{}]: {e}", child.id());
                    kill_quietly(child);
                    return Err(ToolError::Spawn {
                        program: program.to_string(),
                        source: e,
                    });
                }
            }

            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷信號，終止程序 [{}]", child.id());
                kill_quietly(child);
                return Err(ToolError::Cancelled(program.to_string()));
            }

            if started.elapsed() >= self.timeout {
                warn!(
                    "{program} [{}] 超過 {:.0}s，強制終止",
                    child.id(),
                    self.timeout.as_secs_f64()
                );
                kill_quietly(child);
                return Err(ToolError::TimedOut {
                    program: program.to_string(),
                    timeout: self.timeout,
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().to_string()
}

fn kill_quietly(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    }))
}

fn join_pipe_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner(timeout: Duration) -> ToolRunner {
        ToolRunner::new(timeout, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_run_collects_stdout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello; echo oops 1>&2"]);
        let output = runner(Duration::from_secs(5)).run(cmd).unwrap();
        assert_eq!(output.stdout_lossy().trim(), "hello");
        assert_eq!(output.stderr_lossy().trim(), "oops");
    }

    #[test]
    fn test_run_reports_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken 1>&2; exit 3"]);
        let err = runner(Duration::from_secs(5)).run(cmd).unwrap_err();
        match err {
            ToolError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_times_out() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exec sleep 5"]);
        let started = Instant::now();
        let err = runner(Duration::from_millis(200)).run(cmd).unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_cancelled_by_signal() {
        let signal = Arc::new(AtomicBool::new(true));
        let runner = ToolRunner::new(Duration::from_secs(5), signal);
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exec sleep 5"]);
        let err = runner.run(cmd).unwrap_err();
        assert!(matches!(err, ToolError::Cancelled(_)));
    }

    #[test]
    fn test_missing_program() {
        let cmd = Command::new("definitely-not-a-real-binary-xyz");
        let err = runner(Duration::from_secs(1)).run(cmd).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
