use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use uuid::Uuid;

use crate::config::DeployConfig;
use crate::models::deploy::{DeployOutcome, DeployStatus, DeployTrigger};
use crate::utils;

/// Lines of captured output kept in the log per stream
const OUTPUT_TAIL_LINES: usize = 40;

/// Bytes of output kept per stream. The oldest bytes go first.
pub const MAX_OUTPUT_BYTES: usize = 256 * 1024;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// How long to keep reading pipes once the script itself is gone
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs the configured deploy script. The command line is fixed at startup.
#[derive(Debug, Clone)]
pub struct DeployRunner {
    script: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    output_limit: usize,
}

impl DeployRunner {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: None,
            output_limit: MAX_OUTPUT_BYTES,
        }
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            script: config.script.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
            timeout: config.timeout(),
            output_limit: MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_limit(mut self, bytes: usize) -> Self {
        self.output_limit = bytes;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Run the script to completion (or timeout) and log what happened
    pub async fn run(&self, trigger: DeployTrigger) -> DeployOutcome {
        let run_id = Uuid::new_v4();
        let mut outcome = DeployOutcome::new(run_id, trigger, DeployStatus::Succeeded);
        let start = Instant::now();

        tracing::info!(
            "[deploy {}] Running {} ({})",
            run_id,
            self.script.display(),
            outcome.trigger
        );

        let mut cmd = Command::new(&self.script);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down everything the script started
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                outcome.status = DeployStatus::SpawnFailed(e.to_string());
                outcome.elapsed = start.elapsed();
                log_outcome(&outcome);
                return outcome;
            }
        };

        let pid = child.id();
        let mut stdout = StreamCapture::new(child.stdout.take(), self.output_limit);
        let mut stderr = StreamCapture::new(child.stderr.take(), self.output_limit);

        let waited = {
            let finished = wait_and_capture(&mut child, &mut stdout, &mut stderr);
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, finished).await.ok(),
                None => Some(finished.await),
            }
        };

        match waited {
            None => {
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    tracing::debug!("[deploy {}] Reaping timed out script: {}", run_id, e);
                }
                // What the script wrote before it died is still in the pipes
                let _ = tokio::time::timeout(DRAIN_GRACE, async {
                    tokio::join!(stdout.drain(), stderr.drain())
                })
                .await;
                outcome.status = DeployStatus::TimedOut;
            }
            Some(Err(e)) => outcome.status = DeployStatus::SpawnFailed(e.to_string()),
            Some(Ok(status)) => {
                outcome.status = if status.success() {
                    DeployStatus::Succeeded
                } else {
                    DeployStatus::Failed {
                        code: status.code(),
                    }
                };
            }
        }

        outcome.elapsed = start.elapsed();
        outcome.output_truncated = stdout.truncated || stderr.truncated;
        outcome.stdout = stdout.into_string();
        outcome.stderr = stderr.into_string();

        log_outcome(&outcome);
        outcome
    }
}

/// Wait for the script to exit while reading both pipes, so a chatty script
/// never blocks on a full pipe. Processes left in the background may hold
/// the pipes open; their output is only read for a short grace period.
async fn wait_and_capture<O, E>(
    child: &mut Child,
    stdout: &mut StreamCapture<O>,
    stderr: &mut StreamCapture<E>,
) -> std::io::Result<ExitStatus>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let reading = async {
        tokio::join!(stdout.drain(), stderr.drain());
    };
    tokio::pin!(reading);

    let mut pipes_closed = false;
    let status = loop {
        tokio::select! {
            _ = &mut reading, if !pipes_closed => pipes_closed = true,
            status = child.wait() => break status,
        }
    };

    if !pipes_closed {
        let _ = tokio::time::timeout(DRAIN_GRACE, reading).await;
    }
    status
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::debug!("Killing process group {} failed: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// One output pipe and the bytes read from it so far
struct StreamCapture<R> {
    pipe: Option<R>,
    buf: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl<R: AsyncRead + Unpin> StreamCapture<R> {
    fn new(pipe: Option<R>, limit: usize) -> Self {
        Self {
            pipe,
            buf: Vec::new(),
            limit,
            truncated: false,
        }
    }

    /// Read until EOF. Cancelling keeps everything read so far.
    async fn drain(&mut self) {
        let Self {
            pipe,
            buf,
            limit,
            truncated,
        } = self;
        let Some(reader) = pipe.as_mut() else {
            return;
        };

        let mut chunk = vec![0u8; READ_CHUNK_BYTES];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.len() > *limit {
                        let excess = buf.len() - *limit;
                        buf.drain(..excess);
                        *truncated = true;
                    }
                }
                Err(e) => {
                    tracing::debug!("Reading deploy output failed: {}", e);
                    break;
                }
            }
        }
        *pipe = None;
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

pub fn log_outcome(outcome: &DeployOutcome) {
    let stdout = utils::tail_lines(&outcome.stdout, OUTPUT_TAIL_LINES);
    let stderr = utils::tail_lines(&outcome.stderr, OUTPUT_TAIL_LINES);
    let started = outcome.started_at.format("%Y-%m-%d %H:%M:%S");

    match &outcome.status {
        DeployStatus::Succeeded => {
            tracing::info!(
                "[deploy {}] {} in {:.1}s (started {} UTC, {})",
                outcome.run_id,
                outcome.status,
                outcome.elapsed.as_secs_f64(),
                started,
                outcome.trigger
            );
            if !stdout.is_empty() {
                tracing::debug!("[deploy {}] stdout:\n{}", outcome.run_id, stdout);
            }
            if !stderr.is_empty() {
                tracing::debug!("[deploy {}] stderr:\n{}", outcome.run_id, stderr);
            }
        }
        DeployStatus::Skipped => {
            tracing::warn!(
                "[deploy {}] {} ({})",
                outcome.run_id,
                outcome.status,
                outcome.trigger
            );
        }
        _ => {
            tracing::error!(
                "[deploy {}] {} after {:.1}s (started {} UTC, {})",
                outcome.run_id,
                outcome.status,
                outcome.elapsed.as_secs_f64(),
                started,
                outcome.trigger
            );
            if !stdout.is_empty() {
                tracing::error!("[deploy {}] stdout:\n{}", outcome.run_id, stdout);
            }
            if !stderr.is_empty() {
                tracing::error!("[deploy {}] stderr:\n{}", outcome.run_id, stderr);
            }
        }
    }

    if outcome.output_truncated {
        tracing::warn!(
            "[deploy {}] Output hit the capture limit, only the end was kept",
            outcome.run_id
        );
    }
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        path
    }

    /// Runs the script through `/bin/sh` so it never has to be executable
    pub(crate) fn sh_runner(script: &Path) -> DeployRunner {
        DeployRunner::new("/bin/sh").with_args(vec![script.display().to_string()])
    }

    #[tokio::test]
    async fn captures_output_of_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "deploy.sh", "echo building\necho warn >&2");

        let outcome = sh_runner(&script).run(DeployTrigger::default()).await;

        assert_eq!(outcome.status, DeployStatus::Succeeded);
        assert_eq!(outcome.stdout.trim(), "building");
        assert_eq!(outcome.stderr.trim(), "warn");
    }

    #[tokio::test]
    async fn records_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "deploy.sh", "echo boom >&2\nexit 3");

        let outcome = sh_runner(&script).run(DeployTrigger::default()).await;

        assert_eq!(outcome.status, DeployStatus::Failed { code: Some(3) });
        assert!(!outcome.status.is_success());
        assert_eq!(outcome.stderr.trim(), "boom");
    }

    #[tokio::test]
    async fn missing_script_is_a_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = DeployRunner::new(dir.path().join("absent.sh"))
            .run(DeployTrigger::default())
            .await;

        assert!(matches!(outcome.status, DeployStatus::SpawnFailed(_)));
    }

    #[tokio::test]
    async fn fixed_args_and_working_dir_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "deploy.sh", "pwd\necho \"$1\"");

        let outcome = DeployRunner::new("/bin/sh")
            .with_args(vec![script.display().to_string(), "--prod".into()])
            .with_working_dir(dir.path())
            .run(DeployTrigger::default())
            .await;

        let lines: Vec<&str> = outcome.stdout.lines().collect();
        let cwd = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(std::fs::canonicalize(lines[0]).unwrap(), cwd);
        assert_eq!(lines[1], "--prod");
    }

    #[tokio::test]
    async fn runaway_script_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "deploy.sh", "sleep 30");

        let outcome = sh_runner(&script)
            .with_timeout(Some(Duration::from_millis(200)))
            .run(DeployTrigger::default())
            .await;

        assert_eq!(outcome.status, DeployStatus::TimedOut);
        assert!(outcome.elapsed < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn timeout_kills_children_and_keeps_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("late-step-ran");
        let script = write_script(
            dir.path(),
            "deploy.sh",
            &format!(
                "echo started\necho compiling >&2\nsh -c \"sleep 2; touch {}\"",
                marker.display()
            ),
        );

        let outcome = sh_runner(&script)
            .with_timeout(Some(Duration::from_millis(300)))
            .run(DeployTrigger::default())
            .await;

        assert_eq!(outcome.status, DeployStatus::TimedOut);
        assert!(outcome.elapsed < Duration::from_secs(2));
        assert_eq!(outcome.stdout.trim(), "started");
        assert_eq!(outcome.stderr.trim(), "compiling");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn output_is_capped_per_stream() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "deploy.sh",
            "i=0\nwhile [ $i -lt 5000 ]; do echo \"line $i\"; i=$((i+1)); done\necho short >&2",
        );

        let outcome = sh_runner(&script)
            .with_output_limit(1024)
            .run(DeployTrigger::default())
            .await;

        assert_eq!(outcome.status, DeployStatus::Succeeded);
        assert!(outcome.output_truncated);
        assert!(outcome.stdout.len() <= 1024);
        assert!(outcome.stdout.trim_end().ends_with("line 4999"));
        assert_eq!(outcome.stderr.trim(), "short");
    }

    #[tokio::test]
    async fn small_output_is_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "deploy.sh", "echo ok");

        let outcome = sh_runner(&script).run(DeployTrigger::default()).await;

        assert!(!outcome.output_truncated);
        assert_eq!(outcome.stdout, "ok\n");
    }

    #[test]
    fn from_config_copies_fields() {
        let config = DeployConfig {
            script: PathBuf::from("/srv/deploy.sh"),
            args: vec!["a".into()],
            working_dir: Some(PathBuf::from("/srv")),
            timeout_secs: Some(5),
            overlap: Default::default(),
        };
        let runner = DeployRunner::from_config(&config);
        assert_eq!(runner.script(), Path::new("/srv/deploy.sh"));
        assert_eq!(runner.args, vec!["a".to_string()]);
        assert_eq!(runner.timeout, Some(Duration::from_secs(5)));
        assert_eq!(runner.output_limit, MAX_OUTPUT_BYTES);
    }
}
