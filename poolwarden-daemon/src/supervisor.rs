//! Lifecycle of the single supervised pool engine process.
//!
//! At most one instance is held at a time. Starting always retires the held
//! instance first (terminate, bounded wait) before spawning the replacement.
//! Exit is observed asynchronously by a watcher task that owns the child; it
//! only clears the handle if that handle still belongs to the exited instance.

#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use poolwarden_core::RuntimeConfig;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{DaemonError, Result};

/// A running child as seen by the supervisor.
pub trait ProcessHandle: Send + 'static {
    fn pid(&self) -> Option<u32>;
    /// Request termination. Must not block.
    fn terminate(&mut self) -> io::Result<()>;
    /// Resolve once the process has exited; `None` when no exit code exists (signal).
    fn wait(&mut self) -> BoxFuture<'_, io::Result<Option<i32>>>;
}

/// Launches pool processes.
pub trait Spawner: Send + Sync + 'static {
    fn spawn(&self) -> io::Result<Box<dyn ProcessHandle>>;
}

/// Spawns the configured program with piped output forwarded to the log.
#[derive(Debug, Clone)]
pub struct CommandSpawner {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandSpawner {
    pub fn new(program: impl Into<String>, args: Vec<String>, cwd: Option<PathBuf>) -> Self {
        Self { program: program.into(), args, cwd }
    }

    /// `pool_program pool_args...` run from `pool_dir`.
    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        Self::new(cfg.pool_program.clone(), cfg.pool_args.clone(), Some(cfg.pool_dir.clone()))
    }
}

impl Spawner for CommandSpawner {
    fn spawn(&self) -> io::Result<Box<dyn ProcessHandle>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", self.program)))?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, true));
        }
        Ok(Box::new(ChildHandle { child }))
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, is_stderr: bool) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!("[pool] {}", line);
        } else {
            info!("[pool] {}", line);
        }
    }
}

struct ChildHandle {
    child: Child,
}

impl ProcessHandle for ChildHandle {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    fn wait(&mut self) -> BoxFuture<'_, io::Result<Option<i32>>> {
        Box::pin(async move { self.child.wait().await.map(|status| status.code()) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
}

/// Last observed exit of a supervised instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRecord {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub observed_at: DateTime<Utc>,
}

struct Instance {
    generation: u64,
    pid: Option<u32>,
    kill: Option<oneshot::Sender<()>>,
    watcher: JoinHandle<()>,
}

struct Inner {
    state: ProcessState,
    current: Option<Instance>,
    generation: u64,
    last_exit: Option<ExitRecord>,
}

pub struct ProcessSupervisor {
    spawner: Arc<dyn Spawner>,
    inner: Arc<Mutex<Inner>>,
    // Serializes start/stop; never held by status readers.
    lifecycle: tokio::sync::Mutex<()>,
    stop_timeout: Duration,
}

impl ProcessSupervisor {
    pub fn new(spawner: Arc<dyn Spawner>, stop_timeout: Duration) -> Self {
        Self {
            spawner,
            inner: Arc::new(Mutex::new(Inner {
                state: ProcessState::Stopped,
                current: None,
                generation: 0,
                last_exit: None,
            })),
            lifecycle: tokio::sync::Mutex::new(()),
            stop_timeout,
        }
    }

    /// Replace whatever runs with a fresh instance. Returns its pid when known.
    pub async fn start(&self) -> Result<Option<u32>> {
        let _guard = self.lifecycle.lock().await;
        if self.retire_current().await {
            debug!("previous pool process retired before restart");
        }

        self.inner.lock().state = ProcessState::Starting;
        let mut handle = match self.spawner.spawn() {
            Ok(h) => h,
            Err(e) => {
                self.inner.lock().state = ProcessState::Stopped;
                warn!(error = %e, "pool process failed to start");
                return Err(DaemonError::spawn(e.to_string()));
            }
        };

        let pid = handle.pid();
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let generation = inner.generation;
        // Spawned while the lock is held so an instant exit still sees its own instance.
        let watcher = tokio::spawn(watch(Arc::clone(&self.inner), generation, async move {
            tokio::select! {
                status = handle.wait() => status,
                _ = kill_rx => {
                    if let Err(e) = handle.terminate() {
                        debug!(error = %e, "terminate failed; waiting for exit anyway");
                    }
                    handle.wait().await
                }
            }
        }));
        inner.current = Some(Instance { generation, pid, kill: Some(kill_tx), watcher });
        inner.state = ProcessState::Running;
        drop(inner);

        info!(pid = ?pid, generation, "pool process started");
        Ok(pid)
    }

    /// Terminate the held instance, if any. Returns whether one was held.
    pub async fn stop(&self) -> bool {
        let _guard = self.lifecycle.lock().await;
        let stopped = self.retire_current().await;
        self.inner.lock().state = ProcessState::Stopped;
        if stopped {
            info!("pool process stopped");
        }
        stopped
    }

    pub fn is_running(&self) -> bool {
        let inner = self.inner.lock();
        inner.state == ProcessState::Running && inner.current.is_some()
    }

    pub fn state(&self) -> ProcessState {
        self.inner.lock().state
    }

    pub fn pid(&self) -> Option<u32> {
        self.inner.lock().current.as_ref().and_then(|i| i.pid)
    }

    pub fn last_exit(&self) -> Option<ExitRecord> {
        self.inner.lock().last_exit.clone()
    }

    async fn retire_current(&self) -> bool {
        let prior = self.inner.lock().current.take();
        let Some(mut prior) = prior else {
            return false;
        };
        if let Some(kill) = prior.kill.take() {
            let _ = kill.send(());
        }
        if tokio::time::timeout(self.stop_timeout, &mut prior.watcher).await.is_err() {
            warn!(pid = ?prior.pid, timeout = ?self.stop_timeout, "pool process did not exit in time; abandoning it");
            // Dropping the child inside the aborted watcher kills it.
            prior.watcher.abort();
        }
        true
    }
}

async fn watch<F>(inner: Arc<Mutex<Inner>>, generation: u64, exit: F)
where
    F: std::future::Future<Output = io::Result<Option<i32>>>,
{
    let code = match exit.await {
        Ok(code) => code,
        Err(e) => {
            warn!(error = %e, "waiting on pool process failed");
            None
        }
    };
    let mut inner = inner.lock();
    inner.last_exit = Some(ExitRecord { code, observed_at: Utc::now() });
    if inner.current.as_ref().map(|i| i.generation) == Some(generation) {
        inner.current = None;
        inner.state = ProcessState::Stopped;
        warn!(code = ?code, generation, "pool process exited");
    } else {
        debug!(code = ?code, generation, "retired pool process exited");
    }
}
