//! Engine process supervision.
//!
//! [`Supervisor::start`] spawns one engine process per job and returns right
//! away. The outcome arrives later through the job's [`Completion`], and the
//! engine's stderr is handed out as a [`DiagnosticStream`] for
//! [`tail`](crate::tail) to consume. The two are independent: ignoring one
//! never stalls the other.

use crate::{Error, JobDescriptor, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::Instrument;

/// Always passed to the engine ahead of the job's own arguments.
pub const OVERWRITE_FLAG: &str = "-y";

/// Runs jobs with a fixed engine binary.
#[derive(Debug, Clone)]
pub struct Supervisor {
    engine: PathBuf,
}

/// Handles returned by [`Supervisor::start`].
#[derive(Debug)]
pub struct StartedJob {
    /// Resolves once the engine has exited (or failed to start).
    pub completion: Completion,
    /// The engine's stderr; detached when it could not be attached.
    pub diagnostics: DiagnosticStream,
    /// Set when stderr could not be attached. The job still runs, but no
    /// progress will be reported.
    pub attach_error: Option<Error>,
}

impl Supervisor {
    pub fn new(engine: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    pub fn engine(&self) -> &Path {
        &self.engine
    }

    /// Full argument list the engine is invoked with.
    pub fn command_args(&self, job: &JobDescriptor) -> Vec<String> {
        let mut args = Vec::with_capacity(job.args().len() + 1);
        args.push(OVERWRITE_FLAG.to_string());
        args.extend(job.args().iter().cloned());
        args
    }

    /// Spawn the engine for `job`.
    ///
    /// Never fails synchronously: a spawn error is delivered through the
    /// returned [`Completion`]. Must be called from within a Tokio runtime.
    pub fn start(&self, job: &JobDescriptor) -> StartedJob {
        let span = tracing::info_span!("job", id = %job.id());
        let _entered = span.enter();

        let args = self.command_args(job);
        let (done_tx, done_rx) = oneshot::channel();
        let completion = Completion { rx: done_rx };

        tracing::info!("Spawning {:?} for {:?}", self.engine, job.input());
        tracing::debug!("Engine arguments: {:?}", args);

        let mut cmd = Command::new(&self.engine);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = Error::ProcessStartFailed {
                    args,
                    message: e.to_string(),
                    output: String::new(),
                };
                tracing::error!("{}", err);
                let _ = done_tx.send(Err(err));
                return StartedJob {
                    completion,
                    diagnostics: DiagnosticStream::detached(),
                    attach_error: None,
                };
            }
        };

        let (diagnostics, attach_error) = match child.stderr.take() {
            Some(stderr) => (DiagnosticStream::from_reader(stderr), None),
            None => {
                let err = Error::StreamAttachFailed {
                    message: "engine stderr was not captured".to_string(),
                };
                tracing::warn!("{}", err);
                (DiagnosticStream::detached(), Some(err))
            }
        };

        tokio::spawn(supervise(child, args, done_tx).instrument(span.clone()));

        StartedJob {
            completion,
            diagnostics,
            attach_error,
        }
    }
}

/// Wait for the engine to exit, buffering its stdout, and report once.
async fn supervise(child: Child, args: Vec<String>, done: oneshot::Sender<Result<()>>) {
    let result = match child.wait_with_output().await {
        Ok(output) if output.status.success() => {
            tracing::info!("Engine finished successfully");
            Ok(())
        }
        Ok(output) => Err(Error::ProcessRunFailed {
            args,
            message: output.status.to_string(),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        }),
        Err(e) => Err(Error::ProcessRunFailed {
            args,
            message: e.to_string(),
            output: String::new(),
        }),
    };

    if let Err(ref err) = result {
        tracing::error!("{}", err);
    }

    if done.send(result).is_err() {
        tracing::debug!("Completion dropped before the engine exited");
    }
}

/// One-shot outcome of a started job.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<Result<()>>,
}

impl Completion {
    /// Wait for the engine to exit.
    ///
    /// # Errors
    ///
    /// - [`Error::ProcessStartFailed`] if the engine could not be spawned.
    /// - [`Error::ProcessRunFailed`] on a nonzero exit or wait failure; the
    ///   error carries the arguments and the engine's buffered stdout.
    /// - [`Error::CompletionLost`] if the supervising task vanished.
    pub async fn wait(self) -> Result<()> {
        self.rx.await.unwrap_or_else(|_| Err(Error::CompletionLost))
    }
}

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Readable handle on a job's diagnostic output.
///
/// Owned by whoever tails it. Dropping a handle that was never tailed keeps
/// draining it in the background until the engine exits, so an unread pipe
/// can never fill up and block the engine.
pub struct DiagnosticStream {
    reader: Option<BoxedReader>,
}

impl DiagnosticStream {
    /// Wrap any byte stream, e.g. a saved ffmpeg log.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            reader: Some(Box::new(reader)),
        }
    }

    /// A handle with nothing behind it; tailing it yields no updates.
    pub fn detached() -> Self {
        Self { reader: None }
    }

    pub fn is_attached(&self) -> bool {
        self.reader.is_some()
    }

    pub(crate) fn take(&mut self) -> Option<BoxedReader> {
        self.reader.take()
    }
}

impl std::fmt::Debug for DiagnosticStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticStream")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl Drop for DiagnosticStream {
    fn drop(&mut self) {
        let Some(mut reader) = self.reader.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
            });
        }
    }
}
