//! External destinations for call records

use crate::collector::record::CallRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write call record to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize call record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives every call record after it is appended to the ledger
///
/// `record` runs on the caller's task, so implementations must not block
/// on I/O. Errors are logged and counted by the collector; they never reach
/// the orchestration patterns.
pub trait CallSink: Send + Sync {
    /// Short label for logs and metrics
    fn name(&self) -> &str;

    fn record(&self, record: &CallRecord) -> Result<(), SinkError>;

    /// Wait until every accepted record is durable
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug)]
enum WriterCommand {
    Line(Vec<u8>),
    Flush(Sender<()>),
}

/// Appends each record as one JSON line
///
/// Lines are queued to a dedicated writer thread; `record` only serializes
/// and enqueues. A failed write surfaces as an error from the next `record`
/// or `flush`. Dropping the sink drains the queue before returning.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    commands: Option<Sender<WriterCommand>>,
    writer: Option<JoinHandle<()>>,
    pending_error: Arc<Mutex<Option<std::io::Error>>>,
}

impl JsonlSink {
    /// Open (or create) the file in append mode, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| SinkError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        let (commands, queue) = mpsc::channel();
        let pending_error = Arc::new(Mutex::new(None));
        let writer = std::thread::Builder::new()
            .name("jsonl-sink".to_string())
            .spawn({
                let path = path.clone();
                let pending_error = pending_error.clone();
                move || run_writer(file, queue, &path, &pending_error)
            })
            .map_err(io_err)?;

        Ok(Self {
            path,
            commands: Some(commands),
            writer: Some(writer),
            pending_error,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn send(&self, command: WriterCommand) -> Result<(), SinkError> {
        self.commands
            .as_ref()
            .and_then(|commands| commands.send(command).ok())
            .ok_or_else(|| {
                SinkError::Unavailable(format!(
                    "writer for {} has stopped",
                    self.path.display()
                ))
            })
    }

    fn take_pending_error(&self) -> Result<(), SinkError> {
        let pending = self
            .pending_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match pending {
            Some(source) => Err(SinkError::Io {
                path: self.path.display().to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}

impl CallSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn record(&self, record: &CallRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        self.send(WriterCommand::Line(line))?;
        self.take_pending_error()
    }

    fn flush(&self) -> Result<(), SinkError> {
        let (ack, acked) = mpsc::channel();
        self.send(WriterCommand::Flush(ack))?;
        let writer_alive = acked.recv().is_ok();

        self.take_pending_error()?;
        if !writer_alive {
            return Err(SinkError::Unavailable(format!(
                "writer for {} stopped before flushing",
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        // Closing the channel ends the writer once the queue is drained
        self.commands.take();
        if let Some(writer) = self.writer.take()
            && writer.join().is_err()
        {
            tracing::error!(path = %self.path.display(), "Call record writer panicked");
        }
    }
}

/// Writer loop: drain whatever is queued, write it, flush once per batch
fn run_writer(
    file: File,
    queue: Receiver<WriterCommand>,
    path: &Path,
    pending_error: &Mutex<Option<std::io::Error>>,
) {
    let mut out = BufWriter::new(file);

    while let Ok(first) = queue.recv() {
        let mut acks = Vec::new();
        let mut failure = None;

        for command in std::iter::once(first).chain(queue.try_iter()) {
            match command {
                WriterCommand::Line(line) => {
                    if let Err(e) = out.write_all(&line) {
                        failure = Some(e);
                    }
                }
                WriterCommand::Flush(ack) => acks.push(ack),
            }
        }

        if let Err(e) = out.flush() {
            failure = Some(e);
        }

        if let Some(e) = failure {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write call records");
            *pending_error
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(e);
        }

        for ack in acks {
            // The flushing caller may have given up waiting
            let _ = ack.send(());
        }
    }
}
