use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{LineParser, LogBuffer};

/// Errors surfaced by the tailer
#[derive(Debug, Error)]
pub enum TailError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("log file became inaccessible: {0}")]
    Lost(#[source] io::Error),
}

/// Notifications sent to the viewer loop
#[derive(Clone, Debug)]
pub enum TailEvent {
    /// A batch of records was appended to the buffer
    Appended(usize),
    /// The file was truncated or replaced and following resumed from the
    /// start of the new content
    Rotated,
    /// The file became permanently inaccessible; the tailer stopped and
    /// the viewer continues frozen over buffered history
    Ended(String),
}

/// Result of a single poll step
#[derive(Clone, Copy, Debug, Default)]
pub struct PollOutcome {
    /// Complete lines appended to the buffer during this step
    pub appended: usize,
    /// Whether rotation was detected and recovered during this step
    pub rotated: bool,
}

#[cfg(unix)]
fn file_identity(metadata: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn file_identity(_metadata: &fs::Metadata) -> Option<(u64, u64)> {
    // No stable identity available; the size-shrink heuristic still
    // catches truncation and in-place replacement.
    None
}

/// Follows a growing log file, feeding complete lines through the parser
/// into the buffer.
///
/// The state machine is Opening (constructor), Following (`poll`),
/// Rotated (identity change or size shrink; one reopen from the start of
/// the new file) and Error (`TailError::Lost`, terminal). Partial
/// trailing data is carried between polls until its newline arrives.
pub struct LogTailer {
    path: PathBuf,
    file: File,
    pos: u64,
    identity: Option<(u64, u64)>,
    carry: Vec<u8>,
    parser: LineParser,
}

impl LogTailer {
    /// Open the target file. With `seed_existing` the buffer is seeded
    /// with the tail of the current content (bounded by the buffer's own
    /// capacity); otherwise following starts at the current end so only
    /// new content streams.
    ///
    /// A missing or unreadable file here is fatal to the caller; there is
    /// no retry at startup.
    pub fn open(path: &Path, seed_existing: bool, buffer: &LogBuffer) -> Result<Self, TailError> {
        let file = File::open(path).map_err(|source| TailError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let metadata = file.metadata().map_err(|source| TailError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut tailer = Self {
            path: path.to_path_buf(),
            identity: Some(file_identity(&metadata).unwrap_or((0, metadata.len()))),
            file,
            pos: 0,
            carry: Vec::new(),
            parser: LineParser::new(),
        };

        if seed_existing {
            let seeded = tailer.read_new_lines(buffer).map_err(TailError::Lost)?;
            debug!(seeded, path = %tailer.path.display(), "seeded from existing content");
        } else {
            tailer.pos = tailer
                .file
                .seek(SeekFrom::End(0))
                .map_err(TailError::Lost)?;
        }

        Ok(tailer)
    }

    /// One Following step: detect rotation, then drain new complete
    /// lines into the buffer. Synchronous and deterministic so the state
    /// machine is testable without the polling loop around it.
    pub fn poll(&mut self, buffer: &LogBuffer) -> Result<PollOutcome, TailError> {
        let mut outcome = PollOutcome::default();

        match fs::metadata(&self.path) {
            Ok(metadata) => {
                let identity = file_identity(&metadata).or(self.identity);
                if identity != self.identity || metadata.len() < self.pos {
                    // Truncated or replaced; a single reopen attempt, no
                    // indefinite retries.
                    warn!(path = %self.path.display(), "log rotation detected, reopening");
                    self.reopen()?;
                    outcome.rotated = true;
                }
            }
            Err(err) => {
                // The file vanished. One reconnection attempt in case the
                // writer is mid-replace; otherwise the source is gone.
                debug!(path = %self.path.display(), %err, "log file not statable");
                self.reopen()?;
                outcome.rotated = true;
            }
        }

        outcome.appended = self.read_new_lines(buffer).map_err(TailError::Lost)?;
        Ok(outcome)
    }

    fn reopen(&mut self) -> Result<(), TailError> {
        let file = File::open(&self.path).map_err(TailError::Lost)?;
        let metadata = file.metadata().map_err(TailError::Lost)?;
        if !self.carry.is_empty() {
            debug!(
                bytes = self.carry.len(),
                "discarding incomplete line lost to rotation"
            );
        }
        self.identity = Some(file_identity(&metadata).unwrap_or((0, metadata.len())));
        self.file = file;
        self.pos = 0;
        self.carry.clear();
        Ok(())
    }

    /// Read from the remembered offset to EOF, appending every complete
    /// line. A trailing partial line stays in the carry buffer.
    fn read_new_lines(&mut self, buffer: &LogBuffer) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(self.pos))?;
        let mut chunk = Vec::new();
        let read = self.file.read_to_end(&mut chunk)?;
        if read == 0 {
            return Ok(0);
        }
        self.pos += read as u64;
        self.carry.extend_from_slice(&chunk);

        let mut appended = 0;
        let mut consumed = 0;
        while let Some(offset) = self.carry[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            let line = String::from_utf8_lossy(&self.carry[consumed..end]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            buffer.append(self.parser.parse(line));
            appended += 1;
            consumed = end + 1;
        }
        self.carry.drain(..consumed);
        Ok(appended)
    }
}

/// Handle to the background polling task (teardown via cancellation)
pub struct TailHandle {
    cancel: CancellationToken,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TailHandle {
    /// Drive a tailer at a bounded poll interval until cancelled or the
    /// source is lost. Growth polling has no retry ceiling; it simply
    /// continues at the configured cadence.
    pub fn spawn(
        mut tailer: LogTailer,
        buffer: LogBuffer,
        poll_interval: Duration,
        events: mpsc::UnboundedSender<TailEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,

                        _ = tokio::time::sleep(poll_interval) => {
                            match tailer.poll(&buffer) {
                                Ok(outcome) => {
                                    if outcome.rotated
                                        && events.send(TailEvent::Rotated).is_err()
                                    {
                                        break;
                                    }
                                    if outcome.appended > 0
                                        && events.send(TailEvent::Appended(outcome.appended)).is_err()
                                    {
                                        break;
                                    }
                                }
                                Err(err) => {
                                    warn!(%err, "tailer stopped");
                                    let _ = events.send(TailEvent::Ended(err.to_string()));
                                    break;
                                }
                            }
                        }
                    }
                }
                // File handle drops here, before the process exits.
            })
        };

        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Stop the polling loop and wait for it to exit, so the file handle
    /// is closed before the caller proceeds to process exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TailHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
