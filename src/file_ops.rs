use crate::error::HashError;
use crate::hashers;
use crate::models::{Algorithm, HashRecord, HashStatus};
use chrono::Utc;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{self, JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;

/// Hashes one file on a blocking worker while exposing how far it has read.
///
/// Open failures do not surface as errors: the task is created already in
/// [`HashStatus::FileError`] with a total size of zero.
#[derive(Debug)]
pub struct FileHashTask {
    inner: Arc<TaskInner>,
    // Present between a successful open and `start`/`stop`.
    stream: Mutex<Option<File>>,
}

#[derive(Debug)]
struct TaskInner {
    id: String,
    algorithm: Algorithm,
    file_path: PathBuf,
    file_name: String,
    total_bytes: u64,
    buffer_size: usize,
    position: AtomicU64,
    open: AtomicBool,
    state: Mutex<TaskState>,
}

#[derive(Debug)]
struct TaskState {
    status: HashStatus,
    digest: Option<String>,
    error: Option<HashError>,
}

impl FileHashTask {
    pub fn open(algorithm: Algorithm, path: impl AsRef<Path>, buffer_size: usize) -> Self {
        let (file_path, file_name) = resolve_path(path.as_ref());
        let (stream, total_bytes, error) = match open_regular_file(&file_path) {
            Ok((file, len)) => (Some(file), len, None),
            Err(e) => {
                warn!(path = %file_path.display(), error = %e, "cannot hash file");
                (None, 0, Some(e))
            }
        };
        let status = if error.is_some() {
            HashStatus::FileError
        } else {
            HashStatus::Incomplete
        };

        let inner = TaskInner {
            id: Uuid::new_v4().to_string(),
            algorithm,
            file_path,
            file_name,
            total_bytes,
            buffer_size,
            position: AtomicU64::new(0),
            open: AtomicBool::new(stream.is_some()),
            state: Mutex::new(TaskState {
                status,
                digest: None,
                error,
            }),
        };
        debug!(id = %inner.id, path = %inner.file_path.display(), total_bytes, %algorithm, "task created");

        FileHashTask {
            inner: Arc::new(inner),
            stream: Mutex::new(stream),
        }
    }

    /// Start hashing on a blocking worker. Returns `None` when there is no
    /// open stream left to hash (open failure, already started or stopped).
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Option<JoinHandle<HashRecord>> {
        let file = lock(&self.stream).take()?;
        let inner = Arc::clone(&self.inner);
        debug!(id = %inner.id, "hashing started");
        Some(task::spawn_blocking(move || {
            inner.run(file);
            inner.record()
        }))
    }

    /// Request cancellation. Only acts while the task is still `Incomplete`;
    /// the task ends as a `FileError` like any other read failure, and a
    /// running worker fails on its next read of the closed stream.
    pub fn stop(&self) {
        if self.status() != HashStatus::Incomplete {
            return;
        }
        // never started: release the file here, nothing else holds it
        let started = lock(&self.stream).take().is_none();
        self.inner.finish(Err(HashError::Closed {
            path: self.inner.file_path.clone(),
        }));
        debug!(id = %self.inner.id, started, "stop requested");
    }

    /// Bytes consumed so far, or the total size once the stream is closed.
    pub fn current_position(&self) -> u64 {
        self.inner.current_position()
    }

    pub fn status(&self) -> HashStatus {
        lock(&self.inner.state).status
    }

    pub fn digest(&self) -> Option<String> {
        lock(&self.inner.state).digest.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        lock(&self.inner.state).error.as_ref().map(ToString::to_string)
    }

    pub fn record(&self) -> HashRecord {
        self.inner.record()
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn algorithm(&self) -> Algorithm {
        self.inner.algorithm
    }

    pub fn file_path(&self) -> &Path {
        &self.inner.file_path
    }

    pub fn file_name(&self) -> &str {
        &self.inner.file_name
    }

    pub fn total_bytes(&self) -> u64 {
        self.inner.total_bytes
    }
}

impl TaskInner {
    fn run(self: &Arc<Self>, file: File) {
        let reader = TrackedReader {
            file,
            task: Arc::clone(self),
        };
        let outcome = hashers::compute_hash_for_reader(reader, self.algorithm, self.buffer_size)
            .map_err(|source| {
                if self.open.load(Ordering::Acquire) {
                    HashError::Read {
                        path: self.file_path.clone(),
                        source,
                    }
                } else {
                    HashError::Closed {
                        path: self.file_path.clone(),
                    }
                }
            });
        // `reader`, and with it the file, was consumed above
        self.finish(outcome);
    }

    /// Record the terminal outcome, then close the stream.
    fn finish(&self, outcome: Result<String, HashError>) {
        {
            let mut state = lock(&self.state);
            if state.status.is_terminal() {
                return;
            }
            match outcome {
                Ok(digest) => {
                    debug!(id = %self.id, %digest, "hashing finished");
                    state.status = HashStatus::Success;
                    state.digest = Some(digest);
                }
                Err(e) => {
                    match &e {
                        HashError::Closed { .. } => debug!(id = %self.id, "hashing cancelled"),
                        _ => warn!(id = %self.id, error = %e, "hashing failed"),
                    }
                    state.status = HashStatus::FileError;
                    state.error = Some(e);
                }
            }
        }
        self.close();
    }

    /// Mark the stream closed. True only for the call that performed the close.
    fn close(&self) -> bool {
        self.open
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn current_position(&self) -> u64 {
        if self.open.load(Ordering::Acquire) {
            self.position.load(Ordering::Acquire).min(self.total_bytes)
        } else {
            self.total_bytes
        }
    }

    fn record(&self) -> HashRecord {
        let state = lock(&self.state);
        HashRecord {
            id: self.id.clone(),
            file_name: self.file_name.clone(),
            file_path: self.file_path.clone(),
            algorithm: self.algorithm,
            status: state.status,
            digest: state.digest.clone(),
            error: state.error.as_ref().map(ToString::to_string),
            total_bytes: self.total_bytes,
            timestamp: Utc::now(),
        }
    }
}

/// Counts consumed bytes and refuses to read once the task's stream is closed.
struct TrackedReader {
    file: File,
    task: Arc<TaskInner>,
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.task.open.load(Ordering::Acquire) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "input stream closed",
            ));
        }
        let n = self.file.read(buf)?;
        self.task.position.fetch_add(n as u64, Ordering::AcqRel);
        Ok(n)
    }
}

/// Absolute path and display name. Falls back to the path as given.
fn resolve_path(path: &Path) -> (PathBuf, String) {
    let file_path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (file_path, file_name)
}

fn open_regular_file(path: &Path) -> Result<(File, u64), HashError> {
    let open_err = |source| HashError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_err)?;
    let meta = file.metadata().map_err(open_err)?;
    if !meta.is_file() {
        return Err(HashError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok((file, meta.len()))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
