//! Runs a set of [`FileHashTask`]s concurrently and folds their read
//! positions into one progress value.

use crate::config::HasherConfig;
use crate::file_ops::FileHashTask;
use crate::models::{Algorithm, HashRecord};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::Path;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }

    /// Fraction done in `0.0..=1.0`; an empty total counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchCoordinator {
    config: HasherConfig,
    tasks: Vec<FileHashTask>,
    total_bytes: u64,
    pending: FuturesUnordered<JoinHandle<HashRecord>>,
}

impl BatchCoordinator {
    pub fn new(config: HasherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Queue one task per path and start them all. Returns how many were added.
    ///
    /// Every task joins the active set and the grand total before the first
    /// one starts. Must be called from within a tokio runtime.
    pub fn submit<I, P>(&mut self, paths: I, algorithm: Algorithm) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let first = self.tasks.len();
        for path in paths {
            let task = FileHashTask::open(algorithm, path, self.config.buffer_size);
            self.total_bytes += task.total_bytes();
            self.tasks.push(task);
        }
        let added = self.tasks.len() - first;
        if added == 0 {
            return 0;
        }

        for task in &self.tasks[first..] {
            if let Some(handle) = task.start() {
                self.pending.push(handle);
            }
        }
        info!(added, total_bytes = self.total_bytes, %algorithm, "batch submitted");
        added
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.tasks.iter().map(FileHashTask::current_position).sum(),
            total: self.total_bytes,
        }
    }

    pub fn stop_all(&self) {
        for task in &self.tasks {
            task.stop();
        }
        debug!(tasks = self.tasks.len(), "stop requested for batch");
    }

    /// All bytes accounted for and every task settled.
    pub fn is_drained(&self) -> bool {
        self.progress().is_complete() && self.tasks.iter().all(|t| t.status().is_terminal())
    }

    pub fn tasks(&self) -> &[FileHashTask] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Snapshot every task in submission order and reset for the next batch.
    /// Tasks still running are stopped first and come back as `FileError`.
    pub fn drain(&mut self) -> Vec<HashRecord> {
        self.stop_all();
        let records: Vec<HashRecord> = self.tasks.iter().map(FileHashTask::record).collect();
        info!(tasks = records.len(), total_bytes = self.total_bytes, "batch drained");
        self.tasks.clear();
        self.total_bytes = 0;
        self.pending.clear();
        records
    }

    /// Next task to finish, in completion order. `None` once nothing is pending.
    pub async fn next_completed(&mut self) -> Option<HashRecord> {
        while let Some(joined) = self.pending.next().await {
            match joined {
                Ok(record) => return Some(record),
                Err(e) => warn!(error = %e, "hashing worker did not complete"),
            }
        }
        None
    }

    /// Poll progress every `poll_interval`, reporting each sample to `on_tick`,
    /// until the batch drains. Returns the drained records.
    pub async fn watch<F>(&mut self, mut on_tick: F) -> Vec<HashRecord>
    where
        F: FnMut(Progress),
    {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            on_tick(self.progress());
            if self.is_drained() {
                break;
            }
        }
        self.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_progress_is_complete() {
        let p = Progress::default();
        assert!(p.is_complete());
        assert_eq!(p.fraction(), 1.0);
    }

    #[test]
    fn fraction_of_partial_progress() {
        let p = Progress {
            current: 25,
            total: 100,
        };
        assert!(!p.is_complete());
        assert_eq!(p.fraction(), 0.25);
    }

    #[tokio::test]
    async fn empty_submission_is_noop() {
        let mut batch = BatchCoordinator::new(HasherConfig::default());
        let none: Vec<&str> = Vec::new();
        assert_eq!(batch.submit(none, Algorithm::Md5), 0);
        batch.stop_all();
        batch.stop_all();
        assert!(batch.is_empty());
        assert!(batch.is_drained());
        assert_eq!(batch.progress(), Progress::default());
        assert!(batch.next_completed().await.is_none());
    }
}
