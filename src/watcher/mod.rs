//! Selection watcher
//!
//! Polls a `SelectionSource` on its own thread and analyzes every new
//! selection there. Results go through a capacity-1 channel: a newer result
//! replaces one the consumer has not picked up yet. The watcher only reads
//! from the store.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::analyzer::{AnalysisResult, ContextSynthesizer};
use crate::{Error, Result};

/// Where the current selection comes from
pub trait SelectionSource: Send {
    /// Current selection, `None` when there is nothing to read
    fn read(&mut self) -> Result<Option<String>>;

    fn describe(&self) -> String;
}

/// Runs a command and takes its stdout, e.g. `pbpaste` or `wl-paste -p`
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Config("watcher command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl SelectionSource for CommandSource {
    fn read(&mut self) -> Result<Option<String>> {
        let output = Command::new(&self.program).args(&self.args).output()?;
        if !output.status.success() {
            return Err(Error::Io(std::io::Error::other(format!(
                "{} exited with {}",
                self.program, output.status
            ))));
        }
        let text = String::from_utf8_lossy(&output.stdout).to_string();
        Ok((!text.trim().is_empty()).then_some(text))
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Reads the selection from a file; a missing file is an empty selection
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SelectionSource for FileSource {
    fn read(&mut self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok((!text.trim().is_empty()).then_some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    /// Selections shorter than this (after trimming) are ignored
    pub min_length: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            min_length: 3,
        }
    }
}

/// Single-slot mailbox where a new value replaces an undelivered one
struct LatestSlot<T> {
    tx: Sender<T>,
    stale: Receiver<T>,
}

impl<T> LatestSlot<T> {
    fn new() -> (Self, Receiver<T>) {
        let (tx, rx) = channel::bounded(1);
        (
            Self {
                tx,
                stale: rx.clone(),
            },
            rx,
        )
    }

    /// Returns false once the consumer is gone
    fn publish(&self, value: T) -> bool {
        while self.stale.try_recv().is_ok() {}
        match self.tx.try_send(value) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

pub struct SelectionWatcher {
    synthesizer: Arc<ContextSynthesizer>,
    options: WatchOptions,
}

impl SelectionWatcher {
    pub fn new(synthesizer: Arc<ContextSynthesizer>, options: WatchOptions) -> Self {
        Self { synthesizer, options }
    }

    pub fn spawn(self, mut source: Box<dyn SelectionSource>) -> WatcherHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let (slot, rx) = LatestSlot::new();
        let stop_flag = Arc::clone(&stop);

        let join = thread::spawn(move || {
            tracing::info!("Watching selections from {}", source.describe());
            let mut last_hash: Option<blake3::Hash> = None;

            while !stop_flag.load(Ordering::Relaxed) {
                match source.read() {
                    Ok(Some(text)) => {
                        let selected = text.trim();
                        let hash = blake3::hash(selected.as_bytes());
                        if selected.chars().count() >= self.options.min_length && last_hash != Some(hash) {
                            last_hash = Some(hash);
                            match self.synthesizer.analyze(selected) {
                                Ok(result) => {
                                    if !slot.publish(result) {
                                        break;
                                    }
                                }
                                Err(e) => tracing::warn!("Analysis failed: {}", e),
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Failed to read selection: {}", e),
                }
                thread::sleep(self.options.poll_interval);
            }

            tracing::debug!("selection watcher stopped");
        });

        WatcherHandle {
            stop,
            rx,
            join: Some(join),
        }
    }
}

/// Consumer side of a running watcher
pub struct WatcherHandle {
    stop: Arc<AtomicBool>,
    rx: Receiver<AnalysisResult>,
    join: Option<thread::JoinHandle<()>>,
}

impl WatcherHandle {
    /// Most recent undelivered result, if any
    pub fn latest(&self) -> Option<AnalysisResult> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<AnalysisResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::warn!("selection watcher thread panicked");
            }
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Contact;
    use crate::pattern::{PatternKind, RegexClassifier};
    use crate::storage::SqliteStore;

    fn synthesizer() -> Arc<ContextSynthesizer> {
        let store = SqliteStore::open_in_memory().unwrap().into_handle();
        store.insert_contact(&Contact::new("Sarah Mitchell")).unwrap();
        Arc::new(ContextSynthesizer::new(store, Arc::new(RegexClassifier::new().unwrap())))
    }

    fn fast() -> WatchOptions {
        WatchOptions {
            poll_interval: Duration::from_millis(10),
            min_length: 3,
        }
    }

    #[test]
    fn test_latest_slot_keeps_newest() {
        let (slot, rx) = LatestSlot::new();
        assert!(slot.publish(1));
        assert!(slot.publish(2));
        assert!(slot.publish(3));
        assert_eq!(rx.try_recv().ok(), Some(3));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_file_source_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileSource::new(dir.path().join("selection.txt"));
        assert_eq!(source.read().unwrap(), None);
    }

    #[test]
    fn test_command_source_rejects_empty_argv() {
        assert!(CommandSource::new(&[]).is_err());
    }

    #[test]
    fn test_watcher_analyzes_new_selections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.txt");
        std::fs::write(&path, "Sarah Mitchell").unwrap();

        let handle = SelectionWatcher::new(synthesizer(), fast()).spawn(Box::new(FileSource::new(&path)));

        let first = handle.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.selected_text, "Sarah Mitchell");
        assert_eq!(first.exact_matches.len(), 1);

        // unchanged selection is not analyzed again
        assert!(handle.recv_timeout(Duration::from_millis(100)).is_none());

        std::fs::write(&path, "JT-346").unwrap();
        let second = handle.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second.detected_type, Some(PatternKind::TicketId));

        handle.stop();
    }

    #[test]
    fn test_short_selection_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.txt");
        std::fs::write(&path, " a ").unwrap();

        let handle = SelectionWatcher::new(synthesizer(), fast()).spawn(Box::new(FileSource::new(&path)));
        assert!(handle.recv_timeout(Duration::from_millis(150)).is_none());
        handle.stop();
    }
}
