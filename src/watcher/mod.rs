//! Live reload of a diagram source file.
//!
//! The watch sits on the parent directory: saving by rename swaps the file
//! out from under a watch placed on the file itself. Once events touching
//! the file have been quiet for the settle interval, the file is reread and
//! its text handed back, unless the save left the content as it was.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::perf;

/// Outcome of one [`SourceWatcher::poll`].
#[derive(Debug)]
pub enum Reload {
    /// No settled change.
    Idle,
    /// The file settled with new content.
    Changed(String),
    /// The file settled but could not be read, as happens mid-save.
    Failed(std::io::Error),
}

pub struct SourceWatcher {
    _backend: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    path: PathBuf,
    dir: PathBuf,
    settle: Duration,
    dirty_since: Option<Instant>,
    digest: u64,
}

impl SourceWatcher {
    /// Start watching `path`. Its current content counts as already seen.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be created or the directory
    /// cannot be watched.
    pub fn new(path: impl AsRef<Path>, settle: Duration) -> notify::Result<Self> {
        let requested = path.as_ref();
        // Backends report canonical paths.
        let path = requested
            .canonicalize()
            .unwrap_or_else(|_| requested.to_path_buf());
        let dir = watch_dir(&path);
        let digest = fs::read_to_string(&path).map_or(0, |text| digest(&text));

        let (tx, rx) = mpsc::channel();
        let mut backend = notify::recommended_watcher(move |result| {
            let _ = tx.send(result);
        })?;
        backend.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path.display(), "watching diagram source");

        Ok(Self {
            _backend: backend,
            rx,
            path,
            dir,
            settle,
            dirty_since: None,
            digest,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain backend events and reread the file once they have settled.
    pub fn poll(&mut self) -> Reload {
        if self.drain() {
            self.dirty_since = Some(Instant::now());
        }
        match self.dirty_since {
            Some(since) if since.elapsed() >= self.settle => self.dirty_since = None,
            _ => return Reload::Idle,
        }

        match fs::read_to_string(&self.path) {
            Ok(text) if self.accept(&text) => Reload::Changed(text),
            Ok(_) => {
                perf::log_event("watcher.unchanged", self.path.display().to_string());
                Reload::Idle
            }
            Err(err) => Reload::Failed(err),
        }
    }

    /// True if any pending event touched the watched file.
    fn drain(&self) -> bool {
        let mut seen = 0usize;
        let mut touched = false;
        for result in self.rx.try_iter() {
            seen += 1;
            match result {
                Ok(event) => touched |= event.paths.iter().any(|p| self.touches_target(p)),
                Err(err) => {
                    tracing::warn!(error = %err, "file watch error");
                    perf::log_event("watcher.error", err.to_string());
                }
            }
        }
        if seen > 0 {
            perf::log_event("watcher.events", format!("seen={seen} touched={touched}"));
        }
        touched
    }

    fn touches_target(&self, path: &Path) -> bool {
        path == self.dir
            || path == self.path
            || self
                .path
                .file_name()
                .is_some_and(|name| path.file_name() == Some(name))
    }

    /// Remember `text` as the latest content; false if nothing changed.
    fn accept(&mut self, text: &str) -> bool {
        let digest = digest(text);
        if digest == self.digest {
            return false;
        }
        self.digest = digest;
        true
    }
}

fn digest(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

fn watch_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn watched(content: &str, settle: Duration) -> (TempDir, PathBuf, SourceWatcher) {
        let dir = tempdir().unwrap();
        let path = dir.path().canonicalize().unwrap().join("flow.mmd");
        fs::write(&path, content).unwrap();
        let watcher = SourceWatcher::new(&path, settle).unwrap();
        (dir, path, watcher)
    }

    #[test]
    fn test_bare_file_is_watched_from_current_dir() {
        assert_eq!(watch_dir(Path::new("flow.mmd")), PathBuf::from("."));
    }

    #[test]
    fn test_directory_event_touches_target() {
        let (_dir, path, watcher) = watched("graph TD", Duration::from_millis(10));
        assert!(watcher.touches_target(path.parent().unwrap()));
        assert!(watcher.touches_target(&path));
    }

    #[test]
    fn test_sibling_file_is_ignored() {
        let (_dir, path, watcher) = watched("graph TD", Duration::from_millis(10));
        assert!(!watcher.touches_target(&path.with_file_name("other.mmd")));
    }

    #[test]
    fn test_unchanged_content_is_not_reported_again() {
        let (_dir, _path, mut watcher) = watched("graph TD", Duration::from_millis(10));
        assert!(!watcher.accept("graph TD"));
        assert!(watcher.accept("graph LR"));
        assert!(!watcher.accept("graph LR"));
    }

    #[test]
    fn test_quiet_watcher_is_idle() {
        let (_dir, _path, mut watcher) = watched("graph TD", Duration::from_millis(10));
        assert!(matches!(watcher.poll(), Reload::Idle));
    }

    #[test]
    fn test_modification_is_reloaded_after_settling() {
        let (_dir, path, mut watcher) = watched("graph TD", Duration::from_millis(50));

        std::thread::sleep(Duration::from_millis(500));
        fs::write(&path, "graph LR").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reloaded = None;
        while Instant::now() < deadline {
            if let Reload::Changed(text) = watcher.poll() {
                reloaded = Some(text);
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(reloaded.as_deref(), Some("graph LR"));
    }
}
