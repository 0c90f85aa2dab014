//! Directory-backed step store.

use crate::{Event, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const STEP_PREFIX: &str = "Step";
const STEP_SUFFIX: &str = ".json";

/// Writes each appended event to its own `Step<N>.json` file.
///
/// A disabled store accepts events and drops them.
#[derive(Debug)]
pub struct StepStore {
    dir: Option<PathBuf>,
    next_step: AtomicU64,
}

impl StepStore {
    /// Open (creating if needed) a step directory and clear step files left
    /// over from an earlier run.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let removed = clear_steps(&dir)?;
        debug!(dir = %dir.display(), removed, "step log opened");

        Ok(Self {
            dir: Some(dir),
            next_step: AtomicU64::new(1),
        })
    }

    /// A store that records nothing.
    pub fn disabled() -> Self {
        Self {
            dir: None,
            next_step: AtomicU64::new(1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Directory steps are written to, if enabled.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Append an event, returning the path written (if enabled).
    pub fn append(&self, event: &Event) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };

        let step = self.next_step.fetch_add(1, Ordering::SeqCst);
        let path = dir.join(format!("{STEP_PREFIX}{step}{STEP_SUFFIX}"));
        let json = serde_json::to_string_pretty(event)?;
        std::fs::write(&path, json)?;

        Ok(Some(path))
    }
}

fn is_step_file(name: &str) -> bool {
    name.strip_prefix(STEP_PREFIX)
        .and_then(|rest| rest.strip_suffix(STEP_SUFFIX))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn clear_steps(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if is_step_file(&name.to_string_lossy()) && entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventKind, SessionId};

    #[test]
    fn writes_numbered_steps() {
        let dir = tempfile::tempdir().unwrap();
        let store = StepStore::open(dir.path()).unwrap();
        let session = SessionId::new();

        let first = store
            .append(&Event::new(
                session,
                EventKind::SessionStart {
                    server: "weather".into(),
                    tools: vec!["get_weather".into()],
                },
            ))
            .unwrap()
            .unwrap();
        let second = store
            .append(&Event::new(session, EventKind::SessionEnd))
            .unwrap()
            .unwrap();

        assert_eq!(first.file_name().unwrap(), "Step1.json");
        assert_eq!(second.file_name().unwrap(), "Step2.json");

        let written: Event =
            serde_json::from_str(&std::fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(written.kind, EventKind::SessionEnd);
        assert_eq!(written.session_id, session);
    }

    #[test]
    fn open_clears_previous_steps_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Step1.json"), "{}").unwrap();
        std::fs::write(dir.path().join("Step12.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let store = StepStore::open(dir.path()).unwrap();

        assert!(!dir.path().join("Step1.json").exists());
        assert!(!dir.path().join("Step12.json").exists());
        assert!(dir.path().join("notes.json").exists());
        assert_eq!(store.dir(), Some(dir.path()));
    }

    #[test]
    fn disabled_store_writes_nothing() {
        let store = StepStore::disabled();
        let written = store
            .append(&Event::new(SessionId::new(), EventKind::SessionEnd))
            .unwrap();
        assert!(written.is_none());
        assert!(!store.is_enabled());
        assert!(store.dir().is_none());
    }

    #[test]
    fn step_file_names() {
        assert!(is_step_file("Step3.json"));
        assert!(!is_step_file("Step.json"));
        assert!(!is_step_file("Stepx.json"));
        assert!(!is_step_file("step3.json"));
    }
}
