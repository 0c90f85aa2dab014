//! Diagnostic step log for chat sessions.
//!
//! When enabled, every orchestration step of a session (connect, model
//! request, model response, tool call, tool result, close) is written as a
//! pretty-printed JSON file named `Step<N>.json` in a directory. Opening the
//! store clears step files from a previous run. The files are purely
//! diagnostic: nothing reads them back.
//!
//! # Example
//!
//! ```no_run
//! use steplog::{Event, EventKind, SessionId, StepStore};
//!
//! let store = StepStore::open("logs")?;
//! let session_id = SessionId::new();
//!
//! store.append(&Event::new(
//!     session_id,
//!     EventKind::SessionStart { server: "weather".into(), tools: vec![] },
//! ))?;
//! store.append(&Event::new(session_id, EventKind::SessionEnd))?;
//! # Ok::<(), steplog::Error>(())
//! ```

mod error;
mod event;
mod store;

pub use error::{Error, Result};
pub use event::{Event, EventKind, SessionId};
pub use store::StepStore;
