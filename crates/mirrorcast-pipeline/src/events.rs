//! Pipeline events. All transient, scoped to one file's cycle.

use chrono::{DateTime, Utc};
use mirrorcast_protocol::{FileDescriptor, Peer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FileSaved,
    FileReplicated,
}

/// A file finished streaming into local storage.
///
/// The ingestion byte stream is single-pass and is not carried here;
/// replication re-reads the stored content instead.
#[derive(Debug, Clone)]
pub struct FileSavedEvent {
    pub file: FileDescriptor,
    /// Whole seconds the ingestion took (monotonic clock).
    pub duration_secs: u64,
    /// Wall time the write completed.
    pub saved_at: DateTime<Utc>,
}

/// One peer finished receiving the file. Exactly one per successfully
/// uploaded peer per cycle.
#[derive(Debug, Clone)]
pub struct FileReplicatedEvent {
    pub file: FileDescriptor,
    pub peer: Peer,
    /// Whole seconds since the fan-out began -- the same fixed start
    /// point for every peer, so later completions report larger
    /// values.
    pub duration_secs: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum Event {
    Saved(FileSavedEvent),
    Replicated(FileReplicatedEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Saved(_) => EventKind::FileSaved,
            Event::Replicated(_) => EventKind::FileReplicated,
        }
    }

    pub fn file(&self) -> &FileDescriptor {
        match self {
            Event::Saved(ev) => &ev.file,
            Event::Replicated(ev) => &ev.file,
        }
    }
}
