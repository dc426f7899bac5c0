//! Filesystem watch layer: the OS-level event source abstraction.

pub mod source;

pub use source::{ChangeKind, ChangeRecord, FsEventSource};
