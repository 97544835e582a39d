//! mhx - Multi-file hex comparison with Emacs keybindings
//!
//! This library provides the comparison engine shared by mhx (TUI viewer) and hxdiff (CLI tool):
//! byte buffers for every loaded file, the 16-byte line layout, the two positional
//! compare modes and the projection of their results onto lines and bytes.

pub mod app;
pub mod buffer;
pub mod config;
pub mod diff;
pub mod highlight;
pub mod layout;
pub mod logging;
pub mod ui;

pub use buffer::{BufferError, Document, FileHandle, FileStore};
pub use diff::{CompareMode, DiffError, DifferenceSet};
pub use highlight::{FileHighlight, Projection};
pub use layout::{LineRecord, Slot, BYTES_PER_LINE};
