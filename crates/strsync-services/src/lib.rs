//! Reconciliation layer used by the CLI.
//! Loads a translation and its base resource, injects placeholders for missing
//! keys and writes the canonical file back.

pub mod base;
pub mod batch;
pub mod render;
pub mod session;
pub mod util;

pub use base::{base_candidates, resolve_base, BasePaths, BaseSource, ResolvedBase};
pub use batch::{sync_file, sync_tree, BatchOptions, SyncOptions};
pub use render::{render_records, GENERATOR_MARKER};
pub use session::{LocalizableFile, UpdateReport};
pub use strsync_core::{LocalizationItem, Result, StringsError};
