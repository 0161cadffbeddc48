//! Snapshots of target files taken before they are modified
//!
//! A snapshot is written next to its target as
//! `<target>.backup.<YYYY-MM-DD>`. One generation is kept per day: a second
//! run on the same day overwrites that day's backup. Backups are never
//! deleted by this crate.

mod snapshot;

pub use snapshot::{BackupEntry, BackupManager, Snapshot};
