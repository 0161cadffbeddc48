//! Filesystem primitives for harden
//!
//! Provides the small set of I/O operations the reconciliation pipeline is
//! built on: byte reads, permission-preserving atomic writes, dated backup
//! naming, checksums, format-agnostic config loading and a retry policy.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod retry;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::{backup_path, lane_key, rebase, resolve_link};
pub use retry::RetryPolicy;
