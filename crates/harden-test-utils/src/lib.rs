//! Shared test fixtures for the harden workspace.
//!
//! Dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`fixtures`]: realistic `sshd_config` / `ssh_config` bodies
//! - [`target`]: [`target::TestTarget`], a temporary directory holding config files

pub mod fixtures;
pub mod target;

pub use target::TestTarget;
