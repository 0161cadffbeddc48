//! SafetyGuard: snapshot, reconcile, validate, roll back
//!
//! After [`SafetyGuard::apply`] returns, the target is either the newly
//! reconciled document that the validator accepted (or was not asked to
//! check), or byte-identical to the snapshot taken at the start. The one
//! known gap is a crash between writing the new document and restoring the
//! snapshot; the dated backup on disk covers that case manually.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use harden_fs::{RetryPolicy, io};
use serde::Serialize;

use crate::backup::BackupManager;
use crate::clock::{Clock, SystemClock};
use crate::directive::{self, Directive};
use crate::document::ConfigDocument;
use crate::reconcile::{ConfigReconciler, DirectiveChange, Plan};
use crate::validate::{ValidationOutcome, Validator};
use crate::{Error, Result};

/// Outcome of one guarded reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    pub path: PathBuf,
    pub backup: PathBuf,
    /// One entry per directive, in the order they were applied
    pub changes: Vec<DirectiveChange>,
    pub validation: ValidationOutcome,
    pub rolled_back: bool,
}

impl ApplyResult {
    /// Directives that altered the file (before any rollback).
    pub fn changed(&self) -> usize {
        self.changes.iter().filter(|c| c.is_change()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.changes.len() - self.changed()
    }

    /// The new document is in place.
    pub fn is_success(&self) -> bool {
        !self.rolled_back
    }
}

/// Wraps reconciliation of a live file with backup, validation and rollback.
pub struct SafetyGuard {
    reconciler: ConfigReconciler,
    backups: BackupManager,
    retry: RetryPolicy,
}

impl Default for SafetyGuard {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl SafetyGuard {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            reconciler: ConfigReconciler::new(),
            backups: BackupManager::new(clock),
            retry: RetryPolicy::default(),
        }
    }

    /// Retry policy for backup, write and restore operations.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.backups = self.backups.with_retry(retry);
        self.retry = retry;
        self
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Reconcile `path` toward `directives`, keeping the result only if
    /// `validator` accepts it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDirective`] / [`Error::DuplicateDirective`] before
    ///   anything is read.
    /// - [`Error::Read`] if the target cannot be read; nothing is written.
    /// - [`Error::Write`] if the backup or the new document cannot be
    ///   written. A failed backup means the target was never touched.
    /// - [`Error::RollbackFailed`] if the original could not be put back.
    ///
    /// A validator rejection is not an error: the file is restored and the
    /// returned result has `rolled_back` set.
    pub fn apply(
        &self,
        path: &Path,
        directives: &[Directive],
        validator: &dyn Validator,
    ) -> Result<ApplyResult> {
        directive::validate_set(directives)?;

        let original = read_target(path)?;
        let bytes = original.as_bytes().to_vec();

        // Writes go to the file a symlinked target points at; the link stays
        let snapshot = self.backups.take(path, bytes)?;
        let target = snapshot.target();

        let reconciliation = self
            .reconciler
            .reconcile(&ConfigDocument::parse(&original), directives);
        let rendered = reconciliation.document.render();

        if rendered == original {
            tracing::debug!(path = %path.display(), "document already converged, not rewriting");
        } else if let Err(source) = self
            .retry
            .run("write document", || io::write_text(target, &rendered))
        {
            // A failed rename leaves the original in place, but a partial
            // failure elsewhere might not; put the snapshot back regardless.
            return match self.backups.restore(&snapshot) {
                Ok(()) => Err(Error::Write {
                    path: path.to_path_buf(),
                    source,
                }),
                Err(restore_err) => {
                    tracing::error!(
                        path = %path.display(),
                        error = %restore_err,
                        "restore after failed write failed"
                    );
                    Err(Error::RollbackFailed {
                        path: path.to_path_buf(),
                        backup: snapshot.backup().to_path_buf(),
                        diagnostics: format!("write failed: {source}"),
                        source: restore_err,
                    })
                }
            };
        }

        let validation = validator.validate(target);

        let rolled_back = if let ValidationOutcome::Failed { diagnostics } = &validation {
            tracing::warn!(
                path = %path.display(),
                validator = %validator.describe(),
                diagnostics = %diagnostics,
                "validation failed, rolling back"
            );
            if let Err(source) = self.backups.restore(&snapshot) {
                tracing::error!(
                    path = %path.display(),
                    backup = %snapshot.backup().display(),
                    error = %source,
                    "rollback failed"
                );
                return Err(Error::RollbackFailed {
                    path: path.to_path_buf(),
                    backup: snapshot.backup().to_path_buf(),
                    diagnostics: diagnostics.clone(),
                    source,
                });
            }
            true
        } else {
            false
        };

        tracing::info!(
            path = %path.display(),
            changed = reconciliation.changed(),
            unchanged = reconciliation.unchanged(),
            rolled_back,
            "apply finished"
        );

        Ok(ApplyResult {
            path: path.to_path_buf(),
            backup: snapshot.backup().to_path_buf(),
            changes: reconciliation.changes,
            validation,
            rolled_back,
        })
    }

    /// Show what [`apply`](Self::apply) would change without touching
    /// anything, including the backup.
    pub fn plan(&self, path: &Path, directives: &[Directive]) -> Result<Plan> {
        directive::validate_set(directives)?;
        let original = read_target(path)?;
        Ok(self
            .reconciler
            .plan(&original, directives, &path.to_string_lossy()))
    }
}

fn read_target(path: &Path) -> Result<String> {
    io::read_text(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
