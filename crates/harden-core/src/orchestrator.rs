//! ApplyOrchestrator: run the safety guard over many targets
//!
//! Targets are independent. A rollback or fatal error on one never stops the
//! rest, and every target gets a report. Targets that resolve to the same
//! file share a lane and run one after another in input order; distinct
//! lanes may run on separate worker threads.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use serde::Serialize;

use crate::directive::Directive;
use crate::guard::{ApplyResult, SafetyGuard};
use crate::paths::{ConfigFile, PathResolver};
use crate::reconcile::Plan;
use crate::validate::{NoopValidator, Validator};
use crate::{Error, Result};

/// Which file a target addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetFile {
    /// Resolved through the orchestrator's [`PathResolver`]
    Known(ConfigFile),
    /// Used as given
    Path(PathBuf),
}

impl From<ConfigFile> for TargetFile {
    fn from(file: ConfigFile) -> Self {
        Self::Known(file)
    }
}

impl From<PathBuf> for TargetFile {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for TargetFile {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// One file, the directives it should carry, and how to check it.
#[derive(Clone)]
pub struct Target {
    pub file: TargetFile,
    pub directives: Vec<Directive>,
    pub validator: Arc<dyn Validator>,
}

impl Target {
    pub fn new(
        file: impl Into<TargetFile>,
        directives: Vec<Directive>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            file: file.into(),
            directives,
            validator,
        }
    }

    /// A target whose result is not checked by any validator.
    pub fn unvalidated(file: impl Into<TargetFile>, directives: Vec<Directive>) -> Self {
        Self::new(file, directives, Arc::new(NoopValidator))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("file", &self.file)
            .field("directives", &self.directives)
            .field("validator", &self.validator.describe())
            .finish()
    }
}

/// Final state of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// New document in place (validated, or validation skipped)
    Success,
    /// Validator rejected the change; original restored
    RolledBack,
    /// Could not read, back up or write; nothing verified was changed
    Failed,
    /// Worker stopped before reporting; file state unknown
    Interrupted,
    /// Original could not be restored; needs attention
    RollbackFailed,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::RolledBack => "rolled back",
            Self::Failed => "failed",
            Self::Interrupted => "interrupted",
            Self::RollbackFailed => "ROLLBACK FAILED",
        };
        f.write_str(label)
    }
}

/// Report for one target.
#[derive(Debug)]
pub struct TargetReport {
    pub path: PathBuf,
    pub outcome: Result<ApplyResult>,
}

impl TargetReport {
    pub fn status(&self) -> TargetStatus {
        match &self.outcome {
            Ok(result) if result.rolled_back => TargetStatus::RolledBack,
            Ok(_) => TargetStatus::Success,
            Err(Error::Interrupted { .. }) => TargetStatus::Interrupted,
            Err(Error::RollbackFailed { .. }) => TargetStatus::RollbackFailed,
            Err(_) => TargetStatus::Failed,
        }
    }
}

/// Reports for every target, in input order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    /// Every target ended in [`TargetStatus::Success`].
    pub fn success(&self) -> bool {
        self.targets
            .iter()
            .all(|t| t.status() == TargetStatus::Success)
    }

    /// The most severe status across all targets.
    pub fn worst(&self) -> TargetStatus {
        self.targets
            .iter()
            .map(TargetReport::status)
            .max()
            .unwrap_or(TargetStatus::Success)
    }

    pub fn count(&self, status: TargetStatus) -> usize {
        self.targets.iter().filter(|t| t.status() == status).count()
    }
}

/// Drives [`SafetyGuard`] across targets.
pub struct ApplyOrchestrator {
    guard: SafetyGuard,
    resolver: Box<dyn PathResolver>,
    max_workers: usize,
}

impl ApplyOrchestrator {
    pub fn new(guard: SafetyGuard, resolver: Box<dyn PathResolver>) -> Self {
        Self {
            guard,
            resolver,
            max_workers: 1,
        }
    }

    /// Allow up to `workers` distinct files to be processed concurrently.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    pub fn resolver(&self) -> &dyn PathResolver {
        self.resolver.as_ref()
    }

    pub fn guard(&self) -> &SafetyGuard {
        &self.guard
    }

    /// Concrete path for a target file.
    pub fn resolve(&self, file: &TargetFile) -> PathBuf {
        match file {
            TargetFile::Known(known) => self.resolver.config_path(*known),
            TargetFile::Path(path) => path.clone(),
        }
    }

    /// Apply every target and collect the results.
    pub fn run(&self, targets: &[Target]) -> RunReport {
        let paths: Vec<PathBuf> = targets.iter().map(|t| self.resolve(&t.file)).collect();
        let lanes = lanes(&paths);

        tracing::info!(
            targets = targets.len(),
            lanes = lanes.len(),
            workers = self.max_workers.min(lanes.len().max(1)),
            "starting run"
        );

        let mut slots: Vec<Option<TargetReport>> = targets.iter().map(|_| None).collect();

        if self.max_workers <= 1 || lanes.len() <= 1 {
            for (index, (target, path)) in targets.iter().zip(&paths).enumerate() {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(self.apply_one(target, path));
                }
            }
        } else {
            let workers = self.max_workers.min(lanes.len());
            let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); workers];
            for (n, lane) in lanes.iter().enumerate() {
                buckets[n % workers].extend(lane);
            }

            let finished: Vec<(usize, TargetReport)> = thread::scope(|scope| {
                let handles: Vec<_> = buckets
                    .iter()
                    .map(|bucket| {
                        let paths = &paths;
                        scope.spawn(move || {
                            bucket
                                .iter()
                                .filter_map(|&i| {
                                    let target = targets.get(i)?;
                                    let path = paths.get(i)?;
                                    Some((i, self.apply_one(target, path)))
                                })
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .flat_map(|h| match h.join() {
                        Ok(reports) => reports,
                        Err(_) => {
                            tracing::error!("worker panicked");
                            Vec::new()
                        }
                    })
                    .collect()
            });

            for (index, report) in finished {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(report);
                }
            }
        }

        let targets = slots
            .into_iter()
            .zip(paths)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| TargetReport {
                    outcome: Err(Error::Interrupted { path: path.clone() }),
                    path,
                })
            })
            .collect();

        RunReport { targets }
    }

    /// Dry-run every target.
    pub fn plan(&self, targets: &[Target]) -> Vec<(PathBuf, Result<Plan>)> {
        targets
            .iter()
            .map(|target| {
                let path = self.resolve(&target.file);
                let plan = self.guard.plan(&path, &target.directives);
                (path, plan)
            })
            .collect()
    }

    fn apply_one(&self, target: &Target, path: &Path) -> TargetReport {
        let span = tracing::info_span!("target", path = %path.display());
        let _entered = span.enter();

        let outcome = self
            .guard
            .apply(path, &target.directives, target.validator.as_ref());
        if let Err(e) = &outcome {
            if e.is_urgent() {
                tracing::error!(error = %e, "target needs manual recovery");
            } else {
                tracing::warn!(error = %e, "target failed");
            }
        }

        TargetReport {
            path: path.to_path_buf(),
            outcome,
        }
    }
}

/// Group target indices by the file they touch, keeping first-seen order
/// both across and within lanes.
fn lanes(paths: &[PathBuf]) -> Vec<Vec<usize>> {
    let mut by_key: HashMap<PathBuf, usize> = HashMap::new();
    let mut lanes: Vec<Vec<usize>> = Vec::new();

    for (index, path) in paths.iter().enumerate() {
        let key = harden_fs::lane_key(path);
        match by_key.get(&key) {
            Some(&lane) => {
                if let Some(lane) = lanes.get_mut(lane) {
                    lane.push(index);
                }
            }
            None => {
                by_key.insert(key, lanes.len());
                lanes.push(vec![index]);
            }
        }
    }

    lanes
}
