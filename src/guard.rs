//! Storage guard: make sure the store has room before a run starts.

use crate::config::PipelineConfig;
use crate::error::StorageError;
use crate::store::{EntryKind, Quota, Store};
use log::{debug, info, warn};

/// Outcome of one space-reclamation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files that were deleted.
    pub deleted: Vec<String>,
    /// Entries left alone because of their name or path length.
    pub skipped: Vec<String>,
    /// Files whose deletion failed.
    pub failed: Vec<String>,
}

/// Space-reclamation policy applied by [`StorageGuard`].
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub min_free_ratio: f64,
    pub keep_files: Vec<String>,
    pub max_name_len: usize,
    pub max_path_len: usize,
}

impl From<&PipelineConfig> for GuardPolicy {
    /// The source recording is always on the keep list.
    fn from(config: &PipelineConfig) -> Self {
        let mut keep_files = config.keep_files.clone();
        if !keep_files.contains(&config.input_name) {
            keep_files.push(config.input_name.clone());
        }
        Self {
            min_free_ratio: config.min_free_ratio,
            keep_files,
            max_name_len: config.max_name_len,
            max_path_len: config.max_path_len,
        }
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Verifies free space on a [`Store`], escalating from cleanup to format.
pub struct StorageGuard<'a, S: Store> {
    store: &'a mut S,
    policy: GuardPolicy,
}

impl<'a, S: Store> StorageGuard<'a, S> {
    pub fn new(store: &'a mut S, policy: GuardPolicy) -> Self {
        Self { store, policy }
    }

    fn query(&self) -> Result<Quota, StorageError> {
        let quota = self.store.quota().map_err(StorageError::InfoUnavailable)?;
        info!(
            "Store: total {} bytes, used {} bytes, free {:.1}%",
            quota.total,
            quota.used,
            quota.free_ratio() * 100.0
        );
        Ok(quota)
    }

    /// Ensure at least `min_free_ratio` of the store is free.
    ///
    /// Mounts the store, then on low space runs [`cleanup`](Self::cleanup)
    /// once and re-checks; if space is still low the store is formatted and
    /// mounted again.
    ///
    /// # Errors
    /// * [`StorageError::MountFailed`] if mounting, formatting or re-mounting fails
    /// * [`StorageError::InfoUnavailable`] if capacity cannot be queried
    pub fn ensure_space(&mut self) -> Result<Quota, StorageError> {
        self.store.mount().map_err(StorageError::MountFailed)?;

        let quota = self.query()?;
        if !quota.is_low(self.policy.min_free_ratio) {
            return Ok(quota);
        }

        warn!("Low store space, attempting cleanup");
        let report = self.cleanup()?;
        info!(
            "Cleanup deleted {} files ({} skipped, {} failed)",
            report.deleted.len(),
            report.skipped.len(),
            report.failed.len()
        );

        let quota = self.query()?;
        if !quota.is_low(self.policy.min_free_ratio) {
            return Ok(quota);
        }

        warn!("Still low on space, formatting store");
        self.store.format().map_err(StorageError::MountFailed)?;
        self.store.mount().map_err(StorageError::MountFailed)?;
        self.query()
    }

    /// Delete every regular file not on the keep list.
    ///
    /// Directories and other entry kinds are never touched. Entries with
    /// names longer than `max_name_len`, or whose store path would exceed
    /// `max_path_len`, are skipped. A failed deletion is logged and the pass
    /// continues.
    ///
    /// # Errors
    /// [`StorageError::InfoUnavailable`] if the store cannot be listed.
    pub fn cleanup(&mut self) -> Result<CleanupReport, StorageError> {
        info!("Cleaning up store files");
        let entries = self
            .store
            .entries()
            .map_err(StorageError::InfoUnavailable)?;

        let mut report = CleanupReport::default();
        for entry in entries {
            if entry.kind != EntryKind::File {
                continue;
            }
            if entry.name.len() > self.policy.max_name_len {
                warn!("Skipping file with too long name: {}", entry.name);
                report.skipped.push(entry.name);
                continue;
            }
            if self.policy.keep_files.iter().any(|keep| *keep == entry.name) {
                debug!("Keeping {}", entry.name);
                continue;
            }
            let path_len = self.store.path(&entry.name).as_os_str().len();
            if path_len > self.policy.max_path_len {
                warn!("Path too long for file: {}", entry.name);
                report.skipped.push(entry.name);
                continue;
            }
            match self.store.remove(&entry.name) {
                Ok(()) => {
                    info!("Deleted file: {}", entry.name);
                    report.deleted.push(entry.name);
                }
                Err(e) => {
                    warn!("Failed to delete file {}: {}", entry.name, e);
                    report.failed.push(entry.name);
                }
            }
        }
        Ok(report)
    }
}
