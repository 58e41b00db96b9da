/// Outcome counters of one volume's create and delete phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeOutcome {
    /// Snapshots created.
    pub created: u32,
    /// Snapshots deleted.
    pub deleted: u32,
    /// Failed snapshot operations.
    pub errors: u32,
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Volumes processed.
    pub total_vols: u32,
    /// Run-level failures such as an unreachable provider.
    pub total_errors: u32,
    /// Snapshots created.
    pub snap_creates: u32,
    /// Snapshots deleted.
    pub snap_deletes: u32,
    /// Failed snapshot create, list or delete calls.
    pub snap_errors: u32,
}

impl RunStats {
    /// Merges the outcome of one fully processed volume.
    pub fn record_volume(&mut self, outcome: VolumeOutcome) {
        self.total_vols = self.total_vols.saturating_add(1);
        self.snap_creates = self.snap_creates.saturating_add(outcome.created);
        self.snap_deletes = self.snap_deletes.saturating_add(outcome.deleted);
        self.snap_errors = self.snap_errors.saturating_add(outcome.errors);
    }

    /// Records a failure that stopped the run.
    pub fn record_run_error(&mut self) {
        self.total_errors = self.total_errors.saturating_add(1);
    }

    /// Returns run-level plus snapshot-level errors.
    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.total_errors.saturating_add(self.snap_errors)
    }

    /// Returns whether the run finished without any error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }
}
