/// Reconciliation tuning for remote entity snapshots.

#[derive(Debug, Clone, Copy)]
pub struct SnapshotTuning {
    /// Exponential blend rate (per second) toward the extrapolated
    /// authoritative position while inside the snap threshold.
    pub smoothing_rate: f32,

    /// Positional error, in world units, beyond which the render position
    /// snaps directly instead of interpolating (teleports, packet loss).
    pub snap_distance: f32,
}

impl Default for SnapshotTuning {
    fn default() -> Self {
        Self {
            smoothing_rate: 10.0,
            snap_distance: 300.0,
        }
    }
}
