//! Per-frame batching statistics.

/// Counters filled by one planning or flush pass over a batch.
///
/// Tests (and debug overlays) read these instead of looking at GPU
/// output: one draw per populated sub-mesh, uploads only for unflushed
/// tails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Number of draw submissions planned this frame.
    pub draw_calls: u32,
    /// Total instances across all planned draws.
    pub instances: u32,
    /// Instance bytes scheduled for upload this frame.
    pub bytes_uploaded: u64,
    /// Cumulative arena repacks since batch construction.
    pub repacks: u32,
}
