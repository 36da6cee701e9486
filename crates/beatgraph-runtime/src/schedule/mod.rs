//! Deterministic ordering and pacing analysis.
//!
//! Nothing here gates execution: the order and the rhythm report are
//! advisory views of the graph's structure.

mod phase;
mod rhythm;
mod topo;

pub use phase::Phase;
pub use rhythm::{
    AGGREGATOR_BONUS, Beat, DEPTH_PENALTY_PER_LEVEL, DEPTH_THRESHOLD, EARLY_CLIMAX_PERCENT,
    FAN_OUT_BONUS_PER_BRANCH, FLAT_RHYTHM_STDDEV, MIN_BEAT_WEIGHT, PEAK_WEIGHT, RhythmAnalysis,
    RhythmWarning, WEAK_HOOK_WEIGHT,
};
pub use topo::{Schedule, topological_order};
