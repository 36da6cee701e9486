//! Rhythm analysis.
//!
//! Treats the scheduled node order as a timeline, scores each node as a
//! "beat" and flags pacing problems. The report is advisory only.

use std::collections::HashSet;
use std::fmt;

use beatgraph_core::NodeId;
use serde::Serialize;

use super::{Phase, Schedule, topological_order};
use crate::TRACING_TARGET_SCHEDULE;
use crate::graph::{Graph, GraphNode};
use crate::registry::{BeatRole, NodeKindId};

/// Depth from the nearest root beyond which a penalty applies.
pub const DEPTH_THRESHOLD: usize = 3;

/// Weight subtracted per level beyond [`DEPTH_THRESHOLD`].
pub const DEPTH_PENALTY_PER_LEVEL: f64 = 0.15;

/// Bonus per outgoing edge of a branching kind.
pub const FAN_OUT_BONUS_PER_BRANCH: f64 = 0.25;

/// Bonus for an aggregator fed by a single branching kind.
pub const AGGREGATOR_BONUS: f64 = 0.3;

/// Lower bound of any effective weight.
pub const MIN_BEAT_WEIGHT: f64 = 0.1;

/// Weights with a population standard deviation below this read as flat.
pub const FLAT_RHYTHM_STDDEV: f64 = 0.25;

/// A peak before this cumulative percentage is too early.
pub const EARLY_CLIMAX_PERCENT: f64 = 30.0;

/// Beats heavier than this count as peaks.
pub const PEAK_WEIGHT: f64 = 1.8;

/// An opening beat lighter than this is a weak hook.
pub const WEAK_HOOK_WEIGHT: f64 = 0.4;

/// More peaks than this dilute the climax.
const MAX_PEAKS: usize = 2;

/// A scored node on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    /// Scored node.
    pub node_id: NodeId,
    /// Kind of the node.
    pub kind: NodeKindId,
    /// Effective weight.
    pub weight: f64,
    /// Longest-path depth from any root.
    pub depth: usize,
    /// Running weight through this beat, as a share of the total.
    pub cumulative_percent: f64,
    /// Band the cumulative percentage falls into.
    pub phase: Phase,
}

/// A pacing problem detected by [`RhythmAnalysis::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RhythmWarning {
    /// Every beat weighs about the same.
    FlatRhythm {
        /// Population standard deviation of the weights.
        stddev: f64,
    },
    /// The heaviest beat arrives too early.
    EarlyClimax {
        /// First beat with the maximum weight.
        node_id: NodeId,
        /// Its cumulative percentage.
        percent: f64,
    },
    /// The release band outweighs the chaos band.
    MissingRelease {
        /// Total weight of the release band.
        release_weight: f64,
        /// Total weight of the chaos band.
        chaos_weight: f64,
    },
    /// Too many beats compete for the climax.
    MultiplePeaks {
        /// Number of beats above [`PEAK_WEIGHT`].
        count: usize,
    },
    /// The opening beat is too light.
    WeakHook {
        /// First beat.
        node_id: NodeId,
        /// Its weight.
        weight: f64,
    },
}

impl fmt::Display for RhythmWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatRhythm { stddev } => {
                write!(f, "flat rhythm: weight spread {stddev:.2} is below {FLAT_RHYTHM_STDDEV}")
            }
            Self::EarlyClimax { percent, .. } => {
                write!(f, "early climax: the peak lands at {percent:.1}%")
            }
            Self::MissingRelease {
                release_weight,
                chaos_weight,
            } => write!(
                f,
                "missing release: release weighs {release_weight:.2}, more than chaos at {chaos_weight:.2}"
            ),
            Self::MultiplePeaks { count } => {
                write!(f, "multiple peaks: {count} beats weigh more than {PEAK_WEIGHT}")
            }
            Self::WeakHook { weight, .. } => {
                write!(f, "weak hook: the opening beat weighs only {weight:.2}")
            }
        }
    }
}

/// Beats, totals and warnings for a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RhythmAnalysis {
    /// Beats in schedule order.
    pub beats: Vec<Beat>,
    /// Sum of all effective weights.
    pub total_weight: f64,
    /// Warnings in fixed order: flat, early climax, missing release,
    /// multiple peaks, weak hook.
    pub warnings: Vec<RhythmWarning>,
    /// Nodes left unscored because of a cycle.
    pub cyclic: Vec<NodeId>,
}

impl RhythmAnalysis {
    /// Schedules and scores `graph`.
    pub fn analyze(graph: &Graph) -> Self {
        let schedule = topological_order(graph);
        Self::from_schedule(graph, &schedule)
    }

    /// Scores `graph` along an existing schedule.
    pub fn from_schedule(graph: &Graph, schedule: &Schedule) -> Self {
        let scored: Vec<(&GraphNode, f64, usize)> = schedule
            .order
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                let node = graph.node(*id)?;
                let depth = schedule.depth_at(index);
                Some((node, effective_weight(graph, node, depth), depth))
            })
            .collect();

        let total_weight: f64 = scored.iter().map(|(_, weight, _)| weight).sum();

        let mut running = 0.0;
        let beats: Vec<Beat> = scored
            .into_iter()
            .map(|(node, weight, depth)| {
                running += weight;
                let cumulative_percent = if total_weight > 0.0 {
                    running / total_weight * 100.0
                } else {
                    0.0
                };
                Beat {
                    node_id: node.id,
                    kind: node.kind,
                    weight,
                    depth,
                    cumulative_percent,
                    phase: Phase::for_percent(cumulative_percent),
                }
            })
            .collect();

        let warnings = detect_warnings(&beats);
        tracing::debug!(
            target: TRACING_TARGET_SCHEDULE,
            beats = beats.len(),
            total_weight,
            warnings = warnings.len(),
            "Rhythm analyzed"
        );

        Self {
            beats,
            total_weight,
            warnings,
            cyclic: schedule.cyclic.clone(),
        }
    }

    /// Returns the beats of one phase.
    pub fn beats_in(&self, phase: Phase) -> impl Iterator<Item = &Beat> + '_ {
        self.beats.iter().filter(move |beat| beat.phase == phase)
    }

    /// Returns the total weight of one phase.
    pub fn phase_weight(&self, phase: Phase) -> f64 {
        phase_weight(&self.beats, phase)
    }

    /// Returns the first beat with the maximum weight.
    pub fn peak(&self) -> Option<&Beat> {
        peak(&self.beats)
    }
}

fn phase_weight(beats: &[Beat], phase: Phase) -> f64 {
    beats
        .iter()
        .filter(|beat| beat.phase == phase)
        .map(|beat| beat.weight)
        .sum()
}

fn peak(beats: &[Beat]) -> Option<&Beat> {
    beats
        .iter()
        .reduce(|best, beat| if beat.weight > best.weight { beat } else { best })
}

fn effective_weight(graph: &Graph, node: &GraphNode, depth: usize) -> f64 {
    let definition = node.definition();
    let mut weight = definition.beat_weight;

    if depth > DEPTH_THRESHOLD {
        weight -= DEPTH_PENALTY_PER_LEVEL * (depth - DEPTH_THRESHOLD) as f64;
    }

    match definition.beat_role {
        BeatRole::Branching => {
            weight += FAN_OUT_BONUS_PER_BRANCH * graph.outgoing(node.id).count() as f64;
        }
        BeatRole::Aggregator => {
            let predecessors: HashSet<NodeId> =
                graph.incoming(node.id).map(|edge| edge.source).collect();
            let fed_by_branch = predecessors.len() == 1
                && predecessors
                    .iter()
                    .filter_map(|id| graph.node(*id))
                    .all(|source| source.definition().beat_role == BeatRole::Branching);
            if fed_by_branch {
                weight += AGGREGATOR_BONUS;
            }
        }
        BeatRole::Plain => {}
    }

    weight.max(MIN_BEAT_WEIGHT)
}

fn detect_warnings(beats: &[Beat]) -> Vec<RhythmWarning> {
    let mut warnings = Vec::new();
    let Some(first) = beats.first() else {
        return warnings;
    };

    if beats.len() >= 2 {
        let count = beats.len() as f64;
        let mean = beats.iter().map(|beat| beat.weight).sum::<f64>() / count;
        let variance = beats
            .iter()
            .map(|beat| (beat.weight - mean).powi(2))
            .sum::<f64>()
            / count;
        let stddev = variance.sqrt();
        if stddev < FLAT_RHYTHM_STDDEV {
            warnings.push(RhythmWarning::FlatRhythm { stddev });
        }
    }

    if let Some(peak) = peak(beats)
        && peak.cumulative_percent < EARLY_CLIMAX_PERCENT
    {
        warnings.push(RhythmWarning::EarlyClimax {
            node_id: peak.node_id,
            percent: peak.cumulative_percent,
        });
    }

    let has_chaos = beats.iter().any(|beat| beat.phase == Phase::Chaos);
    let chaos_weight = phase_weight(beats, Phase::Chaos);
    let release_weight = phase_weight(beats, Phase::Release);
    if has_chaos && release_weight > chaos_weight {
        warnings.push(RhythmWarning::MissingRelease {
            release_weight,
            chaos_weight,
        });
    }

    let peaks = beats.iter().filter(|beat| beat.weight > PEAK_WEIGHT).count();
    if peaks > MAX_PEAKS {
        warnings.push(RhythmWarning::MultiplePeaks { count: peaks });
    }

    if first.weight < WEAK_HOOK_WEIGHT {
        warnings.push(RhythmWarning::WeakHook {
            node_id: first.node_id,
            weight: first.weight,
        });
    }

    warnings
}
