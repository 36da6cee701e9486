//! Pacing bands.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// One of six ordered pacing bands over cumulative weight.
///
/// Bands are closed at their upper bound: a beat at exactly 10% is still
/// part of the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// 0 to 10%.
    Hook,
    /// 10 to 30%.
    Build,
    /// 30 to 50%.
    Tension,
    /// 50 to 75%.
    Chaos,
    /// 75 to 90%.
    Release,
    /// 90 to 100%.
    Outro,
}

impl Phase {
    /// Returns the band containing a cumulative percentage.
    pub fn for_percent(percent: f64) -> Self {
        match percent {
            p if p <= 10.0 => Self::Hook,
            p if p <= 30.0 => Self::Build,
            p if p <= 50.0 => Self::Tension,
            p if p <= 75.0 => Self::Chaos,
            p if p <= 90.0 => Self::Release,
            _ => Self::Outro,
        }
    }

    /// Returns the `(lower, upper)` percentage bounds.
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::Hook => (0.0, 10.0),
            Self::Build => (10.0, 30.0),
            Self::Tension => (30.0, 50.0),
            Self::Chaos => (50.0, 75.0),
            Self::Release => (75.0, 90.0),
            Self::Outro => (90.0, 100.0),
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hook => "Hook",
            Self::Build => "Build",
            Self::Tension => "Tension",
            Self::Chaos => "Chaos",
            Self::Release => "Release",
            Self::Outro => "Outro",
        }
    }

    /// One-line description shown next to the label.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Hook => "Grab attention in the opening moments",
            Self::Build => "Establish the subject and raise the stakes",
            Self::Tension => "Layer detail and keep momentum climbing",
            Self::Chaos => "The densest, most intense stretch",
            Self::Release => "Let the intensity settle",
            Self::Outro => "Close on a lasting final image",
        }
    }

    /// Display color.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Hook => "#38bdf8",
            Self::Build => "#22c55e",
            Self::Tension => "#eab308",
            Self::Chaos => "#ef4444",
            Self::Release => "#a855f7",
            Self::Outro => "#64748b",
        }
    }
}
