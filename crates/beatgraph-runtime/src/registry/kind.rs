//! Node kind definitions.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::port::{Port, PortDirection, SemanticType};

/// Identifier of a node kind.
///
/// The set of kinds is closed; every variant has exactly one static
/// definition, see [`NodeKindId::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKindId {
    /// A user-written generation prompt.
    Prompt,
    /// Free-form notes used as context.
    Note,
    /// Rewrites a prompt with an LLM.
    PromptEnhancer,
    /// Fans a prompt out into several variations.
    PromptSplitter,
    /// Combines several prompts into one.
    PromptMerge,
    /// Generates an image from a prompt.
    ImageGenerator,
    /// A user-supplied image.
    ImageUpload,
    /// Edits an image following a prompt.
    ImageEditor,
    /// Increases image resolution.
    ImageUpscaler,
    /// Animates an image into a clip.
    ImageToVideo,
    /// Generates a clip straight from a prompt.
    TextToVideo,
    /// Concatenates clips.
    VideoStitcher,
}

/// Palette grouping used when presenting kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Sources: prompts, notes, uploads.
    Input,
    /// Text processing.
    Text,
    /// Branching and merging.
    Flow,
    /// Image generation and editing.
    Image,
    /// Video generation and editing.
    Video,
}

impl Category {
    /// Display label of the category.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Input => "Inputs",
            Self::Text => "Text",
            Self::Flow => "Flow",
            Self::Image => "Image",
            Self::Video => "Video",
        }
    }
}

/// How a kind participates in rhythm scoring beyond its base weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatRole {
    /// Base weight only.
    #[default]
    Plain,
    /// Earns a bonus per outgoing branch.
    Branching,
    /// Earns a bonus when it closes a branch.
    Aggregator,
}

/// Immutable definition of a node kind.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeKind {
    /// Kind identifier.
    pub id: NodeKindId,
    /// Display label.
    pub label: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Palette category.
    pub category: Category,
    /// Search tags.
    pub tags: &'static [&'static str],
    /// Input ports in declaration order.
    pub inputs: &'static [Port],
    /// Output ports in declaration order.
    pub outputs: &'static [Port],
    /// Base pacing intensity.
    pub beat_weight: f64,
    /// Scoring role.
    pub beat_role: BeatRole,
    /// Whether the kind runs on the job service.
    pub executable: bool,
}

impl NodeKind {
    /// Returns the ports of the given direction in declaration order.
    #[inline]
    pub fn ports(&self, direction: PortDirection) -> &'static [Port] {
        match direction {
            PortDirection::Input => self.inputs,
            PortDirection::Output => self.outputs,
        }
    }

    /// Looks up an input port.
    pub fn input(&self, id: &str) -> Option<&'static Port> {
        self.inputs.iter().find(|port| port.id == id)
    }

    /// Looks up an output port.
    pub fn output(&self, id: &str) -> Option<&'static Port> {
        self.outputs.iter().find(|port| port.id == id)
    }

    /// Looks up a port by direction and id.
    pub fn port(&self, direction: PortDirection, id: &str) -> Option<&'static Port> {
        self.ports(direction).iter().find(|port| port.id == id)
    }

    /// Returns the first port of the given direction and type.
    pub fn first_port(&self, direction: PortDirection, ty: SemanticType) -> Option<&'static Port> {
        self.ports(direction).iter().find(|port| port.semantic_type == ty)
    }

    /// Returns whether the kind declares a port of the given direction and type.
    pub fn has_port(&self, direction: PortDirection, ty: SemanticType) -> bool {
        self.first_port(direction, ty).is_some()
    }

    /// Returns whether `query` occurs in the label, description or tags,
    /// ignoring case. An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.label.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
    }
}
