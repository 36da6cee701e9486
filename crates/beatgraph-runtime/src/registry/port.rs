//! Typed, directional connection points.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Direction of a port relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PortDirection {
    /// Receives a value from an upstream node.
    Input,
    /// Publishes a value to downstream nodes.
    Output,
}

impl PortDirection {
    /// Returns the direction a port must have to connect with this one.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// The closed set of data kinds exchanged between nodes.
///
/// Connections are legal only between identical types; there is no coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SemanticType {
    /// A generation prompt.
    PromptText,
    /// Free-form context or notes.
    FreeText,
    /// A reference to a generated or uploaded image.
    ImageAsset,
    /// A reference to a generated video.
    VideoAsset,
}

impl SemanticType {
    /// Edge color used when auto-wiring a link of this type.
    ///
    /// Rendering hint only, the engine never reads it back.
    pub const fn color(self) -> &'static str {
        match self {
            Self::PromptText => "#a855f7",
            Self::FreeText => "#94a3b8",
            Self::ImageAsset => "#22c55e",
            Self::VideoAsset => "#f97316",
        }
    }
}

/// A port declared by a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Port id, unique per direction within its kind.
    pub id: &'static str,
    /// Whether the port receives or publishes.
    pub direction: PortDirection,
    /// Type of the exchanged value.
    pub semantic_type: SemanticType,
    /// Display label.
    pub label: &'static str,
    /// Node-data key holding the published value (output ports only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishes: Option<&'static str>,
}

impl Port {
    /// Declares an input port.
    pub const fn input(id: &'static str, label: &'static str, ty: SemanticType) -> Self {
        Self {
            id,
            direction: PortDirection::Input,
            semantic_type: ty,
            label,
            publishes: None,
        }
    }

    /// Declares an output port publishing the node-data value under `key`.
    pub const fn output(
        id: &'static str,
        label: &'static str,
        ty: SemanticType,
        key: &'static str,
    ) -> Self {
        Self {
            id,
            direction: PortDirection::Output,
            semantic_type: ty,
            label,
            publishes: Some(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_semantic_type_wire_names() {
        assert_eq!(SemanticType::PromptText.to_string(), "prompt-text");
        assert_eq!(
            SemanticType::from_str("image-asset").unwrap(),
            SemanticType::ImageAsset
        );
        let json = serde_json::to_string(&SemanticType::VideoAsset).unwrap();
        assert_eq!(json, "\"video-asset\"");
    }

    #[test]
    fn test_every_type_has_a_distinct_color() {
        let colors: Vec<_> = SemanticType::iter().map(SemanticType::color).collect();
        for (i, color) in colors.iter().enumerate() {
            assert!(!colors[i + 1..].contains(color));
        }
    }

    #[test]
    fn test_opposite_direction() {
        assert_eq!(PortDirection::Input.opposite(), PortDirection::Output);
        assert_eq!(PortDirection::Output.opposite(), PortDirection::Input);
    }
}
