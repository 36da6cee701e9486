//! Built-in node kind definitions.

use super::kind::{BeatRole, Category, NodeKind, NodeKindId};
use super::port::Port;
use super::port::SemanticType::{FreeText, ImageAsset, PromptText, VideoAsset};

/// Node-data key holding a node's text.
pub const TEXT_KEY: &str = "text";

/// Node-data key holding a node's result asset.
pub const ASSET_URL_KEY: &str = "assetUrl";

static PROMPT: NodeKind = NodeKind {
    id: NodeKindId::Prompt,
    label: "Prompt",
    description: "A generation prompt written by hand",
    category: Category::Input,
    tags: &["text", "input"],
    inputs: &[],
    outputs: &[Port::output("prompt", "Prompt", PromptText, TEXT_KEY)],
    beat_weight: 0.5,
    beat_role: BeatRole::Plain,
    executable: false,
};

static NOTE: NodeKind = NodeKind {
    id: NodeKindId::Note,
    label: "Note",
    description: "Free-form context such as a script excerpt or style guide",
    category: Category::Input,
    tags: &["text", "context"],
    inputs: &[],
    outputs: &[Port::output("text", "Text", FreeText, TEXT_KEY)],
    beat_weight: 0.3,
    beat_role: BeatRole::Plain,
    executable: false,
};

static PROMPT_ENHANCER: NodeKind = NodeKind {
    id: NodeKindId::PromptEnhancer,
    label: "Prompt Enhancer",
    description: "Rewrites a prompt with a language model, optionally guided by context",
    category: Category::Text,
    tags: &["llm", "rewrite", "text"],
    inputs: &[
        Port::input("prompt", "Prompt", PromptText),
        Port::input("context", "Context", FreeText),
    ],
    outputs: &[Port::output("prompt", "Prompt", PromptText, ASSET_URL_KEY)],
    beat_weight: 0.8,
    beat_role: BeatRole::Plain,
    executable: true,
};

static PROMPT_SPLITTER: NodeKind = NodeKind {
    id: NodeKindId::PromptSplitter,
    label: "Prompt Splitter",
    description: "Fans one prompt out to several downstream branches",
    category: Category::Flow,
    tags: &["branch", "variations"],
    inputs: &[Port::input("prompt", "Prompt", PromptText)],
    outputs: &[Port::output("prompt", "Prompt", PromptText, TEXT_KEY)],
    beat_weight: 0.6,
    beat_role: BeatRole::Branching,
    executable: false,
};

static PROMPT_MERGE: NodeKind = NodeKind {
    id: NodeKindId::PromptMerge,
    label: "Prompt Merge",
    description: "Joins several prompts into a single one",
    category: Category::Flow,
    tags: &["join", "combine"],
    inputs: &[Port::input("prompts", "Prompts", PromptText)],
    outputs: &[Port::output("prompt", "Prompt", PromptText, TEXT_KEY)],
    beat_weight: 0.7,
    beat_role: BeatRole::Aggregator,
    executable: false,
};

static IMAGE_GENERATOR: NodeKind = NodeKind {
    id: NodeKindId::ImageGenerator,
    label: "Image Generator",
    description: "Generates a still image from a prompt",
    category: Category::Image,
    tags: &["image", "text-to-image", "ai"],
    inputs: &[Port::input("prompt", "Prompt", PromptText)],
    outputs: &[Port::output("image", "Image", ImageAsset, ASSET_URL_KEY)],
    beat_weight: 1.5,
    beat_role: BeatRole::Plain,
    executable: true,
};

static IMAGE_UPLOAD: NodeKind = NodeKind {
    id: NodeKindId::ImageUpload,
    label: "Image Upload",
    description: "An image supplied by the user",
    category: Category::Input,
    tags: &["image", "upload", "input"],
    inputs: &[],
    outputs: &[Port::output("image", "Image", ImageAsset, ASSET_URL_KEY)],
    beat_weight: 0.4,
    beat_role: BeatRole::Plain,
    executable: false,
};

static IMAGE_EDITOR: NodeKind = NodeKind {
    id: NodeKindId::ImageEditor,
    label: "Image Editor",
    description: "Edits an image following a prompt",
    category: Category::Image,
    tags: &["image", "inpaint", "edit", "ai"],
    inputs: &[
        Port::input("image", "Image", ImageAsset),
        Port::input("prompt", "Prompt", PromptText),
    ],
    outputs: &[Port::output("image", "Image", ImageAsset, ASSET_URL_KEY)],
    beat_weight: 1.2,
    beat_role: BeatRole::Plain,
    executable: true,
};

static IMAGE_UPSCALER: NodeKind = NodeKind {
    id: NodeKindId::ImageUpscaler,
    label: "Image Upscaler",
    description: "Increases the resolution of an image",
    category: Category::Image,
    tags: &["image", "upscale", "resolution"],
    inputs: &[Port::input("image", "Image", ImageAsset)],
    outputs: &[Port::output("image", "Image", ImageAsset, ASSET_URL_KEY)],
    beat_weight: 0.9,
    beat_role: BeatRole::Plain,
    executable: true,
};

static IMAGE_TO_VIDEO: NodeKind = NodeKind {
    id: NodeKindId::ImageToVideo,
    label: "Image to Video",
    description: "Animates a still image into a short clip",
    category: Category::Video,
    tags: &["video", "animate", "ai"],
    inputs: &[
        Port::input("image", "Image", ImageAsset),
        Port::input("prompt", "Motion prompt", PromptText),
    ],
    outputs: &[Port::output("video", "Video", VideoAsset, ASSET_URL_KEY)],
    beat_weight: 2.0,
    beat_role: BeatRole::Plain,
    executable: true,
};

static TEXT_TO_VIDEO: NodeKind = NodeKind {
    id: NodeKindId::TextToVideo,
    label: "Text to Video",
    description: "Generates a clip straight from a prompt",
    category: Category::Video,
    tags: &["video", "text-to-video", "ai"],
    inputs: &[Port::input("prompt", "Prompt", PromptText)],
    outputs: &[Port::output("video", "Video", VideoAsset, ASSET_URL_KEY)],
    beat_weight: 2.0,
    beat_role: BeatRole::Plain,
    executable: true,
};

static VIDEO_STITCHER: NodeKind = NodeKind {
    id: NodeKindId::VideoStitcher,
    label: "Video Stitcher",
    description: "Concatenates clips into one video",
    category: Category::Video,
    tags: &["video", "concat", "edit"],
    inputs: &[Port::input("clips", "Clips", VideoAsset)],
    outputs: &[Port::output("video", "Video", VideoAsset, ASSET_URL_KEY)],
    beat_weight: 1.0,
    beat_role: BeatRole::Plain,
    executable: true,
};

impl NodeKindId {
    /// Returns the static definition of this kind.
    pub fn kind(self) -> &'static NodeKind {
        match self {
            Self::Prompt => &PROMPT,
            Self::Note => &NOTE,
            Self::PromptEnhancer => &PROMPT_ENHANCER,
            Self::PromptSplitter => &PROMPT_SPLITTER,
            Self::PromptMerge => &PROMPT_MERGE,
            Self::ImageGenerator => &IMAGE_GENERATOR,
            Self::ImageUpload => &IMAGE_UPLOAD,
            Self::ImageEditor => &IMAGE_EDITOR,
            Self::ImageUpscaler => &IMAGE_UPSCALER,
            Self::ImageToVideo => &IMAGE_TO_VIDEO,
            Self::TextToVideo => &TEXT_TO_VIDEO,
            Self::VideoStitcher => &VIDEO_STITCHER,
        }
    }
}
