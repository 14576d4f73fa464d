use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::{AdgeniusError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "square_1_1")]
    Square,
    #[serde(rename = "classic_4_3")]
    Classic,
    #[serde(rename = "traditional_3_4")]
    Traditional,
    #[serde(rename = "widescreen_16_9")]
    Widescreen,
    #[serde(rename = "social_story_9_16")]
    SocialStory,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::Classic,
        Self::Traditional,
        Self::Widescreen,
        Self::SocialStory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "square_1_1",
            Self::Classic => "classic_4_3",
            Self::Traditional => "traditional_3_4",
            Self::Widescreen => "widescreen_16_9",
            Self::SocialStory => "social_story_9_16",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = AdgeniusError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == raw)
            .ok_or_else(|| AdgeniusError::Validation(format!("unknown aspect ratio {raw:?}")))
    }
}

/// Model selector chosen by the caller. `ClassicFast` is the only value routed to Imagen3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderModel {
    #[default]
    Default,
    ClassicFast,
    Fluid,
    Realism,
    Zen,
}

impl ProviderModel {
    pub const ALL: [ProviderModel; 5] = [
        Self::Default,
        Self::ClassicFast,
        Self::Fluid,
        Self::Realism,
        Self::Zen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ClassicFast => "classic_fast",
            Self::Fluid => "fluid",
            Self::Realism => "realism",
            Self::Zen => "zen",
        }
    }

    /// Returns `None` for names outside the recognized set; callers decide the fallback.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|model| model.as_str() == raw)
    }

    /// The Mystic model to send for this selector. Only the named sub-styles pass through.
    pub fn mystic_model(self, fallback: MysticModel) -> MysticModel {
        match self {
            Self::Fluid => MysticModel::Fluid,
            Self::Realism => MysticModel::Realism,
            Self::Zen => MysticModel::Zen,
            Self::Default | Self::ClassicFast => fallback,
        }
    }
}

impl fmt::Display for ProviderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderModel {
    type Err = AdgeniusError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
            .ok_or_else(|| AdgeniusError::Validation(format!("unknown provider model {raw:?}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MysticModel {
    Fluid,
    #[default]
    Realism,
    Zen,
}

impl MysticModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fluid => "fluid",
            Self::Realism => "realism",
            Self::Zen => "zen",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageStyle {
    #[default]
    #[serde(rename = "photo")]
    Photo,
    #[serde(rename = "digital-art")]
    DigitalArt,
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "painting")]
    Painting,
    #[serde(rename = "low-poly")]
    LowPoly,
    #[serde(rename = "pixel-art")]
    PixelArt,
    #[serde(rename = "anime")]
    Anime,
    #[serde(rename = "cyberpunk")]
    Cyberpunk,
    #[serde(rename = "comic")]
    Comic,
    #[serde(rename = "vintage")]
    Vintage,
    #[serde(rename = "cartoon")]
    Cartoon,
    #[serde(rename = "vector")]
    Vector,
    #[serde(rename = "studio-shot")]
    StudioShot,
    #[serde(rename = "dark")]
    Dark,
    #[serde(rename = "sketch")]
    Sketch,
    #[serde(rename = "mockup")]
    Mockup,
    #[serde(rename = "2000s-phone")]
    Phone2000s,
    #[serde(rename = "70s-vibe")]
    Vibe70s,
    #[serde(rename = "watercolor")]
    Watercolor,
    #[serde(rename = "art-nouveau")]
    ArtNouveau,
    #[serde(rename = "origami")]
    Origami,
    #[serde(rename = "surreal")]
    Surreal,
    #[serde(rename = "fantasy")]
    Fantasy,
    #[serde(rename = "traditional-japan")]
    TraditionalJapan,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 24] = [
        Self::Photo,
        Self::DigitalArt,
        Self::ThreeD,
        Self::Painting,
        Self::LowPoly,
        Self::PixelArt,
        Self::Anime,
        Self::Cyberpunk,
        Self::Comic,
        Self::Vintage,
        Self::Cartoon,
        Self::Vector,
        Self::StudioShot,
        Self::Dark,
        Self::Sketch,
        Self::Mockup,
        Self::Phone2000s,
        Self::Vibe70s,
        Self::Watercolor,
        Self::ArtNouveau,
        Self::Origami,
        Self::Surreal,
        Self::Fantasy,
        Self::TraditionalJapan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::DigitalArt => "digital-art",
            Self::ThreeD => "3d",
            Self::Painting => "painting",
            Self::LowPoly => "low-poly",
            Self::PixelArt => "pixel-art",
            Self::Anime => "anime",
            Self::Cyberpunk => "cyberpunk",
            Self::Comic => "comic",
            Self::Vintage => "vintage",
            Self::Cartoon => "cartoon",
            Self::Vector => "vector",
            Self::StudioShot => "studio-shot",
            Self::Dark => "dark",
            Self::Sketch => "sketch",
            Self::Mockup => "mockup",
            Self::Phone2000s => "2000s-phone",
            Self::Vibe70s => "70s-vibe",
            Self::Watercolor => "watercolor",
            Self::ArtNouveau => "art-nouveau",
            Self::Origami => "origami",
            Self::Surreal => "surreal",
            Self::Fantasy => "fantasy",
            Self::TraditionalJapan => "traditional-japan",
        }
    }
}

impl FromStr for ImageStyle {
    type Err = AdgeniusError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == raw)
            .ok_or_else(|| AdgeniusError::Validation(format!("unknown image style {raw:?}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Asynchronous text-to-image provider; answers submits with a task id.
    Mystic,
    /// Synchronous `classic_fast` provider.
    Imagen3,
}

impl ProviderKind {
    pub fn for_model(model: ProviderModel) -> Self {
        match model {
            ProviderModel::ClassicFast => Self::Imagen3,
            ProviderModel::Default
            | ProviderModel::Fluid
            | ProviderModel::Realism
            | ProviderModel::Zen => Self::Mystic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mystic => "mystic",
            Self::Imagen3 => "imagen3",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylingOptions {
    /// Imagen3 only; sent as `styling.style`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ImageStyle>,
    /// Mystic only; sent as the top-level `realism` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realism: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub provider_model: ProviderModel,
    #[serde(default)]
    pub styling: StylingOptions,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
            provider_model: ProviderModel::default(),
            styling: StylingOptions::default(),
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_model(mut self, model: ProviderModel) -> Self {
        self.provider_model = model;
        self
    }

    pub fn with_style(mut self, style: ImageStyle) -> Self {
        self.styling.style = Some(style);
        self
    }

    pub fn with_realism(mut self, realism: bool) -> Self {
        self.styling.realism = Some(realism);
        self
    }

    pub fn provider(&self) -> ProviderKind {
        ProviderKind::for_model(self.provider_model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(AdgeniusError::Validation(
                "prompt must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a provider reported for a task on one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Pending,
    Completed { result: String },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AdgeniusError> for TaskError {
    fn from(err: &AdgeniusError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Snapshot of an asynchronous generation job. Only `GenerationTask::observe` mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub task_id: String,
    pub provider: ProviderKind,
    pub state: TaskState,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResult {
    Completed {
        result: String,
        provider: ProviderKind,
    },
    Pending {
        task: GenerationTask,
    },
}

impl SubmitResult {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Completed { provider, .. } => *provider,
            Self::Pending { task } => task.provider,
        }
    }
}
