/*!
 * Delivery surfaces and their length budgets.
 *
 * A surface is a transmission channel with its own hard size limit. Each
 * surface also carries a safety margin so the category tag and the markup
 * added by rendering never push a segment over the hard limit.
 */

use serde::{Deserialize, Serialize};

/// Target transmission channel for a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// Plain text message
    #[default]
    Message,
    /// Caption attached to a photo
    Caption,
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Caption => write!(f, "caption"),
        }
    }
}

impl std::str::FromStr for Surface {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "message" => Ok(Self::Message),
            "caption" => Ok(Self::Caption),
            _ => Err(anyhow::anyhow!("Invalid surface: {}", s)),
        }
    }
}

/// Hard limit and safety margin of one surface, counted in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceLimit {
    /// Maximum length the platform accepts
    pub hard_limit: usize,
    /// Budget reserved for the tag and markup overhead
    pub safety_margin: usize,
}

impl SurfaceLimit {
    /// Message surface: 4096 chars, 200 reserved
    pub const MESSAGE: Self = Self {
        hard_limit: 4096,
        safety_margin: 200,
    };

    /// Caption surface: 1024 chars, 50 reserved
    pub const CAPTION: Self = Self {
        hard_limit: 1024,
        safety_margin: 50,
    };

    /// Length raw segments are split to
    pub fn effective_limit(&self) -> usize {
        self.hard_limit.saturating_sub(self.safety_margin)
    }
}

/// Limits for every surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceLimits {
    /// Message surface limit
    #[serde(default = "default_message_limit")]
    pub message: SurfaceLimit,
    /// Caption surface limit
    #[serde(default = "default_caption_limit")]
    pub caption: SurfaceLimit,
}

impl SurfaceLimits {
    /// Limit for the given surface
    pub fn for_surface(&self, surface: Surface) -> SurfaceLimit {
        match surface {
            Surface::Message => self.message,
            Surface::Caption => self.caption,
        }
    }
}

impl Default for SurfaceLimits {
    fn default() -> Self {
        Self {
            message: SurfaceLimit::MESSAGE,
            caption: SurfaceLimit::CAPTION,
        }
    }
}

fn default_message_limit() -> SurfaceLimit {
    SurfaceLimit::MESSAGE
}

fn default_caption_limit() -> SurfaceLimit {
    SurfaceLimit::CAPTION
}
