//! Rewrite request domain: modes, tones, and input limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length of the message to rewrite, in characters.
pub const MAX_INPUT_CHARS: usize = 6000;

/// Maximum length of the recipient description, in characters.
pub const MAX_RECIPIENT_CHARS: usize = 120;

/// Recipient used when the caller does not name one.
pub const DEFAULT_RECIPIENT: &str = "someone";

/// Weekly free-tier rewrite allowance used when none is configured.
pub const DEFAULT_WEEKLY_LIMIT: u32 = 10;

/// Rewrite register selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Workplace-appropriate rewrites.
    Normal,

    /// Exaggerated, playful rewrites.
    Fun,
}

impl Mode {
    /// Tones selectable in this mode.
    #[must_use]
    pub const fn tones(self) -> &'static [Tone] {
        match self {
            Self::Normal => &[Tone::Professional, Tone::Casual],
            Self::Fun => &[
                Tone::FiveYearOld,
                Tone::Sarcastic,
                Tone::Unhinged,
                Tone::Angry,
                Tone::OverlyPolite,
            ],
        }
    }

    /// Whether `tone` is selectable in this mode.
    #[must_use]
    pub fn allows(self, tone: Tone) -> bool {
        self.tones().contains(&tone)
    }

    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fun => "fun",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "fun" => Ok(Self::Fun),
            _ => Err(ParseModeError),
        }
    }
}

/// Rewrite tone. Each tone belongs to exactly one mode; use
/// [`Mode::allows`] to validate the pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    /// Polished business language.
    #[serde(rename = "professional")]
    Professional,

    /// Relaxed but clear.
    #[serde(rename = "casual")]
    Casual,

    /// Like an excited five-year-old wrote it.
    #[serde(rename = "5yearold")]
    FiveYearOld,

    /// Dry and cutting.
    #[serde(rename = "sarcastic")]
    Sarcastic,

    /// Chaotic energy.
    #[serde(rename = "unhinged")]
    Unhinged,

    /// Barely restrained fury.
    #[serde(rename = "angry")]
    Angry,

    /// Apologetic to a fault.
    #[serde(rename = "overly-polite")]
    OverlyPolite,
}

impl Tone {
    /// Wire name of the tone.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::FiveYearOld => "5yearold",
            Self::Sarcastic => "sarcastic",
            Self::Unhinged => "unhinged",
            Self::Angry => "angry",
            Self::OverlyPolite => "overly-polite",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ParseToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "professional" => Ok(Self::Professional),
            "casual" => Ok(Self::Casual),
            "5yearold" => Ok(Self::FiveYearOld),
            "sarcastic" => Ok(Self::Sarcastic),
            "unhinged" => Ok(Self::Unhinged),
            "angry" => Ok(Self::Angry),
            "overly-polite" => Ok(Self::OverlyPolite),
            _ => Err(ParseToneError),
        }
    }
}

/// The input is not a recognized mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode")]
pub struct ParseModeError;

/// The input is not a recognized tone name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tone")]
pub struct ParseToneError;
