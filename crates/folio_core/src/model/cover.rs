//! Cover image reference with framing parameters.
//!
//! Stored documents encode framing as a URL fragment:
//! `<url>#x=<pct>&y=<pct>&s=<pct>`, present only when framing differs from
//! the default (50/50/100).

use serde::{Deserialize, Serialize};

pub const DEFAULT_POS: u8 = 50;
pub const DEFAULT_SCALE: u16 = 100;

const INLINE_PREFIX: &str = "data:";
const SESSION_LOCAL_PREFIX: &str = "blob:";

/// Cover reference plus horizontal/vertical focus and zoom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub url: String,
    /// Horizontal focus, percent (0..=100).
    pub pos_x: u8,
    /// Vertical focus, percent (0..=100).
    pub pos_y: u8,
    /// Zoom, percent.
    pub scale: u16,
}

impl Default for CoverImage {
    fn default() -> Self {
        Self::from_url("")
    }
}

impl CoverImage {
    /// Cover with default framing.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pos_x: DEFAULT_POS,
            pos_y: DEFAULT_POS,
            scale: DEFAULT_SCALE,
        }
    }

    /// Parses a stored cover value, splitting off the framing fragment.
    ///
    /// Missing or unparsable parameters fall back to their defaults;
    /// positions are clamped to 0..=100.
    pub fn parse(stored: &str) -> Self {
        let Some((url, fragment)) = stored.split_once('#') else {
            return Self::from_url(stored);
        };

        let mut cover = Self::from_url(url);
        for pair in fragment.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let Ok(number) = value.trim().parse::<f64>() else {
                continue;
            };
            if !number.is_finite() || number < 0.0 {
                continue;
            }
            match key {
                "x" => cover.pos_x = clamp_pct(number),
                "y" => cover.pos_y = clamp_pct(number),
                "s" => cover.scale = number.round().min(f64::from(u16::MAX)) as u16,
                _ => {}
            }
        }
        cover
    }

    /// Stored representation, with the framing fragment when non-default.
    pub fn encode(&self) -> String {
        if self.url.is_empty() || self.has_default_framing() {
            return self.url.clone();
        }
        format!(
            "{}#x={}&y={}&s={}",
            self.url, self.pos_x, self.pos_y, self.scale
        )
    }

    pub fn has_default_framing(&self) -> bool {
        self.pos_x == DEFAULT_POS && self.pos_y == DEFAULT_POS && self.scale == DEFAULT_SCALE
    }

    /// Sets focus and zoom; positions are clamped to 0..=100.
    pub fn set_framing(&mut self, pos_x: i32, pos_y: i32, scale: u16) {
        self.pos_x = pos_x.clamp(0, 100) as u8;
        self.pos_y = pos_y.clamp(0, 100) as u8;
        self.scale = scale;
    }
}

/// Whether `url` is an inline-encoded payload (`data:` URI).
pub fn is_inline_encoded(url: &str) -> bool {
    url.starts_with(INLINE_PREFIX)
}

/// Whether `url` is only valid inside the session that created it.
pub fn is_session_local(url: &str) -> bool {
    url.starts_with(SESSION_LOCAL_PREFIX)
}

/// Whether `url` can be written to durable storage as-is.
pub fn is_persistable(url: &str) -> bool {
    !url.is_empty() && !is_inline_encoded(url) && !is_session_local(url)
}

/// Storage-safe copy of `url`: inline and session-local references become
/// empty.
pub fn storage_safe(url: &str) -> String {
    if is_persistable(url) {
        url.to_string()
    } else {
        String::new()
    }
}

/// Builds a fresh session-local reference for a staged upload.
pub fn session_local_reference(file_name: &str) -> String {
    format!(
        "{SESSION_LOCAL_PREFIX}session/{}/{}",
        uuid::Uuid::new_v4().simple(),
        file_name
    )
}

fn clamp_pct(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
