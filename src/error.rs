use std::io;
use thiserror::Error;

use crate::validator::{Drift, Violation};

fn join_lines<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("  - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum FontgenError {
    #[error("Invalid atom specification: {reason}")]
    InvalidSpec { reason: String },

    #[error("Private use area overflow: codepoint U+{requested:04X} is above the ceiling U+{ceiling:04X}")]
    AllocationOverflow { requested: u32, ceiling: u32 },

    #[error("Layout validation failed with {} violation(s):\n{}", .0.len(), join_lines(.0))]
    Validation(Vec<Violation>),

    #[error("Codepoint drift against golden snapshot in {} atom(s):\n{}", .0.len(), join_lines(.0))]
    CodepointDrift(Vec<Drift>),

    #[error("Base glyph for '{character}' ({system}) not available in the font")]
    MissingBaseGlyph { character: char, system: String },

    #[error("Overlay glyph {name} not available")]
    MissingOverlayGlyph { name: String },

    #[error("Glyph {glyph} not found")]
    GlyphNotFound { glyph: String },

    #[error("Font backend error: {0}")]
    Backend(String),

    #[error("Malformed path")]
    BadPath,

    #[error("IO Error: {0}")]
    IO(#[from] io::Error),

    #[error("Error parsing YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Error in JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FontgenError {
    pub(crate) fn invalid_spec(reason: impl Into<String>) -> Self {
        FontgenError::InvalidSpec {
            reason: reason.into(),
        }
    }

    /// Whether the error only affects a single atom during materialization
    pub fn is_per_atom(&self) -> bool {
        matches!(
            self,
            FontgenError::MissingBaseGlyph { .. }
                | FontgenError::MissingOverlayGlyph { .. }
                | FontgenError::GlyphNotFound { .. }
        )
    }
}
