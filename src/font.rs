use crate::{glyph::GlyphList, FontgenError, Glyph};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An in-memory font: units per em and a flat list of glyphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub upm: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default)]
    pub glyphs: GlyphList,
}

impl Default for Font {
    fn default() -> Self {
        Self::new()
    }
}

impl Font {
    pub fn new() -> Self {
        Font {
            upm: 1000,
            family_name: None,
            glyphs: GlyphList(vec![]),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontgenError> {
        let path = path.as_ref();
        if !path.extension().is_some_and(|ext| ext == "json") {
            return Err(FontgenError::Backend(format!(
                "Unsupported font file {}, expected .json",
                path.display()
            )));
        }
        let buffered = std::io::BufReader::new(std::fs::File::open(path)?);
        let font: Font = serde_json::from_reader(buffered)?;
        log::info!(
            "Loaded {} glyphs from {}",
            font.glyphs.len(),
            path.display()
        );
        Ok(font)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FontgenError> {
        let path = path.as_ref();
        let writer = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        log::info!("Saved {} glyphs to {}", self.glyphs.len(), path.display());
        Ok(())
    }

    /// Insert a glyph, replacing any glyph of the same name. The new glyph
    /// takes over its codepoints from whichever glyph held them before.
    pub fn add_glyph(&mut self, glyph: Glyph) {
        for other in self.glyphs.iter_mut() {
            other.codepoints.retain(|cp| !glyph.codepoints.contains(cp));
        }
        match self.glyphs.get_mut(&glyph.name) {
            Some(existing) => *existing = glyph,
            None => self.glyphs.push(glyph),
        }
    }
}
