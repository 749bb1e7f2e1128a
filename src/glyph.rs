use crate::layer::Layer;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphList(pub Vec<Glyph>);
impl GlyphList {
    pub fn get(&self, g: &str) -> Option<&Glyph> {
        self.0.iter().find(|&glyph| glyph.name == g)
    }
    pub fn get_mut(&mut self, g: &str) -> Option<&mut Glyph> {
        self.0.iter_mut().find(|glyph| glyph.name == g)
    }

    pub fn get_by_codepoint(&self, codepoint: u32) -> Option<&Glyph> {
        self.0
            .iter()
            .find(|glyph| glyph.codepoints.contains(&codepoint))
    }
    pub fn get_by_codepoint_mut(&mut self, codepoint: u32) -> Option<&mut Glyph> {
        self.0
            .iter_mut()
            .find(|glyph| glyph.codepoints.contains(&codepoint))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Glyph> {
        self.0.iter()
    }
}

impl Deref for GlyphList {
    type Target = Vec<Glyph>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for GlyphList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codepoints: Vec<u32>,
    #[serde(flatten)]
    pub layer: Layer,
}

impl Glyph {
    pub fn new(name: impl Into<String>, codepoint: Option<u32>, width: f64) -> Self {
        Glyph {
            name: name.into(),
            codepoints: codepoint.into_iter().collect(),
            layer: Layer::new(width),
        }
    }
}
