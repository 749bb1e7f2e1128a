//! The font-editing collaborator.
//!
//! Allocation, validation and placement never touch a font directly. The
//! build pipeline talks to fonts only through [`FontBackend`], which covers
//! fetching metrics, creating glyphs, importing glyphs from another font
//! and serializing the result.

mod memory;

use std::{fmt::Display, path::Path as FsPath};

use crate::{
    resolver::{ComponentRef, GlyphMetrics},
    FontgenError, Path,
};

pub use memory::MemoryFont;

/// How a glyph is looked up in a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKey<'a> {
    Codepoint(u32),
    Name(&'a str),
}

impl Display for GlyphKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlyphKey::Codepoint(cp) => write!(f, "U+{:04X}", cp),
            GlyphKey::Name(name) => f.write_str(name),
        }
    }
}

pub trait FontBackend {
    /// Bounding box and advance width of a glyph, or `None` if the font has
    /// no such glyph. A glyph without ink reports a zero-sized box at the
    /// origin.
    fn glyph_metrics(&self, key: GlyphKey<'_>) -> Option<GlyphMetrics>;

    fn has_glyph(&self, key: GlyphKey<'_>) -> bool {
        self.glyph_metrics(key).is_some()
    }

    /// Create (or replace) a glyph at `codepoint` built from component
    /// references. Its advance width starts at zero.
    fn create_composite(
        &mut self,
        codepoint: u32,
        name: &str,
        components: &[ComponentRef],
    ) -> Result<(), FontgenError>;

    /// Create (or replace) a glyph at `codepoint` from outlines.
    fn create_outline(
        &mut self,
        codepoint: u32,
        name: &str,
        paths: Vec<Path>,
        advance_width: f64,
    ) -> Result<(), FontgenError>;

    /// Copy the glyph at `source_codepoint` in `source` to `codepoint` under
    /// `name`, scaled uniformly by `scale`.
    fn import_glyph(
        &mut self,
        source: &Self,
        source_codepoint: u32,
        codepoint: u32,
        name: &str,
        scale: f64,
    ) -> Result<(), FontgenError>
    where
        Self: Sized;

    fn set_advance_width(&mut self, key: GlyphKey<'_>, width: f64) -> Result<(), FontgenError>;

    fn save(&self, path: &FsPath) -> Result<(), FontgenError>;
}
