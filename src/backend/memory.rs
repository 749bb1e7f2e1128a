use std::path::Path as FsPath;

use kurbo::{Affine, Rect};

use super::{FontBackend, GlyphKey};
use crate::{
    resolver::{ComponentRef, GlyphMetrics},
    shape::Shape,
    Component, Font, FontgenError, Glyph, Path,
};

/// The in-memory reference backend
pub type MemoryFont = Font;

impl Font {
    fn lookup(&self, key: GlyphKey<'_>) -> Option<&Glyph> {
        match key {
            GlyphKey::Codepoint(cp) => self.glyphs.get_by_codepoint(cp),
            GlyphKey::Name(name) => self.glyphs.get(name),
        }
    }
}

impl FontBackend for Font {
    fn glyph_metrics(&self, key: GlyphKey<'_>) -> Option<GlyphMetrics> {
        let glyph = self.lookup(key)?;
        let bbox = match glyph.layer.bounds(self) {
            Ok(bbox) => bbox.unwrap_or(Rect::ZERO),
            Err(e) => {
                log::warn!("Could not compute bounds of {}: {}", glyph.name, e);
                return None;
            }
        };
        Some(GlyphMetrics::new(
            glyph.name.as_str(),
            bbox,
            glyph.layer.width,
        ))
    }

    fn create_composite(
        &mut self,
        codepoint: u32,
        name: &str,
        components: &[ComponentRef],
    ) -> Result<(), FontgenError> {
        let mut glyph = Glyph::new(name, Some(codepoint), 0.0);
        for component in components {
            if self.glyphs.get(&component.glyph).is_none() {
                return Err(FontgenError::GlyphNotFound {
                    glyph: component.glyph.to_string(),
                });
            }
            glyph.layer.push_component(Component::new(
                component.glyph.clone(),
                component.transform,
            ));
        }
        self.add_glyph(glyph);
        Ok(())
    }

    fn create_outline(
        &mut self,
        codepoint: u32,
        name: &str,
        paths: Vec<Path>,
        advance_width: f64,
    ) -> Result<(), FontgenError> {
        let mut glyph = Glyph::new(name, Some(codepoint), advance_width);
        glyph.layer.shapes = paths.into_iter().map(Shape::Path).collect();
        self.add_glyph(glyph);
        Ok(())
    }

    fn import_glyph(
        &mut self,
        source: &Self,
        source_codepoint: u32,
        codepoint: u32,
        name: &str,
        scale: f64,
    ) -> Result<(), FontgenError> {
        let original = source.glyphs.get_by_codepoint(source_codepoint).ok_or_else(|| {
            FontgenError::GlyphNotFound {
                glyph: GlyphKey::Codepoint(source_codepoint).to_string(),
            }
        })?;
        // Component references point into the source font, so flatten them
        let layer = original.layer.decomposed(source);
        let transform = Affine::scale(scale);
        let mut glyph = Glyph::new(name, Some(codepoint), layer.width * scale);
        glyph.layer.shapes = layer
            .shapes
            .iter()
            .map(|shape| shape.apply_transform(transform))
            .collect();
        log::debug!(
            "Imported {} as {} from U+{:04X} to U+{:04X} (scale {})",
            original.name,
            glyph.name,
            source_codepoint,
            codepoint,
            scale
        );
        self.add_glyph(glyph);
        Ok(())
    }

    fn set_advance_width(&mut self, key: GlyphKey<'_>, width: f64) -> Result<(), FontgenError> {
        let glyph = match key {
            GlyphKey::Codepoint(cp) => self.glyphs.get_by_codepoint_mut(cp),
            GlyphKey::Name(name) => self.glyphs.get_mut(name),
        }
        .ok_or_else(|| FontgenError::GlyphNotFound {
            glyph: key.to_string(),
        })?;
        glyph.layer.width = width;
        Ok(())
    }

    fn save(&self, path: &FsPath) -> Result<(), FontgenError> {
        Font::save(self, path)
    }
}
