use crate::{shape::Shape, Component, Font, FontgenError, Path};
use kurbo::Shape as KurboShape;
use serde::{Deserialize, Serialize};

/// Nested component references deeper than this are not followed.
const MAX_COMPONENT_DEPTH: usize = 32;

/// The outline of a glyph: its advance width and shapes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub width: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
}

impl Layer {
    pub fn new(width: f64) -> Layer {
        Layer {
            width,
            ..Default::default()
        }
    }

    pub fn components(&self) -> impl DoubleEndedIterator<Item = &Component> {
        self.shapes.iter().filter_map(|x| {
            if let Shape::Component(c) = x {
                Some(c)
            } else {
                None
            }
        })
    }

    pub fn paths(&self) -> impl DoubleEndedIterator<Item = &Path> {
        self.shapes.iter().filter_map(|x| {
            if let Shape::Path(p) = x {
                Some(p)
            } else {
                None
            }
        })
    }

    pub fn push_component(&mut self, c: Component) {
        self.shapes.push(Shape::Component(c))
    }

    pub fn has_components(&self) -> bool {
        self.shapes
            .iter()
            .any(|sh| matches!(sh, Shape::Component(_)))
    }

    /// The outlines of every component, flattened through nested references
    pub fn decomposed_components(&self, font: &Font) -> Vec<Path> {
        let mut contours = Vec::new();

        let mut stack: Vec<(&Component, kurbo::Affine, usize)> = Vec::new();
        for component in self.components() {
            stack.push((component, component.transform, 0));
            while let Some((component, transform, depth)) = stack.pop() {
                if depth >= MAX_COMPONENT_DEPTH {
                    log::warn!(
                        "Component {} nested too deeply, not decomposed",
                        component.reference
                    );
                    continue;
                }
                let referenced_glyph = match font.glyphs.get(&component.reference) {
                    Some(g) => g,
                    None => {
                        log::warn!("Component {} references a missing glyph", component.reference);
                        continue;
                    }
                };
                let outline = &referenced_glyph.layer;
                contours.extend(outline.paths().map(|contour| contour.transformed(transform)));

                // Depth-first decomposition means we need to extend the stack reversed, so
                // the first component is taken out next.
                for nested in outline.components().rev() {
                    stack.push((nested, transform * nested.transform, depth + 1));
                }
            }
        }

        contours
    }

    /// A copy of this layer with every component replaced by its outlines
    pub fn decomposed(&self, font: &Font) -> Layer {
        Layer {
            width: self.width,
            shapes: self
                .paths()
                .cloned()
                .chain(self.decomposed_components(font))
                .map(Shape::Path)
                .collect(),
        }
    }

    /// Ink bounds of the layer including its components, or `None` when it
    /// has no outlines at all.
    pub fn bounds(&self, font: &Font) -> Result<Option<kurbo::Rect>, FontgenError> {
        let decomposed;
        let layer = if self.has_components() {
            decomposed = self.decomposed(font);
            &decomposed
        } else {
            self
        };
        let paths: Result<Vec<kurbo::BezPath>, FontgenError> =
            layer.paths().map(|p| p.to_kurbo()).collect();
        Ok(paths?
            .iter()
            .map(|p| p.bounding_box())
            .reduce(|accum, item| accum.union(item)))
    }
}
