//! Composite glyph placement.
//!
//! Every overlay transform is computed from the base character's own
//! metrics and the overlay glyph's metrics alone, so overlays never
//! influence each other and the composite always keeps the base advance
//! width.

use kurbo::{Affine, Rect};
use smol_str::SmolStr;

use crate::{
    atom::{AccidentalKind, OctaveVariant},
    geometry::{GeometryTable, DOT_CENTER_NUDGE, DOT_HEIGHT_ADJUSTMENT, DOUBLE_DOT_SCALE},
};

/// The ink bounding box and advance width of a glyph
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMetrics {
    pub name: SmolStr,
    pub bbox: Rect,
    pub advance_width: f64,
}

impl GlyphMetrics {
    pub fn new(name: impl Into<SmolStr>, bbox: Rect, advance_width: f64) -> Self {
        GlyphMetrics {
            name: name.into(),
            bbox,
            advance_width,
        }
    }
}

/// A base character of a notation system together with its glyph metrics
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterMetrics {
    pub system: String,
    pub character: char,
    pub glyph: GlyphMetrics,
}

/// An overlay to place on top of a base character
#[derive(Debug, Clone, PartialEq)]
pub enum OverlaySpec {
    OctaveDots {
        variant: OctaveVariant,
        dot: GlyphMetrics,
    },
    Accidental {
        kind: AccidentalKind,
        glyph: GlyphMetrics,
    },
}

/// A positioned reference to another glyph
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRef {
    pub glyph: SmolStr,
    pub transform: Affine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeGlyph {
    /// The base reference first, then overlays in the order requested
    pub components: Vec<ComponentRef>,
    pub advance_width: f64,
}

/// Horizontal offset of an octave dot over `base`.
pub fn dot_x_offset(base: &CharacterMetrics, dot: &Rect, geometry: &GeometryTable) -> f64 {
    let bbox = base.glyph.bbox;
    let base_width = bbox.width();
    let x = if geometry.config.dot_horizontal_center {
        bbox.x0 + (base_width - dot.width()) / 2.0 - dot.x0 + dot.width() * DOT_CENTER_NUDGE
    } else {
        bbox.x0 - dot.x0
    };
    x + geometry.dot_nudge(Some(&base.system), base.character) * base_width
}

/// Transforms for the dot (or two dots) of an octave variant.
pub fn dot_placements(
    base: &CharacterMetrics,
    variant: OctaveVariant,
    dot: &Rect,
    geometry: &GeometryTable,
) -> Vec<Affine> {
    let bbox = base.glyph.bbox;
    let adjustment = bbox.height() * DOT_HEIGHT_ADJUSTMENT;
    let x = dot_x_offset(base, dot, geometry);
    let y = if variant.is_above() {
        bbox.y1 - dot.y0 + geometry.config.dot_above_gap + adjustment
    } else {
        bbox.y0 - dot.y1 - geometry.config.dot_below_gap - adjustment
    };
    if variant.dot_count() == 1 {
        return vec![Affine::translate((x, y))];
    }
    let spacing = 2.0 * dot.height() * DOUBLE_DOT_SCALE;
    let second = if variant.is_above() {
        y + spacing
    } else {
        y - spacing
    };
    [y, second]
        .into_iter()
        .map(|y| Affine::new([DOUBLE_DOT_SCALE, 0.0, 0.0, DOUBLE_DOT_SCALE, x, y]))
        .collect()
}

/// Transform placing an accidental to the right of `base`, vertically centered.
pub fn accidental_placement(
    base: &CharacterMetrics,
    accidental: &Rect,
    geometry: &GeometryTable,
) -> Affine {
    let bbox = base.glyph.bbox;
    let config = &geometry.config;
    let x = bbox.x1 - accidental.x0 + config.accidental_x_offset;
    let y = (bbox.y1 + bbox.y0 - accidental.y1 - accidental.y0) / 2.0 + config.accidental_y_offset;
    let scale = config.accidental_scale;
    Affine::new([scale, 0.0, 0.0, scale, x, y])
}

/// Build the composite for `base` with the given overlays.
pub fn resolve(
    base: &CharacterMetrics,
    overlays: &[OverlaySpec],
    geometry: &GeometryTable,
) -> CompositeGlyph {
    let mut components = vec![ComponentRef {
        glyph: base.glyph.name.clone(),
        transform: Affine::IDENTITY,
    }];
    for overlay in overlays {
        match overlay {
            OverlaySpec::OctaveDots { variant, dot } => {
                components.extend(
                    dot_placements(base, *variant, &dot.bbox, geometry)
                        .into_iter()
                        .map(|transform| ComponentRef {
                            glyph: dot.name.clone(),
                            transform,
                        }),
                );
            }
            OverlaySpec::Accidental { glyph, .. } => components.push(ComponentRef {
                glyph: glyph.name.clone(),
                transform: accidental_placement(base, &glyph.bbox, geometry),
            }),
        }
    }
    CompositeGlyph {
        components,
        advance_width: base.glyph.advance_width,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::geometry::GeometryConfig;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn coeffs(affine: &Affine) -> [f64; 6] {
        affine.as_coeffs()
    }

    fn base(character: char) -> CharacterMetrics {
        CharacterMetrics {
            system: "number".to_string(),
            character,
            glyph: GlyphMetrics::new("one", Rect::new(10.0, 0.0, 90.0, 700.0), 120.0),
        }
    }

    fn dot() -> GlyphMetrics {
        GlyphMetrics::new("period", Rect::new(0.0, 0.0, 40.0, 40.0), 60.0)
    }

    fn sharp() -> GlyphMetrics {
        GlyphMetrics::new("sharp", Rect::new(5.0, -100.0, 65.0, 500.0), 70.0)
    }

    #[test]
    fn test_one_dot_above() {
        let composite = resolve(
            &base('1'),
            &[OverlaySpec::OctaveDots {
                variant: OctaveVariant::OneDotAbove,
                dot: dot(),
            }],
            &GeometryTable::default(),
        );
        assert_eq!(composite.components.len(), 2);
        assert_eq!(composite.components[0].transform, Affine::IDENTITY);
        let [a, _, _, d, x, y] = coeffs(&composite.components[1].transform);
        assert_eq!((a, d), (1.0, 1.0));
        // 10 + (80 - 40) / 2 - 0 + 40 * 0.8
        assert_close(x, 62.0);
        // 700 - 0 + 50 + 700 * 0.05
        assert_close(y, 785.0);
    }

    #[test]
    fn test_one_dot_below() {
        let placements = dot_placements(
            &base('1'),
            OctaveVariant::OneDotBelow,
            &dot().bbox,
            &GeometryTable::default(),
        );
        let [_, _, _, _, x, y] = coeffs(&placements[0]);
        assert_close(x, 62.0);
        // 0 - 40 - 50 - 35
        assert_close(y, -125.0);
    }

    #[rstest]
    #[case(OctaveVariant::TwoDotsAbove, 785.0, 785.0 + 48.0)]
    #[case(OctaveVariant::TwoDotsBelow, -125.0, -125.0 - 48.0)]
    fn test_two_dots(#[case] variant: OctaveVariant, #[case] first: f64, #[case] second: f64) {
        let placements =
            dot_placements(&base('1'), variant, &dot().bbox, &GeometryTable::default());
        assert_eq!(placements.len(), 2);
        let [a0, _, _, d0, x0, y0] = coeffs(&placements[0]);
        let [a1, _, _, _, x1, y1] = coeffs(&placements[1]);
        assert_eq!((a0, d0, a1), (DOUBLE_DOT_SCALE, DOUBLE_DOT_SCALE, DOUBLE_DOT_SCALE));
        assert_close(x0, 62.0);
        assert_close(x1, 62.0);
        assert_close(y0, first);
        assert_close(y1, second);
    }

    #[rstest]
    #[case('2', 62.0 - 8.0)]
    #[case('3', 62.0 - 80.0 * 0.17)]
    #[case('4', 62.0 + 3.2)]
    #[case('7', 62.0 - 3.2)]
    fn test_character_nudges(#[case] character: char, #[case] expected: f64) {
        let x = dot_x_offset(&base(character), &dot().bbox, &GeometryTable::default());
        assert_close(x, expected);
    }

    #[test]
    fn test_uncentered_dot() {
        let geometry = GeometryTable::new(GeometryConfig {
            dot_horizontal_center: false,
            ..Default::default()
        });
        let dot = Rect::new(5.0, 0.0, 45.0, 40.0);
        assert_close(dot_x_offset(&base('1'), &dot, &geometry), 5.0);
        assert_close(dot_x_offset(&base('2'), &dot, &geometry), 5.0 - 8.0);
    }

    #[test]
    fn test_accidental_placement() {
        let geometry = GeometryTable::new(GeometryConfig {
            accidental_scale: 0.8,
            accidental_x_offset: 10.0,
            accidental_y_offset: -5.0,
            ..Default::default()
        });
        let [a, b, c, d, x, y] = coeffs(&accidental_placement(&base('1'), &sharp().bbox, &geometry));
        assert_eq!((a, b, c, d), (0.8, 0.0, 0.0, 0.8));
        // 90 - 5 + 10
        assert_close(x, 95.0);
        // (700 + 0 - 500 + 100) / 2 - 5
        assert_close(y, 145.0);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![OverlaySpec::OctaveDots { variant: OctaveVariant::TwoDotsBelow, dot: dot() }])]
    #[case(vec![OverlaySpec::Accidental { kind: AccidentalKind::Sharp, glyph: sharp() }])]
    #[case(vec![
        OverlaySpec::Accidental { kind: AccidentalKind::Sharp, glyph: sharp() },
        OverlaySpec::OctaveDots { variant: OctaveVariant::TwoDotsAbove, dot: dot() },
    ])]
    fn test_width_is_base_width(#[case] overlays: Vec<OverlaySpec>) {
        let composite = resolve(&base('5'), &overlays, &GeometryTable::default());
        assert_eq!(composite.advance_width, 120.0);
    }

    #[test]
    fn test_overlays_are_independent() {
        let geometry = GeometryTable::default();
        let accidental = OverlaySpec::Accidental {
            kind: AccidentalKind::Flat,
            glyph: sharp(),
        };
        let dots = OverlaySpec::OctaveDots {
            variant: OctaveVariant::OneDotAbove,
            dot: dot(),
        };
        let alone = resolve(&base('3'), &[accidental.clone()], &geometry);
        let combined = resolve(&base('3'), &[accidental, dots.clone()], &geometry);
        let dots_only = resolve(&base('3'), &[dots], &geometry);

        assert_eq!(combined.components[1], alone.components[1]);
        assert_eq!(combined.components[2], dots_only.components[1]);
        assert_eq!(
            combined
                .components
                .iter()
                .map(|c| c.glyph.as_str())
                .collect::<Vec<_>>(),
            vec!["one", "sharp", "period"]
        );
    }
}
