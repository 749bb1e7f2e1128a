use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Octave dots sit this fraction of the base glyph's ink height further away
/// from the glyph than the configured gap.
pub const DOT_HEIGHT_ADJUSTMENT: f64 = 0.05;
/// Scale applied to each dot of a two-dot octave mark.
pub const DOUBLE_DOT_SCALE: f64 = 0.6;
/// Horizontal nudge applied after centering, as a fraction of the dot's width.
pub const DOT_CENTER_NUDGE: f64 = 0.8;

/// Scalar positioning parameters for dots and imported symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub dot_above_gap: f64,
    pub dot_below_gap: f64,
    /// Loaded and exported, but placement derives double-dot spacing from
    /// the dot height instead.
    pub dot_vertical_step: f64,
    pub dot_horizontal_center: bool,
    pub accidental_scale: f64,
    pub accidental_x_offset: f64,
    pub accidental_y_offset: f64,
    pub barline_scale: f64,
    pub ornament_scale: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            dot_above_gap: 50.0,
            dot_below_gap: 50.0,
            dot_vertical_step: 100.0,
            dot_horizontal_center: true,
            accidental_scale: 1.0,
            accidental_x_offset: 0.0,
            accidental_y_offset: 0.0,
            barline_scale: 1.0,
            ornament_scale: 1.0,
        }
    }
}

/// Hand-tuned horizontal dot corrections, as a signed fraction of the base
/// character's ink width. Positive moves right.
pub fn default_dot_nudges() -> IndexMap<char, f64> {
    IndexMap::from([
        ('2', -0.10),
        ('3', -0.17),
        ('5', -0.17),
        ('6', -0.17),
        ('4', 0.04),
        ('7', -0.04),
    ])
}

/// The geometry configuration plus the sparse per-character override maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryTable {
    pub config: GeometryConfig,
    pub dot_nudges: IndexMap<char, f64>,
    /// Consulted before `dot_nudges`; keyed by system name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub system_dot_nudges: IndexMap<String, IndexMap<char, f64>>,
}

impl Default for GeometryTable {
    fn default() -> Self {
        GeometryTable {
            config: GeometryConfig::default(),
            dot_nudges: default_dot_nudges(),
            system_dot_nudges: IndexMap::new(),
        }
    }
}

impl GeometryTable {
    pub fn new(config: GeometryConfig) -> Self {
        GeometryTable {
            config,
            ..Default::default()
        }
    }

    /// The dot nudge fraction for `character`, with system overrides first.
    pub fn dot_nudge(&self, system: Option<&str>, character: char) -> f64 {
        system
            .and_then(|name| self.system_dot_nudges.get(name))
            .and_then(|nudges| nudges.get(&character))
            .or_else(|| self.dot_nudges.get(&character))
            .copied()
            .unwrap_or(0.0)
    }
}
