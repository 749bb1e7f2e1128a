//! The declarative atom specification.
//!
//! An atoms document lists the notation systems (in allocation order), the
//! geometry block, the imported symbols and the accidental composite
//! configuration. Loading only deserializes and normalizes it; the
//! consistency checks that guard codepoint stability run in [`crate::allocate`].

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    atom::{AccidentalKind, AllocationPolicy, NotationSystem, SymbolSpec, DEFAULT_SYMBOL_SOURCE},
    geometry::{default_dot_nudges, GeometryConfig, GeometryTable},
    layout::CodepointRange,
    FontgenError,
};

pub const DEFAULT_PUA_START: u32 = 0xE600;
pub const DEFAULT_PUA_CEILING: u32 = 0xF8FF;

/// Configuration for the composites of one accidental kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentalCompositeSpec {
    pub kind: AccidentalKind,
    /// Codepoint of the accidental glyph in the font
    pub symbol: Option<u32>,
    /// Explicit range for base+accidental composites; packed when absent
    pub range: Option<(u32, u32)>,
    /// Explicit range for base+accidental+octave composites; packed when absent
    pub octave_range: Option<(u32, u32)>,
}

/// A complete notation specification
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSpec {
    pub systems: Vec<NotationSystem>,
    /// The declared concatenation of every system's characters
    pub character_order: String,
    pub symbols: Vec<SymbolSpec>,
    pub geometry: GeometryTable,
    pub pua_start: u32,
    pub pua_ceiling: u32,
    pub accidentals: Vec<AccidentalCompositeSpec>,
    pub valid_spaces: Vec<CodepointRange>,
}

impl AtomSpec {
    /// Build a specification whose declared character order is the
    /// concatenation of the given systems.
    pub fn new(systems: Vec<NotationSystem>, symbols: Vec<SymbolSpec>, pua_start: u32) -> Self {
        let character_order = systems
            .iter()
            .flat_map(|system| system.characters.iter())
            .collect();
        AtomSpec {
            systems,
            character_order,
            symbols,
            geometry: GeometryTable::default(),
            pua_start,
            pua_ceiling: DEFAULT_PUA_CEILING,
            accidentals: vec![],
            valid_spaces: default_valid_spaces(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, FontgenError> {
        let raw: RawAtomSpec = serde_yaml::from_str(yaml)?;
        raw.try_into()
    }

    /// Number of base characters across all systems
    pub fn character_count(&self) -> usize {
        self.systems.iter().map(|s| s.characters.len()).sum()
    }

    /// Every (system, character) pair in allocation order
    pub fn characters(&self) -> impl Iterator<Item = (&str, char)> {
        self.systems.iter().flat_map(|system| {
            system
                .characters
                .iter()
                .map(move |c| (system.name.as_str(), *c))
        })
    }
}

pub fn default_valid_spaces() -> Vec<CodepointRange> {
    vec![
        CodepointRange::private_use_area(),
        CodepointRange::musical_symbols(),
    ]
}

/// Load an atoms document from a YAML file.
pub fn load_spec(path: impl AsRef<Path>) -> Result<AtomSpec, FontgenError> {
    let path = path.as_ref();
    log::info!("Loading atom specification: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let spec = AtomSpec::from_yaml_str(&content)?;
    for system in &spec.systems {
        log::info!("{}: {} characters", system.name, system.characters.len());
    }
    log::info!(
        "{} symbols, {} accidental kinds, PUA start U+{:04X}",
        spec.symbols.len(),
        spec.accidentals.len(),
        spec.pua_start
    );
    Ok(spec)
}

#[derive(Debug, Deserialize)]
struct RawAtomSpec {
    #[serde(default)]
    notation_systems: Vec<RawSystem>,
    #[serde(default)]
    character_order: String,
    #[serde(default)]
    pua: RawPua,
    #[serde(default)]
    geometry: RawGeometry,
    #[serde(default)]
    symbol_policy: AllocationPolicy,
    #[serde(default)]
    smufl_symbols: Vec<RawSymbol>,
    #[serde(default)]
    accidental_composites: RawAccidentalComposites,
    #[serde(default)]
    valid_spaces: Option<Vec<CodepointRange>>,
}

#[derive(Debug, Deserialize)]
struct RawSystem {
    system_name: String,
    #[serde(default)]
    characters: Vec<RawCharacter>,
}

#[derive(Debug, Deserialize)]
struct RawCharacter {
    char: String,
}

#[derive(Debug, Deserialize)]
struct RawPua {
    #[serde(default = "pua_start", deserialize_with = "crate::serde_helpers::codepoint_de")]
    start: u32,
    #[serde(
        default = "pua_ceiling",
        deserialize_with = "crate::serde_helpers::codepoint_de"
    )]
    ceiling: u32,
}

fn pua_start() -> u32 {
    DEFAULT_PUA_START
}
fn pua_ceiling() -> u32 {
    DEFAULT_PUA_CEILING
}

impl Default for RawPua {
    fn default() -> Self {
        RawPua {
            start: DEFAULT_PUA_START,
            ceiling: DEFAULT_PUA_CEILING,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawGeometry {
    #[serde(default)]
    dots: RawDots,
    #[serde(default)]
    symbols: RawSymbolGeometry,
    #[serde(default)]
    dot_nudges: Option<IndexMap<String, f64>>,
    #[serde(default)]
    system_dot_nudges: IndexMap<String, IndexMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawDots {
    above_gap: f64,
    below_gap: f64,
    vertical_step: f64,
    horizontal_center: bool,
}

impl Default for RawDots {
    fn default() -> Self {
        let defaults = GeometryConfig::default();
        RawDots {
            above_gap: defaults.dot_above_gap,
            below_gap: defaults.dot_below_gap,
            vertical_step: defaults.dot_vertical_step,
            horizontal_center: defaults.dot_horizontal_center,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSymbolGeometry {
    accidental_scale: f64,
    accidental_x_offset: f64,
    accidental_y_offset: f64,
    barline_scale: f64,
    ornament_scale: f64,
}

impl Default for RawSymbolGeometry {
    fn default() -> Self {
        let defaults = GeometryConfig::default();
        RawSymbolGeometry {
            accidental_scale: defaults.accidental_scale,
            accidental_x_offset: defaults.accidental_x_offset,
            accidental_y_offset: defaults.accidental_y_offset,
            barline_scale: defaults.barline_scale,
            ornament_scale: defaults.ornament_scale,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSymbol {
    glyph_name: String,
    #[serde(default)]
    label: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::codepoint_option_de")]
    smufl_codepoint: Option<u32>,
    #[serde(default)]
    codepoint_offset: Option<u32>,
    #[serde(default)]
    policy: Option<AllocationPolicy>,
    #[serde(default)]
    source_font: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAccidentalComposites {
    #[serde(default)]
    types: IndexMap<String, RawAccidentalType>,
}

#[derive(Debug, Deserialize)]
struct RawAccidentalType {
    #[serde(default, deserialize_with = "crate::serde_helpers::codepoint_option_de")]
    smufl_symbol: Option<u32>,
    #[serde(
        default,
        deserialize_with = "crate::serde_helpers::codepoint_range_option_de"
    )]
    range: Option<(u32, u32)>,
    #[serde(
        default,
        deserialize_with = "crate::serde_helpers::codepoint_range_option_de"
    )]
    octave_range: Option<(u32, u32)>,
}

fn single_char(s: &str, context: &str) -> Result<char, FontgenError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(FontgenError::invalid_spec(format!(
            "{}: expected a single character, got '{}'",
            context, s
        ))),
    }
}

fn nudge_map(
    raw: &IndexMap<String, f64>,
    context: &str,
) -> Result<IndexMap<char, f64>, FontgenError> {
    raw.iter()
        .map(|(k, v)| Ok((single_char(k, context)?, *v)))
        .collect()
}

impl TryFrom<RawAtomSpec> for AtomSpec {
    type Error = FontgenError;

    fn try_from(raw: RawAtomSpec) -> Result<Self, Self::Error> {
        let systems = raw
            .notation_systems
            .iter()
            .map(|system| {
                let characters = system
                    .characters
                    .iter()
                    .map(|c| single_char(&c.char, &format!("System {}", system.system_name)))
                    .collect::<Result<Vec<char>, _>>()?;
                Ok(NotationSystem {
                    name: system.system_name.clone(),
                    characters,
                })
            })
            .collect::<Result<Vec<_>, FontgenError>>()?;

        let symbols = raw
            .smufl_symbols
            .into_iter()
            .map(|symbol| {
                if symbol.glyph_name.trim().is_empty() {
                    return Err(FontgenError::invalid_spec("Symbol with an empty glyph_name"));
                }
                Ok(SymbolSpec {
                    label: if symbol.label.is_empty() {
                        symbol.glyph_name.clone()
                    } else {
                        symbol.label
                    },
                    name: symbol.glyph_name,
                    source_codepoint: symbol.smufl_codepoint.unwrap_or(0),
                    codepoint_offset: symbol.codepoint_offset,
                    policy: symbol.policy.unwrap_or(raw.symbol_policy),
                    source: symbol
                        .source_font
                        .unwrap_or_else(|| DEFAULT_SYMBOL_SOURCE.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let accidentals = raw
            .accidental_composites
            .types
            .into_iter()
            .map(|(name, config)| {
                Ok(AccidentalCompositeSpec {
                    kind: name.parse()?,
                    symbol: config.smufl_symbol,
                    range: config.range,
                    octave_range: config.octave_range,
                })
            })
            .collect::<Result<Vec<_>, FontgenError>>()?;

        let dot_nudges = match &raw.geometry.dot_nudges {
            Some(map) => nudge_map(map, "geometry.dot_nudges")?,
            None => default_dot_nudges(),
        };
        let system_dot_nudges = raw
            .geometry
            .system_dot_nudges
            .iter()
            .map(|(system, map)| {
                Ok((
                    system.clone(),
                    nudge_map(map, &format!("geometry.system_dot_nudges.{}", system))?,
                ))
            })
            .collect::<Result<IndexMap<_, _>, FontgenError>>()?;
        let dots = &raw.geometry.dots;
        let sym = &raw.geometry.symbols;
        let geometry = GeometryTable {
            config: GeometryConfig {
                dot_above_gap: dots.above_gap,
                dot_below_gap: dots.below_gap,
                dot_vertical_step: dots.vertical_step,
                dot_horizontal_center: dots.horizontal_center,
                accidental_scale: sym.accidental_scale,
                accidental_x_offset: sym.accidental_x_offset,
                accidental_y_offset: sym.accidental_y_offset,
                barline_scale: sym.barline_scale,
                ornament_scale: sym.ornament_scale,
            },
            dot_nudges,
            system_dot_nudges,
        };

        Ok(AtomSpec {
            systems,
            character_order: raw.character_order,
            symbols,
            geometry,
            pua_start: raw.pua.start,
            pua_ceiling: raw.pua.ceiling,
            accidentals,
            valid_spaces: raw.valid_spaces.unwrap_or_else(default_valid_spaces),
        })
    }
}
