//! The runtime mapping document.
//!
//! This is the contract consumed by lookup clients: for every note atom its
//! system, character, variant name, codepoint and octave shift; for every
//! symbol its name, kind, label and codepoint. Codepoints are written as
//! lowercase `0x` hex strings.

use std::{fmt::Display, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    atom::AccidentalKind, geometry::GeometryConfig, layout::CodepointLayout, spec::AtomSpec,
    FontgenError,
};

pub const MAPPING_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Accidental,
    Barline,
    Bracket,
    Ornament,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SymbolKind::Accidental => "accidental",
            SymbolKind::Barline => "barline",
            SymbolKind::Bracket => "bracket",
            SymbolKind::Ornament => "ornament",
        })
    }
}

/// Classifies symbols by glyph name prefix. The first matching rule wins.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolClassifier {
    rules: Vec<(String, SymbolKind)>,
    fallback: SymbolKind,
}

impl Default for SymbolClassifier {
    fn default() -> Self {
        SymbolClassifier {
            rules: [
                ("accidental", SymbolKind::Accidental),
                ("uni266", SymbolKind::Accidental),
                ("barline", SymbolKind::Barline),
                ("uniE0", SymbolKind::Barline),
                ("bracket", SymbolKind::Bracket),
                ("reversedBracket", SymbolKind::Bracket),
            ]
            .into_iter()
            .map(|(prefix, kind)| (prefix.to_string(), kind))
            .collect(),
            fallback: SymbolKind::Ornament,
        }
    }
}

impl SymbolClassifier {
    pub fn with_rule(mut self, prefix: impl Into<String>, kind: SymbolKind) -> Self {
        self.rules.push((prefix.into(), kind));
        self
    }

    pub fn classify(&self, name: &str) -> SymbolKind {
        self.rules
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix.as_str()))
            .map(|(_, kind)| *kind)
            .unwrap_or(self.fallback)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PuaAllocation {
    #[serde(
        default,
        serialize_with = "crate::serde_helpers::codepoint_hex_option_ser",
        deserialize_with = "crate::serde_helpers::codepoint_option_de"
    )]
    pub notes_start: Option<u32>,
    #[serde(
        default,
        serialize_with = "crate::serde_helpers::codepoint_hex_option_ser",
        deserialize_with = "crate::serde_helpers::codepoint_option_de"
    )]
    pub notes_end: Option<u32>,
    #[serde(
        default,
        serialize_with = "crate::serde_helpers::codepoint_hex_option_ser",
        deserialize_with = "crate::serde_helpers::codepoint_option_de"
    )]
    pub symbols_start: Option<u32>,
    #[serde(
        default,
        serialize_with = "crate::serde_helpers::codepoint_hex_option_ser",
        deserialize_with = "crate::serde_helpers::codepoint_option_de"
    )]
    pub symbols_end: Option<u32>,
    /// Keyed by accidental kind name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub accidentals: IndexMap<String, AccidentalAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentalAllocation {
    #[serde(
        serialize_with = "crate::serde_helpers::codepoint_hex_ser",
        deserialize_with = "crate::serde_helpers::codepoint_de"
    )]
    pub start: u32,
    #[serde(
        serialize_with = "crate::serde_helpers::codepoint_hex_ser",
        deserialize_with = "crate::serde_helpers::codepoint_de"
    )]
    pub end: u32,
    #[serde(
        serialize_with = "crate::serde_helpers::codepoint_hex_ser",
        deserialize_with = "crate::serde_helpers::codepoint_de"
    )]
    pub octave_start: u32,
    #[serde(
        serialize_with = "crate::serde_helpers::codepoint_hex_ser",
        deserialize_with = "crate::serde_helpers::codepoint_de"
    )]
    pub octave_end: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantEntry {
    #[serde(
        serialize_with = "crate::serde_helpers::codepoint_hex_ser",
        deserialize_with = "crate::serde_helpers::codepoint_de"
    )]
    pub codepoint: u32,
    pub octave_shift: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub system: String,
    pub character: char,
    /// Keyed by variant name, e.g. `1_dot_above`
    pub variants: IndexMap<String, VariantEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub label: String,
    #[serde(
        serialize_with = "crate::serde_helpers::codepoint_hex_ser",
        deserialize_with = "crate::serde_helpers::codepoint_de"
    )]
    pub codepoint: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentalEntry {
    pub system: String,
    pub character: char,
    pub accidental: AccidentalKind,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::serde_helpers::codepoint_hex_option_ser",
        deserialize_with = "crate::serde_helpers::codepoint_option_de"
    )]
    pub codepoint: Option<u32>,
    /// Combined accidental+octave composites, keyed by variant name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variants: IndexMap<String, VariantEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSummary {
    pub count: usize,
    pub chars: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_notes: usize,
    pub total_symbols: usize,
    pub total_glyphs: usize,
    pub systems: IndexMap<String, SystemSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub version: String,
    pub generated_from: String,
    pub pua_allocation: PuaAllocation,
    pub notes: Vec<NoteEntry>,
    pub symbols: Vec<SymbolEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accidental_composites: Vec<AccidentalEntry>,
    pub summary: Summary,
}

impl Mapping {
    pub fn from_json_str(json: &str) -> Result<Self, FontgenError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontgenError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, FontgenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FontgenError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_string()? + "\n")?;
        log::info!("Wrote mapping to {}", path.display());
        Ok(())
    }
}

/// Export a layout with the default symbol classifier.
pub fn export(spec: &AtomSpec, layout: &CodepointLayout) -> Mapping {
    export_with(spec, layout, &SymbolClassifier::default())
}

pub fn export_with(
    spec: &AtomSpec,
    layout: &CodepointLayout,
    classifier: &SymbolClassifier,
) -> Mapping {
    let mut notes: IndexMap<(&str, char), NoteEntry> = IndexMap::new();
    for atom in &layout.note_atoms {
        let entry = notes
            .entry((atom.system.as_str(), atom.character))
            .or_insert_with(|| NoteEntry {
                system: atom.system.clone(),
                character: atom.character,
                variants: IndexMap::new(),
            });
        if let Some(codepoint) = atom.assigned_codepoint {
            entry.variants.insert(
                atom.variant.name().to_string(),
                VariantEntry {
                    codepoint,
                    octave_shift: atom.variant.octave_shift(),
                },
            );
        }
    }
    let notes: Vec<NoteEntry> = notes.into_values().collect();

    let symbols: Vec<SymbolEntry> = layout
        .symbols
        .iter()
        .filter_map(|symbol| {
            Some(SymbolEntry {
                name: symbol.spec.name.clone(),
                kind: classifier.classify(&symbol.spec.name),
                label: symbol.spec.label.clone(),
                codepoint: symbol.assigned_codepoint?,
            })
        })
        .collect();

    let mut composites: IndexMap<(AccidentalKind, &str, char), AccidentalEntry> = IndexMap::new();
    for atom in &layout.accidental_atoms {
        let entry = composites
            .entry((atom.accidental, atom.system.as_str(), atom.character))
            .or_insert_with(|| AccidentalEntry {
                system: atom.system.clone(),
                character: atom.character,
                accidental: atom.accidental,
                codepoint: None,
                variants: IndexMap::new(),
            });
        match (atom.variant, atom.assigned_codepoint) {
            (None, codepoint) => entry.codepoint = codepoint,
            (Some(variant), Some(codepoint)) => {
                entry.variants.insert(
                    variant.name().to_string(),
                    VariantEntry {
                        codepoint,
                        octave_shift: variant.octave_shift(),
                    },
                );
            }
            (Some(_), None) => {}
        }
    }

    let pua_allocation = PuaAllocation {
        notes_start: layout.notes_range.map(|(start, _)| start),
        notes_end: layout.notes_range.map(|(_, end)| end),
        symbols_start: layout.symbols_range.map(|(start, _)| start),
        symbols_end: layout.symbols_range.map(|(_, end)| end),
        accidentals: layout
            .accidental_ranges
            .iter()
            .map(|ranges| {
                (
                    ranges.accidental.name().to_string(),
                    AccidentalAllocation {
                        start: ranges.composites.0,
                        end: ranges.composites.1,
                        octave_start: ranges.octave_composites.0,
                        octave_end: ranges.octave_composites.1,
                    },
                )
            })
            .collect(),
    };

    let summary = Summary {
        total_notes: notes.len(),
        total_symbols: symbols.len(),
        total_glyphs: layout.atom_count(),
        systems: spec
            .systems
            .iter()
            .map(|system| {
                (
                    system.name.clone(),
                    SystemSummary {
                        count: system.characters.len(),
                        chars: system.characters.iter().collect(),
                    },
                )
            })
            .collect(),
        geometry: Some(spec.geometry.config.clone()),
    };

    log::info!("Mapping: {} notes, {} symbols", notes.len(), symbols.len());
    Mapping {
        version: MAPPING_VERSION.to_string(),
        generated_from: "atoms.yaml".to_string(),
        pua_allocation,
        notes,
        symbols,
        accidental_composites: composites.into_values().collect(),
        summary,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        allocate,
        atom::{AllocationPolicy, NotationSystem, SymbolSpec},
        spec::AccidentalCompositeSpec,
        validator::Snapshot,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("accidentalSharp", SymbolKind::Accidental)]
    #[case("uni266F", SymbolKind::Accidental)]
    #[case("barlineDouble", SymbolKind::Barline)]
    #[case("uniE030", SymbolKind::Barline)]
    #[case("bracketTop", SymbolKind::Bracket)]
    #[case("reversedBracketTop", SymbolKind::Bracket)]
    #[case("ornamentTrill", SymbolKind::Ornament)]
    #[case("segno", SymbolKind::Ornament)]
    fn test_default_classifier(#[case] name: &str, #[case] expected: SymbolKind) {
        assert_eq!(SymbolClassifier::default().classify(name), expected);
    }

    #[test]
    fn test_added_rule() {
        let classifier = SymbolClassifier::default().with_rule("segno", SymbolKind::Barline);
        assert_eq!(classifier.classify("segno"), SymbolKind::Barline);
        assert_eq!(classifier.classify("coda"), SymbolKind::Ornament);
    }

    fn spec() -> AtomSpec {
        let mut spec = AtomSpec::new(
            vec![
                NotationSystem::new("number", "12"),
                NotationSystem::new("western", "C"),
            ],
            vec![
                SymbolSpec::new("barlineSingle", "Barline (single)", 0x1D100),
                SymbolSpec::new("ornamentTrill", "Trill", 0xE566)
                    .with_policy(AllocationPolicy::Packed),
            ],
            0xE600,
        );
        spec.accidentals = vec![AccidentalCompositeSpec {
            kind: AccidentalKind::Sharp,
            symbol: Some(0x1D130),
            range: None,
            octave_range: None,
        }];
        spec
    }

    #[test]
    fn test_export_shape() {
        let spec = spec();
        let mapping = export(&spec, &allocate(&spec).unwrap());
        let json: serde_json::Value =
            serde_json::from_str(&mapping.to_json_string().unwrap()).unwrap();

        assert_eq!(json["version"], "1.0");
        assert_eq!(json["pua_allocation"]["notes_start"], "0xe600");
        assert_eq!(json["pua_allocation"]["notes_end"], "0xe60b");
        assert_eq!(json["pua_allocation"]["symbols_start"], "0xe60c");
        assert_eq!(json["pua_allocation"]["symbols_end"], "0x1d100");
        assert_eq!(json["pua_allocation"]["accidentals"]["sharp"]["start"], "0xe60d");
        assert_eq!(json["notes"][0]["system"], "number");
        assert_eq!(json["notes"][0]["character"], "1");
        assert_eq!(
            json["notes"][1]["variants"]["2_dots_below"],
            serde_json::json!({"codepoint": "0xe607", "octave_shift": -2})
        );
        assert_eq!(
            json["symbols"][0],
            serde_json::json!({
                "name": "barlineSingle",
                "kind": "barline",
                "label": "Barline (single)",
                "codepoint": "0x1d100"
            })
        );
        assert_eq!(json["symbols"][1]["kind"], "ornament");
        assert_eq!(json["summary"]["total_notes"], 3);
        assert_eq!(json["summary"]["total_symbols"], 2);
        assert_eq!(json["summary"]["total_glyphs"], 12 + 2 + 3 + 12);
        assert_eq!(
            json["summary"]["systems"]["number"],
            serde_json::json!({"count": 2, "chars": "12"})
        );
        assert_eq!(json["summary"]["geometry"]["dot_vertical_step"], 100.0);
    }

    #[test]
    fn test_accidental_entries() {
        let spec = spec();
        let mapping = export(&spec, &allocate(&spec).unwrap());
        assert_eq!(mapping.accidental_composites.len(), 3);
        let first = &mapping.accidental_composites[0];
        assert_eq!(first.character, '1');
        assert_eq!(first.codepoint, Some(0xE60D));
        // Octave composites are packed after the three plain composites
        assert_eq!(first.variants["1_dot_above"].codepoint, 0xE610);
        assert_eq!(
            mapping.accidental_composites[2].variants["2_dots_below"].codepoint,
            0xE610 + 11
        );
    }

    #[test]
    fn test_json_reload_preserves_snapshot() {
        let spec = spec();
        let layout = allocate(&spec).unwrap();
        let mapping = export(&spec, &layout);
        let reloaded = Mapping::from_json_str(&mapping.to_json_string().unwrap()).unwrap();
        assert_eq!(reloaded, mapping);
        assert_eq!(
            Snapshot::from_mapping(&reloaded).unwrap(),
            Snapshot::from_layout(&layout)
        );
    }
}
