use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::FontgenError;

/// One of the four octave-dot variants of a base character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OctaveVariant {
    #[serde(rename = "1_dot_above")]
    OneDotAbove,
    #[serde(rename = "2_dots_above")]
    TwoDotsAbove,
    #[serde(rename = "1_dot_below")]
    OneDotBelow,
    #[serde(rename = "2_dots_below")]
    TwoDotsBelow,
}

impl OctaveVariant {
    /// All variants in allocation order
    pub const ALL: [OctaveVariant; 4] = [
        OctaveVariant::OneDotAbove,
        OctaveVariant::TwoDotsAbove,
        OctaveVariant::OneDotBelow,
        OctaveVariant::TwoDotsBelow,
    ];

    pub fn index(&self) -> usize {
        match self {
            OctaveVariant::OneDotAbove => 0,
            OctaveVariant::TwoDotsAbove => 1,
            OctaveVariant::OneDotBelow => 2,
            OctaveVariant::TwoDotsBelow => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            OctaveVariant::OneDotAbove => "1_dot_above",
            OctaveVariant::TwoDotsAbove => "2_dots_above",
            OctaveVariant::OneDotBelow => "1_dot_below",
            OctaveVariant::TwoDotsBelow => "2_dots_below",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|variant| variant.name() == name)
    }

    pub fn octave_shift(&self) -> i8 {
        match self {
            OctaveVariant::OneDotAbove => 1,
            OctaveVariant::TwoDotsAbove => 2,
            OctaveVariant::OneDotBelow => -1,
            OctaveVariant::TwoDotsBelow => -2,
        }
    }

    pub fn dot_count(&self) -> usize {
        self.octave_shift().unsigned_abs() as usize
    }

    pub fn is_above(&self) -> bool {
        self.octave_shift() > 0
    }
}

impl Display for OctaveVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Accidental overlay types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccidentalKind {
    Sharp,
    Flat,
    DoubleSharp,
    DoubleFlat,
}

impl AccidentalKind {
    pub fn name(&self) -> &'static str {
        match self {
            AccidentalKind::Sharp => "sharp",
            AccidentalKind::Flat => "flat",
            AccidentalKind::DoubleSharp => "double_sharp",
            AccidentalKind::DoubleFlat => "double_flat",
        }
    }
}

impl Display for AccidentalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccidentalKind {
    type Err = FontgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sharp" => Ok(AccidentalKind::Sharp),
            "flat" => Ok(AccidentalKind::Flat),
            "double_sharp" => Ok(AccidentalKind::DoubleSharp),
            "double_flat" => Ok(AccidentalKind::DoubleFlat),
            _ => Err(FontgenError::invalid_spec(format!(
                "Unknown accidental kind: {}",
                s
            ))),
        }
    }
}

/// How a symbol receives its codepoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Land at the symbol's externally recognized codepoint
    #[default]
    Standard,
    /// Take a slot in the private range directly after the notes
    Packed,
}

/// A named ordered sequence of base characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotationSystem {
    pub name: String,
    pub characters: Vec<char>,
}

impl NotationSystem {
    pub fn new(name: impl Into<String>, characters: &str) -> Self {
        NotationSystem {
            name: name.into(),
            characters: characters.chars().collect(),
        }
    }
}

/// An imported symbol: accidental, barline or ornament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub name: String,
    pub label: String,
    pub source_codepoint: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codepoint_offset: Option<u32>,
    pub policy: AllocationPolicy,
    /// Name of the font the glyph is imported from
    pub source: String,
}

pub const DEFAULT_SYMBOL_SOURCE: &str = "noto_music";

impl SymbolSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, source_codepoint: u32) -> Self {
        SymbolSpec {
            name: name.into(),
            label: label.into(),
            source_codepoint,
            codepoint_offset: None,
            policy: AllocationPolicy::Standard,
            source: DEFAULT_SYMBOL_SOURCE.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// One octave-dot variant of one base character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAtom {
    pub system: String,
    pub character: char,
    pub variant: OctaveVariant,
    pub assigned_codepoint: Option<u32>,
}

/// A symbol together with the codepoint it was given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedSymbol {
    pub spec: SymbolSpec,
    pub assigned_codepoint: Option<u32>,
}

/// A base character with an accidental overlay, and optionally octave dots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentalAtom {
    pub system: String,
    pub character: char,
    pub accidental: AccidentalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<OctaveVariant>,
    pub assigned_codepoint: Option<u32>,
}

/// Stable identity of an allocatable atom, used for reporting and snapshots
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AtomId {
    Note {
        system: String,
        character: char,
        variant: OctaveVariant,
    },
    Symbol {
        name: String,
    },
    Accidental {
        system: String,
        character: char,
        accidental: AccidentalKind,
        variant: Option<OctaveVariant>,
    },
}

impl Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomId::Note {
                system,
                character,
                variant,
            } => write!(f, "note {}/'{}'/{}", system, character, variant),
            AtomId::Symbol { name } => write!(f, "symbol {}", name),
            AtomId::Accidental {
                system,
                character,
                accidental,
                variant: None,
            } => write!(f, "{} {}/'{}'", accidental, system, character),
            AtomId::Accidental {
                system,
                character,
                accidental,
                variant: Some(variant),
            } => write!(f, "{} {}/'{}'/{}", accidental, system, character, variant),
        }
    }
}

impl NoteAtom {
    /// Glyph name used when the composite is materialized
    pub fn glyph_name(&self) -> String {
        format!("{}_{}_v{}", self.system, self.character, self.variant.index())
    }

    pub fn id(&self) -> AtomId {
        AtomId::Note {
            system: self.system.clone(),
            character: self.character,
            variant: self.variant,
        }
    }
}

impl AssignedSymbol {
    pub fn id(&self) -> AtomId {
        AtomId::Symbol {
            name: self.spec.name.clone(),
        }
    }
}

impl AccidentalAtom {
    pub fn id(&self) -> AtomId {
        AtomId::Accidental {
            system: self.system.clone(),
            character: self.character,
            accidental: self.accidental,
            variant: self.variant,
        }
    }

    /// Glyph name used when the composite is materialized
    pub fn glyph_name(&self) -> String {
        match self.variant {
            Some(variant) => format!(
                "{}_{}_{}_{}",
                self.system, self.character, self.accidental, variant
            ),
            None => format!("{}_{}_{}", self.system, self.character, self.accidental),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_variant_semantics() {
        let shifts: Vec<i8> = OctaveVariant::ALL.iter().map(|v| v.octave_shift()).collect();
        assert_eq!(shifts, vec![1, 2, -1, -2]);
        for (ix, variant) in OctaveVariant::ALL.iter().enumerate() {
            assert_eq!(variant.index(), ix);
            assert_eq!(OctaveVariant::from_index(ix), Some(*variant));
        }
        assert_eq!(OctaveVariant::from_index(4), None);
        assert_eq!(OctaveVariant::TwoDotsBelow.dot_count(), 2);
        assert!(!OctaveVariant::OneDotBelow.is_above());
    }

    #[test]
    fn test_variant_serializes_as_name() {
        let serialized = serde_json::to_string(&OctaveVariant::TwoDotsAbove).unwrap();
        assert_eq!(serialized, r#""2_dots_above""#);
    }

    #[test]
    fn test_accidental_from_str() {
        assert_eq!(
            "double-sharp".parse::<AccidentalKind>().unwrap(),
            AccidentalKind::DoubleSharp
        );
        assert!("natural".parse::<AccidentalKind>().is_err());
    }

    #[test]
    fn test_atom_id_display() {
        let atom = AccidentalAtom {
            system: "number".to_string(),
            character: '1',
            accidental: AccidentalKind::Sharp,
            variant: Some(OctaveVariant::OneDotBelow),
            assigned_codepoint: None,
        };
        assert_eq!(atom.id().to_string(), "sharp number/'1'/1_dot_below");
        assert_eq!(atom.glyph_name(), "number_1_sharp_1_dot_below");
    }
}
