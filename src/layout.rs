use serde::{Deserialize, Serialize};

use crate::atom::{AccidentalAtom, AccidentalKind, AssignedSymbol, AtomId, NoteAtom};

/// An inclusive codepoint range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodepointRange {
    pub name: String,
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
}

impl CodepointRange {
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self {
        CodepointRange {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        (self.start..=self.end).contains(&codepoint)
    }

    pub fn private_use_area() -> Self {
        CodepointRange::new("private_use_area", 0xE000, 0xF8FF)
    }

    pub fn musical_symbols() -> Self {
        CodepointRange::new("musical_symbols", 0x1D100, 0x1D1FF)
    }
}

/// The range of codepoints handed to one accidental kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentalRanges {
    pub accidental: AccidentalKind,
    pub composites: (u32, u32),
    pub octave_composites: (u32, u32),
}

/// The full result of codepoint allocation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodepointLayout {
    pub note_atoms: Vec<NoteAtom>,
    pub symbols: Vec<AssignedSymbol>,
    /// Accidental composites, then combined accidental+octave composites, per kind
    pub accidental_atoms: Vec<AccidentalAtom>,
    pub notes_range: Option<(u32, u32)>,
    pub symbols_range: Option<(u32, u32)>,
    pub accidental_ranges: Vec<AccidentalRanges>,
    pub valid_spaces: Vec<CodepointRange>,
}

impl CodepointLayout {
    /// Every atom in the layout with its assignment, in allocation order
    pub fn assignments(&self) -> impl Iterator<Item = (AtomId, Option<u32>)> + '_ {
        self.note_atoms
            .iter()
            .map(|atom| (atom.id(), atom.assigned_codepoint))
            .chain(
                self.symbols
                    .iter()
                    .map(|symbol| (symbol.id(), symbol.assigned_codepoint)),
            )
            .chain(
                self.accidental_atoms
                    .iter()
                    .map(|atom| (atom.id(), atom.assigned_codepoint)),
            )
    }

    pub fn atom_count(&self) -> usize {
        self.note_atoms.len() + self.symbols.len() + self.accidental_atoms.len()
    }

    /// Note atoms belonging to one system, in allocation order
    pub fn notes_for_system<'a>(&'a self, system: &'a str) -> impl Iterator<Item = &'a NoteAtom> {
        self.note_atoms
            .iter()
            .filter(move |atom| atom.system == system)
    }

    pub fn codepoint_of(&self, id: &AtomId) -> Option<u32> {
        self.assignments()
            .find(|(atom_id, _)| atom_id == id)
            .and_then(|(_, codepoint)| codepoint)
    }
}
