use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    path::Path,
};

use indexmap::IndexMap;

use crate::{
    atom::{AccidentalKind, AtomId, OctaveVariant},
    layout::CodepointLayout,
    mapping::Mapping,
    FontgenError,
};

/// A single problem found in a codepoint layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Unassigned(AtomId),
    Duplicate {
        codepoint: u32,
        atoms: Vec<AtomId>,
    },
    OutOfRange {
        atom: AtomId,
        codepoint: u32,
    },
    IncompleteVariants {
        system: String,
        character: char,
        found: Vec<OctaveVariant>,
    },
    NonContiguous {
        system: String,
        after: u32,
        next: u32,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Unassigned(atom) => write!(f, "{} has no codepoint", atom),
            Violation::Duplicate { codepoint, atoms } => write!(
                f,
                "U+{:04X} assigned to {}",
                codepoint,
                atoms
                    .iter()
                    .map(|atom| atom.to_string())
                    .collect::<Vec<_>>()
                    .join(" and ")
            ),
            Violation::OutOfRange { atom, codepoint } => write!(
                f,
                "{} at U+{:04X} is outside every valid codepoint space",
                atom, codepoint
            ),
            Violation::IncompleteVariants {
                system,
                character,
                found,
            } => write!(
                f,
                "{}/'{}' must have each octave variant exactly once, found [{}]",
                system,
                character,
                found
                    .iter()
                    .map(|v| v.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Violation::NonContiguous { system, after, next } => write!(
                f,
                "{} notes are not contiguous: U+{:04X} is followed by U+{:04X}",
                system, after, next
            ),
        }
    }
}

/// A codepoint that moved relative to the golden snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    Changed {
        atom: AtomId,
        golden: u32,
        current: u32,
    },
    Removed {
        atom: AtomId,
        golden: u32,
    },
}

impl Drift {
    pub fn atom(&self) -> &AtomId {
        match self {
            Drift::Changed { atom, .. } | Drift::Removed { atom, .. } => atom,
        }
    }
}

impl Display for Drift {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Drift::Changed {
                atom,
                golden,
                current,
            } => write!(
                f,
                "{} moved from U+{:04X} to U+{:04X}",
                atom, golden, current
            ),
            Drift::Removed { atom, golden } => {
                write!(f, "{} (golden U+{:04X}) is no longer allocated", atom, golden)
            }
        }
    }
}

fn unassigned(layout: &CodepointLayout) -> Vec<Violation> {
    layout
        .assignments()
        .filter(|(_, codepoint)| codepoint.is_none())
        .map(|(atom, _)| Violation::Unassigned(atom))
        .collect()
}

fn duplicates(layout: &CodepointLayout) -> Vec<Violation> {
    let mut by_codepoint: BTreeMap<u32, Vec<AtomId>> = BTreeMap::new();
    for (atom, codepoint) in layout.assignments() {
        if let Some(codepoint) = codepoint {
            by_codepoint.entry(codepoint).or_default().push(atom);
        }
    }
    by_codepoint
        .into_iter()
        .filter(|(_, atoms)| atoms.len() > 1)
        .map(|(codepoint, atoms)| Violation::Duplicate { codepoint, atoms })
        .collect()
}

fn out_of_range(layout: &CodepointLayout) -> Vec<Violation> {
    layout
        .assignments()
        .filter_map(|(atom, codepoint)| {
            let codepoint = codepoint?;
            (!layout
                .valid_spaces
                .iter()
                .any(|space| space.contains(codepoint)))
            .then_some(Violation::OutOfRange { atom, codepoint })
        })
        .collect()
}

fn incomplete_variants(layout: &CodepointLayout) -> Vec<Violation> {
    let mut found: IndexMap<(&str, char), Vec<OctaveVariant>> = IndexMap::new();
    for atom in &layout.note_atoms {
        found
            .entry((atom.system.as_str(), atom.character))
            .or_default()
            .push(atom.variant);
    }
    found
        .into_iter()
        .filter_map(|((system, character), mut variants)| {
            variants.sort();
            (variants != OctaveVariant::ALL).then(|| Violation::IncompleteVariants {
                system: system.to_string(),
                character,
                found: variants,
            })
        })
        .collect()
}

fn non_contiguous(layout: &CodepointLayout) -> Vec<Violation> {
    let mut by_system: IndexMap<&str, Vec<u32>> = IndexMap::new();
    for atom in &layout.note_atoms {
        if let Some(codepoint) = atom.assigned_codepoint {
            by_system
                .entry(atom.system.as_str())
                .or_default()
                .push(codepoint);
        }
    }
    let mut violations = vec![];
    for (system, mut codepoints) in by_system {
        codepoints.sort_unstable();
        codepoints.dedup();
        for pair in codepoints.windows(2) {
            if pair[1] != pair[0] + 1 {
                violations.push(Violation::NonContiguous {
                    system: system.to_string(),
                    after: pair[0],
                    next: pair[1],
                });
            }
        }
    }
    violations
}

/// Check a layout for unassigned atoms, duplicate codepoints, codepoints
/// outside the valid spaces, incomplete octave variant sets and gaps in a
/// system's note range.
///
/// Every check runs independently and all violations are reported together.
pub fn validate(layout: &CodepointLayout) -> Result<(), FontgenError> {
    let violations: Vec<Violation> = [
        unassigned(layout),
        duplicates(layout),
        out_of_range(layout),
        incomplete_variants(layout),
        non_contiguous(layout),
    ]
    .into_iter()
    .flatten()
    .collect();
    if violations.is_empty() {
        log::info!("Layout of {} atoms is valid", layout.atom_count());
        Ok(())
    } else {
        Err(FontgenError::Validation(violations))
    }
}

/// A captured atom → codepoint assignment, used to detect drift
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(pub BTreeMap<AtomId, u32>);

impl Snapshot {
    pub fn from_layout(layout: &CodepointLayout) -> Self {
        Snapshot(
            layout
                .assignments()
                .filter_map(|(atom, codepoint)| Some((atom, codepoint?)))
                .collect(),
        )
    }

    /// Rebuild a snapshot from a previously exported mapping document
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, FontgenError> {
        let variant = |name: &str| {
            OctaveVariant::from_name(name).ok_or_else(|| {
                FontgenError::invalid_spec(format!("Unknown octave variant in mapping: {}", name))
            })
        };
        let mut snapshot = BTreeMap::new();
        for note in &mapping.notes {
            for (name, entry) in &note.variants {
                snapshot.insert(
                    AtomId::Note {
                        system: note.system.clone(),
                        character: note.character,
                        variant: variant(name)?,
                    },
                    entry.codepoint,
                );
            }
        }
        for symbol in &mapping.symbols {
            snapshot.insert(
                AtomId::Symbol {
                    name: symbol.name.clone(),
                },
                symbol.codepoint,
            );
        }
        for composite in &mapping.accidental_composites {
            let accidental: AccidentalKind = composite.accidental;
            if let Some(codepoint) = composite.codepoint {
                snapshot.insert(
                    AtomId::Accidental {
                        system: composite.system.clone(),
                        character: composite.character,
                        accidental,
                        variant: None,
                    },
                    codepoint,
                );
            }
            for (name, entry) in &composite.variants {
                snapshot.insert(
                    AtomId::Accidental {
                        system: composite.system.clone(),
                        character: composite.character,
                        accidental,
                        variant: Some(variant(name)?),
                    },
                    entry.codepoint,
                );
            }
        }
        Ok(Snapshot(snapshot))
    }

    /// Load a golden snapshot from a mapping JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontgenError> {
        Self::from_mapping(&Mapping::load(path)?)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compare a layout against a golden snapshot.
///
/// Every atom of the snapshot must keep its codepoint. Atoms that are new
/// in the layout are allowed, so appending characters never drifts.
pub fn check_drift(layout: &CodepointLayout, golden: &Snapshot) -> Result<(), FontgenError> {
    let current = Snapshot::from_layout(layout);
    let drifts: Vec<Drift> = golden
        .0
        .iter()
        .filter_map(|(atom, &golden)| match current.0.get(atom) {
            Some(&now) if now == golden => None,
            Some(&now) => Some(Drift::Changed {
                atom: atom.clone(),
                golden,
                current: now,
            }),
            None => Some(Drift::Removed {
                atom: atom.clone(),
                golden,
            }),
        })
        .collect();
    if drifts.is_empty() {
        log::info!(
            "No drift against golden snapshot ({} atoms, {} new)",
            golden.len(),
            current.len().saturating_sub(golden.len())
        );
        Ok(())
    } else {
        Err(FontgenError::CodepointDrift(drifts))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        allocate,
        atom::{NotationSystem, SymbolSpec},
        spec::AtomSpec,
    };
    use pretty_assertions::assert_eq;

    fn spec() -> AtomSpec {
        AtomSpec::new(
            vec![
                NotationSystem::new("number", "1234567"),
                NotationSystem::new("western", "CDE"),
            ],
            vec![SymbolSpec::new("barlineSingle", "Barline (single)", 0x1D100)],
            0xE000,
        )
    }

    fn violations(layout: &CodepointLayout) -> Vec<Violation> {
        match validate(layout) {
            Err(FontgenError::Validation(violations)) => violations,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_allocated_layout_is_valid() {
        let layout = allocate(&spec()).unwrap();
        assert!(validate(&layout).is_ok());
    }

    #[test]
    fn test_duplicate_names_both_atoms() {
        let mut layout = allocate(&spec()).unwrap();
        // Character '2' 2_dots_above already holds 0xE005
        layout.note_atoms[8].assigned_codepoint = Some(0xE005);
        let found = violations(&layout);
        let duplicate = found
            .iter()
            .find(|v| matches!(v, Violation::Duplicate { .. }))
            .unwrap();
        let Violation::Duplicate { codepoint, atoms } = duplicate else {
            unreachable!()
        };
        assert_eq!(*codepoint, 0xE005);
        assert_eq!(
            atoms,
            &vec![
                layout.note_atoms[5].id(),
                layout.note_atoms[8].id(),
            ]
        );
        let message = FontgenError::Validation(found.clone()).to_string();
        assert!(message.contains("note number/'2'/2_dots_above"));
        assert!(message.contains("note number/'3'/1_dot_above"));
    }

    #[test]
    fn test_reports_every_violation() {
        let mut layout = allocate(&spec()).unwrap();
        layout.note_atoms[0].assigned_codepoint = None;
        layout.symbols[0].assigned_codepoint = Some(0x1F600);
        layout.note_atoms.pop();
        let found = violations(&layout);
        assert!(found.contains(&Violation::Unassigned(layout.note_atoms[0].id())));
        assert!(found.contains(&Violation::OutOfRange {
            atom: layout.symbols[0].id(),
            codepoint: 0x1F600,
        }));
        assert!(found.iter().any(|v| matches!(
            v,
            Violation::IncompleteVariants { system, character: 'E', .. } if system == "western"
        )));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_repeated_variant_is_incomplete() {
        let mut layout = allocate(&spec()).unwrap();
        layout.note_atoms[1].variant = OctaveVariant::OneDotAbove;
        let found = violations(&layout);
        assert_eq!(
            found,
            vec![Violation::IncompleteVariants {
                system: "number".to_string(),
                character: '1',
                found: vec![
                    OctaveVariant::OneDotAbove,
                    OctaveVariant::OneDotAbove,
                    OctaveVariant::OneDotBelow,
                    OctaveVariant::TwoDotsBelow,
                ],
            }]
        );
    }

    #[test]
    fn test_gap_in_notes() {
        let mut layout = allocate(&spec()).unwrap();
        let last = layout.note_atoms.len() - 1;
        layout.note_atoms[last].assigned_codepoint = Some(0xE100);
        let found = violations(&layout);
        assert_eq!(
            found,
            vec![Violation::NonContiguous {
                system: "western".to_string(),
                after: 0xE026,
                next: 0xE100,
            }]
        );
    }

    #[test]
    fn test_no_drift_against_itself() {
        let layout = allocate(&spec()).unwrap();
        let golden = Snapshot::from_layout(&layout);
        assert!(check_drift(&layout, &golden).is_ok());
    }

    #[test]
    fn test_appending_does_not_drift() {
        let golden = Snapshot::from_layout(&allocate(&spec()).unwrap());
        let mut appended = spec();
        appended.systems[1].characters.push('F');
        appended.character_order.push('F');
        let layout = allocate(&appended).unwrap();
        assert!(check_drift(&layout, &golden).is_ok());
    }

    #[test]
    fn test_prepending_a_system_drifts_everything() {
        let original = spec();
        let golden = Snapshot::from_layout(&allocate(&original).unwrap());
        let mut systems = vec![NotationSystem::new("sargam", "SrRg")];
        systems.extend(original.systems.clone());
        let reordered = AtomSpec::new(systems, original.symbols.clone(), 0xE000);
        let layout = allocate(&reordered).unwrap();

        let Err(FontgenError::CodepointDrift(drifts)) = check_drift(&layout, &golden) else {
            panic!("expected drift");
        };
        let note_count = original.character_count() * 4;
        assert_eq!(drifts.len(), note_count);
        assert!(drifts.iter().all(|d| matches!(
            d,
            Drift::Changed { golden, current, .. } if *current == golden + 16
        )));
    }

    #[test]
    fn test_removed_atom_drifts() {
        let golden = Snapshot::from_layout(&allocate(&spec()).unwrap());
        let mut shorter = spec();
        shorter.systems[1].characters.pop();
        shorter.character_order.pop();
        let layout = allocate(&shorter).unwrap();
        let Err(FontgenError::CodepointDrift(drifts)) = check_drift(&layout, &golden) else {
            panic!("expected drift");
        };
        assert_eq!(drifts.len(), 4);
        assert!(drifts.iter().all(|d| matches!(d, Drift::Removed { .. })));
        assert_eq!(drifts[0].atom().to_string(), "note western/'E'/1_dot_above");
    }
}
