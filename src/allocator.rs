use std::collections::HashSet;

use crate::{
    atom::{AccidentalAtom, AllocationPolicy, AssignedSymbol, NoteAtom, OctaveVariant},
    layout::{AccidentalRanges, CodepointLayout},
    spec::{AccidentalCompositeSpec, AtomSpec},
    FontgenError,
};

const VARIANTS_PER_CHARACTER: u32 = OctaveVariant::ALL.len() as u32;

/// A running codepoint counter bounded by the private-use ceiling.
struct Cursor {
    next: u32,
    ceiling: u32,
}

impl Cursor {
    /// Reserve `count` contiguous codepoints, returning the first.
    fn reserve(&mut self, count: u32) -> Result<u32, FontgenError> {
        let start = self.next;
        if count > 0 {
            check_ceiling(start, count, self.ceiling)?;
        }
        self.next = start + count;
        Ok(start)
    }
}

fn check_ceiling(start: u32, count: u32, ceiling: u32) -> Result<(), FontgenError> {
    let last = start.saturating_add(count.saturating_sub(1));
    if start > ceiling {
        return Err(FontgenError::AllocationOverflow {
            requested: start,
            ceiling,
        });
    }
    if last > ceiling {
        return Err(FontgenError::AllocationOverflow {
            requested: ceiling + 1,
            ceiling,
        });
    }
    Ok(())
}

fn check_spec(spec: &AtomSpec) -> Result<(), FontgenError> {
    if spec.systems.is_empty() {
        return Err(FontgenError::invalid_spec("No notation systems declared"));
    }
    let mut names = HashSet::new();
    for system in &spec.systems {
        if !names.insert(system.name.as_str()) {
            return Err(FontgenError::invalid_spec(format!(
                "Duplicate system name: '{}'",
                system.name
            )));
        }
        let mut seen = HashSet::new();
        for c in &system.characters {
            if !seen.insert(*c) {
                return Err(FontgenError::invalid_spec(format!(
                    "System '{}' lists character '{}' more than once",
                    system.name, c
                )));
            }
        }
    }
    let expected: String = spec.characters().map(|(_, c)| c).collect();
    if spec.character_order != expected {
        return Err(FontgenError::invalid_spec(format!(
            "character_order mismatch!\n  Expected: {}\n  Got:      {}",
            expected, spec.character_order
        )));
    }
    if spec.pua_start > spec.pua_ceiling {
        return Err(FontgenError::AllocationOverflow {
            requested: spec.pua_start,
            ceiling: spec.pua_ceiling,
        });
    }
    let mut symbol_names = HashSet::new();
    for symbol in &spec.symbols {
        if !symbol_names.insert(symbol.name.as_str()) {
            return Err(FontgenError::invalid_spec(format!(
                "Duplicate symbol name: '{}'",
                symbol.name
            )));
        }
    }
    if !spec.accidentals.is_empty() && spec.character_count() == 0 {
        return Err(FontgenError::invalid_spec(
            "Accidental composites configured but no characters declared",
        ));
    }
    let mut kinds = HashSet::new();
    for accidental in &spec.accidentals {
        if !kinds.insert(accidental.kind) {
            return Err(FontgenError::invalid_spec(format!(
                "Accidental kind {} configured more than once",
                accidental.kind
            )));
        }
    }
    Ok(())
}

fn assign_symbols(
    spec: &AtomSpec,
    cursor: &mut Cursor,
) -> Result<Vec<AssignedSymbol>, FontgenError> {
    let packed_start = cursor.next;
    let mut symbols = Vec::with_capacity(spec.symbols.len());
    for symbol in &spec.symbols {
        let codepoint = match symbol.policy {
            AllocationPolicy::Standard => {
                if symbol.source_codepoint == 0 {
                    return Err(FontgenError::invalid_spec(format!(
                        "Symbol {} uses the standard policy but has no source codepoint",
                        symbol.name
                    )));
                }
                symbol.source_codepoint
            }
            AllocationPolicy::Packed => match symbol.codepoint_offset {
                Some(offset) => {
                    let codepoint = packed_start.saturating_add(offset);
                    check_ceiling(codepoint, 1, cursor.ceiling)?;
                    cursor.next = cursor.next.max(codepoint + 1);
                    codepoint
                }
                None => cursor.reserve(1)?,
            },
        };
        log::debug!(
            "Symbol {} ({:?}) -> U+{:04X}",
            symbol.name,
            symbol.policy,
            codepoint
        );
        symbols.push(AssignedSymbol {
            spec: symbol.clone(),
            assigned_codepoint: Some(codepoint),
        });
    }
    Ok(symbols)
}

/// Resolve the start of an explicit or packed block of `count` codepoints.
fn block_start(
    explicit: Option<(u32, u32)>,
    count: u32,
    cursor: &mut Cursor,
    what: &str,
) -> Result<u32, FontgenError> {
    match explicit {
        Some((start, end)) => {
            if end < start || (count > 0 && end - start < count - 1) {
                return Err(FontgenError::invalid_spec(format!(
                    "{} range U+{:04X}-U+{:04X} cannot hold {} glyphs",
                    what, start, end, count
                )));
            }
            check_ceiling(start, count, cursor.ceiling)?;
            Ok(start)
        }
        None => cursor.reserve(count),
    }
}

fn assign_accidentals(
    spec: &AtomSpec,
    accidental: &AccidentalCompositeSpec,
    cursor: &mut Cursor,
    atoms: &mut Vec<AccidentalAtom>,
) -> Result<AccidentalRanges, FontgenError> {
    let count = spec.character_count() as u32;
    let start = block_start(
        accidental.range,
        count,
        cursor,
        &format!("{} composite", accidental.kind),
    )?;
    for (ix, (system, character)) in spec.characters().enumerate() {
        atoms.push(AccidentalAtom {
            system: system.to_string(),
            character,
            accidental: accidental.kind,
            variant: None,
            assigned_codepoint: Some(start + ix as u32),
        });
    }

    let octave_count = count * VARIANTS_PER_CHARACTER;
    let octave_start = block_start(
        accidental.octave_range,
        octave_count,
        cursor,
        &format!("{}+octave composite", accidental.kind),
    )?;
    for (ix, (system, character)) in spec.characters().enumerate() {
        for variant in OctaveVariant::ALL {
            atoms.push(AccidentalAtom {
                system: system.to_string(),
                character,
                accidental: accidental.kind,
                variant: Some(variant),
                assigned_codepoint: Some(
                    octave_start + ix as u32 * VARIANTS_PER_CHARACTER + variant.index() as u32,
                ),
            });
        }
    }
    log::info!(
        "{} composites: U+{:04X}-U+{:04X}, with octave: U+{:04X}-U+{:04X}",
        accidental.kind,
        start,
        start + count.saturating_sub(1),
        octave_start,
        octave_start + octave_count.saturating_sub(1)
    );
    Ok(AccidentalRanges {
        accidental: accidental.kind,
        composites: (start, start + count.saturating_sub(1)),
        octave_composites: (octave_start, octave_start + octave_count.saturating_sub(1)),
    })
}

/// Deterministically assign codepoints to every atom of the specification.
///
/// Notes take a single contiguous run starting at `pua_start`, walking
/// systems and characters in declaration order with four variants each.
/// Packed symbols follow the notes; standard symbols keep their source
/// codepoint. Accidental composites use their explicit ranges, or are
/// packed after everything else in declaration order.
pub fn allocate(spec: &AtomSpec) -> Result<CodepointLayout, FontgenError> {
    check_spec(spec)?;
    log::info!("Assigning codepoints starting at U+{:04X}", spec.pua_start);

    let mut cursor = Cursor {
        next: spec.pua_start,
        ceiling: spec.pua_ceiling,
    };

    let note_count = spec.character_count() as u32 * VARIANTS_PER_CHARACTER;
    let notes_start = cursor.reserve(note_count)?;
    let mut note_atoms = Vec::with_capacity(note_count as usize);
    let mut codepoint = notes_start;
    for (system, character) in spec.characters() {
        for variant in OctaveVariant::ALL {
            note_atoms.push(NoteAtom {
                system: system.to_string(),
                character,
                variant,
                assigned_codepoint: Some(codepoint),
            });
            codepoint += 1;
        }
    }
    let notes_range = (note_count > 0).then(|| (notes_start, notes_start + note_count - 1));
    log::info!(
        "Assigned {} note atoms: U+{:04X}-U+{:04X}",
        note_atoms.len(),
        notes_start,
        (notes_start + note_count).saturating_sub(1)
    );

    let symbols = assign_symbols(spec, &mut cursor)?;
    let symbol_codepoints = symbols.iter().filter_map(|s| s.assigned_codepoint);
    let symbols_range = symbol_codepoints
        .clone()
        .min()
        .zip(symbol_codepoints.max());
    log::info!("Assigned {} symbols", symbols.len());

    let mut accidental_atoms = vec![];
    let mut accidental_ranges = vec![];
    for accidental in &spec.accidentals {
        accidental_ranges.push(assign_accidentals(
            spec,
            accidental,
            &mut cursor,
            &mut accidental_atoms,
        )?);
    }

    Ok(CodepointLayout {
        note_atoms,
        symbols,
        accidental_atoms,
        notes_range,
        symbols_range,
        accidental_ranges,
        valid_spaces: spec.valid_spaces.clone(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        atom::{AccidentalKind, NotationSystem, SymbolSpec},
        spec::AccidentalCompositeSpec,
    };
    use pretty_assertions::assert_eq;

    fn number_spec() -> AtomSpec {
        AtomSpec::new(vec![NotationSystem::new("number", "1234567")], vec![], 0xE000)
    }

    #[test]
    fn test_first_characters() {
        let layout = allocate(&number_spec()).unwrap();
        let codepoints: Vec<u32> = layout
            .note_atoms
            .iter()
            .take(8)
            .map(|a| a.assigned_codepoint.unwrap())
            .collect();
        assert_eq!(
            codepoints,
            vec![0xE000, 0xE001, 0xE002, 0xE003, 0xE004, 0xE005, 0xE006, 0xE007]
        );
        assert_eq!(layout.note_atoms[0].character, '1');
        assert_eq!(layout.note_atoms[3].variant, OctaveVariant::TwoDotsBelow);
        assert_eq!(layout.note_atoms[4].character, '2');
        assert_eq!(layout.note_atoms[4].variant, OctaveVariant::OneDotAbove);
        assert_eq!(layout.notes_range, Some((0xE000, 0xE01B)));
    }

    #[test]
    fn test_counter_runs_across_systems() {
        let spec = AtomSpec::new(
            vec![
                NotationSystem::new("number", "12"),
                NotationSystem::new("western", "CD"),
            ],
            vec![],
            0xE600,
        );
        let layout = allocate(&spec).unwrap();
        let western: Vec<u32> = layout
            .notes_for_system("western")
            .map(|a| a.assigned_codepoint.unwrap())
            .collect();
        assert_eq!(western, (0xE608..0xE610).collect::<Vec<_>>());
    }

    #[test]
    fn test_character_order_mismatch() {
        let mut spec = number_spec();
        spec.character_order = "1234576".to_string();
        let err = allocate(&spec).unwrap_err();
        assert!(matches!(err, FontgenError::InvalidSpec { .. }));
        assert!(err.to_string().contains("character_order mismatch"));
    }

    #[test]
    fn test_empty_systems_rejected() {
        let spec = AtomSpec::new(vec![], vec![], 0xE000);
        assert!(matches!(
            allocate(&spec),
            Err(FontgenError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_duplicate_system_name_rejected() {
        let spec = AtomSpec::new(
            vec![
                NotationSystem::new("number", "12"),
                NotationSystem::new("number", "34"),
            ],
            vec![],
            0xE000,
        );
        assert!(matches!(
            allocate(&spec),
            Err(FontgenError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_duplicate_symbol_name_rejected() {
        let mut spec = number_spec();
        spec.symbols = vec![
            SymbolSpec::new("barline", "Barline", 0x1D100),
            SymbolSpec::new("barline", "Barline", 0x1D101),
        ];
        let err = allocate(&spec).unwrap_err();
        assert!(matches!(err, FontgenError::InvalidSpec { .. }));
        assert!(err.to_string().contains("Duplicate symbol name"));
    }

    #[test]
    fn test_accidentals_without_characters_rejected() {
        let mut spec = AtomSpec::new(vec![NotationSystem::new("number", "")], vec![], 0xE000);
        spec.accidentals = vec![AccidentalCompositeSpec {
            kind: AccidentalKind::Sharp,
            symbol: None,
            range: None,
            octave_range: None,
        }];
        assert!(matches!(
            allocate(&spec),
            Err(FontgenError::InvalidSpec { .. })
        ));
        spec.accidentals.clear();
        assert!(allocate(&spec).unwrap().accidental_ranges.is_empty());
    }

    #[test]
    fn test_range_spanning_every_codepoint() {
        let mut spec = number_spec();
        spec.pua_ceiling = u32::MAX;
        spec.accidentals = vec![AccidentalCompositeSpec {
            kind: AccidentalKind::Flat,
            symbol: None,
            range: Some((0x0, 0xFFFF_FFFF)),
            octave_range: Some((0xF0000, 0xF001B)),
        }];
        let layout = allocate(&spec).unwrap();
        assert_eq!(layout.accidental_ranges[0].composites, (0x0, 0x6));
    }

    #[test]
    fn test_overflow() {
        let mut spec = number_spec();
        spec.pua_start = 0xF8F0;
        let err = allocate(&spec).unwrap_err();
        assert!(matches!(
            err,
            FontgenError::AllocationOverflow {
                requested: 0xF900,
                ceiling: 0xF8FF
            }
        ));
    }

    #[test]
    fn test_caller_ceiling() {
        let mut spec = number_spec();
        spec.pua_ceiling = 0xE01B;
        assert!(allocate(&spec).is_ok());
        spec.pua_ceiling = 0xE01A;
        assert!(matches!(
            allocate(&spec),
            Err(FontgenError::AllocationOverflow { .. })
        ));
    }

    #[test]
    fn test_symbol_policies() {
        let mut spec = number_spec();
        spec.symbols = vec![
            SymbolSpec::new("barlineSingle", "Barline (single)", 0x1D100),
            SymbolSpec::new("ornamentTrill", "Trill", 0xE566).with_policy(AllocationPolicy::Packed),
            SymbolSpec::new("ornamentTurn", "Turn", 0xE567).with_policy(AllocationPolicy::Packed),
        ];
        let layout = allocate(&spec).unwrap();
        let assigned: Vec<u32> = layout
            .symbols
            .iter()
            .map(|s| s.assigned_codepoint.unwrap())
            .collect();
        // Packed symbols follow the last note directly
        assert_eq!(assigned, vec![0x1D100, 0xE01C, 0xE01D]);
        assert_eq!(layout.symbols_range, Some((0xE01C, 0x1D100)));
    }

    #[test]
    fn test_packed_offsets() {
        let mut spec = number_spec();
        let mut with_offset = SymbolSpec::new("ornamentMordent", "Mordent", 0xE56D)
            .with_policy(AllocationPolicy::Packed);
        with_offset.codepoint_offset = Some(3);
        spec.symbols = vec![
            with_offset,
            SymbolSpec::new("ornamentTrill", "Trill", 0xE566).with_policy(AllocationPolicy::Packed),
        ];
        let layout = allocate(&spec).unwrap();
        assert_eq!(layout.symbols[0].assigned_codepoint, Some(0xE01F));
        assert_eq!(layout.symbols[1].assigned_codepoint, Some(0xE020));
    }

    #[test]
    fn test_standard_symbol_without_codepoint() {
        let mut spec = number_spec();
        spec.symbols = vec![SymbolSpec::new("mystery", "Mystery", 0)];
        assert!(matches!(
            allocate(&spec),
            Err(FontgenError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_explicit_accidental_ranges() {
        let mut spec = AtomSpec::new(vec![NotationSystem::new("number", "12")], vec![], 0xE600);
        spec.accidentals = vec![AccidentalCompositeSpec {
            kind: AccidentalKind::Sharp,
            symbol: Some(0x1D130),
            range: Some((0xE1F0, 0xE21E)),
            octave_range: Some((0xE2B0, 0xE36F)),
        }];
        let layout = allocate(&spec).unwrap();
        let sharps: Vec<(Option<OctaveVariant>, u32)> = layout
            .accidental_atoms
            .iter()
            .map(|a| (a.variant, a.assigned_codepoint.unwrap()))
            .collect();
        assert_eq!(sharps.len(), 2 + 8);
        assert_eq!(sharps[0], (None, 0xE1F0));
        assert_eq!(sharps[1], (None, 0xE1F1));
        assert_eq!(sharps[2], (Some(OctaveVariant::OneDotAbove), 0xE2B0));
        // Second character, third variant: start + 1*4 + 2
        assert_eq!(sharps[8], (Some(OctaveVariant::OneDotBelow), 0xE2B6));
    }

    #[test]
    fn test_packed_accidental_ranges() {
        let mut spec = AtomSpec::new(vec![NotationSystem::new("number", "12")], vec![], 0xE000);
        spec.accidentals = vec![
            AccidentalCompositeSpec {
                kind: AccidentalKind::Sharp,
                symbol: None,
                range: None,
                octave_range: None,
            },
            AccidentalCompositeSpec {
                kind: AccidentalKind::Flat,
                symbol: None,
                range: None,
                octave_range: None,
            },
        ];
        let layout = allocate(&spec).unwrap();
        assert_eq!(
            layout.accidental_ranges,
            vec![
                AccidentalRanges {
                    accidental: AccidentalKind::Sharp,
                    composites: (0xE008, 0xE009),
                    octave_composites: (0xE00A, 0xE011),
                },
                AccidentalRanges {
                    accidental: AccidentalKind::Flat,
                    composites: (0xE012, 0xE013),
                    octave_composites: (0xE014, 0xE01B),
                },
            ]
        );
    }

    #[test]
    fn test_short_explicit_range() {
        let mut spec = number_spec();
        spec.accidentals = vec![AccidentalCompositeSpec {
            kind: AccidentalKind::Flat,
            symbol: None,
            range: Some((0xE100, 0xE102)),
            octave_range: None,
        }];
        assert!(matches!(
            allocate(&spec),
            Err(FontgenError::InvalidSpec { .. })
        ));
    }
}
