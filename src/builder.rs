//! Materializes a validated layout into a font.
//!
//! Symbols are imported first, then the octave dot is ensured, then every
//! note, accidental and combined composite is resolved and written to the
//! target backend. Metric lookups and writes are sequential; only the pure
//! placement step may run in parallel.

use std::fmt::Display;

use indexmap::IndexMap;

use crate::{
    backend::{FontBackend, GlyphKey},
    mapping::{SymbolClassifier, SymbolKind},
    resolver::{resolve, CharacterMetrics, CompositeGlyph, GlyphMetrics, OverlaySpec},
    spec::AtomSpec,
    CodepointLayout, FontgenError, OutlinePen, Path, PathBuilder,
};

pub const DOT_CODEPOINT: u32 = 0x2E;
const SYNTHETIC_DOT_NAME: &str = "period";
const SYNTHETIC_DOT_SIZE: f32 = 100.0;
const SYNTHETIC_DOT_ADVANCE: f64 = 150.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Stop at the first per-atom error instead of skipping the atom
    pub strict: bool,
}

/// Something the build could not produce, and why
#[derive(Debug)]
pub struct Skipped {
    pub subject: String,
    pub reason: FontgenError,
}

impl Display for Skipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.reason)
    }
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub imported_symbols: usize,
    pub synthetic_dot: bool,
    /// Names of the composite glyphs written, in allocation order
    pub created: Vec<String>,
    pub skipped: Vec<Skipped>,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(
        &mut self,
        subject: impl Into<String>,
        reason: FontgenError,
        options: BuildOptions,
    ) -> Result<(), FontgenError> {
        if options.strict {
            return Err(reason);
        }
        let skipped = Skipped {
            subject: subject.into(),
            reason,
        };
        log::warn!("Skipping {}", skipped);
        self.skipped.push(skipped);
        Ok(())
    }
}

/// One composite to place: where it goes and what it is made of
struct Job {
    codepoint: u32,
    name: String,
    base: CharacterMetrics,
    overlays: Vec<OverlaySpec>,
}

fn symbol_scale(kind: SymbolKind, spec: &AtomSpec) -> f64 {
    match kind {
        SymbolKind::Barline => spec.geometry.config.barline_scale,
        SymbolKind::Ornament => spec.geometry.config.ornament_scale,
        // Accidentals are scaled by the composite reference instead
        SymbolKind::Accidental | SymbolKind::Bracket => 1.0,
    }
}

fn import_symbols<B: FontBackend>(
    spec: &AtomSpec,
    layout: &CodepointLayout,
    target: &mut B,
    sources: &IndexMap<String, B>,
    options: BuildOptions,
    report: &mut BuildReport,
) -> Result<(), FontgenError> {
    let classifier = SymbolClassifier::default();
    for symbol in &layout.symbols {
        let Some(codepoint) = symbol.assigned_codepoint else {
            continue;
        };
        let name = &symbol.spec.name;
        let missing = || FontgenError::MissingOverlayGlyph {
            name: format!("{} from {}", name, symbol.spec.source),
        };
        match sources.get(&symbol.spec.source) {
            Some(source) => {
                let scale = symbol_scale(classifier.classify(name), spec);
                match target.import_glyph(
                    source,
                    symbol.spec.source_codepoint,
                    codepoint,
                    name,
                    scale,
                ) {
                    Ok(()) => report.imported_symbols += 1,
                    Err(e) if e.is_per_atom() => report.skip(name.as_str(), missing(), options)?,
                    Err(e) => return Err(e),
                }
            }
            None if target.has_glyph(GlyphKey::Codepoint(codepoint)) => {
                log::debug!("{} already present at U+{:04X}", name, codepoint);
            }
            None => report.skip(name.as_str(), missing(), options)?,
        }
    }
    log::info!("Imported {} symbols", report.imported_symbols);
    Ok(())
}

/// Outline of the square dot used when the font has no full stop
pub fn synthetic_dot() -> Vec<Path> {
    let mut pen = PathBuilder::new();
    pen.move_to(0.0, 0.0);
    pen.line_to(SYNTHETIC_DOT_SIZE, 0.0);
    pen.line_to(SYNTHETIC_DOT_SIZE, SYNTHETIC_DOT_SIZE);
    pen.line_to(0.0, SYNTHETIC_DOT_SIZE);
    pen.close();
    pen.build()
}

fn ensure_dot<B: FontBackend>(
    target: &mut B,
    report: &mut BuildReport,
) -> Result<GlyphMetrics, FontgenError> {
    if !target.has_glyph(GlyphKey::Codepoint(DOT_CODEPOINT)) {
        log::info!("No dot glyph in font, creating a synthetic one");
        target.create_outline(
            DOT_CODEPOINT,
            SYNTHETIC_DOT_NAME,
            synthetic_dot(),
            SYNTHETIC_DOT_ADVANCE,
        )?;
        report.synthetic_dot = true;
    }
    target
        .glyph_metrics(GlyphKey::Codepoint(DOT_CODEPOINT))
        .ok_or_else(|| FontgenError::MissingOverlayGlyph {
            name: SYNTHETIC_DOT_NAME.to_string(),
        })
}

/// Look up every base character once, keyed by (system, character)
fn base_metrics<B: FontBackend>(
    spec: &AtomSpec,
    target: &B,
    options: BuildOptions,
    report: &mut BuildReport,
) -> Result<IndexMap<(String, char), CharacterMetrics>, FontgenError> {
    let mut bases = IndexMap::new();
    for (system, character) in spec.characters() {
        match target.glyph_metrics(GlyphKey::Codepoint(character as u32)) {
            Some(glyph) => {
                bases.insert(
                    (system.to_string(), character),
                    CharacterMetrics {
                        system: system.to_string(),
                        character,
                        glyph,
                    },
                );
            }
            None => report.skip(
                format!("{}/'{}' and its composites", system, character),
                FontgenError::MissingBaseGlyph {
                    character,
                    system: system.to_string(),
                },
                options,
            )?,
        }
    }
    Ok(bases)
}

fn accidental_glyphs<B: FontBackend>(
    spec: &AtomSpec,
    target: &B,
    options: BuildOptions,
    report: &mut BuildReport,
) -> Result<IndexMap<crate::atom::AccidentalKind, GlyphMetrics>, FontgenError> {
    let mut glyphs = IndexMap::new();
    for accidental in &spec.accidentals {
        let metrics = accidental
            .symbol
            .and_then(|cp| target.glyph_metrics(GlyphKey::Codepoint(cp)));
        match metrics {
            Some(metrics) => {
                glyphs.insert(accidental.kind, metrics);
            }
            None => report.skip(
                format!("{} composites", accidental.kind),
                FontgenError::MissingOverlayGlyph {
                    name: match accidental.symbol {
                        Some(cp) => format!("{} (U+{:04X})", accidental.kind, cp),
                        None => accidental.kind.to_string(),
                    },
                },
                options,
            )?,
        }
    }
    Ok(glyphs)
}

fn collect_jobs(
    layout: &CodepointLayout,
    bases: &IndexMap<(String, char), CharacterMetrics>,
    dot: &GlyphMetrics,
    accidentals: &IndexMap<crate::atom::AccidentalKind, GlyphMetrics>,
) -> Vec<Job> {
    let mut jobs = vec![];
    for atom in &layout.note_atoms {
        let (Some(codepoint), Some(base)) = (
            atom.assigned_codepoint,
            bases.get(&(atom.system.clone(), atom.character)),
        ) else {
            continue;
        };
        jobs.push(Job {
            codepoint,
            name: atom.glyph_name(),
            base: base.clone(),
            overlays: vec![OverlaySpec::OctaveDots {
                variant: atom.variant,
                dot: dot.clone(),
            }],
        });
    }
    for atom in &layout.accidental_atoms {
        let (Some(codepoint), Some(base), Some(glyph)) = (
            atom.assigned_codepoint,
            bases.get(&(atom.system.clone(), atom.character)),
            accidentals.get(&atom.accidental),
        ) else {
            continue;
        };
        let mut overlays = vec![OverlaySpec::Accidental {
            kind: atom.accidental,
            glyph: glyph.clone(),
        }];
        if let Some(variant) = atom.variant {
            overlays.push(OverlaySpec::OctaveDots {
                variant,
                dot: dot.clone(),
            });
        }
        jobs.push(Job {
            codepoint,
            name: atom.glyph_name(),
            base: base.clone(),
            overlays,
        });
    }
    jobs
}

#[cfg(feature = "rayon")]
fn resolve_all(jobs: &[Job], spec: &AtomSpec) -> Vec<CompositeGlyph> {
    use rayon::prelude::*;
    jobs.par_iter()
        .map(|job| resolve(&job.base, &job.overlays, &spec.geometry))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn resolve_all(jobs: &[Job], spec: &AtomSpec) -> Vec<CompositeGlyph> {
    jobs.iter()
        .map(|job| resolve(&job.base, &job.overlays, &spec.geometry))
        .collect()
}

/// Write every composite of `layout` into `target`.
///
/// `sources` maps a symbol's source name to the font its glyph is imported
/// from. The layout must already have passed validation.
pub fn build_font<B: FontBackend>(
    spec: &AtomSpec,
    layout: &CodepointLayout,
    target: &mut B,
    sources: &IndexMap<String, B>,
    options: BuildOptions,
) -> Result<BuildReport, FontgenError> {
    let mut report = BuildReport::default();

    import_symbols(spec, layout, target, sources, options, &mut report)?;
    let dot = ensure_dot(target, &mut report)?;
    let bases = base_metrics(spec, target, options, &mut report)?;
    let accidentals = accidental_glyphs(spec, target, options, &mut report)?;

    let jobs = collect_jobs(layout, &bases, &dot, &accidentals);
    log::info!("Resolving {} composite glyphs", jobs.len());
    let composites = resolve_all(&jobs, spec);

    for (job, composite) in jobs.iter().zip(composites) {
        log::debug!("{} -> U+{:04X}", job.name, job.codepoint);
        let written = target
            .create_composite(job.codepoint, &job.name, &composite.components)
            .and_then(|_| {
                target.set_advance_width(GlyphKey::Codepoint(job.codepoint), composite.advance_width)
            });
        match written {
            Ok(()) => report.created.push(job.name.clone()),
            Err(e) if e.is_per_atom() => report.skip(job.name.as_str(), e, options)?,
            Err(e) => return Err(e),
        }
    }

    log::info!(
        "Created {} composite glyphs, skipped {}",
        report.created.len(),
        report.skipped.len()
    );
    Ok(report)
}
