mod args;

use args::Args;
use clap::Parser;
use indexmap::IndexMap;
use notation_fontgen::{
    allocate, build_font, load_spec,
    mapping::export,
    validator::{check_drift, validate, Snapshot},
    BuildOptions, FontBackend, FontgenError, MemoryFont,
};

const MAPPING_FILE: &str = "mapping.json";
const FONT_FILE: &str = "notation-font.json";

fn run(args: &Args) -> Result<(), FontgenError> {
    let spec = load_spec(&args.atoms)?;
    let layout = allocate(&spec)?;
    validate(&layout)?;
    log::info!("Layout valid: {} atoms", layout.atom_count());

    if let Some(golden) = &args.golden {
        let snapshot = Snapshot::load(golden)?;
        match check_drift(&layout, &snapshot) {
            Err(FontgenError::CodepointDrift(drifts)) if args.allow_drift => {
                for drift in &drifts {
                    log::warn!("Codepoint drift: {}", drift);
                }
            }
            other => other?,
        }
    }

    std::fs::create_dir_all(&args.output_dir)?;
    let mapping = export(&spec, &layout);
    mapping.save(args.output_dir.join(MAPPING_FILE))?;

    if args.validate_only {
        return Ok(());
    }
    let Some(base_font) = &args.base_font else {
        log::warn!("No base font given, skipping font build");
        return Ok(());
    };

    let mut font = MemoryFont::load(base_font)?;
    let mut sources = IndexMap::new();
    for symbol_font in &args.symbol_fonts {
        sources.insert(symbol_font.name.clone(), MemoryFont::load(&symbol_font.path)?);
    }
    let report = build_font(
        &spec,
        &layout,
        &mut font,
        &sources,
        BuildOptions {
            strict: args.strict,
        },
    )?;
    for skipped in &report.skipped {
        log::warn!("Not built: {}", skipped);
    }
    FontBackend::save(&font, &args.output_dir.join(FONT_FILE))?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.into())
        .init();

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
