use std::path::PathBuf;

use clap::Parser;

/// A symbol source font given as NAME=PATH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolFont {
    pub name: String,
    pub path: PathBuf,
}

fn parse_symbol_font(arg: &str) -> Result<SymbolFont, String> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", arg))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{}'", arg));
    }
    Ok(SymbolFont {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

/// Allocate codepoints for a music notation font and build its composites
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Atom specification (YAML)
    pub atoms: PathBuf,

    /// Font providing the base characters; composites are added to it
    #[arg(short, long)]
    pub base_font: Option<PathBuf>,

    /// Font to import symbols from, as NAME=PATH (repeatable)
    #[arg(short, long = "symbol-font", value_parser = parse_symbol_font)]
    pub symbol_fonts: Vec<SymbolFont>,

    /// Directory for the generated font and mapping
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Previously exported mapping to check for codepoint drift
    #[arg(short, long)]
    pub golden: Option<PathBuf>,

    /// Allocate, validate and export the mapping without building a font
    #[arg(long)]
    pub validate_only: bool,

    /// Fail on the first missing glyph instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Report codepoint drift as a warning instead of failing
    #[arg(long)]
    pub allow_drift: bool,

    #[command(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::WarnLevel>,
}
