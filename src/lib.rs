#![deny(clippy::unwrap_used, clippy::expect_used)]
//! Codepoint allocation and composite glyph layout for music notation fonts.
//!
//! An atoms document ([`spec::AtomSpec`]) declares notation systems and
//! imported symbols. [`allocate`] assigns every note variant, symbol and
//! accidental composite a codepoint, [`validator::validate`] and
//! [`validator::check_drift`] guard the result, [`mapping::export`] writes
//! the runtime mapping, and [`builder::build_font`] places the composites
//! into a font through a [`FontBackend`].

mod allocator;
pub mod atom;
pub mod backend;
pub mod builder;
mod common;
mod error;
mod font;
pub mod geometry;
mod glyph;
mod layer;
pub mod layout;
pub mod mapping;
pub mod resolver;
mod serde_helpers;
mod shape;
pub mod spec;
pub mod validator;

pub use crate::{
    allocator::allocate,
    atom::{AccidentalKind, AtomId, OctaveVariant},
    backend::{FontBackend, GlyphKey, MemoryFont},
    builder::{build_font, BuildOptions, BuildReport},
    common::{Node, NodeType},
    error::FontgenError,
    font::Font,
    glyph::{Glyph, GlyphList},
    layer::Layer,
    layout::CodepointLayout,
    mapping::Mapping,
    shape::{Component, OutlinePen, Path, PathBuilder, Shape},
    spec::{load_spec, AtomSpec},
};
