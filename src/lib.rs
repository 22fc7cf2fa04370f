//! `mtl` implements the Metadata Template Language: a small
//! domain-specific language that renders one or more output strings
//! from per-file metadata through substitution, list expansion,
//! filtering, conditional logic, find/replace, defaults and
//! user-defined variables.
//!
//! A template is parsed once with [`parser::parse`] into a
//! [`ast::Template`], then rendered as many times as needed — once per
//! source file — with [`render::Renderer::render`] against a
//! caller-supplied [`provider::ProviderRegistry`] and
//! [`provider::FileContext`]. Parsing and rendering are independent
//! steps on purpose: a host application (a file-mover CLI, say) parses
//! a handful of templates once at startup and renders each of them
//! once per file it walks.
//!
//! ```
//! use mtl::parser::parse;
//! use mtl::provider::{FileContext, ProviderRegistry};
//! use mtl::render::Renderer;
//! use chrono::{TimeZone, Utc};
//!
//! let registry = ProviderRegistry::new();
//! let ctx = FileContext::new(
//!     "/home/jane/Music/song.mp3",
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//! );
//! let template = parse("{filepath.stem}{filepath.suffix}").unwrap();
//! let out = Renderer::new(&registry).render(&template, &ctx).unwrap();
//! assert_eq!(out, vec!["songmp3".to_string()]);
//! ```
//!
//! This crate does not walk directories, move/copy/hardlink files, or
//! implement any concrete metadata extractor (audio tags, EXIF,
//! `mdls`, PDF, DOCX). Host applications provide those by implementing
//! [`provider::Provider`] and registering an instance per field name in
//! a [`provider::ProviderRegistry`]; see `SPEC_FULL.md` §1 for the
//! full list of Non-goals.

pub mod ast;
pub mod conditional;
pub mod config;
pub mod datetime;
pub mod error;
pub mod filters;
pub mod findreplace;
pub mod lexer;
pub mod parser;
pub mod provider;
mod punctuation;
mod pyformat;
pub mod render;
pub mod value;
pub mod variables;
