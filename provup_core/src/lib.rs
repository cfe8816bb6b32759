//! `provup_core` is the core library for `provup`, a one-shot migration tool that makes a module's provider dependencies explicit. It reads the `*.tf` files of a module directory, works out which providers the module uses and where each one comes from, and writes a single consolidated `required_providers` block while leaving every other byte of the configuration untouched.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Module directory
//!   → Loader (discovers *.tf files, lexes and parses them into positional syntax trees)
//!   → Aggregator (merges required_providers entries, provider blocks and resources)
//!   → Resolver (maps legacy provider addresses to canonical ones via a SourceCatalog)
//!   → Rewriter (splices a regenerated required_providers block into one file)
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Configuration loading from `provup.toml`: catalog entries, rewrite options and exclude patterns.
//! - [`module`] — Module discovery and extraction of provider-related declarations.
//! - [`catalog`] — The [`SourceCatalog`] trait and the built-in [`StaticCatalog`].
//! - [`rewrite`] — Locating, merging and regenerating declaration blocks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use provup_core::StaticCatalog;
//! use provup_core::UpgradeOptions;
//! use provup_core::upgrade_module;
//!
//! let catalog = StaticCatalog::builtin();
//! let report = upgrade_module(Path::new("."), &catalog, &UpgradeOptions::default())
//! 	.map_err(|failure| failure.error)
//! 	.unwrap();
//!
//! for requirement in report.requirements.values() {
//! 	println!("{}: {:?}", requirement.name, requirement.source_for_display());
//! }
//! ```

pub use addrs::*;
pub use aggregate::*;
pub use catalog::*;
pub use config::*;
pub use diagnostic::*;
pub use engine::*;
pub use error::*;
pub use parser::*;
pub use position::*;
pub use requirement::*;
pub use resolve::*;
pub use rewrite::*;
pub use tokens::*;

mod addrs;
mod aggregate;
pub mod catalog;
pub mod config;
mod diagnostic;
mod engine;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
pub mod module;
mod parser;
mod position;
mod requirement;
mod resolve;
pub mod rewrite;
pub(crate) mod tokens;

#[cfg(test)]
mod __fixtures;
