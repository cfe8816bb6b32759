use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;

use crate::ProvupError;
use crate::ProvupResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["provup.toml", ".provup.toml", ".config/provup.toml"];

/// File created (or appended to) when no file in the module declares
/// provider requirements or contains a `terraform` block.
pub const DEFAULT_FALLBACK_FILE: &str = "versions.tf";

/// Configuration loaded from a `provup.toml` file in the module directory.
///
/// ```toml
/// [catalog]
/// custom = "example.com/acme/custom"
/// disable_builtin = false
///
/// [rewrite]
/// merge_blocks = false
/// fallback_file = "versions.tf"
///
/// [exclude]
/// patterns = ["generated_*.tf"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ProvupConfig {
	/// Legacy type name to source address overrides for the catalog.
	#[serde(default)]
	pub catalog: CatalogConfig,
	/// Options controlling how the declaration block is rewritten.
	#[serde(default)]
	pub rewrite: RewriteConfig,
	/// Files to leave out of discovery.
	#[serde(default)]
	pub exclude: ExcludeConfig,
}

/// Catalog entries mapping a provider type name to its source address.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
	/// When true, only the entries listed here are known.
	#[serde(default)]
	pub disable_builtin: bool,
	/// `type = "namespace/type"` entries. Values are parsed lazily so a bad
	/// entry only affects the provider it names.
	#[serde(flatten)]
	pub entries: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct RewriteConfig {
	/// Merge several `required_providers` blocks found in the same file
	/// into the first one instead of failing.
	#[serde(default)]
	pub merge_blocks: bool,
	/// File that receives a new declaration block when none exists.
	#[serde(default = "default_fallback_file")]
	pub fallback_file: PathBuf,
}

impl Default for RewriteConfig {
	fn default() -> Self {
		Self {
			merge_blocks: false,
			fallback_file: default_fallback_file(),
		}
	}
}

fn default_fallback_file() -> PathBuf {
	PathBuf::from(DEFAULT_FALLBACK_FILE)
}

/// Glob patterns, relative to the module directory, for files that are
/// never loaded.
#[derive(Debug, Default, Deserialize)]
pub struct ExcludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
}

impl ExcludeConfig {
	pub fn glob_set(&self) -> ProvupResult<GlobSet> {
		build_glob_set(&self.patterns)
	}
}

impl ProvupConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> ProvupResult<Option<ProvupConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	pub fn from_toml(content: &str) -> ProvupResult<ProvupConfig> {
		toml::from_str(content).map_err(|e| ProvupError::ConfigParse(e.to_string()))
	}
}

/// Build a `GlobSet` from a list of glob pattern strings.
pub(crate) fn build_glob_set(patterns: &[String]) -> ProvupResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			ProvupError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
		builder.add(glob);
	}
	builder
		.build()
		.map_err(|e| ProvupError::ConfigParse(format!("failed to build exclude rules: {e}")))
}
