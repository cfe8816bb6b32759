use std::collections::BTreeMap;

use thiserror::Error;

use crate::CatalogConfig;
use crate::addrs::ProviderAddr;

/// Providers whose legacy addresses moved to the `hashicorp` namespace on
/// the public registry.
pub const BUILTIN_PROVIDERS: &[&str] = &[
	"ad",
	"archive",
	"aws",
	"azuread",
	"azurerm",
	"azurestack",
	"boundary",
	"cloudinit",
	"consul",
	"dns",
	"external",
	"google",
	"google-beta",
	"hcp",
	"hcs",
	"helm",
	"http",
	"kubernetes",
	"local",
	"nomad",
	"null",
	"opc",
	"oraclepaas",
	"random",
	"template",
	"terraform",
	"tfe",
	"time",
	"tls",
	"vault",
	"vsphere",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LookupError {
	/// The catalog has no canonical address for the provider.
	#[error("provider `{0}` is not known to the source catalog")]
	NotKnown(String),
	/// The lookup failed for another reason.
	#[error("{0}")]
	Other(String),
}

/// Resolves legacy provider addresses to canonical ones.
pub trait SourceCatalog {
	/// Look up the canonical address for a legacy address such as `-/aws`.
	fn lookup_legacy(&self, legacy: &ProviderAddr) -> Result<ProviderAddr, LookupError>;
}

/// A catalog backed by the built-in provider list and the `[catalog]`
/// entries of `provup.toml`. Configured entries take precedence.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
	entries: BTreeMap<String, String>,
	builtin: bool,
}

impl StaticCatalog {
	/// A catalog that only knows the built-in providers.
	pub fn builtin() -> Self {
		Self {
			entries: BTreeMap::new(),
			builtin: true,
		}
	}

	/// A catalog that only knows the given entries.
	pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
		Self {
			entries: entries.into_iter().collect(),
			builtin: false,
		}
	}

	pub fn from_config(config: Option<&CatalogConfig>) -> Self {
		Self {
			entries: config.map(|c| c.entries.clone()).unwrap_or_default(),
			builtin: !config.is_some_and(|c| c.disable_builtin),
		}
	}

	pub fn with_entry(mut self, type_name: impl Into<String>, source: impl Into<String>) -> Self {
		self.entries.insert(type_name.into(), source.into());
		self
	}
}

impl SourceCatalog for StaticCatalog {
	fn lookup_legacy(&self, legacy: &ProviderAddr) -> Result<ProviderAddr, LookupError> {
		let type_name = legacy.type_name.as_str();

		if let Some(source) = self.entries.get(type_name) {
			return ProviderAddr::parse(source).map_err(|e| {
				LookupError::Other(format!("catalog entry `{type_name} = \"{source}\"` is invalid: {e}"))
			});
		}

		if self.builtin && BUILTIN_PROVIDERS.contains(&type_name) {
			return Ok(ProviderAddr::new_default(type_name));
		}

		Err(LookupError::NotKnown(legacy.for_display()))
	}
}
