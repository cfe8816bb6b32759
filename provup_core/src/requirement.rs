use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::SourceLocation;
use crate::addrs::ProviderAddr;

/// Provider requirements keyed by local name. Iteration is lexicographic,
/// which keeps the rewritten block stable between runs.
pub type RequirementMap = BTreeMap<String, ProviderRequirement>;

/// Where a requirement's provider comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderAddress {
	/// A canonical address, or the legacy `-/<name>` address derived from
	/// the local name.
	Resolved(ProviderAddr),
	/// The catalog does not know this provider. The rewritten entry gets no
	/// `source` and an explanatory comment instead.
	Unresolved,
}

/// Everything known about one provider the module depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequirement {
	/// The local name the module uses for the provider.
	pub name: String,
	/// The source string declared in a `required_providers` entry. Requirements
	/// with a declared source are never looked up.
	pub source: Option<String>,
	pub address: ProviderAddress,
	/// The version constraint, as written.
	pub version: Option<String>,
	/// Where the requirement was declared or implied, for diagnostics.
	pub location: Option<SourceLocation>,
}

impl ProviderRequirement {
	/// A requirement synthesized from a local name alone.
	pub fn legacy(
		name: impl Into<String>,
		version: Option<String>,
		location: Option<SourceLocation>,
	) -> Self {
		let name = name.into();
		Self {
			address: ProviderAddress::Resolved(ProviderAddr::new_legacy(name.as_str())),
			name,
			source: None,
			version,
			location,
		}
	}

	pub fn is_unresolved(&self) -> bool {
		self.address == ProviderAddress::Unresolved
	}

	/// The address to write as the `source` of the rewritten entry.
	pub fn source_for_display(&self) -> Option<String> {
		match &self.address {
			ProviderAddress::Resolved(addr) => Some(addr.for_display()),
			ProviderAddress::Unresolved => None,
		}
	}

	/// The version constraint, if one is set and non-empty.
	pub fn version_constraint(&self) -> Option<&str> {
		self.version
			.as_deref()
			.map(str::trim)
			.filter(|version| !version.is_empty())
	}

	/// The type name used to build the legacy lookup address.
	pub fn type_name(&self) -> &str {
		match &self.address {
			ProviderAddress::Resolved(addr) => addr.type_name.as_str(),
			ProviderAddress::Unresolved => self.name.as_str(),
		}
	}
}
