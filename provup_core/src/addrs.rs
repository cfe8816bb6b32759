use std::fmt::Display;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// The registry host implied when a source address has no hostname.
pub const DEFAULT_REGISTRY_HOST: &str = "registry.terraform.io";

/// The namespace assumed for single-part source addresses.
pub const DEFAULT_NAMESPACE: &str = "hashicorp";

/// The placeholder namespace of addresses synthesized from a local name
/// before any canonical address is known.
pub const LEGACY_NAMESPACE: &str = "-";

/// A fully-qualified provider source address: `hostname/namespace/type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderAddr {
	pub hostname: String,
	pub namespace: String,
	pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AddrError {
	#[error("source address must not be empty")]
	Empty,
	#[error("source address must have at most three parts separated by `/`")]
	TooManyParts,
	#[error("invalid {part} `{value}`: {reason}")]
	InvalidPart {
		part: &'static str,
		value: String,
		reason: &'static str,
	},
	#[error("the legacy namespace `-` is only valid on the default registry")]
	LegacyOnCustomHost,
}

impl ProviderAddr {
	pub fn new(
		hostname: impl Into<String>,
		namespace: impl Into<String>,
		type_name: impl Into<String>,
	) -> Self {
		Self {
			hostname: hostname.into(),
			namespace: namespace.into(),
			type_name: type_name.into(),
		}
	}

	/// The legacy address derived purely from a local name.
	pub fn new_legacy(type_name: impl Into<String>) -> Self {
		Self::new(DEFAULT_REGISTRY_HOST, LEGACY_NAMESPACE, type_name)
	}

	/// An address in the default namespace of the default registry.
	pub fn new_default(type_name: impl Into<String>) -> Self {
		Self::new(DEFAULT_REGISTRY_HOST, DEFAULT_NAMESPACE, type_name)
	}

	pub fn is_default_host(&self) -> bool {
		self.hostname == DEFAULT_REGISTRY_HOST
	}

	/// The shortest form of the address that parses back to the same value.
	/// The hostname is omitted for the default registry.
	pub fn for_display(&self) -> String {
		if self.is_default_host() {
			format!("{}/{}", self.namespace, self.type_name)
		} else {
			self.to_string()
		}
	}

	/// Parse a source address of the form `[hostname/][namespace/]type`.
	pub fn parse(source: &str) -> Result<Self, AddrError> {
		let source = source.trim();
		if source.is_empty() {
			return Err(AddrError::Empty);
		}

		let parts: Vec<&str> = source.split('/').collect();
		let (hostname, namespace, type_name) = match parts.as_slice() {
			[type_name] => (DEFAULT_REGISTRY_HOST, DEFAULT_NAMESPACE, *type_name),
			[namespace, type_name] => (DEFAULT_REGISTRY_HOST, *namespace, *type_name),
			[hostname, namespace, type_name] => (*hostname, *namespace, *type_name),
			_ => return Err(AddrError::TooManyParts),
		};

		let hostname = validate_hostname(hostname)?;
		let namespace = validate_namespace(namespace)?;
		let type_name = validate_type_name(type_name)?;

		if namespace == LEGACY_NAMESPACE && hostname != DEFAULT_REGISTRY_HOST {
			return Err(AddrError::LegacyOnCustomHost);
		}

		Ok(Self::new(hostname, namespace, type_name))
	}
}

impl Display for ProviderAddr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
	}
}

impl FromStr for ProviderAddr {
	type Err = AddrError;

	fn from_str(source: &str) -> Result<Self, Self::Err> {
		Self::parse(source)
	}
}

fn validate_hostname(value: &str) -> Result<String, AddrError> {
	let invalid = |reason| {
		AddrError::InvalidPart {
			part: "hostname",
			value: value.to_string(),
			reason,
		}
	};

	if value.is_empty() {
		return Err(invalid("must not be empty"));
	}
	let valid_chars = value
		.chars()
		.all(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '.' | ':'));
	if !valid_chars {
		return Err(invalid("must contain only letters, digits, `-`, `.` and a port"));
	}

	Ok(value.to_lowercase())
}

fn validate_namespace(value: &str) -> Result<String, AddrError> {
	if value == LEGACY_NAMESPACE {
		return Ok(value.to_string());
	}

	validate_name_part("namespace", value)
}

fn validate_type_name(value: &str) -> Result<String, AddrError> {
	validate_name_part("type", value)
}

fn validate_name_part(part: &'static str, value: &str) -> Result<String, AddrError> {
	let invalid = |reason| {
		AddrError::InvalidPart {
			part,
			value: value.to_string(),
			reason,
		}
	};

	if value.is_empty() {
		return Err(invalid("must not be empty"));
	}
	if value.starts_with('-') || value.ends_with('-') {
		return Err(invalid("must not start or end with `-`"));
	}
	if !value
		.chars()
		.all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
	{
		return Err(invalid("must contain only letters, digits, `-` and `_`"));
	}

	Ok(value.to_lowercase())
}

/// The local name implied by a resource type: the part before the first
/// underscore, so `aws_instance` implies `aws`.
pub fn implied_provider(resource_type: &str) -> &str {
	resource_type
		.split_once('_')
		.map_or(resource_type, |(prefix, _)| prefix)
}
