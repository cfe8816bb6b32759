use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::AnyResult;
use crate::LookupError;
use crate::ProviderAddr;
use crate::ProviderAddress;
use crate::ProviderRequirement;
use crate::RequirementMap;
use crate::SourceCatalog;
use crate::module::ConfigFile;
use crate::parser::Document;

/// The comment written above an unresolved `custom` provider, indented by
/// `indent`.
pub fn custom_todo_comment(indent: &str) -> String {
	[
		"# TF-UPGRADE-TODO",
		"#",
		"# No source detected for this provider. You must add a source address",
		"# in the following format:",
		"#",
		"# source = \"your.domain.com/organization/custom\"",
		"#",
		"# For more information, see the provider source documentation:",
		"#",
		"# https://www.terraform.io/docs/configuration/providers.html#provider-source",
	]
	.iter()
	.map(|line| format!("{indent}{line}\n"))
	.collect()
}

pub fn parse(source: &str) -> Document {
	Document::parse(source).unwrap_or_else(|e| panic!("parse: {e:?}"))
}

pub fn config_file(name: &str, source: &str) -> ConfigFile {
	ConfigFile::from_document(Path::new(name), parse(source))
		.unwrap_or_else(|e| panic!("config file: {e}"))
}

pub fn config_files(files: &[(&str, &str)]) -> BTreeMap<PathBuf, ConfigFile> {
	files
		.iter()
		.map(|(name, source)| (PathBuf::from(name), config_file(name, source)))
		.collect()
}

/// A temporary module directory holding the given files.
pub fn module_dir(files: &[(&str, &str)]) -> AnyResult<TempDir> {
	let tmp = tempfile::tempdir()?;
	for (name, content) in files {
		let path = tmp.path().join(name);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}

	Ok(tmp)
}

pub fn read(dir: &TempDir, name: &str) -> String {
	std::fs::read_to_string(dir.path().join(name)).unwrap_or_else(|e| panic!("read {name}: {e}"))
}

pub fn resolved(name: &str, source: &str, version: Option<&str>) -> ProviderRequirement {
	ProviderRequirement {
		name: name.to_string(),
		source: None,
		address: ProviderAddress::Resolved(
			ProviderAddr::parse(source).unwrap_or_else(|e| panic!("address: {e}")),
		),
		version: version.map(String::from),
		location: None,
	}
}

pub fn unresolved(name: &str, version: Option<&str>) -> ProviderRequirement {
	ProviderRequirement {
		name: name.to_string(),
		source: None,
		address: ProviderAddress::Unresolved,
		version: version.map(String::from),
		location: None,
	}
}

pub fn requirement_map(requirements: Vec<ProviderRequirement>) -> RequirementMap {
	requirements
		.into_iter()
		.map(|requirement| (requirement.name.clone(), requirement))
		.collect()
}

/// A catalog whose lookups fail for the listed type names and resolve to
/// `hashicorp/<type>` otherwise.
pub struct FailingCatalog {
	pub failing: Vec<&'static str>,
}

impl SourceCatalog for FailingCatalog {
	fn lookup_legacy(&self, legacy: &ProviderAddr) -> Result<ProviderAddr, LookupError> {
		if self.failing.contains(&legacy.type_name.as_str()) {
			return Err(LookupError::Other("registry unavailable".to_string()));
		}

		Ok(ProviderAddr::new_default(legacy.type_name.as_str()))
	}
}
