use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::Diagnostic;
use crate::DiagnosticKind;
use crate::Diagnostics;
use crate::ProviderAddress;
use crate::ProviderRequirement;
use crate::RequirementMap;
use crate::module::ConfigFile;

/// The provider requirements of a module, merged from every file.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
	pub requirements: RequirementMap,
	/// Files containing at least one `required_providers` block, in name
	/// order.
	pub declaration_files: Vec<PathBuf>,
	pub diagnostics: Diagnostics,
}

/// Merge the provider requirements declared or implied across a module.
///
/// Explicit `required_providers` entries are collected first, from every
/// file. Provider configuration blocks and then resources only add
/// requirements for local names nothing earlier has claimed, so an explicit
/// declaration always wins over an implied one.
pub fn aggregate(files: &BTreeMap<PathBuf, ConfigFile>) -> Aggregation {
	let mut aggregation = Aggregation::default();

	for (path, file) in files {
		if !file.required_providers.is_empty() {
			aggregation.declaration_files.push(path.clone());
		}

		for entry in file.required_providers.iter().flat_map(|block| &block.entries) {
			if let Some(existing) = aggregation.requirements.get(&entry.name) {
				tracing::warn!(name = %entry.name, location = %entry.location, "duplicate required provider");
				aggregation.diagnostics.push(Diagnostic::new(
					DiagnosticKind::DuplicateRequirement {
						name: entry.name.clone(),
						previous: existing.location.clone(),
					},
					Some(entry.location.clone()),
				));
				continue;
			}

			aggregation.requirements.insert(
				entry.name.clone(),
				ProviderRequirement {
					name: entry.name.clone(),
					source: entry.source.clone(),
					address: ProviderAddress::Resolved(entry.address.clone()),
					version: entry.version.clone(),
					location: Some(entry.location.clone()),
				},
			);
		}
	}

	for file in files.values() {
		for config in &file.provider_configs {
			if aggregation.requirements.contains_key(&config.name) {
				continue;
			}

			tracing::debug!(name = %config.name, location = %config.location, "requirement implied by provider block");
			aggregation.requirements.insert(
				config.name.clone(),
				ProviderRequirement::legacy(
					config.name.as_str(),
					config.version.clone(),
					Some(config.location.clone()),
				),
			);
		}
	}

	for file in files.values() {
		for resource in file.managed_resources.iter().chain(&file.data_resources) {
			let name = resource.provider_name();
			if aggregation.requirements.contains_key(name) {
				continue;
			}

			tracing::debug!(name, location = %resource.location, "requirement implied by resource");
			aggregation.requirements.insert(
				name.to_string(),
				ProviderRequirement::legacy(name, None, Some(resource.location.clone())),
			);
		}
	}

	aggregation
}
