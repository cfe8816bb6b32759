use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobSet;

use crate::Diagnostic;
use crate::DiagnosticKind;
use crate::Diagnostics;
use crate::Point;
use crate::Position;
use crate::ProvupError;
use crate::ProvupResult;
use crate::SourceLocation;
use crate::addrs::ProviderAddr;
use crate::addrs::implied_provider;
use crate::config::build_glob_set;
use crate::parser::Attribute;
use crate::parser::Block;
use crate::parser::Document;

/// Primary configuration files end in this extension.
pub const CONFIG_EXTENSION: &str = ".tf";

/// JSON configuration files are recognized but never loaded.
pub const JSON_CONFIG_EXTENSION: &str = ".tf.json";

/// Files matching these patterns are merged over primary files by the
/// configuration language. They are reported and skipped.
pub const OVERRIDE_PATTERNS: [&str; 2] = ["override.tf", "*_override.tf"];

/// Options controlling which files are loaded from a module directory.
#[derive(Debug, Clone)]
pub struct LoadOptions {
	/// File names matching this set are skipped entirely.
	pub exclude: GlobSet,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			exclude: GlobSet::empty(),
		}
	}
}

/// A module directory with every primary configuration file parsed.
#[derive(Debug, Clone)]
pub struct Module {
	pub root: PathBuf,
	/// Parsed primary files keyed by path, in file name order.
	pub files: BTreeMap<PathBuf, ConfigFile>,
	/// Override files that were found and skipped.
	pub overrides: Vec<PathBuf>,
	/// Non-fatal problems found while loading.
	pub diagnostics: Diagnostics,
}

impl Module {
	/// The first file, in name order, with a top-level `terraform` block.
	pub fn first_file_with_settings(&self) -> Option<&ConfigFile> {
		self.files
			.values()
			.find(|file| file.document.body().blocks_of_type("terraform").next().is_some())
	}
}

/// One parsed configuration file and the declarations relevant to provider
/// requirements.
#[derive(Debug, Clone)]
pub struct ConfigFile {
	pub path: PathBuf,
	pub document: Document,
	/// `terraform { required_providers { ... } }` blocks in source order.
	pub required_providers: Vec<RequiredProviders>,
	pub provider_configs: Vec<ProviderConfig>,
	pub managed_resources: Vec<Resource>,
	pub data_resources: Vec<Resource>,
}

/// A single `required_providers` block.
#[derive(Debug, Clone)]
pub struct RequiredProviders {
	pub location: SourceLocation,
	pub entries: Vec<RequiredProvider>,
}

/// An entry of a `required_providers` block.
#[derive(Debug, Clone)]
pub struct RequiredProvider {
	pub name: String,
	/// The source string as written, if any.
	pub source: Option<String>,
	/// The parsed source, or the legacy address implied by the name.
	pub address: ProviderAddr,
	pub version: Option<String>,
	pub location: SourceLocation,
}

/// A `provider "name" { ... }` configuration block.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
	pub name: String,
	pub alias: Option<String>,
	/// The legacy in-block version constraint.
	pub version: Option<String>,
	pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceMode {
	Managed,
	Data,
}

/// A reference to a provider configuration such as `aws.west`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
	pub name: String,
	pub alias: Option<String>,
}

/// A `resource` or `data` block.
#[derive(Debug, Clone)]
pub struct Resource {
	pub mode: ResourceMode,
	pub type_name: String,
	pub name: String,
	/// The explicit `provider` argument, if any.
	pub provider: Option<ProviderRef>,
	pub location: SourceLocation,
}

impl Resource {
	/// The local name of the provider this resource uses: the explicit
	/// `provider` reference, or the prefix of the resource type.
	pub fn provider_name(&self) -> &str {
		match &self.provider {
			Some(provider) => provider.name.as_str(),
			None => implied_provider(&self.type_name),
		}
	}
}

/// Discover and parse every primary configuration file in `root`.
///
/// Only the directory itself is read; child modules are not visited.
pub fn load_module(root: &Path, options: &LoadOptions) -> ProvupResult<Module> {
	let overrides = build_glob_set(&OVERRIDE_PATTERNS.map(String::from))?;
	let entries = std::fs::read_dir(root).map_err(|e| {
		ProvupError::ReadFile {
			path: root.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	let mut primary = Vec::new();
	let mut override_files = Vec::new();
	let mut diagnostics = Diagnostics::new();
	let mut json_files = 0usize;

	for entry in entries {
		let path = entry?.path();
		if path.is_dir() {
			continue;
		}
		let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
			continue;
		};
		if is_ignored_file_name(name) {
			continue;
		}
		if options.exclude.is_match(name) {
			tracing::debug!(path = %path.display(), "excluded by config");
			continue;
		}

		if name.ends_with(JSON_CONFIG_EXTENSION) {
			tracing::warn!(path = %path.display(), "skipping JSON configuration file");
			diagnostics.push(Diagnostic::for_file(DiagnosticKind::UnsupportedFile, &path));
			json_files += 1;
		} else if name.ends_with(CONFIG_EXTENSION) {
			if overrides.is_match(name) {
				override_files.push(path);
			} else {
				primary.push(path);
			}
		}
	}

	if primary.is_empty() && override_files.is_empty() && json_files == 0 {
		return Err(ProvupError::NotModuleDirectory(root.display().to_string()));
	}

	primary.sort();
	override_files.sort();
	for path in &override_files {
		tracing::warn!(path = %path.display(), "ignoring override file");
		diagnostics.push(Diagnostic::for_file(DiagnosticKind::OverrideIgnored, path));
	}

	let mut files = BTreeMap::new();
	for path in primary {
		let file = load_file(&path)?;
		tracing::debug!(
			path = %path.display(),
			required_providers = file.required_providers.len(),
			provider_configs = file.provider_configs.len(),
			resources = file.managed_resources.len() + file.data_resources.len(),
			"loaded configuration file"
		);
		files.insert(path, file);
	}

	Ok(Module {
		root: root.to_path_buf(),
		files,
		overrides: override_files,
		diagnostics,
	})
}

/// Hidden files and editor backups never take part in the module.
fn is_ignored_file_name(name: &str) -> bool {
	name.starts_with('.')
		|| name.ends_with('~')
		|| (name.starts_with('#') && name.ends_with('#'))
}

/// Read and parse a single configuration file.
pub fn load_file(path: &Path) -> ProvupResult<ConfigFile> {
	let content = std::fs::read_to_string(path).map_err(|e| {
		ProvupError::ReadFile {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;
	let document = parse_document(path, content)?;

	ConfigFile::from_document(path, document)
}

/// Parse configuration text, reporting syntax errors against `path`.
pub fn parse_document(path: &Path, content: String) -> ProvupResult<Document> {
	let offsets = content.clone();
	Document::parse(content).map_err(|error| {
		let point = Point::locate(&offsets, error.offset);
		ProvupError::Parse {
			path: path.display().to_string(),
			line: point.line,
			column: point.column,
			message: error.message,
		}
	})
}

impl ConfigFile {
	/// Extract the provider-related declarations from a parsed document.
	pub fn from_document(path: &Path, document: Document) -> ProvupResult<Self> {
		let extractor = Extractor {
			path,
			source: document.source(),
		};
		let mut required_providers = Vec::new();
		let mut provider_configs = Vec::new();
		let mut managed_resources = Vec::new();
		let mut data_resources = Vec::new();

		for block in document.body().blocks() {
			match block.ident.as_str() {
				"terraform" => {
					for nested in block.body.blocks_of_type("required_providers") {
						required_providers.push(extractor.required_providers(nested)?);
					}
				}
				"provider" => provider_configs.push(extractor.provider_config(block)?),
				"resource" => managed_resources.push(extractor.resource(block, ResourceMode::Managed)?),
				"data" => data_resources.push(extractor.resource(block, ResourceMode::Data)?),
				_ => {}
			}
		}

		Ok(Self {
			path: path.to_path_buf(),
			document,
			required_providers,
			provider_configs,
			managed_resources,
			data_resources,
		})
	}
}

struct Extractor<'a> {
	path: &'a Path,
	source: &'a str,
}

impl Extractor<'_> {
	fn location(&self, span: &Range<usize>) -> SourceLocation {
		SourceLocation::new(self.path, Position::from_span(self.source, span))
	}

	fn structure_error(&self, offset: usize, message: impl Into<String>) -> ProvupError {
		let point = Point::locate(self.source, offset);
		ProvupError::Parse {
			path: self.path.display().to_string(),
			line: point.line,
			column: point.column,
			message: message.into(),
		}
	}

	fn required_providers(&self, block: &Block) -> ProvupResult<RequiredProviders> {
		let mut entries = Vec::new();
		for attribute in block.body.attributes() {
			entries.push(self.required_provider(attribute)?);
		}
		if let Some(nested) = block.body.blocks().next() {
			return Err(self.structure_error(
				nested.ident_span.start,
				format!("unexpected block `{}` inside required_providers", nested.ident),
			));
		}

		Ok(RequiredProviders {
			location: self.location(&block.ident_span),
			entries,
		})
	}

	fn required_provider(&self, attribute: &Attribute) -> ProvupResult<RequiredProvider> {
		let name = attribute.name.clone();
		let location = self.location(&attribute.name_span);
		let invalid = |reason: &str| {
			ProvupError::InvalidRequirement {
				name: name.clone(),
				location: location.to_string(),
				reason: reason.to_string(),
			}
		};

		let mut source = None;
		let mut version = None;

		if let Some(constraint) = attribute.expression.as_string_literal(self.source) {
			version = Some(constraint);
		} else if let Some(pairs) = attribute.expression.as_object(self.source) {
			for (key, value) in pairs {
				match key.as_str() {
					"source" => {
						let value = value
							.as_string_literal(self.source)
							.ok_or_else(|| invalid("`source` must be a literal string"))?;
						source = Some(value);
					}
					"version" => {
						let value = value
							.as_string_literal(self.source)
							.ok_or_else(|| invalid("`version` must be a literal string"))?;
						version = Some(value);
					}
					other => {
						tracing::debug!(name = %name, key = other, "ignoring required_providers key");
					}
				}
			}
		} else {
			return Err(invalid("expected a version string or an object"));
		}

		let address = match &source {
			Some(source) => {
				ProviderAddr::parse(source).map_err(|e| {
					ProvupError::InvalidSource {
						source_address: source.clone(),
						location: location.to_string(),
						reason: e.to_string(),
					}
				})?
			}
			None => ProviderAddr::new_legacy(name.as_str()),
		};

		Ok(RequiredProvider {
			name,
			source,
			address,
			version,
			location,
		})
	}

	fn provider_config(&self, block: &Block) -> ProvupResult<ProviderConfig> {
		let Some(name) = block.label(0) else {
			return Err(self.structure_error(
				block.ident_span.start,
				"provider blocks require a name label",
			));
		};

		Ok(ProviderConfig {
			name: name.to_string(),
			alias: self.string_attribute(block, "alias")?,
			version: self.string_attribute(block, "version")?,
			location: self.location(&block.ident_span),
		})
	}

	fn resource(&self, block: &Block, mode: ResourceMode) -> ProvupResult<Resource> {
		let (Some(type_name), Some(name)) = (block.label(0), block.label(1)) else {
			return Err(self.structure_error(
				block.ident_span.start,
				format!("{} blocks require a type label and a name label", block.ident),
			));
		};

		let provider = match block.body.attribute("provider") {
			Some(attribute) => Some(self.provider_ref(attribute)?),
			None => None,
		};

		Ok(Resource {
			mode,
			type_name: type_name.to_string(),
			name: name.to_string(),
			provider,
			location: self.location(&block.ident_span),
		})
	}

	/// `provider = aws.west`, or the older quoted form `provider = "aws.west"`.
	fn provider_ref(&self, attribute: &Attribute) -> ProvupResult<ProviderRef> {
		let steps = attribute
			.expression
			.as_traversal(self.source)
			.or_else(|| {
				attribute
					.expression
					.as_string_literal(self.source)
					.map(|value| value.split('.').map(String::from).collect())
			})
			.unwrap_or_default();

		match steps.as_slice() {
			[name] if !name.is_empty() => {
				Ok(ProviderRef {
					name: name.clone(),
					alias: None,
				})
			}
			[name, alias] if !name.is_empty() && !alias.is_empty() => {
				Ok(ProviderRef {
					name: name.clone(),
					alias: Some(alias.clone()),
				})
			}
			_ => {
				Err(self.structure_error(
					attribute.expression.span.start,
					"`provider` must reference a provider configuration such as `aws` or `aws.west`",
				))
			}
		}
	}

	fn string_attribute(&self, block: &Block, name: &str) -> ProvupResult<Option<String>> {
		let Some(attribute) = block.body.attribute(name) else {
			return Ok(None);
		};

		attribute
			.expression
			.as_string_literal(self.source)
			.map(Some)
			.ok_or_else(|| {
				self.structure_error(
					attribute.expression.span.start,
					format!("`{name}` must be a literal string"),
				)
			})
	}
}
