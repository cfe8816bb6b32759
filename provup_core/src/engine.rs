use std::borrow::Cow;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::Diagnostics;
use crate::ProvupConfig;
use crate::ProvupError;
use crate::ProvupResult;
use crate::RequirementMap;
use crate::aggregate::aggregate;
use crate::catalog::SourceCatalog;
use crate::config::DEFAULT_FALLBACK_FILE;
use crate::module::LoadOptions;
use crate::module::Module;
use crate::module::load_module;
use crate::module::parse_document;
use crate::parser::Document;
use crate::resolve::resolve;
use crate::rewrite::RewriteOptions;
use crate::rewrite::rewrite_document;

/// The stages of an upgrade run, in order. A run ends in `Committed`, or in
/// `Failed` when loading or rewriting hits a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Loading,
	Aggregating,
	Resolving,
	Rewriting,
	Committed,
	Failed,
}

#[derive(Debug, Clone)]
pub struct UpgradeOptions {
	pub load: LoadOptions,
	pub rewrite: RewriteOptions,
	/// File, relative to the module directory, that receives the declaration
	/// when no file has a `terraform` block.
	pub fallback_file: PathBuf,
}

impl Default for UpgradeOptions {
	fn default() -> Self {
		Self {
			load: LoadOptions::default(),
			rewrite: RewriteOptions::default(),
			fallback_file: PathBuf::from(DEFAULT_FALLBACK_FILE),
		}
	}
}

impl UpgradeOptions {
	pub fn from_config(config: Option<&ProvupConfig>) -> ProvupResult<Self> {
		let Some(config) = config else {
			return Ok(Self::default());
		};

		Ok(Self {
			load: LoadOptions {
				exclude: config.exclude.glob_set()?,
			},
			rewrite: RewriteOptions {
				merge_blocks: config.rewrite.merge_blocks,
			},
			fallback_file: config.rewrite.fallback_file.clone(),
		})
	}
}

/// The file an upgrade will overwrite, or create.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedWrite {
	pub path: PathBuf,
	/// The current content, or `None` when the file does not exist yet.
	pub original: Option<String>,
	pub content: String,
}

impl PlannedWrite {
	pub fn is_new_file(&self) -> bool {
		self.original.is_none()
	}
}

/// The outcome of a run that did not fail.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
	pub stage: Stage,
	pub requirements: RequirementMap,
	pub declaration_files: Vec<PathBuf>,
	pub diagnostics: Diagnostics,
	/// `None` when the module needs no change.
	pub write: Option<PlannedWrite>,
}

impl UpgradeReport {
	pub fn is_changed(&self) -> bool {
		self.write.is_some()
	}
}

/// A fatal error together with the diagnostics collected before it.
#[derive(Debug)]
pub struct UpgradeFailure {
	/// Always [`Stage::Failed`].
	pub stage: Stage,
	/// The stage the run was in when it failed.
	pub failed_at: Stage,
	pub error: ProvupError,
	pub diagnostics: Diagnostics,
}

struct Run {
	stage: Stage,
	diagnostics: Diagnostics,
}

impl Run {
	fn new() -> Self {
		tracing::debug!(stage = ?Stage::Loading, "starting upgrade");
		Self {
			stage: Stage::Loading,
			diagnostics: Diagnostics::new(),
		}
	}

	fn advance(&mut self, stage: Stage) {
		tracing::debug!(from = ?self.stage, to = ?stage, "advancing upgrade");
		self.stage = stage;
	}

	fn fail(mut self, error: ProvupError) -> UpgradeFailure {
		let failed_at = self.stage;
		tracing::debug!(stage = ?failed_at, error = %error, "upgrade failed");
		self.advance(Stage::Failed);
		UpgradeFailure {
			stage: self.stage,
			failed_at,
			error,
			diagnostics: self.diagnostics,
		}
	}
}

/// Load, aggregate, resolve and rewrite the module in `root` without
/// touching the filesystem. The returned report holds the planned write, if
/// any; pass it to [`commit_upgrade`] to apply it.
pub fn plan_upgrade(
	root: &Path,
	catalog: &dyn SourceCatalog,
	options: &UpgradeOptions,
) -> Result<UpgradeReport, UpgradeFailure> {
	let mut run = Run::new();

	let module = match load_module(root, &options.load) {
		Ok(module) => module,
		Err(error) => return Err(run.fail(error)),
	};
	run.diagnostics.extend(module.diagnostics.iter().cloned());

	run.advance(Stage::Aggregating);
	let aggregation = aggregate(&module.files);
	let mut requirements = aggregation.requirements;
	let declaration_files = aggregation.declaration_files;
	run.diagnostics.extend(aggregation.diagnostics);

	run.advance(Stage::Resolving);
	let resolved = resolve(&mut requirements, catalog);
	run.diagnostics.extend(resolved);

	run.advance(Stage::Rewriting);
	if requirements.is_empty() {
		tracing::info!(root = %root.display(), "module has no provider requirements");
		return Ok(UpgradeReport {
			stage: run.stage,
			requirements,
			declaration_files,
			diagnostics: run.diagnostics,
			write: None,
		});
	}

	if declaration_files.len() > 1 {
		let files = declaration_files
			.iter()
			.map(|path| path.display().to_string())
			.collect();
		return Err(run.fail(ProvupError::MultipleDeclarationFiles { files }));
	}

	let target = match select_target(&module, &declaration_files, options) {
		Ok(target) => target,
		Err(error) => return Err(run.fail(error)),
	};
	tracing::debug!(path = %target.path.display(), exists = target.exists, "selected rewrite target");

	let rewrite = match rewrite_document(
		&target.path,
		&target.document,
		&requirements,
		&options.rewrite,
	) {
		Ok(rewrite) => rewrite,
		Err(error) => return Err(run.fail(error)),
	};
	run.diagnostics.extend(rewrite.diagnostics);

	let changed = !target.exists || rewrite.content != target.document.source();
	let write = changed.then(|| {
		PlannedWrite {
			path: target.path.clone(),
			original: target
				.exists
				.then(|| target.document.source().to_string()),
			content: rewrite.content,
		}
	});

	Ok(UpgradeReport {
		stage: run.stage,
		requirements,
		declaration_files,
		diagnostics: run.diagnostics,
		write,
	})
}

/// Write the planned change of a report to disk.
pub fn commit_upgrade(report: &mut UpgradeReport) -> Result<(), UpgradeFailure> {
	if let Some(write) = &report.write {
		std::fs::write(&write.path, &write.content).map_err(|e| {
			tracing::debug!(from = ?report.stage, to = ?Stage::Failed, "advancing upgrade");
			UpgradeFailure {
				stage: Stage::Failed,
				failed_at: report.stage,
				error: ProvupError::WriteFile {
					path: write.path.display().to_string(),
					reason: e.to_string(),
				},
				diagnostics: report.diagnostics.clone(),
			}
		})?;
		tracing::info!(path = %write.path.display(), "wrote upgraded configuration");
	}

	tracing::debug!(from = ?report.stage, to = ?Stage::Committed, "advancing upgrade");
	report.stage = Stage::Committed;

	Ok(())
}

/// Upgrade the module in `root` and write the result.
pub fn upgrade_module(
	root: &Path,
	catalog: &dyn SourceCatalog,
	options: &UpgradeOptions,
) -> Result<UpgradeReport, UpgradeFailure> {
	let mut report = plan_upgrade(root, catalog, options)?;
	commit_upgrade(&mut report)?;

	Ok(report)
}

struct Target<'a> {
	path: PathBuf,
	document: Cow<'a, Document>,
	exists: bool,
}

/// Pick the document that receives the declaration: the file that already
/// declares requirements, else the first file with a `terraform` block,
/// else the fallback file.
fn select_target<'a>(
	module: &'a Module,
	declaration_files: &[PathBuf],
	options: &UpgradeOptions,
) -> ProvupResult<Target<'a>> {
	let declaring = declaration_files
		.first()
		.and_then(|path| module.files.get(path));
	if let Some(file) = declaring.or_else(|| module.first_file_with_settings()) {
		return Ok(Target {
			path: file.path.clone(),
			document: Cow::Borrowed(&file.document),
			exists: true,
		});
	}

	let path = module.root.join(&options.fallback_file);
	if let Some(file) = module.files.get(&path) {
		return Ok(Target {
			path,
			document: Cow::Borrowed(&file.document),
			exists: true,
		});
	}

	if path.is_file() {
		let content = std::fs::read_to_string(&path).map_err(|e| {
			ProvupError::ReadFile {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;
		let document = parse_document(&path, content)?;
		return Ok(Target {
			path,
			document: Cow::Owned(document),
			exists: true,
		});
	}

	let document = parse_document(&path, String::new())?;
	Ok(Target {
		path,
		document: Cow::Owned(document),
		exists: false,
	})
}
