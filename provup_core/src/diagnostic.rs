use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;

use crate::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
	Warning,
}

/// The kind of a non-fatal problem found while upgrading a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagnosticKind {
	/// A local name was declared more than once. The first declaration wins.
	DuplicateRequirement {
		name: String,
		previous: Option<SourceLocation>,
	},
	/// The catalog does not know the provider; its source must be supplied
	/// by hand.
	SourceNotDetected { name: String, reason: String },
	/// The catalog lookup failed; the requirement was left unchanged.
	SourceLookupFailed { name: String, reason: String },
	/// An override file was skipped.
	OverrideIgnored,
	/// A JSON configuration file was skipped.
	UnsupportedFile,
	/// An extra `required_providers` block was merged into the first one
	/// and removed.
	BlockMerged { into: SourceLocation },
}

/// A non-fatal problem with the file or declaration it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub kind: DiagnosticKind,
	/// The file the diagnostic concerns.
	pub file: Option<PathBuf>,
	/// The declaration the diagnostic concerns, when there is one.
	pub location: Option<SourceLocation>,
}

impl Diagnostic {
	pub fn new(kind: DiagnosticKind, location: Option<SourceLocation>) -> Self {
		let file = location.as_ref().map(|location| location.file.clone());
		Self {
			kind,
			file,
			location,
		}
	}

	pub fn for_file(kind: DiagnosticKind, file: impl AsRef<Path>) -> Self {
		Self {
			kind,
			file: Some(file.as_ref().to_path_buf()),
			location: None,
		}
	}

	pub fn severity(&self) -> Severity {
		match self.kind {
			DiagnosticKind::DuplicateRequirement { .. }
			| DiagnosticKind::SourceNotDetected { .. }
			| DiagnosticKind::SourceLookupFailed { .. }
			| DiagnosticKind::OverrideIgnored
			| DiagnosticKind::UnsupportedFile
			| DiagnosticKind::BlockMerged { .. } => Severity::Warning,
		}
	}

	/// Stable diagnostic code.
	pub fn code(&self) -> &'static str {
		match self.kind {
			DiagnosticKind::DuplicateRequirement { .. } => "provup::duplicate_requirement",
			DiagnosticKind::SourceNotDetected { .. } => "provup::source_not_detected",
			DiagnosticKind::SourceLookupFailed { .. } => "provup::source_lookup_failed",
			DiagnosticKind::OverrideIgnored => "provup::override_ignored",
			DiagnosticKind::UnsupportedFile => "provup::unsupported_file",
			DiagnosticKind::BlockMerged { .. } => "provup::block_merged",
		}
	}

	/// Human-readable message for this diagnostic.
	pub fn message(&self) -> String {
		let file = self
			.file
			.as_ref()
			.map(|file| file.display().to_string())
			.unwrap_or_default();

		match &self.kind {
			DiagnosticKind::DuplicateRequirement { name, previous } => {
				match previous {
					Some(previous) => {
						format!(
							"duplicate required provider configuration for `{name}`, previously \
							 configured at {previous}"
						)
					}
					None => format!("duplicate required provider configuration for `{name}`"),
				}
			}
			DiagnosticKind::SourceNotDetected { name, reason }
			| DiagnosticKind::SourceLookupFailed { name, reason } => {
				format!("could not detect provider source for `{name}`: {reason}")
			}
			DiagnosticKind::OverrideIgnored => {
				format!("ignoring override file `{file}`: not implemented")
			}
			DiagnosticKind::UnsupportedFile => {
				format!("ignoring JSON configuration file `{file}`: only native syntax can be rewritten")
			}
			DiagnosticKind::BlockMerged { into } => {
				format!("merged required_providers block into the one at {into}")
			}
		}
	}

	pub fn help(&self) -> Option<String> {
		match &self.kind {
			DiagnosticKind::DuplicateRequirement { .. } => {
				Some("remove the later declaration; only the first one is kept".to_string())
			}
			DiagnosticKind::SourceNotDetected { name, .. } => {
				Some(format!(
					"add `source = \"<hostname>/<namespace>/{name}\"` to the generated entry, or \
					 map `{name}` under `[catalog]` in provup.toml"
				))
			}
			DiagnosticKind::SourceLookupFailed { .. } => {
				Some("the requirement was left unchanged; check the catalog configuration".to_string())
			}
			DiagnosticKind::OverrideIgnored
			| DiagnosticKind::UnsupportedFile
			| DiagnosticKind::BlockMerged { .. } => None,
		}
	}
}

/// Diagnostics accumulated across the stages of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(
	#[deref]
	#[deref_mut]
	Vec<Diagnostic>,
);

impl Diagnostics {
	pub fn new() -> Self {
		Self::default()
	}

	/// Order diagnostics by file and position so output does not depend on
	/// the order lookups happened in.
	pub fn sorted(&self) -> Vec<&Diagnostic> {
		let mut sorted: Vec<&Diagnostic> = self.0.iter().collect();
		sorted.sort_by(|a, b| {
			a.file
				.cmp(&b.file)
				.then_with(|| {
					let a_line = a.location.as_ref().map(SourceLocation::line);
					let b_line = b.location.as_ref().map(SourceLocation::line);
					a_line.cmp(&b_line)
				})
				.then_with(|| a.message().cmp(&b.message()))
		});
		sorted
	}
}

impl From<Vec<Diagnostic>> for Diagnostics {
	fn from(diagnostics: Vec<Diagnostic>) -> Self {
		Self(diagnostics)
	}
}

impl IntoIterator for Diagnostics {
	type IntoIter = std::vec::IntoIter<Diagnostic>;
	type Item = Diagnostic;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
