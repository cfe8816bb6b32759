use std::ops::Range;
use std::path::Path;

use crate::Diagnostic;
use crate::DiagnosticKind;
use crate::Diagnostics;
use crate::Position;
use crate::ProvupError;
use crate::ProvupResult;
use crate::RequirementMap;
use crate::SourceLocation;
use crate::parser::Block;
use crate::parser::Document;
use crate::parser::line_start;
use crate::parser::quote_string;

/// One indentation step inside generated blocks.
const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
	/// Fold every `required_providers` block of the file into the first one
	/// instead of failing.
	pub merge_blocks: bool,
}

/// A `required_providers` block together with the `terraform` block that
/// contains it.
#[derive(Debug, Clone, Copy)]
pub struct DeclarationBlock<'a> {
	pub block: &'a Block,
	pub parent: &'a Block,
}

/// The rewritten text of a document.
#[derive(Debug, Clone)]
pub struct Rewrite {
	pub content: String,
	pub diagnostics: Diagnostics,
}

/// Every `required_providers` block nested directly in a top-level
/// `terraform` block, in source order.
pub fn find_declaration_blocks(document: &Document) -> Vec<DeclarationBlock<'_>> {
	document
		.body()
		.blocks_of_type("terraform")
		.flat_map(|parent| {
			parent
				.body
				.blocks_of_type("required_providers")
				.map(move |block| DeclarationBlock { block, parent })
		})
		.collect()
}

/// Write `requirements` into the provider declaration of `document`.
///
/// The first `required_providers` block is cleared and repopulated with one
/// entry per requirement. When the document has none, a block is added to
/// its first `terraform` block, or a new `terraform` block is appended.
/// Bytes outside the edited ranges are preserved exactly.
pub fn rewrite_document(
	path: &Path,
	document: &Document,
	requirements: &RequirementMap,
	options: &RewriteOptions,
) -> ProvupResult<Rewrite> {
	let source = document.source();
	let mut diagnostics = Diagnostics::new();

	if requirements.is_empty() {
		return Ok(Rewrite {
			content: source.to_string(),
			diagnostics,
		});
	}

	let blocks = find_declaration_blocks(document);
	let mut edits = Vec::new();

	if let Some((canonical, rest)) = blocks.split_first() {
		if !rest.is_empty() && !options.merge_blocks {
			return Err(ProvupError::MultipleDeclarationBlocks {
				path: path.display().to_string(),
				count: blocks.len(),
			});
		}

		let indent = format!("{}{INDENT}", canonical.block.indent);
		edits.push(replace_body(
			source,
			canonical.block,
			&render_entries(requirements, &indent),
		));

		let into = SourceLocation::new(
			path,
			Position::from_span(source, &canonical.block.ident_span),
		);
		for parent in document.body().blocks_of_type("terraform") {
			let removed: Vec<&Block> = rest
				.iter()
				.filter(|declaration| std::ptr::eq(declaration.parent, parent))
				.map(|declaration| declaration.block)
				.collect();
			if removed.is_empty() {
				continue;
			}

			for block in &removed {
				let location =
					SourceLocation::new(path, Position::from_span(source, &block.ident_span));
				tracing::info!(location = %location, into = %into, "merging required_providers block");
				diagnostics.push(Diagnostic::new(
					DiagnosticKind::BlockMerged { into: into.clone() },
					Some(location),
				));
			}

			// A parent holding nothing but merged blocks goes away entirely.
			if parent.body.items.len() == removed.len() {
				edits.push(removal(source, &parent.span));
			} else {
				edits.extend(removed.iter().map(|block| removal(source, &block.span)));
			}
		}
	} else if let Some(terraform) = document.body().blocks_of_type("terraform").next() {
		let indent = format!("{}{INDENT}", terraform.indent);
		edits.push(insert_before_close(
			source,
			terraform,
			&render_declaration_block(requirements, &indent),
		));
	} else {
		edits.push(append_settings_block(source, requirements));
	}

	// Generated text follows the line endings of the file.
	let newline = line_ending(source);
	if newline != "\n" {
		for edit in &mut edits {
			edit.replacement = edit.replacement.replace('\n', newline);
		}
	}

	Ok(Rewrite {
		content: apply_edits(source, edits),
		diagnostics,
	})
}

/// The comment written above entries whose source could not be detected.
pub fn no_source_comment(name: &str) -> String {
	format!(
		"# TF-UPGRADE-TODO
#
# No source detected for this provider. You must add a source address
# in the following format:
#
# source = \"your.domain.com/organization/{name}\"
#
# For more information, see the provider source documentation:
#
# https://www.terraform.io/docs/configuration/providers.html#provider-source"
	)
}

/// Render one attribute per requirement, each line prefixed with `indent`.
pub fn render_entries(requirements: &RequirementMap, indent: &str) -> String {
	let mut rendered = String::new();

	for requirement in requirements.values() {
		if requirement.is_unresolved() {
			for line in no_source_comment(&requirement.name).lines() {
				rendered.push_str(indent);
				rendered.push_str(line);
				rendered.push('\n');
			}
		}

		let mut fields = Vec::new();
		if let Some(source) = requirement.source_for_display() {
			fields.push(("source", quote_string(&source)));
		}
		if let Some(version) = requirement.version_constraint() {
			fields.push(("version", quote_string(version)));
		}

		if fields.is_empty() {
			rendered.push_str(&format!("{indent}{} = {{}}\n", requirement.name));
			continue;
		}

		let width = fields.iter().map(|(key, _)| key.len()).max().unwrap_or_default();
		rendered.push_str(&format!("{indent}{} = {{\n", requirement.name));
		for (key, value) in &fields {
			rendered.push_str(&format!("{indent}{INDENT}{key:<width$} = {value}\n"));
		}
		rendered.push_str(&format!("{indent}}}\n"));
	}

	rendered
}

/// Render a complete `required_providers` block starting at `indent`.
pub fn render_declaration_block(requirements: &RequirementMap, indent: &str) -> String {
	let entries = render_entries(requirements, &format!("{indent}{INDENT}"));
	format!("{indent}required_providers {{\n{entries}{indent}}}\n")
}

#[derive(Debug)]
struct Edit {
	range: Range<usize>,
	replacement: String,
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
	// Apply from the end of the file so earlier offsets stay valid.
	edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));

	let mut result = source.to_string();
	for edit in edits {
		result.replace_range(edit.range, &edit.replacement);
	}

	result
}

/// `"\r\n"` when the first line of `source` ends with one, otherwise `"\n"`.
fn line_ending(source: &str) -> &'static str {
	match source.find('\n') {
		Some(index) if source[..index].ends_with('\r') => "\r\n",
		_ => "\n",
	}
}

/// The start of the line holding the closing brace of `block`, when the
/// brace sits alone on that line.
fn close_on_own_line(source: &str, block: &Block) -> Option<usize> {
	let close_line = line_start(source, block.close_brace.start);
	(close_line > block.open_brace.end
		&& source[close_line..block.close_brace.start].trim().is_empty())
	.then_some(close_line)
}

/// The end of the opening line of `block`, when at most a comment follows
/// the opening brace on that line.
fn opening_line_end(source: &str, block: &Block) -> Option<usize> {
	let open = block.open_brace.end;
	let end = open + source[open..].find('\n')? + 1;
	let trailing = source[open..end].trim();
	let comment_only = trailing.is_empty()
		|| trailing.starts_with('#')
		|| trailing.starts_with("//")
		|| (trailing.starts_with("/*") && trailing.ends_with("*/"));
	let first_item = block.body.items.first().map_or(end, |item| item.span().start);

	(comment_only && first_item >= end).then_some(end)
}

/// Replace everything between the braces of `block` with `entries`. A
/// comment trailing the opening brace stays in place.
fn replace_body(source: &str, block: &Block, entries: &str) -> Edit {
	match close_on_own_line(source, block) {
		Some(close_line) => {
			match opening_line_end(source, block).filter(|end| *end <= close_line) {
				Some(line_end) => {
					Edit {
						range: line_end..close_line,
						replacement: entries.to_string(),
					}
				}
				None => {
					Edit {
						range: block.open_brace.end..close_line,
						replacement: format!("\n{entries}"),
					}
				}
			}
		}
		None => {
			Edit {
				range: block.open_brace.end..block.close_brace.start,
				replacement: format!("\n{entries}{}", block.indent),
			}
		}
	}
}

/// Insert `text` as the last item of `block`.
fn insert_before_close(source: &str, block: &Block, text: &str) -> Edit {
	match close_on_own_line(source, block) {
		Some(close_line) => {
			Edit {
				range: close_line..close_line,
				replacement: text.to_string(),
			}
		}
		None => {
			let close = block.close_brace.start;
			Edit {
				range: close..close,
				replacement: format!("\n{text}{}", block.indent),
			}
		}
	}
}

/// Remove an item's line range. A blank line left between two blank lines
/// is removed with it.
fn removal(source: &str, span: &Range<usize>) -> Edit {
	let mut end = span.end;
	let before = &source[..span.start];
	let blank_before =
		span.start == 0 || before.ends_with("\n\n") || before.ends_with("\n\r\n");
	if blank_before {
		if source[end..].starts_with('\n') {
			end += 1;
		} else if source[end..].starts_with("\r\n") {
			end += 2;
		}
	}

	Edit {
		range: span.start..end,
		replacement: String::new(),
	}
}

/// Append a new `terraform` block holding the declaration to the end of the
/// document, separated from existing content by one blank line.
fn append_settings_block(source: &str, requirements: &RequirementMap) -> Edit {
	let separator = if source.trim().is_empty()
		|| source.ends_with("\n\n")
		|| source.ends_with("\n\r\n")
	{
		""
	} else if source.ends_with('\n') {
		"\n"
	} else {
		"\n\n"
	};
	let block = render_declaration_block(requirements, INDENT);

	Edit {
		range: source.len()..source.len(),
		replacement: format!("{separator}terraform {{\n{block}}}\n"),
	}
}
