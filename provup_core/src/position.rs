use std::fmt::Display;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// A single point in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
	/// 1-indexed line number.
	pub line: usize,
	/// 1-indexed column number, counted in characters.
	pub column: usize,
	/// 0-indexed byte offset.
	pub offset: usize,
}

impl Point {
	pub fn new(line: usize, column: usize, offset: usize) -> Self {
		Self {
			line,
			column,
			offset,
		}
	}

	/// Locate a byte offset within `source`. Offsets past the end are clamped.
	pub fn locate(source: &str, offset: usize) -> Self {
		let offset = offset.min(source.len());
		let before = &source[..floor_char_boundary(source, offset)];
		let line = before.matches('\n').count() + 1;
		let line_start = before.rfind('\n').map_or(0, |index| index + 1);
		let column = before[line_start..].chars().count() + 1;

		Self {
			line,
			column,
			offset,
		}
	}
}

impl Default for Point {
	fn default() -> Self {
		Self::new(1, 1, 0)
	}
}

/// The start and end points of a range of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
	pub start: Point,
	pub end: Point,
}

impl Position {
	pub fn new(
		start_line: usize,
		start_column: usize,
		start_offset: usize,
		end_line: usize,
		end_column: usize,
		end_offset: usize,
	) -> Self {
		Self {
			start: Point::new(start_line, start_column, start_offset),
			end: Point::new(end_line, end_column, end_offset),
		}
	}

	/// Build the position covering a byte range of `source`.
	pub fn from_span(source: &str, span: &Range<usize>) -> Self {
		Self {
			start: Point::locate(source, span.start),
			end: Point::locate(source, span.end),
		}
	}
}

/// A position tied to the file it was found in. Used to cite declarations
/// in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
	pub file: PathBuf,
	pub position: Position,
}

impl SourceLocation {
	pub fn new(file: impl AsRef<Path>, position: Position) -> Self {
		Self {
			file: file.as_ref().to_path_buf(),
			position,
		}
	}

	pub fn line(&self) -> usize {
		self.position.start.line
	}

	pub fn column(&self) -> usize {
		self.position.start.column
	}
}

impl Display for SourceLocation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{}:{}:{}",
			self.file.display(),
			self.position.start.line,
			self.position.start.column
		)
	}
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
	while offset > 0 && !source.is_char_boundary(offset) {
		offset -= 1;
	}
	offset
}
