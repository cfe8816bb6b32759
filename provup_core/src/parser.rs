use std::ops::Range;

use snailquote::unescape;

use crate::lexer::tokenize;
use crate::tokens::SyntaxError;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// A parsed configuration file that keeps the original text alongside a
/// positional syntax tree. Every node records the byte ranges it came from,
/// so edits can be spliced into the source without disturbing anything
/// else.
#[derive(Debug, Clone)]
pub struct Document {
	source: String,
	body: Body,
}

impl Document {
	/// Parse a configuration file written in the native HCL syntax.
	pub fn parse(source: impl Into<String>) -> Result<Self, SyntaxError> {
		let source = source.into();
		let tokens = tokenize(&source)?;
		let body = {
			let mut parser = Parser::new(&source, tokens);
			parser.parse_body(false)?
		};

		Ok(Self { source, body })
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn body(&self) -> &Body {
		&self.body
	}
}

/// The contents of a file or of a block between its braces.
#[derive(Debug, Clone, Default)]
pub struct Body {
	pub items: Vec<Item>,
}

impl Body {
	pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
		self.items.iter().filter_map(|item| {
			match item {
				Item::Attribute(attribute) => Some(attribute),
				Item::Block(_) => None,
			}
		})
	}

	pub fn blocks(&self) -> impl Iterator<Item = &Block> {
		self.items.iter().filter_map(|item| {
			match item {
				Item::Block(block) => Some(block),
				Item::Attribute(_) => None,
			}
		})
	}

	/// Blocks whose type identifier matches `ident`, in source order.
	pub fn blocks_of_type<'a>(&'a self, ident: &'a str) -> impl Iterator<Item = &'a Block> {
		self.blocks().filter(move |block| block.ident == ident)
	}

	/// The first attribute with the given name.
	pub fn attribute(&self, name: &str) -> Option<&Attribute> {
		self.attributes().find(|attribute| attribute.name == name)
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

#[derive(Debug, Clone)]
pub enum Item {
	Attribute(Attribute),
	Block(Block),
}

impl Item {
	/// The full-line range of the item including any leading comments.
	pub fn span(&self) -> &Range<usize> {
		match self {
			Self::Attribute(attribute) => &attribute.span,
			Self::Block(block) => &block.span,
		}
	}
}

/// `name = expression`
#[derive(Debug, Clone)]
pub struct Attribute {
	pub name: String,
	pub name_span: Range<usize>,
	pub expression: Expression,
	/// Full-line range including leading comments and the trailing newline.
	pub span: Range<usize>,
}

/// `type "label" ... { body }`
#[derive(Debug, Clone)]
pub struct Block {
	pub ident: String,
	pub ident_span: Range<usize>,
	pub labels: Vec<Label>,
	pub open_brace: Range<usize>,
	pub close_brace: Range<usize>,
	pub body: Body,
	/// Full-line range including leading comments and the trailing newline.
	pub span: Range<usize>,
	/// Whitespace preceding the block type on its line.
	pub indent: String,
}

impl Block {
	pub fn label(&self, index: usize) -> Option<&str> {
		self.labels.get(index).map(|label| label.value.as_str())
	}
}

#[derive(Debug, Clone)]
pub struct Label {
	pub value: String,
	pub span: Range<usize>,
}

/// The tokens of an attribute value, excluding surrounding trivia.
#[derive(Debug, Clone)]
pub struct Expression {
	pub tokens: Vec<Token>,
	pub span: Range<usize>,
}

impl Expression {
	pub fn text<'a>(&self, source: &'a str) -> &'a str {
		&source[self.span.clone()]
	}

	fn significant(&self) -> impl Iterator<Item = &Token> {
		self.tokens.iter().filter(|token| {
			!token.kind.is_trivia() && token.kind != TokenKind::Newline
		})
	}

	/// The value of a quoted string without template sequences.
	pub fn as_string_literal(&self, source: &str) -> Option<String> {
		let mut significant = self.significant();
		let token = significant.next()?;
		if significant.next().is_some() || token.kind != TokenKind::String {
			return None;
		}

		decode_string(token.text(source))
	}

	/// The identifiers of a traversal such as `aws.west`.
	pub fn as_traversal(&self, source: &str) -> Option<Vec<String>> {
		let mut steps = Vec::new();
		let mut expect_step = true;

		for token in self.significant() {
			match (expect_step, token.kind) {
				(true, TokenKind::Ident) => {
					steps.push(token.text(source).to_string());
					expect_step = false;
				}
				(false, TokenKind::Dot) => expect_step = true,
				_ => return None,
			}
		}

		if expect_step || steps.is_empty() {
			return None;
		}

		Some(steps)
	}

	/// The key/value pairs of an object constructor such as
	/// `{ source = "hashicorp/aws", version = "~> 3.0" }`. Keys may be
	/// identifiers or quoted strings, separated from their values by `=` or
	/// `:`.
	pub fn as_object(&self, source: &str) -> Option<Vec<(String, Expression)>> {
		let tokens: Vec<&Token> = self
			.tokens
			.iter()
			.filter(|token| !token.kind.is_trivia())
			.collect();
		let (first, rest) = tokens.split_first()?;
		let (last, inner) = rest.split_last()?;
		if first.kind != TokenKind::BraceOpen || last.kind != TokenKind::BraceClose {
			return None;
		}

		let mut pairs = Vec::new();
		let mut index = 0;
		while index < inner.len() {
			let token = inner[index];
			if matches!(token.kind, TokenKind::Newline | TokenKind::Comma) {
				index += 1;
				continue;
			}

			let key = match token.kind {
				TokenKind::Ident => token.text(source).to_string(),
				TokenKind::String => decode_string(token.text(source))?,
				_ => return None,
			};
			index += 1;

			let separator = inner.get(index)?;
			if !matches!(separator.kind, TokenKind::Equals | TokenKind::Colon) {
				return None;
			}
			index += 1;

			let mut depth = 0isize;
			let mut value = Vec::new();
			while let Some(token) = inner.get(index) {
				if depth == 0 && matches!(token.kind, TokenKind::Newline | TokenKind::Comma) {
					break;
				}
				depth += token.kind.nesting();
				value.push((*token).clone());
				index += 1;
			}

			let start = value.first()?.span.start;
			let end = value.last()?.span.end;
			pairs.push((
				key,
				Expression {
					tokens: value,
					span: start..end,
				},
			));
		}

		Some(pairs)
	}
}

/// Decode a quoted template token into its literal value. Returns `None`
/// when the template contains interpolation or directive sequences.
pub fn decode_string(text: &str) -> Option<String> {
	let inner = text.strip_prefix('"')?.strip_suffix('"')?;
	let unescaped_templates = inner.replace("$${", "").replace("%%{", "");
	if unescaped_templates.contains("${") || unescaped_templates.contains("%{") {
		return None;
	}

	let literal = inner.replace("$${", "${").replace("%%{", "%{");
	// Escapes are only processed inside a quoted section.
	if literal.contains('\\') {
		unescape(&format!("\"{literal}\"")).ok()
	} else {
		Some(literal)
	}
}

/// Quote a literal value as an HCL string.
pub fn quote_string(value: &str) -> String {
	let mut quoted = String::with_capacity(value.len() + 2);
	quoted.push('"');
	for ch in value.chars() {
		match ch {
			'"' => quoted.push_str("\\\""),
			'\\' => quoted.push_str("\\\\"),
			'\n' => quoted.push_str("\\n"),
			'\r' => quoted.push_str("\\r"),
			'\t' => quoted.push_str("\\t"),
			_ => quoted.push(ch),
		}
	}
	quoted.push('"');
	quoted.replace("${", "$${").replace("%{", "%%{")
}

/// Whether a comment token runs to the end of its line.
fn ends_line(comment: &str) -> bool {
	comment.starts_with('#') || comment.starts_with("//") || comment.contains('\n')
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(source: &str, offset: usize) -> usize {
	source[..offset].rfind('\n').map_or(0, |index| index + 1)
}

/// The line start when only whitespace precedes `offset` on its line,
/// otherwise `offset` itself.
fn line_start_if_blank_prefix(source: &str, offset: usize) -> usize {
	let start = line_start(source, offset);
	if source[start..offset].trim().is_empty() {
		start
	} else {
		offset
	}
}

struct Parser<'a> {
	source: &'a str,
	tokens: Vec<Token>,
	cursor: usize,
}

impl<'a> Parser<'a> {
	fn new(source: &'a str, tokens: Vec<Token>) -> Self {
		Self {
			source,
			tokens,
			cursor: 0,
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.cursor)
	}

	fn peek_kind(&self) -> Option<TokenKind> {
		self.peek().map(|token| token.kind)
	}

	fn bump(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.cursor).cloned();
		if token.is_some() {
			self.cursor += 1;
		}
		token
	}

	fn skip_whitespace(&mut self) {
		while self.peek_kind() == Some(TokenKind::Whitespace) {
			self.cursor += 1;
		}
	}

	fn end_offset(&self) -> usize {
		self.source.len()
	}

	fn current_offset(&self) -> usize {
		self.peek().map_or(self.end_offset(), |token| token.span.start)
	}

	fn error_here(&self, message: impl Into<String>) -> SyntaxError {
		SyntaxError::new(self.current_offset(), message)
	}

	fn parse_body(&mut self, nested: bool) -> Result<Body, SyntaxError> {
		let mut items = Vec::new();
		let mut lead_start: Option<usize> = None;
		// Nested bodies start on the line holding the opening brace.
		let mut on_opening_line = nested;
		let mut line_has_content = nested;

		loop {
			self.skip_whitespace();
			let Some(kind) = self.peek_kind() else {
				if nested {
					return Err(self.error_here("missing `}` to close block"));
				}
				break;
			};

			match kind {
				TokenKind::Newline => {
					if !line_has_content {
						lead_start = None;
					}
					line_has_content = false;
					on_opening_line = false;
					self.cursor += 1;
				}
				TokenKind::Comment => {
					let Some(token) = self.bump() else { break };
					line_has_content = true;
					if !on_opening_line && lead_start.is_none() {
						lead_start = Some(line_start_if_blank_prefix(self.source, token.span.start));
					}
					if token.text(self.source).contains('\n') {
						on_opening_line = false;
					}
				}
				TokenKind::BraceClose if nested => break,
				TokenKind::Ident => {
					let item = self.parse_item(lead_start.take())?;
					items.push(item);
					on_opening_line = false;
					line_has_content = false;
				}
				other => {
					return Err(self.error_here(format!(
						"expected an attribute or block, found {other}"
					)));
				}
			}
		}

		Ok(Body { items })
	}

	fn parse_item(&mut self, lead_start: Option<usize>) -> Result<Item, SyntaxError> {
		let Some(ident) = self.bump() else {
			return Err(self.error_here("expected an identifier"));
		};
		let name = ident.text(self.source).to_string();
		let start =
			lead_start.unwrap_or_else(|| line_start_if_blank_prefix(self.source, ident.span.start));
		self.skip_whitespace();

		if self.peek_kind() == Some(TokenKind::Equals) {
			self.cursor += 1;
			let expression = self.parse_expression()?;
			let end = self.finish_line(expression.span.end);

			return Ok(Item::Attribute(Attribute {
				name,
				name_span: ident.span,
				expression,
				span: start..end,
			}));
		}

		let mut labels = Vec::new();
		loop {
			self.skip_whitespace();
			match self.peek_kind() {
				Some(TokenKind::String) => {
					let Some(token) = self.bump() else { break };
					let text = token.text(self.source);
					let value = decode_string(text).ok_or_else(|| {
						SyntaxError::new(token.span.start, "block labels must be literal strings")
					})?;
					labels.push(Label {
						value,
						span: token.span,
					});
				}
				Some(TokenKind::Ident) => {
					let Some(token) = self.bump() else { break };
					labels.push(Label {
						value: token.text(self.source).to_string(),
						span: token.span,
					});
				}
				Some(TokenKind::BraceOpen) => break,
				Some(other) => {
					return Err(self.error_here(format!(
						"expected `=` or a block, found {other} after `{name}`"
					)));
				}
				None => return Err(self.error_here(format!("unexpected end of file after `{name}`"))),
			}
		}

		let Some(open_brace) = self.bump() else {
			return Err(self.error_here("expected `{`"));
		};
		let body = self.parse_body(true)?;
		let Some(close_brace) = self.bump() else {
			return Err(self.error_here("missing `}` to close block"));
		};
		let end = self.finish_line(close_brace.span.end);
		let indent_start = line_start(self.source, ident.span.start);
		let indent = &self.source[indent_start..ident.span.start];
		let indent = if indent.trim().is_empty() {
			indent.to_string()
		} else {
			String::new()
		};

		Ok(Item::Block(Block {
			ident: name,
			ident_span: ident.span,
			labels,
			open_brace: open_brace.span,
			close_brace: close_brace.span,
			body,
			span: start..end,
			indent,
		}))
	}

	/// Collect expression tokens up to the end of the line at bracket depth
	/// zero, or up to the `}` closing a single-line block.
	fn parse_expression(&mut self) -> Result<Expression, SyntaxError> {
		self.skip_whitespace();
		let mut tokens = Vec::new();
		let mut depth = 0isize;

		while let Some(token) = self.peek() {
			if depth == 0 {
				match token.kind {
					TokenKind::Newline | TokenKind::BraceClose => break,
					// Inline `/* */` comments are trivia; anything running to the end of
					// the line ends the expression.
					TokenKind::Comment if ends_line(token.text(self.source)) => break,
					TokenKind::BracketClose | TokenKind::ParenClose => {
						return Err(self.error_here(format!("unexpected {}", token.kind)));
					}
					_ => {}
				}
			}

			depth += token.kind.nesting();
			let Some(token) = self.bump() else { break };
			tokens.push(token);
		}

		if depth > 0 {
			return Err(self.error_here("unclosed bracket in expression"));
		}

		while tokens.last().is_some_and(|token| token.kind.is_trivia()) {
			tokens.pop();
		}

		let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
			return Err(self.error_here("expected an expression"));
		};
		let span = first.span.start..last.span.end;

		Ok(Expression { tokens, span })
	}

	/// Consume trailing whitespace, a trailing comment, and the newline that
	/// ends the current item. Returns the end offset of the item's line
	/// range.
	fn finish_line(&mut self, item_end: usize) -> usize {
		let checkpoint = self.cursor;
		self.skip_whitespace();
		if self.peek_kind() == Some(TokenKind::Comment) {
			self.cursor += 1;
			self.skip_whitespace();
		}

		match self.peek_kind() {
			Some(TokenKind::Newline) => {
				let end = self.peek().map_or(item_end, |token| token.span.end);
				self.cursor += 1;
				end
			}
			None => self.end_offset(),
			Some(_) => {
				self.cursor = checkpoint;
				item_end
			}
		}
	}
}
