use logos::Lexer;
use logos::Logos;

use crate::tokens::SyntaxError;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Raw tokens produced by logos for flat tokenization of a configuration
/// file.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum RawToken {
	#[token("\n")]
	#[token("\r\n")]
	Newline,
	#[regex(r"[ \t\r]+")]
	Whitespace,
	#[regex(r"#[^\r\n]*", allow_greedy = true)]
	#[regex(r"//[^\r\n]*", allow_greedy = true)]
	LineComment,
	#[token("/*", block_comment)]
	BlockComment,
	#[regex(r"[\p{XID_Start}_][\p{XID_Continue}-]*")]
	Ident,
	#[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
	Number,
	#[token("\"", quoted_template)]
	QuotedTemplate,
	#[regex(r"<<-?[a-zA-Z_][a-zA-Z0-9_-]*", heredoc)]
	Heredoc,
	#[token("=")]
	Equals,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token("[")]
	BracketOpen,
	#[token("]")]
	BracketClose,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token(",")]
	Comma,
	#[token(".")]
	Dot,
	#[token(":")]
	Colon,
	#[regex(r"==|!=|<=|>=|&&|\|\||=>|\.\.\.|[+\-*/%<>!?~]")]
	Operator,
}

impl From<RawToken> for TokenKind {
	fn from(raw: RawToken) -> Self {
		match raw {
			RawToken::Newline => Self::Newline,
			RawToken::Whitespace => Self::Whitespace,
			RawToken::LineComment | RawToken::BlockComment => Self::Comment,
			RawToken::Ident => Self::Ident,
			RawToken::Number => Self::Number,
			RawToken::QuotedTemplate => Self::String,
			RawToken::Heredoc => Self::Heredoc,
			RawToken::Equals => Self::Equals,
			RawToken::BraceOpen => Self::BraceOpen,
			RawToken::BraceClose => Self::BraceClose,
			RawToken::BracketOpen => Self::BracketOpen,
			RawToken::BracketClose => Self::BracketClose,
			RawToken::ParenOpen => Self::ParenOpen,
			RawToken::ParenClose => Self::ParenClose,
			RawToken::Comma => Self::Comma,
			RawToken::Dot => Self::Dot,
			RawToken::Colon => Self::Colon,
			RawToken::Operator => Self::Operator,
		}
	}
}

fn block_comment(lex: &mut Lexer<'_, RawToken>) -> bool {
	match lex.remainder().find("*/") {
		Some(index) => {
			lex.bump(index + 2);
			true
		}
		None => false,
	}
}

fn quoted_template(lex: &mut Lexer<'_, RawToken>) -> bool {
	match scan_quoted_template(lex.remainder()) {
		Some(length) => {
			lex.bump(length);
			true
		}
		None => false,
	}
}

/// Measure a quoted template whose opening quote has already been consumed.
/// Returns the byte length up to and including the closing quote.
///
/// Interpolation sequences (`${ ... }` and `%{ ... }`) may contain nested
/// quoted templates, so quotes only terminate the template at depth zero.
fn scan_quoted_template(rest: &str) -> Option<usize> {
	let bytes = rest.as_bytes();
	let mut index = 0;
	let mut depth = 0usize;

	while index < bytes.len() {
		let byte = bytes[index];

		if depth == 0 {
			match byte {
				b'\\' => index += 2,
				b'"' => return Some(index + 1),
				b'\n' => return None,
				b'$' | b'%' => {
					let next = bytes.get(index + 1).copied();
					if next == Some(byte) && bytes.get(index + 2) == Some(&b'{') {
						// `$${` and `%%{` are literal escapes.
						index += 3;
					} else if next == Some(b'{') {
						depth = 1;
						index += 2;
					} else {
						index += 1;
					}
				}
				_ => index += 1,
			}
			continue;
		}

		match byte {
			b'{' => {
				depth += 1;
				index += 1;
			}
			b'}' => {
				depth -= 1;
				index += 1;
			}
			b'"' => {
				let nested = scan_quoted_template(&rest[index + 1..])?;
				index += 1 + nested;
			}
			_ => index += 1,
		}
	}

	None
}

fn heredoc(lex: &mut Lexer<'_, RawToken>) -> bool {
	let marker = lex
		.slice()
		.trim_start_matches('<')
		.trim_start_matches('-')
		.to_string();
	let rest = lex.remainder();

	let Some(first_newline) = rest.find('\n') else {
		return false;
	};
	if !rest[..first_newline].trim().is_empty() {
		return false;
	}

	let mut cursor = first_newline + 1;
	loop {
		let line_end = rest[cursor..].find('\n').map_or(rest.len(), |i| cursor + i);
		let line = rest[cursor..line_end].trim_end_matches('\r');
		if line.trim_start() == marker {
			lex.bump(cursor + line.len());
			return true;
		}
		if line_end >= rest.len() {
			return false;
		}
		cursor = line_end + 1;
	}
}

fn describe_error(slice: &str) -> String {
	if slice.starts_with('"') {
		"unterminated template string".to_string()
	} else if slice.starts_with("<<") {
		"unterminated heredoc".to_string()
	} else if slice.starts_with("/*") {
		"unterminated block comment".to_string()
	} else {
		format!("unexpected character `{}`", slice.escape_debug())
	}
}

/// Split `source` into tokens covering every byte.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
	let mut tokens = Vec::new();

	for (result, span) in RawToken::lexer(source).spanned() {
		match result {
			Ok(raw) => tokens.push(Token::new(raw.into(), span)),
			Err(()) => {
				return Err(SyntaxError::new(
					span.start,
					describe_error(&source[span.clone()]),
				));
			}
		}
	}

	Ok(tokens)
}
