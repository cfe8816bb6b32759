use std::fmt::Display;
use std::ops::Range;

/// Every byte of a configuration file belongs to exactly one token, so
/// concatenating the token texts reproduces the source verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	/// `\n` or `\r\n`
	Newline,
	/// Runs of ` `, `\t` and stray `\r`
	Whitespace,
	/// `# ...`, `// ...` or `/* ... */`
	Comment,
	/// An identifier, e.g. `required_providers`
	Ident,
	/// A numeric literal, e.g. `42` or `1.5e3`
	Number,
	/// A quoted template including its quotes, e.g. `"hashicorp/aws"`
	String,
	/// A heredoc template from the `<<EOF` introducer up to the closing marker
	Heredoc,
	/// `=`
	Equals,
	/// `{`
	BraceOpen,
	/// `}`
	BraceClose,
	/// `[`
	BracketOpen,
	/// `]`
	BracketClose,
	/// `(`
	ParenOpen,
	/// `)`
	ParenClose,
	/// `,`
	Comma,
	/// `.`
	Dot,
	/// `:`
	Colon,
	/// Any other operator, e.g. `==`, `=>`, `...` or `?`
	Operator,
}

impl TokenKind {
	/// Tokens that never carry meaning for the structure of a body.
	pub fn is_trivia(self) -> bool {
		matches!(self, Self::Whitespace | Self::Comment)
	}

	/// Bracket depth change caused by this token inside an expression.
	pub fn nesting(self) -> isize {
		match self {
			Self::BraceOpen | Self::BracketOpen | Self::ParenOpen => 1,
			Self::BraceClose | Self::BracketClose | Self::ParenClose => -1,
			_ => 0,
		}
	}
}

impl Display for TokenKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Newline => "newline",
			Self::Whitespace => "whitespace",
			Self::Comment => "comment",
			Self::Ident => "identifier",
			Self::Number => "number",
			Self::String => "string",
			Self::Heredoc => "heredoc",
			Self::Equals => "`=`",
			Self::BraceOpen => "`{`",
			Self::BraceClose => "`}`",
			Self::BracketOpen => "`[`",
			Self::BracketClose => "`]`",
			Self::ParenOpen => "`(`",
			Self::ParenClose => "`)`",
			Self::Comma => "`,`",
			Self::Dot => "`.`",
			Self::Colon => "`:`",
			Self::Operator => "operator",
		};
		write!(f, "{name}")
	}
}

/// A token and the byte range it covers in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub kind: TokenKind,
	pub span: Range<usize>,
}

impl Token {
	pub fn new(kind: TokenKind, span: Range<usize>) -> Self {
		Self { kind, span }
	}

	pub fn text<'a>(&self, source: &'a str) -> &'a str {
		&source[self.span.clone()]
	}
}

/// A lexing or parsing failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
	pub offset: usize,
	pub message: String,
}

impl SyntaxError {
	pub fn new(offset: usize, message: impl Into<String>) -> Self {
		Self {
			offset,
			message: message.into(),
		}
	}
}
