use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ProvupError {
	#[error(transparent)]
	#[diagnostic(code(provup::io_error))]
	Io(#[from] std::io::Error),

	#[error("not a module directory: `{0}` does not contain any configuration files")]
	#[diagnostic(
		code(provup::not_a_module),
		help("run provup from a directory containing `*.tf` files or pass the module path")
	)]
	NotModuleDirectory(String),

	#[error("failed to parse `{path}` at {line}:{column}: {message}")]
	#[diagnostic(code(provup::parse))]
	Parse {
		path: String,
		line: usize,
		column: usize,
		message: String,
	},

	#[error("invalid required provider `{name}` at {location}: {reason}")]
	#[diagnostic(
		code(provup::invalid_requirement),
		help(
			"entries must be a version string or an object such as `{{ source = \
			 \"hashicorp/aws\", version = \"~> 3.0\" }}`"
		)
	)]
	InvalidRequirement {
		name: String,
		location: String,
		reason: String,
	},

	#[error("invalid provider source address `{source_address}` at {location}: {reason}")]
	#[diagnostic(
		code(provup::invalid_source),
		help("source addresses use the form `[hostname/]namespace/type`")
	)]
	InvalidSource {
		source_address: String,
		location: String,
		reason: String,
	},

	#[error("required_providers blocks found in more than one file: {}", files.join(", "))]
	#[diagnostic(
		code(provup::not_implemented),
		help("move every provider requirement into a single `required_providers` block and run again")
	)]
	MultipleDeclarationFiles { files: Vec<String> },

	#[error("found {count} required_providers blocks in `{path}`")]
	#[diagnostic(
		code(provup::multiple_blocks),
		help("merge them into one block, or set `merge_blocks = true` under `[rewrite]` in provup.toml")
	)]
	MultipleDeclarationBlocks { path: String, count: usize },

	#[error("unable to read configuration file `{path}`: {reason}")]
	#[diagnostic(code(provup::read_file))]
	ReadFile { path: String, reason: String },

	#[error("unable to rewrite configuration file `{path}`: {reason}")]
	#[diagnostic(code(provup::write_file))]
	WriteFile { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(provup::config_parse),
		help("check that provup.toml is valid TOML with [catalog], [rewrite] and/or [exclude] sections")
	)]
	ConfigParse(String),
}

pub type ProvupResult<T> = Result<T, ProvupError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
