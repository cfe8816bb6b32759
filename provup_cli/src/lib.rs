use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	name = "provup",
	author,
	version,
	about = "Rewrite a module's configuration to declare explicit provider source addresses.",
	long_about = "provup reads the configuration files of a module directory, works out which \
	              providers the module uses, looks up a source address for each, and writes a \
	              single consolidated `required_providers` block.\n\nOnly the declaration block \
	              is rewritten; every other byte of the configuration is preserved. When no file \
	              declares provider requirements yet, the block is added to the first `terraform` \
	              block or to a new `versions.tf` file.\n\nProviders the catalog does not know \
	              are written without a source and marked with a TF-UPGRADE-TODO comment."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProvupCli {
	/// The module directory to upgrade. Defaults to the current directory.
	pub dir: Option<PathBuf>,

	/// Compute the upgrade without writing any file.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	/// Show a line diff of the rewritten file.
	#[arg(long, default_value_t = false)]
	pub diff: bool,

	/// Output format. Use `text` for human-readable output or `json` for
	/// programmatic consumption.
	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Enable verbose output and debug logging.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// A single JSON document describing the requirements, diagnostics and
	/// the planned or written file.
	Json,
}
