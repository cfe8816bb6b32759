use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use provup_cli::OutputFormat;
use provup_cli::ProvupCli;
use provup_core::Diagnostic;
use provup_core::Diagnostics;
use provup_core::ProvupConfig;
use provup_core::Severity;
use provup_core::StaticCatalog;
use provup_core::UpgradeFailure;
use provup_core::UpgradeOptions;
use provup_core::UpgradeReport;
use provup_core::commit_upgrade;
use provup_core::plan_upgrade;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

const LOG_ENV: &str = "PROVUP_LOG";

const UPGRADE_COMPLETE_GUIDANCE: &str = "Use your version control system to review the proposed \
                                         changes, make any\nnecessary adjustments, and then commit.";

fn main() {
	let args = match ProvupCli::try_parse() {
		Ok(args) => args,
		Err(e) => {
			// Help and version requests are not failures.
			if !e.use_stderr() {
				e.exit();
			}
			eprint!("{e}");
			process::exit(1);
		}
	};

	// Respect NO_COLOR env var, --no-color flag and terminal support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose);

	if let Err(e) = run(&args) {
		let report: miette::Report = e.into();
		eprintln!("{report:?}");
		process::exit(1);
	}
}

fn init_tracing(verbose: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn resolve_root(args: &ProvupCli) -> PathBuf {
	args.dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

fn run(args: &ProvupCli) -> Result<(), provup_core::ProvupError> {
	let root = resolve_root(args);
	let config = ProvupConfig::load(&root)?;
	let catalog = StaticCatalog::from_config(config.as_ref().map(|config| &config.catalog));
	let options = UpgradeOptions::from_config(config.as_ref())?;

	tracing::debug!(root = %root.display(), dry_run = args.dry_run, "upgrading module");

	let mut report = match plan_upgrade(&root, &catalog, &options) {
		Ok(report) => report,
		Err(failure) => {
			report_failure(args, &root, failure);
			process::exit(1);
		}
	};

	if !args.dry_run {
		if let Err(failure) = commit_upgrade(&mut report) {
			report_failure(args, &root, failure);
			process::exit(1);
		}
	}

	match args.format {
		OutputFormat::Json => print_json_report(args, &root, &report),
		OutputFormat::Text => print_text_report(args, &root, &report),
	}

	Ok(())
}

fn report_failure(args: &ProvupCli, root: &Path, failure: UpgradeFailure) {
	match args.format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"ok": false,
				"stage": failure.stage,
				"failed_at": failure.failed_at,
				"error": {
					"code": failure_code(&failure),
					"message": failure.error.to_string(),
				},
				"diagnostics": diagnostics_json(&failure.diagnostics, root),
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			print_diagnostics(&failure.diagnostics, root);
			let report: miette::Report = failure.error.into();
			eprintln!("{report:?}");
		}
	}
}

fn failure_code(failure: &UpgradeFailure) -> Option<String> {
	miette::Diagnostic::code(&failure.error).map(|code| code.to_string())
}

fn print_text_report(args: &ProvupCli, root: &Path, report: &UpgradeReport) {
	print_diagnostics(&report.diagnostics, root);

	if args.verbose {
		println!(
			"Found {} provider requirement(s)",
			report.requirements.len()
		);
		for requirement in report.requirements.values() {
			let source = requirement
				.source_for_display()
				.unwrap_or_else(|| "(no source detected)".to_string());
			match requirement.version_constraint() {
				Some(version) => println!("  {} = {source} ({version})", requirement.name),
				None => println!("  {} = {source}", requirement.name),
			}
		}
	}

	let Some(write) = &report.write else {
		println!("No changes needed: the module's provider requirements are already explicit.");
		return;
	};

	let rel = make_relative(&write.path, root);
	if args.diff {
		eprintln!("{}", colored!(format!("--- {rel}"), bold));
		print_diff(write.original.as_deref().unwrap_or_default(), &write.content);
	}

	if args.dry_run {
		if write.is_new_file() {
			println!("Would create {rel}");
		} else {
			println!("Would update {rel}");
		}
		return;
	}

	if write.is_new_file() {
		println!("Created {rel}");
	} else {
		println!("Updated {rel}");
	}

	if !report.diagnostics.is_empty() {
		println!();
		println!("{}", "-".repeat(72));
	}

	println!();
	println!("{}", colored!(colored!("Upgrade complete!", green), bold));
	println!();
	println!("{UPGRADE_COMPLETE_GUIDANCE}");
}

fn print_json_report(args: &ProvupCli, root: &Path, report: &UpgradeReport) {
	let requirements: serde_json::Map<String, serde_json::Value> = report
		.requirements
		.values()
		.map(|requirement| {
			(
				requirement.name.clone(),
				serde_json::json!({
					"source": requirement.source_for_display(),
					"version": requirement.version_constraint(),
				}),
			)
		})
		.collect();

	let output = serde_json::json!({
		"ok": true,
		"changed": report.is_changed(),
		"written": report.is_changed() && !args.dry_run,
		"file": report.write.as_ref().map(|write| make_relative(&write.path, root)),
		"requirements": requirements,
		"diagnostics": diagnostics_json(&report.diagnostics, root),
	});
	println!("{output}");
}

fn diagnostics_json(diagnostics: &Diagnostics, root: &Path) -> Vec<serde_json::Value> {
	diagnostics
		.sorted()
		.into_iter()
		.map(|diagnostic| {
			serde_json::json!({
				"code": diagnostic.code(),
				"message": relative_message(diagnostic, root),
				"file": diagnostic.file.as_deref().map(|file| make_relative(file, root)),
				"line": diagnostic.location.as_ref().map(provup_core::SourceLocation::line),
				"column": diagnostic.location.as_ref().map(provup_core::SourceLocation::column),
			})
		})
		.collect()
}

fn print_diagnostics(diagnostics: &Diagnostics, root: &Path) {
	for diagnostic in diagnostics.sorted() {
		let report = diagnostic_to_report(diagnostic, root);
		eprintln!("{report:?}");
	}
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

/// The diagnostic message with locations inside the module shown relative
/// to the module directory.
fn relative_message(diagnostic: &Diagnostic, root: &Path) -> String {
	let prefix = format!("{}{}", root.display(), std::path::MAIN_SEPARATOR);
	diagnostic.message().replace(&prefix, "")
}

/// Convert a `Diagnostic` into a `miette::Report` with its severity, code
/// and help text for rich terminal display.
fn diagnostic_to_report(diagnostic: &Diagnostic, root: &Path) -> miette::Report {
	let location = match (&diagnostic.location, &diagnostic.file) {
		(Some(location), _) => {
			Some(format!(
				"{}:{}:{}",
				make_relative(&location.file, root),
				location.line(),
				location.column()
			))
		}
		(None, Some(file)) => Some(make_relative(file, root)),
		(None, None) => None,
	};

	let message = relative_message(diagnostic, root);
	let message = match location {
		Some(location) => format!("[{location}] {message}"),
		None => message,
	};

	let severity = match diagnostic.severity() {
		Severity::Warning => miette::Severity::Warning,
	};

	let mut diag_value = miette::MietteDiagnostic::new(message)
		.with_code(diagnostic.code())
		.with_severity(severity);
	if let Some(help) = diagnostic.help() {
		diag_value = diag_value.with_help(help);
	}

	miette::Report::new(diag_value)
}
