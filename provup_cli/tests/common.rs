#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use provup_core::AnyResult;
use tempfile::TempDir;

pub fn provup_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("provup"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("PROVUP_LOG");
	cmd
}

/// A temporary module directory holding the given files.
pub fn module_dir(files: &[(&str, &str)]) -> AnyResult<TempDir> {
	let tmp = tempfile::tempdir()?;
	for (name, content) in files {
		std::fs::write(tmp.path().join(name), content)?;
	}

	Ok(tmp)
}

pub fn read(root: &Path, name: &str) -> String {
	std::fs::read_to_string(root.join(name)).unwrap_or_else(|e| panic!("read {name}: {e}"))
}
