//! Command line surface.
//!
//! `pacod <package>... [--stdin]` and nothing else: no config file, no
//! persisted state.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use clap::Parser;

/// Interactive picker for pacman optional dependencies.
#[derive(Debug, Parser)]
#[command(name = "pacod", version, about)]
pub struct CliArgs {
	/// Installed packages whose optional dependencies are offered.
	#[arg(value_name = "package", required_unless_present = "stdin")]
	pub packages: Vec<String>,

	/// Additionally read package names from standard input, one per line.
	#[arg(long)]
	pub stdin: bool,
}

pub fn parse_cli() -> CliArgs {
	CliArgs::parse()
}

/// The full package list, with stdin lines appended when requested.
pub fn collect_packages(cli: &CliArgs) -> Result<Vec<String>> {
	let mut packages = cli.packages.clone();
	if cli.stdin {
		for line in io::stdin().lock().lines() {
			let line = line.context("failed to read package names from stdin")?;
			let name = line.trim();
			if !name.is_empty() {
				packages.push(name.to_string());
			}
		}
	}
	Ok(packages)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn packages_are_required_without_stdin() {
		assert!(CliArgs::try_parse_from(["pacod"]).is_err());
	}

	#[test]
	fn stdin_flag_lifts_the_requirement() {
		let cli = CliArgs::try_parse_from(["pacod", "--stdin"]).unwrap();
		assert!(cli.packages.is_empty());
		assert!(cli.stdin);
	}

	#[test]
	fn positionals_collect_in_order() {
		let cli = CliArgs::try_parse_from(["pacod", "vlc", "mpv"]).unwrap();
		assert_eq!(cli.packages, ["vlc", "mpv"]);
		assert!(!cli.stdin);
	}
}
