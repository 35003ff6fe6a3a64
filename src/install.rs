//! Composition and dispatch of the final install command.

use std::os::unix::process::CommandExt;
use std::process::Command;

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use crate::model::Candidate;

/// Build the install argument vector for the picked candidates, prefixed
/// with a privilege-escalation wrapper when needed.
pub fn install_args(picked: &[&Candidate], unprivileged: bool) -> Vec<String> {
	let mut args = Vec::new();
	if unprivileged {
		args.push("sudo".to_string());
	}
	args.extend(["pacman", "-S", "--asdeps"].map(str::to_string));
	args.extend(picked.iter().map(|candidate| candidate.target()));
	args
}

/// True when the current user needs the privilege wrapper.
pub fn unprivileged() -> bool {
	// SAFETY: getuid cannot fail.
	unsafe { libc::getuid() != 0 }
}

/// Replace this process with the install command, or print it when another
/// transaction holds the database lock.
pub fn dispatch(args: Vec<String>, db_locked: bool) -> Result<()> {
	if db_locked {
		eprintln!("{} {}", "$".bold().cyan(), args.join(" "));
		return Ok(());
	}
	// exec only returns on failure.
	let error = Command::new(&args[0]).args(&args[1..]).exec();
	Err(error).with_context(|| format!("failed to execute {}", args[0]))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn candidate(repo: &str, name: &str) -> Candidate {
		Candidate {
			repo: repo.into(),
			name: name.into(),
			version: "1.0-1".into(),
			installed: None,
			provides: Vec::new(),
		}
	}

	#[test]
	fn targets_follow_pick_order() {
		let avahi = candidate("extra", "avahi");
		let aom = candidate("core", "aom");
		let args = install_args(&[&avahi, &aom], false);
		assert_eq!(args, ["pacman", "-S", "--asdeps", "extra/avahi", "core/aom"]);
	}

	#[test]
	fn unprivileged_users_get_sudo() {
		let avahi = candidate("extra", "avahi");
		let args = install_args(&[&avahi], true);
		assert_eq!(args[..2], ["sudo", "pacman"]);
	}
}
