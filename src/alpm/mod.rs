//! Read-only access to the pacman databases, driven through the pacman CLI.
//!
//! The picker never links libalpm; it shells out to `pacman` with `LC_ALL=C`
//! and parses the plain-text output. Queries happen once, before the
//! interactive loop starts.

pub mod version;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use regex::Regex;

use crate::model::{Candidate, Group, OptDepend};

/// Pacman's compiled-in default database path.
pub const DB_PATH: &str = "/var/lib/pacman/";
const LOCK_FILE: &str = "db.lck";

/// An installed package and its raw optional-dependency labels.
#[derive(Debug, Clone)]
pub struct LocalPackage {
	pub name: String,
	pub optdepends: Vec<String>,
}

/// One `repo/name version` entry of a sync-database search.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchEntry {
	repo: String,
	name: String,
	version: String,
	installed: Option<String>,
}

/// Handle on the system package databases.
#[derive(Debug, Clone)]
pub struct PacmanDatabase {
	db_path: PathBuf,
}

impl Default for PacmanDatabase {
	fn default() -> Self {
		Self::new()
	}
}

impl PacmanDatabase {
	pub fn new() -> Self {
		Self::with_db_path(DB_PATH)
	}

	pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
		Self {
			db_path: path.into(),
		}
	}

	/// True while another pacman transaction holds the database lock.
	pub fn lock_held(&self) -> bool {
		self.db_path.join(LOCK_FILE).exists()
	}

	fn pacman(&self, args: &[&str]) -> Command {
		let mut cmd = Command::new("pacman");
		cmd.env("LC_ALL", "C").args(args);
		cmd
	}

	/// Look up an installed package and its optional-dependency labels.
	/// Returns `None` when the package is not installed locally.
	pub fn local_package(&self, name: &str) -> Result<Option<LocalPackage>> {
		let output = self
			.pacman(&["-Qi", name])
			.stderr(Stdio::null())
			.output()
			.context("failed to run pacman -Qi")?;
		if !output.status.success() {
			debug!("{name}: not installed locally");
			return Ok(None);
		}
		let text = String::from_utf8_lossy(&output.stdout);
		let fields = parse_info_fields(&text);

		let name = field_values(&fields, "Name")
			.first()
			.map(String::as_str)
			.unwrap_or(name)
			.to_string();
		let optdepends = field_values(&fields, "Optional Deps")
			.iter()
			.map(|label| strip_installed_marker(label).to_string())
			.collect();
		Ok(Some(LocalPackage { name, optdepends }))
	}

	/// Candidates for a dependency name: every match from the first sync
	/// repository that has any, in that repository's order.
	pub fn search_candidates(&self, dep: &str) -> Result<Vec<Candidate>> {
		let pattern = format!("^{dep}$");
		let output = self
			.pacman(&["-Ss", &pattern])
			.output()
			.context("failed to run pacman -Ss")?;
		match output.status.code() {
			Some(0) => {}
			// pacman exits 1 when nothing matched.
			Some(1) => return Ok(Vec::new()),
			_ => bail!(
				"pacman -Ss failed: {}",
				String::from_utf8_lossy(&output.stderr).trim()
			),
		}
		let entries = parse_search_output(&String::from_utf8_lossy(&output.stdout));
		Ok(first_repo_candidates(entries))
	}

	/// Provides lists for the given `repo/name` targets, keyed by package
	/// name, from one batched `pacman -Si` query.
	pub fn sync_provides(&self, targets: &[String]) -> Result<HashMap<String, Vec<String>>> {
		if targets.is_empty() {
			return Ok(HashMap::new());
		}
		let mut cmd = self.pacman(&["-Si"]);
		cmd.args(targets).stderr(Stdio::null());
		let output = cmd.output().context("failed to run pacman -Si")?;
		// Unknown targets fail the exit status but known ones still print.
		let text = String::from_utf8_lossy(&output.stdout);

		let mut provides = HashMap::new();
		for block in text.split("\n\n") {
			let fields = parse_info_fields(block);
			let Some(name) = field_values(&fields, "Name").first().cloned() else {
				continue;
			};
			let listed = field_values(&fields, "Provides")
				.iter()
				.flat_map(|line| line.split_whitespace())
				.map(str::to_string)
				.collect();
			provides.insert(name, listed);
		}
		Ok(provides)
	}
}

/// Resolve the optional dependencies of the requested packages into picker
/// groups. Dependency names with no candidate anywhere are warned about and
/// omitted; packages that are not installed locally are skipped.
pub fn resolve_optional_dependencies(
	db: &PacmanDatabase,
	packages: &[String],
) -> Result<Vec<Group>> {
	let mut cache: HashMap<String, Vec<Candidate>> = HashMap::new();
	let mut groups = Vec::new();

	for requested in packages {
		let Some(local) = db.local_package(requested)? else {
			continue;
		};
		let mut options = Vec::new();
		for label in &local.optdepends {
			let Some((head, name, description)) = parse_optdep_label(label) else {
				warn!("{requested}: unknown dependency — {label}");
				continue;
			};
			let candidates = match cache.get(&name) {
				Some(hit) => hit.clone(),
				None => {
					let found = db.search_candidates(&name)?;
					cache.insert(name.clone(), found.clone());
					found
				}
			};
			if candidates.is_empty() {
				warn!("{requested}: unknown dependency — {name}");
				continue;
			}
			options.push(OptDepend {
				head,
				name,
				description,
				candidates,
			});
		}
		if !options.is_empty() {
			groups.push(Group {
				name: local.name,
				options,
			});
		}
	}

	fill_provides(db, &mut groups)?;
	Ok(groups)
}

fn fill_provides(db: &PacmanDatabase, groups: &mut [Group]) -> Result<()> {
	let mut seen = HashSet::new();
	let mut targets = Vec::new();
	for group in groups.iter() {
		for option in &group.options {
			for candidate in &option.candidates {
				let target = candidate.target();
				if seen.insert(target.clone()) {
					targets.push(target);
				}
			}
		}
	}

	let provides = db.sync_provides(&targets)?;
	for group in groups {
		for option in &mut group.options {
			for candidate in &mut option.candidates {
				if let Some(listed) = provides.get(&candidate.name) {
					candidate.provides = listed.clone();
				}
			}
		}
	}
	Ok(())
}

/// Split a raw optional-dependency label into (head, bare name,
/// description). `None` when no dependency name can be extracted.
fn parse_optdep_label(label: &str) -> Option<(String, String, String)> {
	static DEP_NAME: OnceLock<Regex> = OnceLock::new();
	let dep_name =
		DEP_NAME.get_or_init(|| Regex::new(r"^[\w.-]+").expect("dependency name pattern is valid"));

	let (head, description) = match label.split_once(':') {
		Some((head, description)) => (head, description.trim()),
		None => (label, ""),
	};
	let name = dep_name.find(head)?.as_str().to_string();
	Some((head.to_string(), name, description.to_string()))
}

/// Drop the `[installed]` marker pacman appends to optional-dependency
/// labels of installed packages.
fn strip_installed_marker(label: &str) -> &str {
	let label = label.trim_end();
	label
		.strip_suffix("[installed]")
		.map(str::trim_end)
		.unwrap_or(label)
}

/// Parse `pacman -Qi` / `-Si` style `Field : value` output, folding
/// indented continuation lines into the preceding field.
fn parse_info_fields(text: &str) -> Vec<(String, Vec<String>)> {
	let mut fields: Vec<(String, Vec<String>)> = Vec::new();
	for line in text.lines() {
		if line.starts_with(char::is_whitespace) {
			let cont = line.trim();
			if !cont.is_empty()
				&& let Some((_, values)) = fields.last_mut()
			{
				values.push(cont.to_string());
			}
		} else if let Some((key, value)) = line.split_once(" : ") {
			let value = value.trim();
			let values = if value.is_empty() {
				Vec::new()
			} else {
				vec![value.to_string()]
			};
			fields.push((key.trim().to_string(), values));
		}
	}
	fields
}

/// Value lines of a field; the literal `None` pacman prints for empty
/// fields maps to no values.
fn field_values<'a>(fields: &'a [(String, Vec<String>)], key: &str) -> &'a [String] {
	for (name, values) in fields {
		if name == key {
			if values.len() == 1 && values[0] == "None" {
				return &[];
			}
			return values;
		}
	}
	&[]
}

/// Parse `pacman -Ss` output into entries, skipping description lines.
fn parse_search_output(text: &str) -> Vec<SearchEntry> {
	let mut entries = Vec::new();
	for line in text.lines() {
		if line.is_empty() || line.starts_with(char::is_whitespace) {
			continue;
		}
		let mut parts = line.split_whitespace();
		let Some((repo, name)) = parts.next().and_then(|target| target.split_once('/')) else {
			continue;
		};
		let Some(version) = parts.next() else {
			continue;
		};
		let rest = parts.collect::<Vec<_>>().join(" ");
		let installed = if let Some(at) = rest.find("[installed:") {
			rest[at + "[installed:".len()..]
				.split(']')
				.next()
				.map(|v| v.trim().to_string())
		} else if rest.contains("[installed]") {
			Some(version.to_string())
		} else {
			None
		};
		entries.push(SearchEntry {
			repo: repo.to_string(),
			name: name.to_string(),
			version: version.to_string(),
			installed,
		});
	}
	entries
}

/// Keep only the entries of the first repository present, preserving order.
fn first_repo_candidates(entries: Vec<SearchEntry>) -> Vec<Candidate> {
	let Some(first_repo) = entries.first().map(|entry| entry.repo.clone()) else {
		return Vec::new();
	};
	entries
		.into_iter()
		.take_while(|entry| entry.repo == first_repo)
		.map(|entry| Candidate {
			repo: entry.repo,
			name: entry.name,
			version: entry.version,
			installed: entry.installed,
			provides: Vec::new(),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	const QI_OUTPUT: &str = "\
Name            : vlc
Version         : 3.0.21-3
Description     : Multi-platform MPEG, VCD/DVD, and DivX player
Optional Deps   : avahi: service discovery using bonjour protocol
                  aom: AOM AV1 codec [installed]
                  gst-plugins-base-libs: for libgst plugins
Required By     : None
";

	const SS_OUTPUT: &str = "\
extra/avahi 1:0.8+r194+g3f79789-2 [installed]
    Service Discovery for Linux using mDNS/DNS-SD
extra/python-avahi 1:0.8+r194+g3f79789-2
    Python bindings for avahi
community/avahi-ui 0.8-1 [installed: 0.7-2] (gnome)
    Avahi UI tools
";

	#[test]
	fn info_fields_fold_continuation_lines() {
		let fields = parse_info_fields(QI_OUTPUT);
		assert_eq!(field_values(&fields, "Name"), ["vlc"]);
		assert_eq!(
			field_values(&fields, "Optional Deps"),
			[
				"avahi: service discovery using bonjour protocol",
				"aom: AOM AV1 codec [installed]",
				"gst-plugins-base-libs: for libgst plugins",
			]
		);
		assert!(field_values(&fields, "Required By").is_empty(), "None maps to empty");
		assert!(field_values(&fields, "Groups").is_empty(), "missing field maps to empty");
	}

	#[test]
	fn installed_markers_are_stripped() {
		assert_eq!(
			strip_installed_marker("aom: AOM AV1 codec [installed]"),
			"aom: AOM AV1 codec"
		);
		assert_eq!(strip_installed_marker("aom: AOM AV1 codec"), "aom: AOM AV1 codec");
	}

	#[test]
	fn optdep_labels_split_into_parts() {
		assert_eq!(
			parse_optdep_label("avahi: service discovery"),
			Some(("avahi".into(), "avahi".into(), "service discovery".into()))
		);
		assert_eq!(
			parse_optdep_label("python-foo>=2: plugin support"),
			Some(("python-foo>=2".into(), "python-foo".into(), "plugin support".into()))
		);
		assert_eq!(
			parse_optdep_label("bash-completion"),
			Some(("bash-completion".into(), "bash-completion".into(), String::new()))
		);
		assert_eq!(parse_optdep_label(": odd"), None);
	}

	#[test]
	fn search_output_parses_versions_and_markers() {
		let entries = parse_search_output(SS_OUTPUT);
		assert_eq!(entries.len(), 3);

		assert_eq!(entries[0].repo, "extra");
		assert_eq!(entries[0].name, "avahi");
		assert_eq!(
			entries[0].installed.as_deref(),
			Some("1:0.8+r194+g3f79789-2"),
			"[installed] means the sync version is installed"
		);
		assert_eq!(entries[1].installed, None);
		assert_eq!(
			entries[2].installed.as_deref(),
			Some("0.7-2"),
			"[installed: v] carries the local version"
		);
	}

	#[test]
	fn only_the_first_repo_contributes_candidates() {
		let candidates = first_repo_candidates(parse_search_output(SS_OUTPUT));
		assert_eq!(candidates.len(), 2);
		assert!(candidates.iter().all(|candidate| candidate.repo == "extra"));
	}
}
