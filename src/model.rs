//! Data model for the optional-dependency picker.
//!
//! [`PickerModel`] owns the group/option/candidate tree for the session and
//! the cursor state the interactive loop drives: the flattened selection
//! index, the picked set, and the scroll offset. Movement semantics work
//! against the visible bounds the renderer reports back each frame through
//! [`ViewStats`].

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::alpm::version::vercmp;
use crate::error::PickerError;

/// Rows kept as slack below the last line when clamping the scroll offset.
const MARGIN_ROWS: usize = 3;

/// A resolvable match for an optional dependency in some sync repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
	/// Sync repository the candidate comes from (`core`, `extra`, ...).
	pub repo: String,
	pub name: String,
	/// Version available in the sync repository.
	pub version: String,
	/// Locally installed version, absent when not installed.
	pub installed: Option<String>,
	/// Names this package provides, as reported by the sync database.
	pub provides: Vec<String>,
}

impl Candidate {
	/// True when the candidate is installed and the sync version is newer.
	pub fn is_outdated(&self) -> bool {
		self.installed
			.as_deref()
			.is_some_and(|installed| vercmp(&self.version, installed) == Ordering::Greater)
	}

	/// `repo/name` target as pacman expects it on the command line.
	pub fn target(&self) -> String {
		format!("{}/{}", self.repo, self.name)
	}
}

/// One optional-dependency slot of a group, with its resolved candidates.
#[derive(Debug, Clone)]
pub struct OptDepend {
	/// Label text before the `:`, possibly carrying a version qualifier.
	pub head: String,
	/// Bare dependency name extracted from the label.
	pub name: String,
	/// Free-text description following the `:`.
	pub description: String,
	pub candidates: Vec<Candidate>,
}

impl OptDepend {
	/// Qualifier left over once the candidate's own name is removed from
	/// the label head; empty when the label names the candidate verbatim.
	pub fn constraint_for(&self, candidate: &Candidate) -> String {
		self.head.replace(&candidate.name, "")
	}
}

/// An installed package owning optional dependencies.
#[derive(Debug, Clone)]
pub struct Group {
	pub name: String,
	pub options: Vec<OptDepend>,
}

/// Flattened address of one candidate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FlatRef {
	group: usize,
	option: usize,
	candidate: usize,
}

/// Bookkeeping the renderer hands back for one painted frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewStats {
	/// Flattened index of the first candidate row on screen.
	pub first_visible: Option<usize>,
	/// Flattened index of the last candidate row on screen.
	pub last_visible: Option<usize>,
	/// Rows actually emitted this frame.
	pub rows_painted: usize,
	/// Logical rows the full content occupies, painted or not.
	pub total_rows: usize,
}

/// Directional movement decoded from arrow and paging keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
	Up,
	Down,
	Home,
	End,
	PageUp,
	PageDown,
}

/// Mutable picker state: the candidate tree plus selection, picked set,
/// and scroll offset.
#[derive(Debug)]
pub struct PickerModel {
	pub groups: Vec<Group>,
	flat: Vec<FlatRef>,
	selected: Option<usize>,
	picked: HashSet<usize>,
	skip: usize,
}

impl PickerModel {
	/// Build the model and its flattened candidate index.
	pub fn load(groups: Vec<Group>) -> Result<Self, PickerError> {
		let mut flat = Vec::new();
		for (g, group) in groups.iter().enumerate() {
			for (o, option) in group.options.iter().enumerate() {
				for c in 0..option.candidates.len() {
					flat.push(FlatRef { group: g, option: o, candidate: c });
				}
			}
		}
		if flat.is_empty() {
			return Err(PickerError::EmptyModel);
		}
		Ok(Self {
			groups,
			flat,
			selected: Some(0),
			picked: HashSet::new(),
			skip: 0,
		})
	}

	/// Total number of selectable candidate rows.
	pub fn len(&self) -> usize {
		self.flat.len()
	}

	pub fn is_empty(&self) -> bool {
		self.flat.is_empty()
	}

	/// Currently highlighted flattened index; `None` once the user committed.
	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	/// First logical row to render, 1-based; 0 means no scrolling.
	pub fn skip(&self) -> usize {
		self.skip
	}

	pub fn is_picked(&self, index: usize) -> bool {
		self.picked.contains(&index)
	}

	pub fn candidate(&self, index: usize) -> Option<&Candidate> {
		let rf = self.flat.get(index)?;
		Some(&self.groups[rf.group].options[rf.option].candidates[rf.candidate])
	}

	/// Candidates toggled on, in render order.
	pub fn picked_candidates(&self) -> Vec<&Candidate> {
		(0..self.flat.len())
			.filter(|index| self.picked.contains(index))
			.filter_map(|index| self.candidate(index))
			.collect()
	}

	/// Toggle the highlighted candidate in or out of the picked set.
	pub fn toggle_selected(&mut self) {
		if let Some(index) = self.selected {
			if !self.picked.remove(&index) {
				self.picked.insert(index);
			}
		}
	}

	/// Commit: the loop terminates once no row is selected.
	pub fn finish(&mut self) {
		self.selected = None;
	}

	pub fn is_done(&self) -> bool {
		self.selected.is_none()
	}

	/// Apply one movement key against the bounds of the last painted frame.
	///
	/// Up/Down step within the visible candidates and bump the scroll
	/// offset at the edges; Home/End first snap to the visible bounds, then
	/// to the absolute first/last row; PageUp/PageDown snap to the visible
	/// bounds only. [`clamp_to_view`](Self::clamp_to_view) resolves any
	/// out-of-range values afterwards.
	pub fn move_selection(&mut self, movement: Movement, view: &ViewStats) {
		let Some(selected) = self.selected else {
			return;
		};
		let (Some(first), Some(last)) = (view.first_visible, view.last_visible) else {
			return;
		};
		match movement {
			Movement::Up => {
				if selected > first {
					self.selected = Some(selected - 1);
				} else {
					self.skip = self.skip.saturating_sub(1);
				}
			}
			Movement::Down => {
				if selected < last {
					self.selected = Some(selected + 1);
				} else {
					self.skip = self.skip.saturating_add(1);
				}
			}
			Movement::Home => {
				if self.skip > 0 && selected > first {
					self.selected = Some(first);
				} else {
					self.selected = Some(0);
					self.skip = 0;
				}
			}
			Movement::End => {
				if selected < last {
					self.selected = Some(last);
				} else {
					// Sentinel scroll offset; the clamp resolves it to the
					// true maximum.
					self.selected = Some(self.flat.len() - 1);
					self.skip = usize::MAX;
				}
			}
			Movement::PageUp => self.selected = Some(first),
			Movement::PageDown => self.selected = Some(last),
		}
	}

	/// Clamp selection into the painted range and the scroll offset into
	/// its valid window. Runs once per decoded input batch.
	pub fn clamp_to_view(&mut self, view: &ViewStats, viewport_lines: u16) {
		if let (Some(selected), Some(first), Some(last)) =
			(self.selected, view.first_visible, view.last_visible)
		{
			self.selected = Some(selected.clamp(first, last));
		}
		self.skip = if view.rows_painted < view.total_rows {
			let max_skip = (view.total_rows + MARGIN_ROWS)
				.saturating_sub(viewport_lines as usize)
				.max(1);
			self.skip.clamp(1, max_skip)
		} else {
			0
		};
	}

	#[cfg(test)]
	pub(crate) fn force_scroll(&mut self, skip: usize) {
		self.skip = skip;
	}
}
