//! Frame rendering for the picker list.
//!
//! [`render`] is a pure function from model and terminal frame to the exact
//! rows to paint, plus the bookkeeping the movement logic needs: logical
//! rows keep counting after painting stops, and the flattened indices of
//! the first and last candidate on screen are reported through
//! [`ViewStats`].

use std::sync::OnceLock;

use crossterm::style::{Color, ContentStyle, Stylize};
use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::model::{Candidate, OptDepend, PickerModel, ViewStats};
use crate::ui::style::{Line, Span, center, fit, repo_color};

/// Hard cap on rendered row width, regardless of terminal columns.
pub const ROW_WIDTH_MAX: usize = 132;

/// Terminal dimensions snapshot used for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermFrame {
	pub columns: u16,
	pub lines: u16,
}

/// A fully rendered frame plus the bookkeeping the controller needs.
#[derive(Debug)]
pub struct RenderedFrame {
	/// Styled rows, in paint order.
	pub rows: Vec<String>,
	pub view: ViewStats,
}

/// Pick-state glyph shown in front of every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickGlyph {
	Available,
	Installed,
	Install,
	Upgrade,
	Reinstall,
}

impl PickGlyph {
	fn of(candidate: &Candidate, picked: bool) -> Self {
		match (&candidate.installed, picked) {
			(None, false) => Self::Available,
			(None, true) => Self::Install,
			(Some(_), false) => Self::Installed,
			(Some(_), true) if candidate.is_outdated() => Self::Upgrade,
			(Some(_), true) => Self::Reinstall,
		}
	}

	fn span(self) -> Span {
		let (text, style) = match self {
			Self::Available => ("[ ]", ContentStyle::new()),
			Self::Installed => ("[=]", ContentStyle::new().with(Color::Blue)),
			Self::Install => ("[+]", ContentStyle::new().with(Color::Green).reverse()),
			Self::Upgrade => ("[^]", ContentStyle::new().with(Color::Magenta).reverse()),
			Self::Reinstall => ("[@]", ContentStyle::new().with(Color::Yellow).reverse()),
		};
		Span::styled(text, style.on(Color::Black))
	}
}

/// Render one frame.
///
/// Rows whose 1-based logical index is below the model's scroll offset are
/// counted but not emitted; painting stops one row short of the viewport
/// bottom (the shell prompt keeps the last line) while counting continues
/// to the end of the content.
pub fn render(model: &PickerModel, frame: &TermFrame) -> RenderedFrame {
	let width = (frame.columns as usize).min(ROW_WIDTH_MAX);
	let capacity = (frame.lines as usize).saturating_sub(2);
	let skip = model.skip();

	let mut rows: Vec<String> = Vec::new();
	let mut view = ViewStats::default();
	let mut ln = 0usize;
	let mut flat = 0usize;

	for group in &model.groups {
		ln += 1;
		if rows.len() < capacity && ln >= skip {
			rows.push(header_row(&group.name, width));
		}
		ln += 1;
		if rows.len() < capacity && ln >= skip {
			rows.push(blank_row(width));
		}
		for option in &group.options {
			for candidate in &option.candidates {
				let index = flat;
				flat += 1;
				ln += 1;
				if rows.len() < capacity && ln >= skip {
					rows.push(candidate_row(model, option, candidate, index, width));
					view.first_visible.get_or_insert(index);
					view.last_visible = Some(index);
				}
			}
		}
		ln += 1;
		if rows.len() < capacity && ln >= skip {
			rows.push(blank_row(width));
		}
	}

	view.rows_painted = rows.len();
	view.total_rows = ln;
	RenderedFrame { rows, view }
}

fn header_row(name: &str, width: usize) -> String {
	let mut line = Line::default();
	line.push(Span::styled(
		center(name, width),
		ContentStyle::new().bold().on(Color::DarkBlue),
	));
	line.to_ansi()
}

fn blank_row(width: usize) -> String {
	let mut line = Line::default();
	line.push(Span::styled(
		" ".repeat(width),
		ContentStyle::new().on(Color::Black),
	));
	line.to_ansi()
}

fn candidate_row(
	model: &PickerModel,
	option: &OptDepend,
	candidate: &Candidate,
	index: usize,
	width: usize,
) -> String {
	let on_black = ContentStyle::new().on(Color::Black);
	let dim = ContentStyle::new().dim().on(Color::Black);
	let selected = model.selected() == Some(index);

	let mut line = Line::default();
	line.push(Span::styled(if selected { "> " } else { "  " }, on_black));
	line.push(PickGlyph::of(candidate, model.is_picked(index)).span());
	line.push(Span::styled("  ", on_black));

	line.push(Span::styled(
		format!("{}/", candidate.repo),
		ContentStyle::new()
			.bold()
			.with(repo_color(&candidate.repo))
			.on(Color::Black),
	));
	line.push(Span::styled(
		candidate.name.clone(),
		ContentStyle::new().bold().on(Color::Black),
	));

	let constraint = option.constraint_for(candidate);
	if !constraint.is_empty() {
		line.push(Span::styled(format!(" as {constraint}"), dim));
	}
	line.push(Span::styled("  ", on_black));

	let shown_version = candidate.installed.as_deref().unwrap_or(&candidate.version);
	if candidate.is_outdated() {
		line.push(Span::styled(format!("[{shown_version} "), dim));
		line.push(Span::styled(
			format!("→  {}", candidate.version),
			ContentStyle::new().with(Color::Green).on(Color::Black),
		));
		line.push(Span::styled("]", dim));
	} else {
		line.push(Span::styled(format!("[{shown_version}]"), dim));
	}
	line.push(Span::styled("  ", on_black));

	// The description fills whatever is left, keeping two trailing columns.
	let remaining = width.saturating_sub(line.width() + 2);
	if remaining >= 2 {
		let italic = ContentStyle::new().italic().on(Color::Black);
		let body = fit(&option.description, remaining - 2);
		let pad = remaining - 2 - UnicodeWidthStr::width(body.as_str());

		line.push(Span::styled("(", italic));
		for (fragment, is_code) in code_fragments(&body) {
			let style = if is_code {
				ContentStyle::new().italic().with(Color::Cyan).on(Color::Black)
			} else {
				italic
			};
			line.push(Span::styled(fragment, style));
		}
		line.push(Span::styled(")", italic));
		if pad > 0 {
			line.push(Span::styled(" ".repeat(pad), on_black));
		}
	}
	let tail = width.saturating_sub(line.width()).min(2);
	line.push(Span::styled(" ".repeat(tail), on_black));

	line.to_ansi()
}

/// Split a description into plain and `` `code` `` fragments; a backtick
/// span runs to the closing backtick or the end of the text.
fn code_fragments(text: &str) -> Vec<(String, bool)> {
	static CODE_SPAN: OnceLock<Regex> = OnceLock::new();
	let code_span =
		CODE_SPAN.get_or_init(|| Regex::new(r"`[^`]*(?:`|$)").expect("code span pattern is valid"));

	let mut fragments = Vec::new();
	let mut last = 0;
	for hit in code_span.find_iter(text) {
		if hit.start() > last {
			fragments.push((text[last..hit.start()].to_string(), false));
		}
		fragments.push((hit.as_str().to_string(), true));
		last = hit.end();
	}
	if last < text.len() {
		fragments.push((text[last..].to_string(), false));
	}
	fragments
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use regex::Regex;

	use crate::model::Group;

	use super::*;

	fn strip_ansi(text: &str) -> String {
		static SGR: OnceLock<Regex> = OnceLock::new();
		let sgr = SGR.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
		sgr.replace_all(text, "").into_owned()
	}

	fn candidate(name: &str) -> Candidate {
		Candidate {
			repo: "extra".into(),
			name: name.into(),
			version: "1.0-1".into(),
			installed: None,
			provides: Vec::new(),
		}
	}

	fn sample_model() -> PickerModel {
		PickerModel::load(vec![Group {
			name: "vlc".into(),
			options: vec![OptDepend {
				head: "avahi".into(),
				name: "avahi".into(),
				description: "service discovery".into(),
				candidates: vec![candidate("avahi"), candidate("libdns"), candidate("mdns")],
			}],
		}])
		.unwrap()
	}

	fn frame(columns: u16, lines: u16) -> TermFrame {
		TermFrame { columns, lines }
	}

	#[test]
	fn paints_full_content_when_it_fits() {
		let model = sample_model();
		let rendered = render(&model, &frame(80, 10));

		// Header, spacer, three candidates, trailing spacer.
		assert_eq!(rendered.rows.len(), 6);
		assert_eq!(rendered.view.rows_painted, 6);
		assert_eq!(rendered.view.total_rows, 6);
		assert_eq!(rendered.view.first_visible, Some(0));
		assert_eq!(rendered.view.last_visible, Some(2));
	}

	#[test]
	fn caps_painted_rows_below_the_viewport() {
		let model = sample_model();
		let rendered = render(&model, &frame(80, 5));

		assert_eq!(rendered.view.rows_painted, 3, "lines - 2 rows at most");
		assert_eq!(rendered.view.total_rows, 6, "counting continues past the cap");
		assert_eq!(rendered.view.last_visible, Some(0));
	}

	#[test]
	fn scroll_offset_suppresses_leading_rows() {
		let mut model = sample_model();
		model.force_scroll(3);
		let rendered = render(&model, &frame(80, 10));

		assert_eq!(rendered.view.rows_painted, 4, "rows 3..=6 remain");
		assert_eq!(rendered.view.first_visible, Some(0), "first candidate sits at row 3");
		let first = strip_ansi(&rendered.rows[0]);
		assert!(first.contains("avahi"), "row 3 is the first candidate: {first:?}");
	}

	#[test]
	fn selected_row_carries_the_cursor() {
		let model = sample_model();
		let rendered = render(&model, &frame(80, 10));

		let rows: Vec<String> = rendered.rows.iter().map(|row| strip_ansi(row)).collect();
		assert!(rows[2].starts_with("> "), "first candidate is selected");
		assert!(rows[3].starts_with("  "), "others are not");
	}

	#[test]
	fn glyphs_track_pick_and_install_state() {
		let mut model = sample_model();
		let rendered = render(&model, &frame(80, 10));
		assert!(strip_ansi(&rendered.rows[2]).contains("[ ]"));

		model.toggle_selected();
		let rendered = render(&model, &frame(80, 10));
		assert!(
			strip_ansi(&rendered.rows[2]).contains("[+]"),
			"picked available candidate installs"
		);
	}

	#[test]
	fn installed_candidates_show_their_state() {
		let mut groups = vec![Group {
			name: "vlc".into(),
			options: vec![OptDepend {
				head: "avahi".into(),
				name: "avahi".into(),
				description: String::new(),
				candidates: vec![candidate("avahi"), candidate("libdns")],
			}],
		}];
		groups[0].options[0].candidates[0].installed = Some("1.0-1".into());
		groups[0].options[0].candidates[1].installed = Some("1.0-1".into());

		let mut model = PickerModel::load(groups).unwrap();
		model.toggle_selected();
		let rendered = render(&model, &frame(80, 10));

		assert!(
			strip_ansi(&rendered.rows[2]).contains("[@]"),
			"picked up-to-date candidate reinstalls"
		);
		assert!(
			strip_ansi(&rendered.rows[3]).contains("[=]"),
			"unpicked installed candidate stays put"
		);
	}

	#[test]
	fn outdated_candidate_renders_the_upgrade_arrow() {
		let mut groups = vec![Group {
			name: "vlc".into(),
			options: vec![OptDepend {
				head: "avahi".into(),
				name: "avahi".into(),
				description: String::new(),
				candidates: vec![candidate("avahi")],
			}],
		}];
		groups[0].options[0].candidates[0].installed = Some("0.9-1".into());

		let mut model = PickerModel::load(groups).unwrap();
		model.toggle_selected();
		let rendered = render(&model, &frame(80, 10));
		let row = strip_ansi(&rendered.rows[2]);

		assert!(row.contains("[^]"), "picked outdated candidate upgrades: {row:?}");
		assert!(row.contains("[0.9-1 →  1.0-1]"), "arrow names the new version: {row:?}");
	}

	#[test]
	fn constraint_qualifier_is_rendered() {
		let model = PickerModel::load(vec![Group {
			name: "python-app".into(),
			options: vec![OptDepend {
				head: "python-foo>=2".into(),
				name: "python-foo".into(),
				description: "plugin support".into(),
				candidates: vec![candidate("python-foo")],
			}],
		}])
		.unwrap();
		let rendered = render(&model, &frame(80, 10));
		let row = strip_ansi(&rendered.rows[2]);
		assert!(row.contains("python-foo as >=2"), "qualifier follows the name: {row:?}");
	}

	#[test]
	fn rows_fill_but_never_exceed_the_width() {
		let model = sample_model();
		for columns in [30u16, 80, 200] {
			let width = (columns as usize).min(ROW_WIDTH_MAX);
			let rendered = render(&model, &frame(columns, 10));
			for row in &rendered.rows {
				let visible = strip_ansi(row);
				assert!(
					UnicodeWidthStr::width(visible.as_str()) <= width,
					"row overflows {width} columns: {visible:?}"
				);
			}
			let header = strip_ansi(&rendered.rows[0]);
			assert_eq!(UnicodeWidthStr::width(header.as_str()), width);
		}
	}

	#[test]
	fn description_truncates_with_an_ellipsis() {
		let model = PickerModel::load(vec![Group {
			name: "vlc".into(),
			options: vec![OptDepend {
				head: "avahi".into(),
				name: "avahi".into(),
				description: "an unreasonably long description that cannot fit".into(),
				candidates: vec![candidate("avahi")],
			}],
		}])
		.unwrap();
		let rendered = render(&model, &frame(44, 10));
		let row = strip_ansi(&rendered.rows[2]);
		assert!(row.contains('…'), "long description is cut: {row:?}");
	}

	#[test]
	fn code_fragments_split_on_backticks() {
		assert_eq!(
			code_fragments("use `foo` or `bar"),
			[
				("use ".to_string(), false),
				("`foo`".to_string(), true),
				(" or ".to_string(), false),
				("`bar".to_string(), true),
			]
		);
		assert_eq!(code_fragments("plain"), [("plain".to_string(), false)]);
	}
}
