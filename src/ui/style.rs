//! ANSI styling primitives for the inline list renderer.
//!
//! Rows are composed from styled spans and fitted by visible column width,
//! so escape sequences never count against the layout. Every span carries
//! its own colors and resets after itself; no styling state leaks between
//! spans or rows.

use std::fmt::Write;

use crossterm::style::{Color, ContentStyle};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// A run of text under a single style.
#[derive(Debug, Clone)]
pub struct Span {
	text: String,
	style: ContentStyle,
}

impl Span {
	pub fn raw(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			style: ContentStyle::new(),
		}
	}

	pub fn styled(text: impl Into<String>, style: ContentStyle) -> Self {
		Self {
			text: text.into(),
			style,
		}
	}

	/// Visible width in terminal columns.
	pub fn width(&self) -> usize {
		UnicodeWidthStr::width(self.text.as_str())
	}
}

/// One display row composed of styled spans.
#[derive(Debug, Clone, Default)]
pub struct Line {
	spans: Vec<Span>,
}

impl Line {
	pub fn push(&mut self, span: Span) {
		if !span.text.is_empty() {
			self.spans.push(span);
		}
	}

	pub fn width(&self) -> usize {
		self.spans.iter().map(Span::width).sum()
	}

	/// Serialize to an ANSI string.
	pub fn to_ansi(&self) -> String {
		let mut out = String::new();
		for span in &self.spans {
			let _ = write!(out, "{}", span.style.apply(span.text.as_str()));
		}
		out
	}
}

/// Display color of a sync repository name; unknown repositories share a
/// fallback.
pub fn repo_color(repo: &str) -> Color {
	match repo {
		"core" => Color::Red,
		"extra" => Color::Green,
		"local" => Color::Yellow,
		_ => Color::Magenta,
	}
}

/// Truncate to at most `max` visible columns, marking any cut with an
/// ellipsis.
pub fn fit(text: &str, max: usize) -> String {
	if UnicodeWidthStr::width(text) <= max {
		return text.to_string();
	}
	if max == 0 {
		return String::new();
	}
	let mut out = String::new();
	let mut used = 0;
	for ch in text.chars() {
		let width = UnicodeWidthChar::width(ch).unwrap_or(0);
		if used + width > max - 1 {
			break;
		}
		out.push(ch);
		used += width;
	}
	out.push('…');
	out
}

/// Center `text` in `width` columns; the spare column goes to the right.
pub fn center(text: &str, width: usize) -> String {
	let text_width = UnicodeWidthStr::width(text);
	if text_width >= width {
		return text.to_string();
	}
	let left = (width - text_width) / 2;
	let right = width - text_width - left;
	format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}
