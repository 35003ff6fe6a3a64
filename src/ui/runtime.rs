//! The interactive selection loop.
//!
//! Strictly sequential: render a frame, block for one input byte, decode,
//! mutate the model, repeat. The only asynchronous inputs are the resize
//! and interrupt flags, consulted between frames; a signal that cuts a
//! blocked read short just triggers another render pass.

use anyhow::Result;

use crate::error::PickerError;
use crate::model::{Movement, PickerModel};
use crate::ui::input::{ArrowKey, KeyDecoder, KeyEvent, PageKey};
use crate::ui::render::render;
use crate::ui::terminal::{self, RawTerminal, ReadOutcome};

/// Run the picker until the user commits (Enter) or cancels (Ctrl-C).
///
/// The terminal is restored on every exit path, including `?` propagation
/// and cancellation.
pub fn run(model: &mut PickerModel) -> Result<()> {
	terminal::install_signal_handlers()?;
	let mut term = RawTerminal::acquire()?;
	let mut frame = terminal::current_frame()?;
	let mut decoder = KeyDecoder::new();

	loop {
		if terminal::interrupted() {
			return Err(PickerError::Interrupted.into());
		}
		if terminal::take_resize() {
			frame = terminal::current_frame()?;
		}

		let rendered = render(model, &frame);
		term.paint(&rendered.rows)?;

		if model.is_done() {
			break;
		}

		match term.read_byte()? {
			ReadOutcome::Byte(byte) => {
				for event in decoder.feed(byte) {
					match event {
						KeyEvent::Ctrl(_) => return Err(PickerError::Interrupted.into()),
						KeyEvent::Arrow(ArrowKey::Up) => {
							model.move_selection(Movement::Up, &rendered.view);
						}
						KeyEvent::Arrow(ArrowKey::Down) => {
							model.move_selection(Movement::Down, &rendered.view);
						}
						KeyEvent::Arrow(ArrowKey::Home) => {
							model.move_selection(Movement::Home, &rendered.view);
						}
						KeyEvent::Arrow(ArrowKey::End) => {
							model.move_selection(Movement::End, &rendered.view);
						}
						KeyEvent::Arrow(_) => {}
						KeyEvent::Page(PageKey::Up) => {
							model.move_selection(Movement::PageUp, &rendered.view);
						}
						KeyEvent::Page(PageKey::Down) => {
							model.move_selection(Movement::PageDown, &rendered.view);
						}
						KeyEvent::Plain(b' ') => model.toggle_selected(),
						KeyEvent::Plain(b'\n' | b'\r') => model.finish(),
						KeyEvent::Plain(_) => {}
					}
				}
				model.clamp_to_view(&rendered.view, frame.lines);
			}
			ReadOutcome::Signal => {}
		}

		term.rewind(rendered.view.rows_painted)?;
	}

	Ok(())
}
