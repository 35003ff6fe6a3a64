//! Byte-at-a-time decoding of raw terminal input.
//!
//! Raw mode delivers input one byte at a time with no line discipline;
//! arrow and paging keys arrive as multi-byte escape sequences.
//! [`KeyDecoder`] is a small state machine fed single bytes; unrecognized
//! sequences degrade to their literal bytes instead of failing, so decoding
//! is total over arbitrary input.

const ESC: u8 = 0x1b;
const ETX: u8 = 0x03;

/// Arrow-family keys carried by `ESC [ <final>` sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
	Up,
	Down,
	Right,
	Left,
	Home,
	End,
}

/// Paging keys carried by `ESC [ 5 ~` and `ESC [ 6 ~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKey {
	Up,
	Down,
}

impl PageKey {
	fn digit(self) -> u8 {
		match self {
			Self::Up => b'5',
			Self::Down => b'6',
		}
	}
}

/// One decoded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
	/// A literal byte, including bytes replayed from unrecognized sequences.
	Plain(u8),
	/// A control byte the picker reacts to (only ETX, Ctrl-C).
	Ctrl(u8),
	Arrow(ArrowKey),
	Page(PageKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Default,
	Escape,
	Bracket,
	Page(PageKey),
}

/// Decoder state machine; owns only the in-flight escape prefix.
#[derive(Debug)]
pub struct KeyDecoder {
	state: State,
}

impl Default for KeyDecoder {
	fn default() -> Self {
		Self::new()
	}
}

impl KeyDecoder {
	pub fn new() -> Self {
		Self {
			state: State::Default,
		}
	}

	/// Feed one raw byte and collect the events it completes.
	///
	/// Never blocks and never fails; a sequence that turns out not to be a
	/// recognized key replays its swallowed prefix as [`KeyEvent::Plain`]
	/// bytes.
	pub fn feed(&mut self, byte: u8) -> Vec<KeyEvent> {
		match self.state {
			State::Default => match byte {
				ETX => vec![KeyEvent::Ctrl(ETX)],
				ESC => {
					self.state = State::Escape;
					Vec::new()
				}
				other => vec![KeyEvent::Plain(other)],
			},
			State::Escape => match byte {
				b'[' => {
					self.state = State::Bracket;
					Vec::new()
				}
				other => {
					self.state = State::Default;
					vec![KeyEvent::Plain(ESC), KeyEvent::Plain(other)]
				}
			},
			State::Bracket => match byte {
				b'A' => self.emit(KeyEvent::Arrow(ArrowKey::Up)),
				b'B' => self.emit(KeyEvent::Arrow(ArrowKey::Down)),
				b'C' => self.emit(KeyEvent::Arrow(ArrowKey::Right)),
				b'D' => self.emit(KeyEvent::Arrow(ArrowKey::Left)),
				b'H' => self.emit(KeyEvent::Arrow(ArrowKey::Home)),
				b'F' => self.emit(KeyEvent::Arrow(ArrowKey::End)),
				b'5' => {
					self.state = State::Page(PageKey::Up);
					Vec::new()
				}
				b'6' => {
					self.state = State::Page(PageKey::Down);
					Vec::new()
				}
				other => {
					self.state = State::Default;
					vec![
						KeyEvent::Plain(ESC),
						KeyEvent::Plain(b'['),
						KeyEvent::Plain(other),
					]
				}
			},
			State::Page(page) => match byte {
				b'~' => self.emit(KeyEvent::Page(page)),
				other => {
					self.state = State::Default;
					vec![
						KeyEvent::Plain(ESC),
						KeyEvent::Plain(b'['),
						KeyEvent::Plain(page.digit()),
						KeyEvent::Plain(other),
					]
				}
			},
		}
	}

	fn emit(&mut self, event: KeyEvent) -> Vec<KeyEvent> {
		self.state = State::Default;
		vec![event]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn feed_all(bytes: &[u8]) -> Vec<KeyEvent> {
		let mut decoder = KeyDecoder::new();
		let mut events = Vec::new();
		for &byte in bytes {
			events.extend(decoder.feed(byte));
		}
		events
	}

	/// Canonical byte sequence an event decodes from.
	fn unrender(event: KeyEvent) -> Vec<u8> {
		match event {
			KeyEvent::Plain(byte) | KeyEvent::Ctrl(byte) => vec![byte],
			KeyEvent::Arrow(arrow) => {
				let fin = match arrow {
					ArrowKey::Up => b'A',
					ArrowKey::Down => b'B',
					ArrowKey::Right => b'C',
					ArrowKey::Left => b'D',
					ArrowKey::Home => b'H',
					ArrowKey::End => b'F',
				};
				vec![ESC, b'[', fin]
			}
			KeyEvent::Page(page) => vec![ESC, b'[', page.digit(), b'~'],
		}
	}

	#[test]
	fn arrow_sequence_emits_on_final_byte() {
		let mut decoder = KeyDecoder::new();
		assert!(decoder.feed(ESC).is_empty());
		assert!(decoder.feed(b'[').is_empty());
		assert_eq!(decoder.feed(b'A'), [KeyEvent::Arrow(ArrowKey::Up)]);
	}

	#[test]
	fn page_sequence_needs_the_tilde() {
		assert_eq!(feed_all(b"\x1b[5~"), [KeyEvent::Page(PageKey::Up)]);
		assert_eq!(feed_all(b"\x1b[6~"), [KeyEvent::Page(PageKey::Down)]);
	}

	#[test]
	fn control_c_is_reported_as_ctrl() {
		assert_eq!(feed_all(b"\x03"), [KeyEvent::Ctrl(ETX)]);
	}

	#[test]
	fn unknown_csi_final_degrades_to_literals() {
		assert_eq!(
			feed_all(b"\x1b[Z"),
			[
				KeyEvent::Plain(ESC),
				KeyEvent::Plain(b'['),
				KeyEvent::Plain(b'Z'),
			]
		);
	}

	#[test]
	fn aborted_page_sequence_replays_the_digit() {
		assert_eq!(
			feed_all(b"\x1b[5x"),
			[
				KeyEvent::Plain(ESC),
				KeyEvent::Plain(b'['),
				KeyEvent::Plain(b'5'),
				KeyEvent::Plain(b'x'),
			]
		);
	}

	#[test]
	fn bare_escape_pair_is_literal() {
		assert_eq!(
			feed_all(b"\x1bq"),
			[KeyEvent::Plain(ESC), KeyEvent::Plain(b'q')]
		);
	}

	#[test]
	fn decoding_loses_no_bytes() {
		let streams: &[&[u8]] = &[
			b"hello",
			b"\x1b[A\x1b[B\x1b[6~ q",
			b"\x1b[Z\x1b[5x\x1bq\x03",
			b"mixed \x1b[H text \x1b[F end",
		];
		for &stream in streams {
			let replayed: Vec<u8> = feed_all(stream)
				.into_iter()
				.flat_map(unrender)
				.collect();
			assert_eq!(replayed, stream, "stream {stream:?} must reconstruct");
		}
	}
}
