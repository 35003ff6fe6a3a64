//! Terminal acquisition, restoration, and asynchronous signal plumbing.
//!
//! The picker paints on stderr while reading raw bytes from the controlling
//! terminal. Raw mode is held by [`RawTerminal`], whose `Drop` restores the
//! saved cursor position, clears the painted region, shows the cursor
//! again, and re-enables the original mode on every exit path, including
//! error propagation and cancellation.

use std::fs::File;
use std::io::{self, IsTerminal, Read, Stderr, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use crossterm::cursor;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};

use crate::ui::render::TermFrame;

static RESIZED: AtomicBool = AtomicBool::new(false);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Handlers only flip atomic flags (async-signal-safe); everything else
/// happens on the main loop between frames.
extern "C" fn handle_sigwinch(_: libc::c_int) {
	RESIZED.store(true, Ordering::SeqCst);
}

extern "C" fn handle_sigint(_: libc::c_int) {
	INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the resize and interrupt handlers. `SA_RESTART` stays off so a
/// blocked single-byte read returns `EINTR` and the loop sees the flags.
pub fn install_signal_handlers() -> Result<()> {
	install(libc::SIGWINCH, handle_sigwinch).context("failed to install SIGWINCH handler")?;
	install(libc::SIGINT, handle_sigint).context("failed to install SIGINT handler")?;
	Ok(())
}

fn install(signum: libc::c_int, handler: extern "C" fn(libc::c_int)) -> io::Result<()> {
	// SAFETY: the handlers above only store to atomics.
	unsafe {
		let mut action: libc::sigaction = std::mem::zeroed();
		action.sa_sigaction = handler as *const () as libc::sighandler_t;
		libc::sigemptyset(&mut action.sa_mask);
		action.sa_flags = 0;
		if libc::sigaction(signum, &action, std::ptr::null_mut()) != 0 {
			return Err(io::Error::last_os_error());
		}
	}
	Ok(())
}

/// Consume a pending resize notification.
pub fn take_resize() -> bool {
	RESIZED.swap(false, Ordering::SeqCst)
}

/// True once an interrupt signal arrived.
pub fn interrupted() -> bool {
	INTERRUPTED.load(Ordering::SeqCst)
}

/// Snapshot the current terminal dimensions.
pub fn current_frame() -> Result<TermFrame> {
	let (columns, lines) = terminal::size().context("failed to query the terminal size")?;
	Ok(TermFrame { columns, lines })
}

/// Outcome of one blocking byte read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
	Byte(u8),
	/// The read was interrupted by a signal; the flags decide what happens.
	Signal,
}

enum TtyInput {
	Stdin(io::Stdin),
	Device(File),
}

/// Exclusive hold on the terminal while the picker runs.
pub struct RawTerminal {
	input: TtyInput,
	output: Stderr,
}

impl RawTerminal {
	/// Switch the terminal to raw mode, hide the cursor, and save its
	/// position so the painted region can be cleared on exit. Input falls
	/// back to `/dev/tty` when stdin was consumed by a pipe.
	pub fn acquire() -> Result<Self> {
		let input = if io::stdin().is_terminal() {
			TtyInput::Stdin(io::stdin())
		} else {
			let tty = File::open("/dev/tty").context("failed to open /dev/tty for input")?;
			TtyInput::Device(tty)
		};

		terminal::enable_raw_mode().context("failed to enable raw terminal mode")?;
		let mut output = io::stderr();
		if let Err(err) = execute!(output, cursor::Hide, cursor::SavePosition) {
			let _ = terminal::disable_raw_mode();
			return Err(err).context("failed to prepare the terminal");
		}
		Ok(Self { input, output })
	}

	/// Block for exactly one input byte.
	pub fn read_byte(&mut self) -> Result<ReadOutcome> {
		let mut buf = [0u8; 1];
		let read = match &mut self.input {
			TtyInput::Stdin(stdin) => stdin.read(&mut buf),
			TtyInput::Device(device) => device.read(&mut buf),
		};
		match read {
			Ok(0) => bail!("terminal input closed"),
			Ok(_) => Ok(ReadOutcome::Byte(buf[0])),
			Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(ReadOutcome::Signal),
			Err(err) => Err(err).context("failed to read terminal input"),
		}
	}

	/// Paint one frame: every row followed by CRLF, then clear whatever an
	/// earlier, taller frame may have left below.
	pub fn paint(&mut self, rows: &[String]) -> Result<()> {
		for row in rows {
			queue!(self.output, Print(row), Print("\r\n"))
				.context("failed to queue frame output")?;
		}
		queue!(self.output, Clear(ClearType::FromCursorDown))
			.context("failed to queue frame output")?;
		self.output.flush().context("failed to paint the frame")?;
		Ok(())
	}

	/// Move the cursor back up over the painted rows so the next frame
	/// overwrites in place.
	pub fn rewind(&mut self, rows_painted: usize) -> Result<()> {
		if rows_painted > 0 {
			execute!(self.output, cursor::MoveToPreviousLine(rows_painted as u16))
				.context("failed to reposition the cursor")?;
		}
		Ok(())
	}
}

impl Drop for RawTerminal {
	fn drop(&mut self) {
		// Best-effort: a failed restore must not shadow the loop's error.
		let _ = execute!(
			self.output,
			cursor::RestorePosition,
			Clear(ClearType::FromCursorDown),
			cursor::Show
		);
		let _ = terminal::disable_raw_mode();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sigwinch_sets_the_resize_flag() {
		install_signal_handlers().expect("handlers install");
		take_resize();
		// SAFETY: raising SIGWINCH only reaches the flag handler above.
		unsafe {
			libc::raise(libc::SIGWINCH);
		}
		assert!(take_resize(), "resize flag must be set by the handler");
		assert!(!take_resize(), "flag is consumed on read");
	}
}
