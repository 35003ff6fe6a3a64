use thiserror::Error;

/// Control-flow outcomes of the interactive picker that callers must tell
/// apart. Terminal and subprocess I/O failures travel as [`anyhow::Error`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
	/// The user cancelled with Ctrl-C, or the process received an interrupt.
	#[error("interrupted")]
	Interrupted,

	/// No optional dependency resolved to any candidate; there is nothing
	/// to show.
	#[error("no optional dependencies to offer")]
	EmptyModel,
}
