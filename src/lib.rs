//! Interactive picker for pacman optional dependencies.
//!
//! The crate splits into the package-database collaborators ([`alpm`],
//! [`install`]) and the interactive core: the data model in [`model`] and
//! the raw-input decoder, renderer, and selection loop under [`ui`].

pub mod alpm;
pub mod cli;
pub mod error;
pub mod install;
pub mod logging;
pub mod model;
pub mod ui;

pub use error::PickerError;
pub use model::{Candidate, Group, OptDepend, PickerModel};
pub use ui::run;
