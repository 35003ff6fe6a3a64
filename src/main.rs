use std::process::ExitCode;

use anyhow::Result;
use pacod::alpm::{PacmanDatabase, resolve_optional_dependencies};
use pacod::cli::{collect_packages, parse_cli};
use pacod::{PickerError, PickerModel, install, logging, ui};

fn main() -> ExitCode {
	logging::init();

	match run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => match err.downcast_ref::<PickerError>() {
			Some(PickerError::Interrupted) => ExitCode::from(130),
			Some(PickerError::EmptyModel) => ExitCode::SUCCESS,
			None => {
				log::error!("{err:#}");
				ExitCode::FAILURE
			}
		},
	}
}

fn run() -> Result<()> {
	let cli = parse_cli();
	let packages = collect_packages(&cli)?;

	let db = PacmanDatabase::new();
	let groups = resolve_optional_dependencies(&db, &packages)?;
	let mut model = PickerModel::load(groups)?;

	ui::run(&mut model)?;

	let picked = model.picked_candidates();
	if picked.is_empty() {
		return Ok(());
	}
	let args = install::install_args(&picked, install::unprivileged());
	install::dispatch(args, db.lock_held())
}
