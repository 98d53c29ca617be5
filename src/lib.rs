pub mod alerts;
pub mod cli;
pub mod console;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod settings;
mod utils;
pub mod ward;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use cli::Cli;
use console::PatientConsole;
use dashboard::DashboardController;
use db::{Database, MemoryStorage, PageStorage};
use settings::{resolve_data_dir, SettingsStore};
use ward::{PatientRegistry, StaffingBoard, SupplyDesk};

pub use error::{CareError, CareResult};

/// Everything a console needs, all sharing one page store.
pub struct AppState<S> {
    pub settings: SettingsStore,
    pub patient: PatientConsole<S>,
    pub dashboard: DashboardController<S>,
    pub patients: PatientRegistry<S>,
    pub staffing: StaffingBoard<S>,
    pub supplies: SupplyDesk<S>,
}

impl<S: PageStorage> AppState<S> {
    pub fn new(storage: S, settings: SettingsStore) -> Self {
        let current = settings.settings();
        Self {
            patient: PatientConsole::new(storage.clone(), current.default_patient_name.clone()),
            dashboard: DashboardController::new(storage.clone(), current.poll_interval()),
            patients: PatientRegistry::new(storage.clone()),
            staffing: StaffingBoard::new(storage.clone()),
            supplies: SupplyDesk::new(storage),
            settings,
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // RUST_LOG, when set, takes precedence over the verbosity flag.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = resolve_data_dir(cli.data_dir.clone())?;
    let settings = SettingsStore::new(data_dir.join("settings.json"))?;

    if cli.ephemeral {
        log::info!("Using in-memory page store; nothing will be kept");
        let state = AppState::new(MemoryStorage::new(), settings);
        return cli::execute(cli.command, &state).await;
    }

    let db_path = data_dir.join(Path::new(&settings.settings().database_file));
    let database = Database::new(db_path)?;
    log::debug!("Page store at {}", database.path().display());

    let state = AppState::new(database, settings);
    state.patient.ensure_default_name().await?;
    cli::execute(cli.command, &state).await
}
