use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use adaptive_table::app::{App, Status, ViewOptions};
use adaptive_table::controller::Controller;
use adaptive_table::domain::{TableConfig, TableError};
use adaptive_table::model::{DEFAULT_PAGE_SIZE_OPTIONS, ExpansionMode};
use adaptive_table::table::DataSet;
use adaptive_table::ui::TableUI;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV, Parquet or Arrow IPC file to show
    file: String,
    /// Rows per page; 0 picks the first of --page-sizes
    #[arg(long, default_value_t = 0)]
    page_size: usize,
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_PAGE_SIZE_OPTIONS)]
    page_sizes: Vec<usize>,
    /// Show a checkbox column for row selection
    #[arg(long)]
    checkbox: bool,
    /// Allow more than one expanded row at a time
    #[arg(long)]
    multi_expand: bool,
    /// Size columns to their content instead of sharing the width equally
    #[arg(long)]
    fit_columns: bool,
    #[arg(long, default_value = "adaptive-table.log")]
    log_file: String,
    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand_path(path: &str) -> Result<PathBuf, TableError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TableError::LoadingFailed(e.to_string()))
}

fn init_tracing(log_path: &Path) -> Result<(), TableError> {
    let file = File::options().create(true).append(true).open(log_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TableError::LoggingSetup(e.to_string()))
}

fn run(args: Args) -> Result<(), TableError> {
    init_tracing(&expand_path(&args.log_file)?)?;
    info!("Starting with {args:?}");

    let dataset = DataSet::load(expand_path(&args.file)?)?;
    let cfg = TableConfig {
        event_poll_time: args.poll_ms,
    };
    let options = ViewOptions::default()
        .has_checkbox(args.checkbox)
        .page_size(args.page_size)
        .page_size_options(args.page_sizes)
        .fit_columns(args.fit_columns)
        .expansion_mode(if args.multi_expand {
            ExpansionMode::Multi
        } else {
            ExpansionMode::Single
        });

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, dataset, options, &cfg);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    dataset: DataSet,
    options: ViewOptions,
    cfg: &TableConfig,
) -> Result<(), TableError> {
    let width = terminal.size()?.width as usize;
    let mut app = App::new(dataset, options, width);
    let ui = TableUI::new();
    let controller = Controller::new(cfg);

    while app.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&app, f))?;

        if let Some(message) = controller.handle_event(app.raw_keys())? {
            app.update(message);
        }
    }
    Ok(())
}
