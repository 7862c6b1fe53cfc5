use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hotkey_charts::data::names::NameTable;
use hotkey_charts::data::store::DataStore;
use hotkey_charts::plot::chart::HtmlChartRenderer;
use hotkey_charts::ui::console::Console;
use hotkey_charts::ui::menu::App;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive line charts for per-hotkey metrics logs", long_about = None)]
struct Cli {
    /// Metrics log, one csv row per hotkey observation
    #[arg(long, default_value = "hotkeys.log")]
    log: PathBuf,

    /// Two-column csv mapping hotkeys to display names
    #[arg(long, default_value = "hotkey_names.csv")]
    names: PathBuf,

    /// Directory the rendered html charts are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    // Each input file is checked on its own so the user sees which one is
    // missing before any load is attempted.
    if !cli.names.exists() {
        eprintln!("Error: The file {} was not found.", cli.names.display());
        return ExitCode::FAILURE;
    }
    let names = match NameTable::load(&cli.names) {
        Ok(names) => names,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if !cli.log.exists() {
        eprintln!("Error: The file {} was not found.", cli.log.display());
        return ExitCode::FAILURE;
    }
    let store = match DataStore::load(&cli.log) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    info!(
        records = store.len(),
        hotkeys = store.distinct_hotkeys().len(),
        named = names.len(),
        "metrics log loaded"
    );

    let renderer = HtmlChartRenderer::new(cli.out_dir);
    let mut app = App::new(&store, &names, Console::stdio(), renderer);
    match app.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
