use clap::Parser;
use console::Console;
use dirs::data_local_dir;
use module_core::{EventBus, Module};
use std::path::PathBuf;
use stopwatch::StopwatchModule;
use storage::FileSystemStorage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory the stopwatch mode snapshot is persisted in.
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,
}

fn get_storage_dir(cli: &Cli) -> Result<PathBuf, ()> {
    if let Some(storage_dir) = &cli.storage_dir {
        return Ok(storage_dir.clone());
    }
    let mut storage_dir = data_local_dir().ok_or_else(|| {
        error!("Could not determine local data directory");
    })?;
    storage_dir.push("stopwatch");
    Ok(storage_dir)
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let storage_dir = get_storage_dir(&cli)?;
    let eb = EventBus::default();
    let mut storage = FileSystemStorage::new(&storage_dir, eb.context());
    let mut stopwatch = StopwatchModule::new(eb.context());
    let mut console = Console::new(eb.context());

    info!("Starting modules...");
    tokio::join!(storage.run(), stopwatch.run(), console.run()).0
}
