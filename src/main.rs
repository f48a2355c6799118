use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use autoinc::contracts::SequenceGenerator;
use autoinc::storage::{Incrementor, IncrementorConfig, RocksDbConfig, RocksDbRecordStore};

#[derive(Parser, Debug)]
#[command(name = "autoinc", version, about = "Per-collection sequence ids on RocksDB")]
struct Cli {
    /// Directory of the sequence store
    #[arg(long, env = "AUTOINC_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Allocate the next value of a namespace
    Next {
        namespace: String,
        /// Seed used when the namespace has no record yet
        #[arg(long, default_value_t = 0)]
        initial: u64,
        /// Print metrics after allocating
        #[arg(long)]
        metrics: bool,
    },
    /// Show the last value handed out
    Current { namespace: String },
    /// Count superseded records left behind by failed cleanups
    Orphans { namespace: String },
    /// Delete superseded records of one namespace, or of all of them
    Sweep { namespace: Option<String> },
    /// List namespaces with a sequence
    Namespaces,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("autoinc=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store = Arc::new(RocksDbRecordStore::open_with_config(
        &cli.data_dir,
        &RocksDbConfig::from_env(),
    )?);
    let incrementor = Incrementor::with_config(store, IncrementorConfig::from_env());

    match cli.command {
        Command::Next {
            namespace,
            initial,
            metrics,
        } => {
            let value = incrementor.next_value(&namespace, initial)?;
            println!("{}", value);
            if metrics {
                eprint!("{}", incrementor.metrics().format_prometheus());
            }
        }
        Command::Current { namespace } => match incrementor.current_value(&namespace)? {
            Some(value) => println!("{}", value),
            None => println!("none"),
        },
        Command::Orphans { namespace } => {
            println!("{}", incrementor.orphan_count(&namespace)?);
        }
        Command::Sweep { namespace } => {
            let removed = match namespace {
                Some(namespace) => incrementor.sweep_superseded(&namespace)?,
                None => incrementor.sweep_all()?,
            };
            println!("{}", removed);
        }
        Command::Namespaces => {
            for namespace in incrementor.namespaces()? {
                println!("{}", namespace);
            }
        }
    }

    Ok(())
}
