use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use clap::Parser;
use scs_archive::Reader;
use tracing::{Level, debug, info};

#[derive(Parser)]
#[command(
    name = "scs-extract",
    about = "List and extract files from SCS# game-data archives",
    version
)]
struct Cli {
    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Path prefix to extract files to
    #[arg(short, long, default_value = ".")]
    dest: PathBuf,

    /// Extract files (if not given, files are just listed)
    #[arg(short = 'x', long)]
    extract: bool,

    /// The archive to read
    archive: PathBuf,

    /// Extract only these paths (all files when empty)
    files: Vec<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let archive = File::open(&cli.archive)?;
    let reader = Reader::new(archive)?;
    debug!(no_files = reader.files().len(), "opened archive");

    let mut orphans = 0usize;
    for entry in reader.files() {
        let Some(name) = entry.name() else {
            orphans += 1;
            continue;
        };

        if entry.is_directory {
            // Directories are implied by the files they contain.
            continue;
        }

        if !cli.files.is_empty() && !cli.files.iter().any(|f| f == name) {
            continue;
        }

        if !cli.extract {
            println!("{name}");
            continue;
        }

        let dest_path = cli.dest.join(name);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut src = reader.open(entry)?;
        let mut dest = File::create(&dest_path)?;
        io::copy(&mut src, &mut dest)?;
        info!(file = name, "extracted");
    }

    if orphans > 0 {
        debug!(orphans, "entries unreachable from the root were skipped");
    }

    Ok(())
}
