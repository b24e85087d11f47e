use anyhow::{Context, Result};
use clap::Parser;
use classpath_index::config::Config;
use std::path::PathBuf;
use tracing::Level;

/// Index the public classes and static functions of a JVM classpath
#[derive(Debug, Parser)]
#[command(name = "classpath-index", version, long_version = env!("CLASSPATH_INDEX_LONG_VERSION"))]
struct Cli {
    /// Directory holding the jars (and an optional `lib/` directory)
    root: PathBuf,

    /// JSON file to write; replaced on success
    output: PathBuf,

    /// TOML configuration file
    #[arg(long, env = "CLASSPATH_INDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Worker threads (0 = one per CPU, 1 = sequential)
    #[arg(long)]
    jobs: Option<usize>,

    /// Additional archive file name to keep out of the index (repeatable)
    #[arg(long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Config file, then environment, then flags
    fn config(&self) -> Result<Config> {
        let mut config = Config::new(self.config.as_deref()).context("Failed to load configuration")?;
        if let Some(jobs) = self.jobs {
            config.scan.jobs = jobs;
        }
        for name in &self.exclude {
            if !config.scan.excluded_archives.contains(name) {
                config.scan.excluded_archives.push(name.clone());
            }
        }
        if self.pretty {
            config.output.pretty = true;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout stays free
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level())
        .init();

    let config = cli.config()?;
    let stats = classpath_index::run(&cli.root, &cli.output, &config).with_context(|| {
        format!(
            "Failed to index {} into {}",
            cli.root.display(),
            cli.output.display()
        )
    })?;

    tracing::info!(
        "Done: {} entries scanned, {} units, {} duplicates dropped",
        stats.entries_scanned,
        stats.units_parsed,
        stats.duplicates_dropped
    );
    Ok(())
}
