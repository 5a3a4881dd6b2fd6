//! Domain Directory CLI Application
//!
//! A command-line interface for maintaining a local directory of domains:
//! manual adds, bulk import from text/CSV/XLSX files, WHOIS enrichment,
//! listing, and removal. This is a thin shell over domain-directory-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use domain_directory_lib::{
    import_manual, import_rows, load_env_config, normalize_domain, parse_timeout_string,
    reader_for_path, ConfigManager, DirectoryConfig, DomainStore, EnvConfig, FileConfig,
    FileFormat, RawRecord, RecordReader, StoreFile, SystemWhoisLookup, WhoisEnricher,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-directory
#[derive(Parser, Debug)]
#[command(name = "domain-directory")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Maintain a local directory of domains with WHOIS enrichment")]
#[command(
    long_about = "Maintain a local directory of domains and their metadata.\n\nDomains enter by manual add or bulk import from text/CSV/XLSX files, and are enriched via WHOIS lookups. When the network is unavailable the fields stay empty for manual editing; an import or enrichment run never fails outright because single rows or lookups did."
)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Store file path (default: ./domains.json)
    #[arg(
        long = "store",
        value_name = "FILE",
        global = true,
        help_heading = "Configuration"
    )]
    pub store: Option<PathBuf>,

    /// Use specific config file instead of automatic discovery
    #[arg(
        long = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Configuration"
    )]
    pub config: Option<String>,

    /// Max concurrent WHOIS lookups (default: 8, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        global = true,
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Per-lookup timeout, e.g. "5s", "30s", "2m"
    #[arg(
        long = "timeout",
        value_name = "DURATION",
        global = true,
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", global = true, help_heading = "Configuration")]
    pub verbose: bool,

    /// Show debug detail in output
    #[arg(short = 'd', long = "debug", global = true, help_heading = "Configuration")]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add domains manually
    Add {
        /// Domain names to add
        #[arg(value_name = "DOMAINS", required = true)]
        names: Vec<String>,

        /// Initial registrar value
        #[arg(long, value_name = "TEXT")]
        registrar: Option<String>,

        /// Initial registrant value
        #[arg(long, value_name = "TEXT")]
        registrant: Option<String>,

        /// Initial creation date
        #[arg(long, value_name = "DATE")]
        created: Option<String>,

        /// Initial expiry date
        #[arg(long, value_name = "DATE")]
        expires: Option<String>,

        /// Note to attach to the new records
        #[arg(long, value_name = "TEXT")]
        note: Option<String>,

        /// Skip the WHOIS lookup for the new records
        #[arg(long = "no-enrich")]
        no_enrich: bool,
    },

    /// Import domains from a text, CSV, or XLSX file
    Import {
        /// Input file (.txt, .csv, .xlsx; only the first worksheet of a
        /// workbook is read)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Override format detection by extension
        #[arg(long, value_enum, value_name = "FORMAT")]
        format: Option<FormatArg>,

        /// Run WHOIS enrichment for unenriched records after the import
        #[arg(long)]
        enrich: bool,
    },

    /// Enrich one domain, or every unenriched record when no name is given
    Enrich {
        /// Domain to enrich
        #[arg(value_name = "DOMAIN")]
        name: Option<String>,
    },

    /// List stored records in insertion order
    List {
        /// Output the records as JSON
        #[arg(short = 'j', long)]
        json: bool,
    },

    /// Remove a record from the directory
    Remove {
        /// Domain to remove
        #[arg(value_name = "DOMAIN")]
        name: String,
    },
}

/// Import format override for files with uncommon extensions.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Text,
    Csv,
    Xlsx,
}

impl FormatArg {
    fn file_format(self) -> FileFormat {
        match self {
            FormatArg::Text => FileFormat::Text,
            FormatArg::Csv => FileFormat::Csv,
            FormatArg::Xlsx => FileFormat::Sheet,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(args, config).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Set up the tracing subscriber; `-v` raises our crates to debug.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("domain_directory_lib=debug,domain_directory=debug,info")
        })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Build DirectoryConfig from config files, environment, and CLI args.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (DD_*)
/// 3. Local config file (./.domain-directory.toml)
/// 4. Global config file (~/.domain-directory.toml)
/// 5. XDG config file (~/.config/domain-directory/config.toml)
/// 6. Built-in defaults
fn build_config(args: &Args) -> Result<DirectoryConfig, Box<dyn std::error::Error>> {
    let mut config = DirectoryConfig::default();

    let config_manager = ConfigManager::new(args.verbose);

    if let Some(explicit_config_path) = &args.config {
        let file_config = config_manager.load_file(explicit_config_path).map_err(|e| {
            format!(
                "Failed to load config file '{}': {}",
                explicit_config_path, e
            )
        })?;
        config = apply_file_config(config, file_config);
    } else if let Ok(file_config) = config_manager.discover_and_load() {
        config = apply_file_config(config, file_config);
    }

    config = apply_env_config(config, load_env_config());

    // CLI arguments win over everything
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".into());
        }
        config.concurrency = concurrency;
    }

    if let Some(timeout_str) = &args.timeout {
        match parse_timeout_string(timeout_str) {
            Some(secs) => config.whois_timeout = Duration::from_secs(secs),
            None => {
                return Err(format!(
                    "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                    timeout_str
                )
                .into())
            }
        }
    }

    if let Some(store) = &args.store {
        config.store_path = Some(store.clone());
    }

    Ok(config)
}

/// Merge FileConfig into DirectoryConfig.
fn apply_file_config(mut config: DirectoryConfig, file_config: FileConfig) -> DirectoryConfig {
    if let Some(defaults) = file_config.defaults {
        if let Some(path) = defaults.store_path {
            config.store_path = Some(PathBuf::from(path));
        }
        if let Some(concurrency) = defaults.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout_str) = defaults.timeout {
            if let Some(secs) = parse_timeout_string(&timeout_str) {
                config.whois_timeout = Duration::from_secs(secs);
            }
        }
        if let Some(retries) = defaults.retries {
            config.whois_retries = retries;
        }
        if let Some(enrich_on_add) = defaults.enrich_on_add {
            config.enrich_on_add = enrich_on_add;
        }
    }
    config
}

/// Apply DD_* environment variables over file-config values.
fn apply_env_config(mut config: DirectoryConfig, env_config: EnvConfig) -> DirectoryConfig {
    if let Some(path) = env_config.store_path {
        config.store_path = Some(PathBuf::from(path));
    }
    if let Some(concurrency) = env_config.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout_str) = env_config.timeout {
        if let Some(secs) = parse_timeout_string(&timeout_str) {
            config.whois_timeout = Duration::from_secs(secs);
        }
    }
    if let Some(retries) = env_config.retries {
        config.whois_retries = retries;
    }
    if let Some(enrich_on_add) = env_config.enrich_on_add {
        config.enrich_on_add = enrich_on_add;
    }
    config
}

/// Main command dispatch.
async fn run(args: Args, config: DirectoryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Args { command, debug, .. } = args;

    let store_file = match &config.store_path {
        Some(path) => StoreFile::new(path.clone()),
        None => StoreFile::default_location(),
    };
    let mut store = DomainStore::from_records(store_file.load()?);
    tracing::debug!(
        store = %store_file.path().display(),
        records = store.len(),
        "store loaded"
    );

    match command {
        Command::Add {
            names,
            registrar,
            registrant,
            created,
            expires,
            note,
            no_enrich,
        } => {
            let rows: Vec<RawRecord> = names
                .iter()
                .map(|name| {
                    let mut row = RawRecord::from_name(name.clone());
                    if let Some(value) = &registrar {
                        row = row.with_field("registrar", value.clone());
                    }
                    if let Some(value) = &registrant {
                        row = row.with_field("registrant", value.clone());
                    }
                    if let Some(value) = &created {
                        row = row.with_field("created", value.clone());
                    }
                    if let Some(value) = &expires {
                        row = row.with_field("expires", value.clone());
                    }
                    if let Some(value) = &note {
                        row = row.with_field("notes", value.clone());
                    }
                    row
                })
                .collect();

            let report = import_manual(&mut store, rows);
            ui::print_import_report(&report);

            if config.enrich_on_add && !no_enrich {
                let targets: Vec<String> = names
                    .iter()
                    .filter_map(|name| normalize_domain(name).ok())
                    .filter(|name| store.get(name).is_some_and(|r| !r.enriched))
                    .collect();
                enrich_and_apply(&mut store, &config, targets).await;
            }

            store_file.save(store.list())?;
        }

        Command::Import {
            file,
            format,
            enrich,
        } => {
            let data = std::fs::read(&file)
                .map_err(|e| format!("Cannot read '{}': {}", file.display(), e))?;

            let reader = match format {
                Some(format) => format.file_format().reader(),
                None => reader_for_path(&file).ok_or_else(|| {
                    format!(
                        "Cannot detect the format of '{}'; use --format text|csv|xlsx",
                        file.display()
                    )
                })?,
            };

            let rows = reader.read_rows(&data)?;
            let report = import_rows(&mut store, rows, reader.source());
            ui::print_import_report(&report);

            if enrich {
                let targets: Vec<String> = store
                    .list()
                    .iter()
                    .filter(|record| !record.enriched)
                    .map(|record| record.name.clone())
                    .collect();
                enrich_and_apply(&mut store, &config, targets).await;
            }

            store_file.save(store.list())?;
        }

        Command::Enrich { name } => {
            match name {
                Some(raw) => {
                    let name = normalize_domain(&raw)?;
                    if store.get(&name).is_none() {
                        println!("'{}' is not in the directory", name);
                        return Ok(());
                    }
                    enrich_and_apply(&mut store, &config, vec![name]).await;
                }
                None => {
                    let targets: Vec<String> = store
                        .list()
                        .iter()
                        .filter(|record| !record.enriched)
                        .map(|record| record.name.clone())
                        .collect();
                    enrich_and_apply(&mut store, &config, targets).await;
                }
            }

            store_file.save(store.list())?;
        }

        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.list())?);
            } else {
                ui::print_list(store.list(), debug);
            }
        }

        Command::Remove { name } => {
            let name = normalize_domain(&name)?;
            match store.remove(&name) {
                Some(record) => {
                    println!("Removed {}", record.name);
                    store_file.save(store.list())?;
                }
                None => println!("'{}' is not in the directory", name),
            }
        }
    }

    Ok(())
}

/// Run WHOIS lookups for `names` and write successful fields back.
///
/// Per-domain failures are printed as outcomes, never raised. A run over
/// many domains always completes and persists what it managed to enrich.
async fn enrich_and_apply(store: &mut DomainStore, config: &DirectoryConfig, names: Vec<String>) {
    if names.is_empty() {
        println!("{}", console::style("Nothing to enrich.").dim());
        return;
    }

    let enricher = WhoisEnricher::with_config(SystemWhoisLookup::new(), config);

    let spinner = if names.len() > 1 {
        ui::Spinner::start(format!("Enriching {} domains...", names.len()))
    } else {
        None
    };

    let start = std::time::Instant::now();
    let outcomes = enricher.enrich_all(names, config.concurrency).await;
    let duration = start.elapsed();

    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    for (name, outcome) in &outcomes {
        if let Some(fields) = outcome.fields() {
            let _ = store.apply_enrichment(name, fields);
        }
        ui::print_enrich_outcome(name, outcome);
    }

    if outcomes.len() > 1 {
        ui::print_enrich_summary(&outcomes, duration);
    }
}
