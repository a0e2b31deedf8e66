use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use schedule_optimizer::catalog::{CatalogError, DirectoryCatalog, TermCatalog};
use schedule_optimizer::config::{self, Config};
use schedule_optimizer::generate::{
    generate_schedules, CourseStatus, GenerateOptions, GenerateRequest,
};
use schedule_optimizer::output;
use schedule_optimizer::schedule::{conflict_reason, BlockedTime};
use schedule_optimizer::scoring::Scorer;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_TERM_UNAVAILABLE: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Course names to combine, e.g. "CSCI 301" "MATH 204"
    #[arg(required = true)]
    courses: Vec<String>,

    /// Term to read sections from (defaults to `term` in the config)
    #[arg(short, long)]
    term: Option<String>,

    /// Fewest courses per schedule
    #[arg(long)]
    min: Option<usize>,

    /// Most courses per schedule
    #[arg(long)]
    max: Option<usize>,

    /// Subject every schedule must contain (repeatable)
    #[arg(short, long = "force")]
    force: Vec<String>,

    /// Section (by CRN) every schedule must contain (repeatable)
    #[arg(long = "force-crn", value_name = "CRN")]
    force_crn: Vec<u32>,

    /// Weekly time to keep free, e.g. "MW 09:00-12:00" (repeatable)
    #[arg(short, long = "block", value_name = "DAYS HH:MM-HH:MM")]
    block: Vec<BlockedTime>,

    /// Print the full response as JSON
    #[arg(long, conflicts_with = "tsv")]
    json: bool,

    /// Print tab-separated values for scripting
    #[arg(long)]
    tsv: bool,

    /// Show at most this many schedules
    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate and rank every conflict-free schedule
    Generate(GenerateArgs),
    /// Show one ranked schedule in detail by its index number
    Show {
        /// Index number of the schedule (1-based, as shown by generate)
        index: usize,
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Check whether two sections can share a schedule
    Check {
        #[arg(short, long)]
        term: Option<String>,
        /// CRN of the first section
        first: u32,
        /// CRN of the second section
        second: u32,
    },
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "schedule-optimizer")]
#[command(about = "Conflict-free course schedule generator and ranker", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/schedule-optimizer/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "schedule_optimizer=debug"
    } else {
        "schedule_optimizer=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Unknown terms get their own code; everything else is bad input data.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CatalogError>() {
        Some(CatalogError::TermUnavailable { .. }) => EXIT_TERM_UNAVAILABLE,
        _ => EXIT_INPUT,
    }
}

fn resolve_term(flag: Option<String>, config: &Config) -> String {
    match flag.or_else(|| config.term.clone()) {
        Some(term) => term,
        None => {
            eprintln!("No term given. Pass --term or set `term` in the config file.");
            std::process::exit(EXIT_CONFIG);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();

    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init = cli.command {
        if let Err(e) = config::init::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = config.validate() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let scorer = match Scorer::from_config(&config.scoring()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Scoring config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let options = match GenerateOptions::from_config(&config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let catalog = DirectoryCatalog::new(config.data_dir());
    debug!(data_dir = %catalog.dir().display(), "reading term tables");

    let result = match cli.command {
        Commands::Generate(args) => {
            run_generate(&config, &catalog, &scorer, &options, args, None, cli.verbose)
        }
        Commands::Show { index, args } => run_generate(
            &config,
            &catalog,
            &scorer,
            &options,
            args,
            Some(index),
            cli.verbose,
        ),
        Commands::Check {
            term,
            first,
            second,
        } => run_check(&config, &catalog, term, first, second),
        Commands::Init => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    if cli.verbose {
        eprintln!("Done in {:?}", start_time.elapsed());
    }
    std::process::exit(EXIT_SUCCESS);
}

fn run_generate(
    config: &Config,
    catalog: &dyn TermCatalog,
    scorer: &Scorer,
    options: &GenerateOptions,
    args: GenerateArgs,
    show: Option<usize>,
    verbose: bool,
) -> Result<()> {
    let request = GenerateRequest {
        term: resolve_term(args.term, config),
        courses: args.courses,
        forced: args.force,
        forced_crns: args.force_crn,
        blocked: args.block,
        min_size: args.min.unwrap_or(config.min_size),
        max_size: args.max.unwrap_or(config.max_size),
    };

    let mut response = generate_schedules(catalog, &request, scorer, options)?;

    if args.json {
        let json = serde_json::to_string_pretty(&response)
            .context("Failed to serialize response")?;
        println!("{}", json);
        return Ok(());
    }

    let use_colors = output::should_use_colors();
    if !response.warnings.is_empty() {
        eprintln!("{}", output::format_warnings(&response.warnings, use_colors));
    }
    let missing = response
        .course_results
        .iter()
        .any(|r| r.status != CourseStatus::Found);
    if missing || verbose {
        eprintln!("{}", output::format_course_results(&response.course_results, use_colors));
    }

    if let Some(index) = show {
        // Validate index bounds (1-based)
        if index < 1 || index > response.schedules.len() {
            anyhow::bail!(
                "Invalid index {}. Must be between 1 and {}.",
                index,
                response.schedules.len()
            );
        }
        println!(
            "{}",
            output::format_schedule_detail(index, &response.schedules[index - 1], use_colors)
        );
        return Ok(());
    }

    if let Some(limit) = args.limit {
        response.schedules.truncate(limit);
    }

    if args.tsv {
        let tsv = output::format_tsv(&response.schedules);
        if !tsv.is_empty() {
            println!("{}", tsv);
        }
    } else {
        println!(
            "{}",
            output::format_scored_table(&response.schedules, use_colors)
        );
    }

    debug!(
        generated = response.stats.total_generated,
        shown = response.schedules.len(),
        truncated = response.stats.truncated,
        elapsed_ms = response.stats.elapsed_ms,
        "generate finished"
    );
    Ok(())
}

fn run_check(
    config: &Config,
    catalog: &dyn TermCatalog,
    term: Option<String>,
    first: u32,
    second: u32,
) -> Result<()> {
    let term = resolve_term(term, config);
    let courses = catalog.courses(&term)?;

    let find = |crn: u32| {
        courses
            .iter()
            .find(|c| c.crn == crn)
            .with_context(|| format!("CRN {} is not offered in term {}", crn, term))
    };
    let a = find(first)?;
    let b = find(second)?;
    a.validate()?;
    b.validate()?;

    let use_colors = output::should_use_colors();
    println!(
        "{}",
        output::format_conflict(a, b, conflict_reason(a, b), use_colors)
    );
    Ok(())
}
