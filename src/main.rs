use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use searchleaks::analysis::LeakEngine;
use searchleaks::config::Config;
use searchleaks::program::manifest::find_default_manifest;
use searchleaks::program::{Manifest, Program};
use searchleaks::report::{self, Reporter};

/// SearchLeaks - static resource and context leak detection for Android
#[derive(Parser, Debug)]
#[command(name = "searchleaks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program model (JSON call graph and class list)
    #[arg(required_unless_present = "completions")]
    program: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional pair definition files (can be specified multiple times)
    #[arg(short, long, value_name = "FILE")]
    pairs: Vec<PathBuf>,

    /// Do not load the builtin Android pair catalog
    #[arg(long)]
    no_builtin_pairs: bool,

    /// AndroidManifest.xml declaring the app components
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the entry-point path search for findings
    #[arg(long)]
    no_paths: bool,

    /// Also report static fields that can retain a Context
    #[arg(long)]
    context_leaks: bool,

    /// Print the computed context container classes and exit
    #[arg(long)]
    list_context_containers: bool,

    /// Analyze pairs in parallel (enabled by default)
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    parallel: bool,

    /// Class name patterns to exclude (can be specified multiple times)
    #[arg(short, long, value_name = "REGEX")]
    exclude: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Compact,
    Json,
}

impl From<OutputFormat> for report::ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => report::ReportFormat::Terminal,
            OutputFormat::Compact => report::ReportFormat::Compact,
            OutputFormat::Json => report::ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose, cli.quiet);

    info!("SearchLeaks v{}", env!("CARGO_PKG_VERSION"));

    let Some(program_path) = cli.program.clone() else {
        return Err(miette::miette!("no program model given"));
    };
    let config = load_config(&cli, &program_path)?;
    run_analysis(&config, &cli, &program_path)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn model_dir(program_path: &Path) -> PathBuf {
    program_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_config(cli: &Cli, program_path: &Path) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&model_dir(program_path))?
    };

    // Override with CLI arguments
    config.pair_files.extend(cli.pairs.iter().cloned());
    if cli.no_builtin_pairs {
        config.builtin_pairs = false;
    }
    if cli.no_paths {
        config.find_paths = false;
    }
    if cli.context_leaks {
        config.context_leaks = true;
    }
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.iter().cloned());
    }
    config.parallel = config.parallel && cli.parallel;

    Ok(config)
}

fn load_manifest(cli: &Cli, program_path: &Path) -> Result<Option<Manifest>> {
    let path = match &cli.manifest {
        Some(path) => Some(path.clone()),
        None => find_default_manifest(&model_dir(program_path)),
    };
    match path {
        Some(path) => {
            info!("Reading manifest {:?}", path);
            Ok(Some(Manifest::from_file(&path)?))
        }
        None => Ok(None),
    }
}

fn run_analysis(config: &Config, cli: &Cli, program_path: &Path) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::{Duration, Instant};

    let start_time = Instant::now();
    let interactive = !cli.quiet && matches!(cli.format, OutputFormat::Terminal);

    // Step 1: Load inputs
    info!("Loading program model {:?}...", program_path);
    let program = Program::from_file(program_path)?;
    let manifest = load_manifest(cli, program_path)?;

    let engine = LeakEngine::new(config)?.with_context_classification(cli.list_context_containers);
    let registry = engine.load_registry()?;

    if interactive {
        println!(
            "{}",
            format!(
                "⚡ Analyzing {} classes, {} call edges, {} pair definitions...",
                program.classes.len(),
                program.edges.len(),
                registry.len()
            )
            .cyan()
        );
    }

    // Step 2: Run the analysis
    let spinner = if interactive {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Tracking allocations and checking reachability");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let outcome = engine.analyze(&program, &registry, manifest.as_ref());

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    // Step 3: Context container listing
    if cli.list_context_containers {
        if let Some(set) = &outcome.context_containers {
            for class in set.iter() {
                println!("{}", class);
            }
        }
        return Ok(());
    }

    if interactive {
        println!(
            "{}",
            format!(
                "⚡ Analysis finished in {:.2}s",
                start_time.elapsed().as_secs_f64()
            )
            .green()
        );
    }

    // Step 4: Report results
    let mut report_options = report::ReportOptions::new();
    report_options.output_path = cli.output.clone();
    report_options.show_paths = config.find_paths;
    report_options.stats = Some(outcome.stats);

    let reporter = Reporter::with_options(cli.format.into(), report_options);
    reporter.report(&outcome.leaks)?;

    info!(
        "Analysis completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
