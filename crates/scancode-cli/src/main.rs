#![allow(
    clippy::cast_precision_loss,       // f64 sufficient for display purposes
    clippy::too_many_lines,            // command handlers print a lot
    clippy::needless_pass_by_value,    // clap hands over owned values
    clippy::fn_params_excessive_bools, // CLI commands have many boolean flags
    clippy::must_use_candidate,        // CLI functions don't need must_use
)]

//! Scancode CLI - animate the bars of scan code SVGs
//!
//! Rewrites SVG files in place, keeping a `.bak` copy of each original.

mod config;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use config::{AnimationConfig, BatchConfig, Config, DEFAULT_CONFIG};
use indicatif::{ProgressBar, ProgressStyle};
use scancode_svg::bar::format_number;
use scancode_svg::{
    animate_document, animate_svg, parse_svg, AnimatedSvg, AnimationOptions, AnimationReport,
    DetectionTier, SvgError,
};
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit code for a missing input file
const EXIT_NOT_FOUND: u8 = 3;
/// Exit code for markup that could not be parsed
const EXIT_PARSE: u8 = 5;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Check if verbose output is requested
    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Log filter used when `RUST_LOG` is unset
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "scancode",
    about = "Animate the bars of scan code SVGs",
    long_about = "Give every bar of a scan code SVG a staggered CSS wiggle.\n\
                  \n\
                  Files are rewritten in place; the original is kept next to it as <file>.bak.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Animation parameters shared by animate, batch and inspect
#[derive(clap::Args, Debug, Clone, Default)]
struct AnimationFlags {
    /// Length of one wiggle cycle in seconds [default: 2.5]
    #[arg(long, value_name = "SECONDS")]
    duration: Option<f64>,

    /// Stagger between consecutive bars in seconds [default: 0.06]
    #[arg(long, value_name = "SECONDS")]
    delay_step: Option<f64>,

    /// Widest untagged rect treated as a bar [default: 50]
    #[arg(long, value_name = "WIDTH")]
    max_bar_width: Option<f64>,

    /// Tallest untagged rect treated as a bar [default: 200]
    #[arg(long, value_name = "HEIGHT")]
    max_bar_height: Option<f64>,
}

impl AnimationFlags {
    /// Resolve with precedence: CLI > config > defaults
    fn resolve(&self, config: &AnimationConfig) -> AnimationOptions {
        let defaults = AnimationOptions::default();
        AnimationOptions {
            duration: self.duration.or(config.duration).unwrap_or(defaults.duration),
            delay_step: self
                .delay_step
                .or(config.delay_step)
                .unwrap_or(defaults.delay_step),
            max_bar_width: self
                .max_bar_width
                .or(config.max_bar_width)
                .unwrap_or(defaults.max_bar_width),
            max_bar_height: self
                .max_bar_height
                .or(config.max_bar_height)
                .unwrap_or(defaults.max_bar_height),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Animate one SVG file in place
    #[command(long_about = "Animate the bars of one SVG file in place.\n\
                      \n\
                      Rects with the 'bar' class are animated; when none carry it, rects\n\
                      within --max-bar-width x --max-bar-height are used instead.\n\
                      The original file is copied to <PATH>.bak first.\n\
                      \n\
                      Examples:\n  \
                        scancode animate code.svg\n  \
                        scancode animate code.svg --duration 3 --delay-step 0.1")]
    Animate {
        /// SVG file to animate
        #[arg(value_name = "PATH")]
        path: PathBuf,

        #[command(flatten)]
        animation: AnimationFlags,
    },

    /// Animate many SVG files
    #[command(long_about = "Animate many SVG files.\n\
                      \n\
                      Directories expand to the *.svg files directly inside them.\n\
                      Each file is processed once even when it is named more than once.\n\
                      \n\
                      Examples:\n  \
                        scancode batch codes/ --parallel\n  \
                        find . -name '*.svg' | scancode batch --stdin --continue-on-error")]
    Batch {
        /// Files or directories to animate
        #[arg(value_name = "PATH", required_unless_present = "stdin")]
        inputs: Vec<PathBuf>,

        /// Read paths from stdin, one per line
        #[arg(long)]
        stdin: bool,

        /// Animate files on a worker pool
        #[arg(long)]
        parallel: bool,

        /// Number of workers (implies --parallel)
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,

        /// Keep going after a file fails
        #[arg(long)]
        continue_on_error: bool,

        #[command(flatten)]
        animation: AnimationFlags,
    },

    /// Show which rects would be animated, without writing anything
    Inspect {
        /// SVG file to inspect
        #[arg(value_name = "PATH")]
        path: PathBuf,

        #[command(flatten)]
        animation: AnimationFlags,
    },

    /// Manage .scancode.toml configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Display the current effective configuration
    Show,

    /// Create a new .scancode.toml with commented defaults
    Init {
        /// Create in user home directory (~/.scancode.toml) instead of current directory
        #[arg(long)]
        global: bool,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show the path(s) to configuration file(s)
    Path,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    init_logging(verbosity);

    match run(args.command, verbosity) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red().bold());
            ExitCode::from(exit_code(&err))
        }
    }
}

/// `env_logger` on stderr, each line tagged with the thread that wrote it
fn init_logging(verbosity: Verbosity) {
    let env = env_logger::Env::default().default_filter_or(verbosity.log_filter());
    env_logger::Builder::from_env(env)
        .format(|buf, record| {
            let thread = std::thread::current();
            writeln!(
                buf,
                "[{}] {}: {}",
                thread.name().unwrap_or("unnamed"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}

/// Process exit code for a failed command
fn exit_code(err: &anyhow::Error) -> u8 {
    let svg_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SvgError>());
    match svg_error {
        Some(SvgError::NotFound(_)) => EXIT_NOT_FOUND,
        Some(SvgError::XmlError(_) | SvgError::InvalidStructure(_)) => EXIT_PARSE,
        _ => 1,
    }
}

fn run(command: Commands, verbosity: Verbosity) -> Result<()> {
    match command {
        Commands::Animate { path, animation } => {
            let config = Config::load();
            let options = animation.resolve(&config.animation.unwrap_or_default());
            animate_command(&path, &options, verbosity)
        }
        Commands::Batch {
            inputs,
            stdin,
            parallel,
            jobs,
            continue_on_error,
            animation,
        } => {
            let config = Config::load();
            let options = animation.resolve(&config.animation.unwrap_or_default());
            batch_command(
                inputs,
                stdin,
                parallel,
                jobs,
                continue_on_error,
                &options,
                &config.batch.unwrap_or_default(),
                verbosity,
            )
        }
        Commands::Inspect { path, animation } => {
            let config = Config::load();
            let options = animation.resolve(&config.animation.unwrap_or_default());
            inspect_command(&path, &options)
        }
        Commands::Config { action } => config_command(action, verbosity),
        Commands::Completions { shell } => completion_command(shell),
    }
}

const fn tier_label(tier: DetectionTier) -> &'static str {
    match tier {
        DetectionTier::Explicit => "'bar' class",
        DetectionTier::Dimensions => "dimensions",
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn print_skipped(report: &AnimationReport) {
    if report.skipped > 0 {
        eprintln!(
            "{} {} bar candidate(s) without numeric height/y left unchanged",
            "Warning:".yellow().bold(),
            report.skipped
        );
    }
}

/// Animate one file in place
fn animate_command(path: &Path, options: &AnimationOptions, verbosity: Verbosity) -> Result<()> {
    let animated = animate_svg(path, options)
        .with_context(|| format!("Failed to animate {}", path.display()))?;
    let report = &animated.report;

    if verbosity.should_show_output() {
        if report.bars.is_empty() {
            eprintln!(
                "{} No bars found in {}",
                "Warning:".yellow().bold(),
                path.display()
            );
        } else {
            println!(
                "{} Animated {} bars in {} (detected by {})",
                "✓".green().bold(),
                report.bars.len().to_string().cyan(),
                path.display(),
                tier_label(report.tier)
            );
        }
        print_skipped(report);
        println!("  {} {}", "Backup:".bright_black(), animated.backup_path.display());
    }

    Ok(())
}

/// Dry run: report what `animate` would do
fn inspect_command(path: &Path, options: &AnimationOptions) -> Result<()> {
    if !path.exists() {
        return Err(SvgError::NotFound(path.to_path_buf()).into());
    }
    options.validate()?;
    let mut doc =
        parse_svg(path).with_context(|| format!("Failed to parse {}", path.display()))?;
    let report = animate_document(&mut doc, options);

    println!(
        "{}: {} bars (detected by {})",
        path.display(),
        report.bars.len(),
        tier_label(report.tier)
    );
    if !report.bars.is_empty() {
        println!(
            "{:>6} {:>10} {:>10} {:>8}",
            "index".bold(),
            "height".bold(),
            "y".bold(),
            "delay".bold()
        );
        for bar in &report.bars {
            println!(
                "{:>6} {:>10} {:>10} {:>8}",
                bar.index,
                format_number(bar.height),
                format_number(bar.y),
                format!("{}s", format_number(bar.delay))
            );
        }
    }
    print_skipped(&report);

    Ok(())
}

/// Files named on the command line or stdin, with directories expanded to
/// their `*.svg` entries (sorted, non-recursive) and duplicates dropped
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut expanded = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("Failed to read directory: {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_svg_file(path))
                .collect();
            entries.sort();
            expanded.extend(entries);
        } else {
            // Missing files are reported per file by the animator
            expanded.push(input.clone());
        }
    }

    let mut seen = HashSet::new();
    expanded.retain(|path| {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        seen.insert(key)
    });

    Ok(expanded)
}

fn is_svg_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Per-file batch result
enum Outcome {
    Animated(AnimatedSvg),
    Failed(SvgError),
    /// Not attempted because an earlier file failed
    Skipped,
}

#[allow(
    clippy::too_many_arguments,
    reason = "CLI command handler - args mirror CLI options"
)]
fn batch_command(
    inputs: Vec<PathBuf>,
    read_from_stdin: bool,
    parallel: bool,
    jobs: Option<usize>,
    continue_on_error: bool,
    options: &AnimationOptions,
    config: &BatchConfig,
    verbosity: Verbosity,
) -> Result<()> {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Resolve final values with precedence: CLI > config > defaults
    let parallel = parallel || config.parallel.unwrap_or(false);
    let jobs = jobs.or(config.jobs);
    let continue_on_error = continue_on_error || config.continue_on_error.unwrap_or(false);

    options.validate()?;

    let num_workers = match jobs {
        Some(n) => n.max(1),
        None if parallel => rayon::current_num_threads(),
        None => 1,
    };

    // Gather input files from stdin if requested
    let mut inputs = inputs;
    if read_from_stdin {
        let stdin = io::stdin();
        inputs.extend(
            stdin
                .lock()
                .lines()
                .map_while(Result::ok)
                .filter(|line| !line.trim().is_empty())
                .map(|line| PathBuf::from(line.trim())),
        );
    }

    let files = expand_inputs(&inputs)?;
    if files.is_empty() {
        anyhow::bail!("No input files found");
    }

    let total_files = files.len();
    if verbosity.should_show_output() {
        let parallel_msg = if num_workers > 1 {
            format!(" with {} workers", num_workers.to_string().cyan())
        } else {
            " (sequential)".to_string()
        };
        eprintln!(
            "{} Processing {} files{}...",
            "Info:".blue().bold(),
            total_files.to_string().cyan(),
            parallel_msg
        );
    }

    // Create progress bar (hidden in quiet mode)
    let progress = if verbosity.should_show_output() {
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")?
                .progress_chars("█▓▒░  "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let start_time = std::time::Instant::now();
    // Early termination flag for fail-fast behavior
    let should_stop = AtomicBool::new(false);

    let process_file = |path: &PathBuf| -> Outcome {
        if !continue_on_error && should_stop.load(Ordering::SeqCst) {
            progress.inc(1);
            return Outcome::Skipped;
        }
        let outcome = match animate_svg(path, options) {
            Ok(animated) => Outcome::Animated(animated),
            Err(err) => {
                log::warn!("{}: {err}", path.display());
                if !continue_on_error {
                    should_stop.store(true, Ordering::SeqCst);
                }
                Outcome::Failed(err)
            }
        };
        progress.set_message(file_label(path));
        progress.inc(1);
        outcome
    };

    let results: Vec<Outcome> = if num_workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("animate-{i}"))
            .build()
            .context("Failed to start worker pool")?;
        pool.install(|| files.par_iter().map(process_file).collect())
    } else {
        // Sequential processing for fail-fast behavior
        files.iter().map(process_file).collect()
    };

    progress.finish_and_clear();

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;
    let mut first_error: Option<(PathBuf, SvgError)> = None;

    for (path, outcome) in files.iter().zip(results) {
        match outcome {
            Outcome::Animated(animated) => {
                succeeded += 1;
                if verbosity.is_verbose() {
                    eprintln!(
                        "{} {} ({} bars, {})",
                        "✓".green().bold(),
                        file_label(path).bright_white(),
                        animated.report.bars.len(),
                        tier_label(animated.report.tier)
                    );
                }
            }
            Outcome::Failed(err) => {
                failed += 1;
                eprintln!(
                    "{} {} - {}",
                    "✗".red().bold(),
                    file_label(path).bright_white(),
                    err.to_string().red()
                );
                if first_error.is_none() {
                    first_error = Some((path.clone(), err));
                }
            }
            Outcome::Skipped => {
                skipped += 1;
                if verbosity.should_show_output() {
                    eprintln!(
                        "{} Skipped {} (previous error)",
                        "Skip:".yellow().bold(),
                        file_label(path)
                    );
                }
            }
        }
    }

    let elapsed = start_time.elapsed();

    // Print summary with colors (skip in quiet mode)
    if verbosity.should_show_output() {
        eprintln!("\n{}", "=== Batch Animation Summary ===".bold());
        eprintln!("{:<16} {}", "Total files:", total_files.to_string().cyan());
        eprintln!("{:<16} {}", "Succeeded:", succeeded.to_string().green());
        eprintln!(
            "{:<16} {}",
            "Failed:",
            if failed > 0 {
                failed.to_string().red()
            } else {
                failed.to_string().normal()
            }
        );
        eprintln!("{:<16} {}", "Skipped:", skipped.to_string().yellow());
        eprintln!("{:<16} {:.2}s", "Total time:", elapsed.as_secs_f64());
        if num_workers > 1 {
            eprintln!("{:<16} {}", "Workers:", num_workers.to_string().cyan());
        }
    }

    if let Some((path, err)) = first_error {
        return Err(anyhow::Error::new(err).context(format!(
            "Batch animation failed: {failed} of {total_files} files, first at {}",
            path.display()
        )));
    }

    Ok(())
}

fn completion_command(shell: Shell) -> Result<()> {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}

fn config_command(action: ConfigAction, verbosity: Verbosity) -> Result<()> {
    match action {
        ConfigAction::Show => config_show(),
        ConfigAction::Init { global, force } => config_init(global, force, verbosity),
        ConfigAction::Path => config_path(),
    }
}

/// Display the current effective configuration
fn config_show() -> Result<()> {
    let merged = Config::load();
    let toml = toml::to_string_pretty(&merged).context("Failed to serialize configuration")?;
    if toml.trim().is_empty() {
        println!("# No configuration found; built-in defaults apply");
    } else {
        println!("{toml}");
    }
    Ok(())
}

/// Create a new configuration file with commented defaults
fn config_init(global: bool, force: bool, verbosity: Verbosity) -> Result<()> {
    let config_path = if global {
        Config::user_path().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
    } else {
        Config::project_path()
    };

    if config_path.exists() && !force {
        eprintln!("{} Use --force to overwrite", "Hint:".cyan().bold());
        anyhow::bail!(
            "Configuration file already exists: {}",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    if verbosity.should_show_output() {
        println!(
            "{} Created configuration file: {}",
            "Success:".green().bold(),
            config_path.display()
        );
    }

    Ok(())
}

/// Show both config file locations and whether they exist
#[allow(
    clippy::unnecessary_wraps,
    reason = "consistent return type for CLI commands"
)]
fn config_path() -> Result<()> {
    let status = |path: &Path| {
        if path.exists() {
            "exists".green()
        } else {
            "not found".yellow()
        }
    };

    if let Some(user) = Config::user_path() {
        println!("{:<9} {} ({})", "User:", user.display(), status(&user));
    }
    let project = Config::project_path();
    println!(
        "{:<9} {} ({})",
        "Project:",
        project.display(),
        status(&project)
    );

    Ok(())
}
