// ABOUTME: Main entry point for the rstslide program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use rstslide::{settings, Config, Docutils, ResourcePolicy, SlideDeck, ThemeMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Show debug output, including the merged configuration
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a reveal.js presentation
    Build(BuildArgs),

    /// List available themes
    Themes,
}

#[derive(Args)]
struct BuildArgs {
    /// Input document (.rst, or docutils .xml)
    input: PathBuf,

    /// Path to output HTML file (defaults to the input with .html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How scripts and stylesheets are referenced
    #[arg(short, long, value_enum)]
    resources: Option<ResourcePolicy>,

    /// Override a setting after document and theme, as key=value
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Read themes through docutils with the settings as substitution definitions
    #[arg(long)]
    theme_preamble: bool,
}

fn build(config: Config, args: &BuildArgs) -> anyhow::Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("html"));

    let docutils = Docutils::new(&config.rst2xml);
    let mut deck = SlideDeck::new(config);
    if let Some(policy) = args.resources {
        deck = deck.policy(policy);
    }
    if args.theme_preamble {
        deck = deck.theme_mode(ThemeMode::Preamble(&docutils));
    }
    for assignment in &args.overrides {
        let (key, value) = settings::parse_assignment(assignment)?;
        deck = deck.set(&key, value);
    }

    deck.convert(&args.input, &output)
        .with_context(|| format!("Failed to convert {:?}", args.input))?;
    log::info!("Presentation generated successfully: {:?}", output);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = Config::from_env();

    let result = match &cli.command {
        Some(Commands::Build(args)) => build(config, args),
        Some(Commands::Themes) => rstslide::available_themes(&config.share_root)
            .map(|themes| {
                for theme in themes {
                    println!("{}", theme);
                }
            })
            .map_err(anyhow::Error::from),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
