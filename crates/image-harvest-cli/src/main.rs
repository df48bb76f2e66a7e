//! image-harvest: build labeled image datasets from web image search.

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use image_harvest_cli::cli;
use image_harvest_cli::cli::fetch_cmd::FetchArgs;
use image_harvest_cli::load_config;

#[derive(Parser)]
#[command(
    name = "image-harvest",
    about = "Search, download, resize and prune labeled image datasets",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and tidy the images for a named recipe.
    Prepare {
        /// Recipe name (see `image-harvest recipes`).
        recipe: String,

        /// Download even if the category folders already hold images.
        #[arg(long)]
        force: bool,
    },

    /// Download and tidy images for ad-hoc categories.
    Fetch {
        /// Category to search for. Repeat for more categories.
        #[arg(short, long = "category", required = true)]
        categories: Vec<String>,

        /// Subject appended to each category search. Repeat for more.
        #[arg(short, long = "subject")]
        subjects: Vec<String>,

        /// Dataset root.
        #[arg(long, default_value = "images")]
        root: PathBuf,

        /// Search results requested per term.
        #[arg(long)]
        max_images: Option<usize>,

        /// Longest side after resizing.
        #[arg(long)]
        max_size: Option<u32>,

        /// Skip the HEAD content-type check.
        #[arg(long)]
        no_content_check: bool,

        /// Download even if the category folders already hold images.
        #[arg(long)]
        force: bool,
    },

    /// Print image URLs for a search term.
    Search {
        term: String,

        /// Maximum number of results.
        #[arg(long)]
        max: Option<usize>,
    },

    /// Check whether URLs serve an image content type.
    CheckUrl {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Resize every image under a directory.
    Resize {
        dir: PathBuf,

        /// Longest side after resizing.
        #[arg(long, default_value_t = image_harvest::DEFAULT_MAX_SIZE)]
        max_size: u32,

        /// Write resized copies here instead of in place.
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Find images that fail to decode.
    Verify {
        dir: PathBuf,

        /// Delete the images that fail.
        #[arg(long)]
        delete: bool,
    },

    /// Show downloaded images and exported models per recipe.
    Status {
        /// Only this recipe.
        recipe: Option<String>,
    },

    /// Split a dataset into train and validation sets.
    Split {
        root: PathBuf,

        /// Fraction of images held out for validation.
        #[arg(long, default_value_t = image_harvest::DEFAULT_VALID_PCT)]
        valid_pct: f64,

        #[arg(long, default_value_t = image_harvest::DEFAULT_SEED)]
        seed: u64,

        /// Manifest path (default: <root>/split.json).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Pick a random image from a directory and print its size.
    Sample {
        dir: PathBuf,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// List known dataset recipes.
    Recipes,

    /// Check environment readiness.
    Doctor,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::output::set_flags(cli.json, cli.quiet);

    let result = run(cli).await;

    if let Err(e) = &result {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }))?;
        } else if !cli::output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "image-harvest", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Prepare { recipe, force } => cli::prepare_cmd::run(&cfg, &recipe, force).await,
        Commands::Fetch {
            categories,
            subjects,
            root,
            max_images,
            max_size,
            no_content_check,
            force,
        } => {
            cli::fetch_cmd::run(
                &cfg,
                FetchArgs {
                    root: &root,
                    categories: &categories,
                    subjects: &subjects,
                    max_images,
                    max_size,
                    skip_content_check: no_content_check,
                    force,
                },
            )
            .await
        }
        Commands::Search { term, max } => cli::search_cmd::run(&cfg, &term, max).await,
        Commands::CheckUrl { urls } => cli::check_url_cmd::run(&cfg, &urls).await,
        Commands::Resize {
            dir,
            max_size,
            dest,
        } => cli::resize_cmd::run(&dir, max_size, dest.as_deref()).await,
        Commands::Verify { dir, delete } => cli::verify_cmd::run(&dir, delete).await,
        Commands::Status { recipe } => cli::status::run(&cfg, recipe.as_deref()).await,
        Commands::Split {
            root,
            valid_pct,
            seed,
            out,
        } => cli::split_cmd::run(&root, valid_pct, seed, out.as_deref()).await,
        Commands::Sample { dir, seed } => cli::sample_cmd::run(&dir, seed).await,
        Commands::Recipes => cli::recipes_cmd::run(&cfg).await,
        Commands::Doctor => cli::doctor::run(&cfg, cli.config.as_deref()).await,
        Commands::Completions { .. } => Ok(()),
    }
}
