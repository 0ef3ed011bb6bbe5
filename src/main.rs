mod artifacts;
mod commands;
mod core;
mod local;
mod model;
mod push;
mod registry;
mod ui;
mod vcs;

use clap::{Parser, Subcommand};
use core::context::AppContext;
use core::error::{KapError, print_error};
use push::PushOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Publish versioned assets to the Kapeta registry
#[derive(Parser)]
#[command(name = "kapctl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Registry URL (overrides kapctl.toml and KAPETA_REGISTRY_URL)
  #[arg(long, global = true, value_name = "URL")]
  registry: Option<String>,

  /// Show debug logs and full error details
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Publishing
  // ============================================================================
  /// Push an asset, publishing local dependencies first
  Push {
    /// Asset directory or definition file (default: current directory)
    path: Option<PathBuf>,
    /// Reserve, build and test, then abort instead of committing
    #[arg(long)]
    dry_run: bool,
    /// Do not run tests
    #[arg(long)]
    skip_tests: bool,
    /// Push even if the working directory is dirty or behind its remote
    #[arg(long)]
    ignore_working_directory: bool,
    /// Maximum nesting of local dependency pushes
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
  },

  /// Show a published version
  View {
    /// Asset reference: handle/name[:version]
    reference: String,
    /// Output the version record as JSON
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Local repository
  // ============================================================================
  /// Link a working copy as the `local` version of its assets
  Link {
    /// Asset directory (default: current directory)
    path: Option<PathBuf>,
  },

  /// Remove installed versions or links from the local repository
  Uninstall {
    /// Asset references: handle/name:version
    #[arg(required = true)]
    references: Vec<String>,
  },

  /// Install published assets and their dependencies into the local repository
  Install {
    /// Asset references: handle/name[:version]
    #[arg(required = true)]
    references: Vec<String>,
    /// Only install the named versions
    #[arg(long)]
    skip_dependencies: bool,
    /// Do not pull docker images of installed versions
    #[arg(long)]
    skip_images: bool,
  },

  /// Clone the source of a published version, link it and install its dependencies
  Clone {
    /// Asset reference: handle/name[:version]
    reference: String,
    /// Directory to clone into (default: ./<name>)
    #[arg(long)]
    target: Option<PathBuf>,
    /// Do not link the clone into the local repository
    #[arg(long)]
    skip_linking: bool,
    /// Do not install dependencies
    #[arg(long)]
    skip_install: bool,
  },
}

impl Commands {
  fn label(&self) -> &'static str {
    match self {
      Commands::Push { .. } => "Push failed",
      Commands::View { .. } => "View failed",
      Commands::Link { .. } => "Link failed",
      Commands::Uninstall { .. } => "Uninstall failed",
      Commands::Install { .. } => "Install failed",
      Commands::Clone { .. } => "Clone failed",
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Diagnostics go to stderr; KAPCTL_LOG wins over the verbosity flag
fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_env("KAPCTL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let label = cli.command.label();
  let ctx = match AppContext::build(cli.registry) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(label, e, cli.verbose),
  };

  let result = match cli.command {
    // Publishing
    Commands::Push {
      path,
      dry_run,
      skip_tests,
      ignore_working_directory,
      max_depth,
    } => {
      let options = PushOptions {
        dry_run,
        skip_tests,
        ignore_working_directory,
        verbose: cli.verbose,
        max_depth: max_depth.unwrap_or(ctx.config.max_depth),
      };
      commands::run_push(&ctx, path, options)
    }
    Commands::View { reference, json } => commands::run_view(&ctx, &reference, json),

    // Local repository
    Commands::Link { path } => commands::run_link(&ctx, path),
    Commands::Uninstall { references } => commands::run_uninstall(&ctx, &references),
    Commands::Install {
      references,
      skip_dependencies,
      skip_images,
    } => commands::run_install(&ctx, &references, skip_dependencies, skip_images),
    Commands::Clone {
      reference,
      target,
      skip_linking,
      skip_install,
    } => commands::run_clone(
      &ctx,
      &reference,
      commands::CloneOptions {
        target,
        skip_linking,
        skip_install,
      },
    ),
  };

  if let Err(err) = result {
    handle_error(label, err, cli.verbose);
  }
}

fn handle_error(label: &str, err: KapError, verbose: bool) -> ! {
  print_error(label, &err, verbose);
  std::process::exit(err.exit_code().as_i32());
}
