#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use optdeps_core::{Integration, PackageManager, ResolutionStrategy, StoreLayout};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "optdeps")]
#[command(author, version, about = "Resolve, install and load optional build dependencies", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Install root for optional dependencies (overrides OPTDEPS_INSTALL_ROOT)
    #[arg(long, global = true, value_name = "PATH")]
    install_root: Option<PathBuf>,

    /// Package manager used for installs (npm, pnpm, yarn, bun)
    #[arg(long, global = true, value_name = "NAME")]
    package_manager: Option<PackageManager>,

    /// Restrict the locator to these strategies, in order (repeatable)
    #[arg(long = "strategy", global = true, value_name = "NAME")]
    strategies: Vec<ResolutionStrategy>,

    /// Content-store layout as MARKER[:LEVELS], replacing the pnpm default (repeatable)
    #[arg(long = "store-layout", global = true, value_name = "LAYOUT")]
    store_layouts: Vec<StoreLayout>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// List the resolution bases for the project
    Bases,

    /// Resolve an already-installed dependency without installing
    Resolve {
        /// Dependency id, e.g. "sass-loader" or "@scope/pkg"
        dependency: String,
    },

    /// Resolve a dependency, installing it into the install root if missing
    Ensure {
        /// Dependency id (defaults to the integration's dependency)
        dependency: Option<String>,

        /// Integration requesting the dependency (sass, less, react, preact, vue)
        #[arg(long, short)]
        integration: Integration,

        /// Package to install when missing (repeatable)
        #[arg(long = "install", value_name = "PKG")]
        install: Vec<String>,

        /// Package to verify after install (repeatable, defaults to the install list)
        #[arg(long = "verify", value_name = "PKG")]
        verify: Vec<String>,
    },

    /// Ensure a dependency, then load its entry module
    Load {
        /// Dependency id (defaults to the integration's dependency)
        dependency: Option<String>,

        /// Integration requesting the dependency (sass, less, react, preact, vue)
        #[arg(long, short)]
        integration: Integration,
    },

    /// List the integrations the project uses and whether each resolves
    Detect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Version needs no subscriber.
    if matches!(cli.command, Some(Commands::Version) | None) {
        return commands::version::run(cli.json);
    }

    logging::init(cli.verbose, cli.json);

    let project = cli
        .cwd
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let ctx = commands::Context {
        project,
        json: cli.json,
        install_root: cli.install_root,
        package_manager: cli.package_manager,
        strategies: cli.strategies,
        store_layouts: cli.store_layouts,
    };

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(ctx.json),
        Some(Commands::Bases) => commands::bases::run(&ctx),
        Some(Commands::Resolve { dependency }) => commands::resolve::run(&ctx, &dependency),
        Some(Commands::Ensure {
            dependency,
            integration,
            install,
            verify,
        }) => commands::ensure::run(&ctx, integration, dependency, install, verify),
        Some(Commands::Load {
            dependency,
            integration,
        }) => commands::load::run(&ctx, integration, dependency),
        Some(Commands::Detect) => commands::detect::run(&ctx),
    }
}
