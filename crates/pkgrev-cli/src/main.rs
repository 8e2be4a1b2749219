mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pkgrev",
    about = "Readiness-gate controller for Porch PackageRevisions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Controller config file (YAML)
    #[arg(long, global = true, env = "PKGREV_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller until interrupted
    Run {
        /// Only watch this namespace (default: all namespaces)
        #[arg(long, short = 'n', env = "PKGREV_NAMESPACE")]
        namespace: Option<String>,

        /// Reconcile YAML files under this directory instead of the cluster
        #[arg(long, env = "PKGREV_STORE_DIR")]
        dir: Option<PathBuf>,
    },

    /// Show what the controller would do to a PackageRevision file, without writing
    Evaluate {
        /// PackageRevision YAML file ("-" for stdin)
        file: PathBuf,
    },

    /// Reconcile one PackageRevision in a directory store
    Reconcile {
        /// Resource identity: namespace/name, or name in "default"
        key: String,

        /// Store directory
        #[arg(long, env = "PKGREV_STORE_DIR")]
        dir: PathBuf,
    },

    /// Print the ClusterRole the controller needs
    Rbac {
        /// ClusterRole name
        #[arg(long, default_value = pkgrev_controller::rbac::DEFAULT_ROLE_NAME)]
        name: String,
    },

    /// Inspect the controller config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run { namespace, dir } => cmd::run::run(config_path, namespace, dir),
        Commands::Evaluate { file } => cmd::evaluate::run(&file, cli.json),
        Commands::Reconcile { key, dir } => cmd::reconcile::run(config_path, &key, &dir, cli.json),
        Commands::Rbac { name } => cmd::rbac::run(&name, cli.json),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
