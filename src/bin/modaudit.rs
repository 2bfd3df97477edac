//! modaudit CLI binary entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modaudit::discovery::NestedDiscovery;
use modaudit::error::AuditError;
use modaudit::model::ProjectModel;
use modaudit::report;
use modaudit::resolver::ResolveOptions;

/// Audit a modular build graph for missing transitive inheritance declarations.
#[derive(Parser)]
#[command(name = "modaudit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every inheritance declaration against the dependency closure.
    Check {
        /// Project model document produced by the build system.
        project: PathBuf,

        /// Treat warnings as a fatal outcome.
        #[arg(long)]
        fail_on_warning: bool,

        /// Print full diagnostic detail for recovered descriptor errors.
        #[arg(long)]
        verbose: bool,

        /// Also persist the report as an XML document.
        #[arg(long)]
        file_output: bool,

        /// Name of the persisted report document.
        #[arg(long, default_value = report::DEFAULT_REPORT_FILE)]
        report_file: PathBuf,
    },

    /// Discover nested build units and print their compile roots.
    Sources {
        /// Comma-separated root directories to search.
        #[arg(long, value_delimiter = ',', required = true)]
        roots: Vec<PathBuf>,

        /// Comma-separated substring patterns a descriptor name must contain.
        #[arg(long, value_delimiter = ',')]
        includes: Vec<String>,

        /// Comma-separated substring patterns a descriptor name must not
        /// contain.
        #[arg(long, value_delimiter = ',')]
        excludes: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code().code())
        }
    }
}

fn run(command: Commands) -> Result<(), AuditError> {
    match command {
        Commands::Check {
            project,
            fail_on_warning,
            verbose,
            file_output,
            report_file,
        } => {
            let project = ProjectModel::load(&project)?;
            let resolution = modaudit::run_audit(&project, &ResolveOptions { verbose })?;
            report::render_console(&resolution);
            if file_output {
                report::write_document(&resolution, &report_file)?;
            }
            if resolution.has_warnings && fail_on_warning {
                return Err(AuditError::WarningsFound);
            }
            Ok(())
        }
        Commands::Sources {
            roots,
            includes,
            excludes,
        } => {
            let discovered = NestedDiscovery::new(roots)
                .with_includes(includes)
                .with_excludes(excludes)
                .discover()?;
            for root in &discovered {
                info!("Source directory: {} added.", root.display());
            }
            Ok(())
        }
    }
}
