use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::error;

use javaguard_lib::commands::{self, RemoteJavaPayload, ResolveJavaPayload};
use javaguard_lib::core::error::GuardResult;
use javaguard_lib::core::java::Platform;

#[derive(Parser)]
#[command(name = "javaguard")]
#[command(author, version, about = "Find a Java runtime that can run a given application version", long_about = None)]
struct Cli {
    /// Application data directory (default: per-user data dir/JavaGuard)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Platform to resolve for (default: host)
    #[arg(long, global = true, value_enum)]
    platform: Option<PlatformArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the best Java executable for a target version
    Resolve {
        /// Target application version, e.g. 1.20.4
        target: String,
    },
    /// List every valid Java installation, best first
    List {
        /// Target application version, e.g. 1.20.4
        target: String,
    },
    /// Look up the latest downloadable JDK
    Remote {
        /// Java major version
        #[arg(long, conflicts_with = "target")]
        major: Option<u32>,
        /// Target application version to derive the major from
        #[arg(long)]
        target: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlatformArg {
    Windows,
    Macos,
    Linux,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Windows => Platform::Windows,
            PlatformArg::Macos => Platform::MacOs,
            PlatformArg::Linux => Platform::Linux,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    javaguard_lib::init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(found) => {
            if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one command, printing its JSON result. `Ok(false)` means the
/// command ran but found nothing.
async fn run(cli: Cli) -> GuardResult<bool> {
    let platform = cli.platform.map(Platform::from);
    match cli.command {
        Commands::Resolve { target } => {
            let resolved = commands::resolve_java(ResolveJavaPayload {
                target_version: target,
                platform,
                app_data_dir: cli.data_dir,
            })
            .await?;
            let found = resolved.exec_path.is_some();
            print_json(&resolved)?;
            Ok(found)
        }
        Commands::List { target } => {
            let installations = commands::list_java_installations(ResolveJavaPayload {
                target_version: target,
                platform,
                app_data_dir: cli.data_dir,
            })
            .await?;
            print_json(&installations)?;
            Ok(!installations.is_empty())
        }
        Commands::Remote { major, target } => {
            let package = commands::locate_remote_java(RemoteJavaPayload {
                platform,
                major,
                target_version: target,
                app_data_dir: cli.data_dir,
            })
            .await?;
            print_json(&package)?;
            Ok(package.is_some())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> GuardResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
