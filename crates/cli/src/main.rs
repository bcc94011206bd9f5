use clap::{Args, Parser, Subcommand};
use colored::*;
use sonar_corelib::{logging, Config, Harvester, Result};
use std::path::PathBuf;
use tracing::{info, Level};

fn print_banner() {
    println!();
    println!(
        "{}",
        "╔══════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!(
        "{}",
        "║        🔎 Sonar Harvest - SonarQube results as a dataset     ║".bright_cyan()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!(
        "{}",
        format!("🚀 Initializing Sonar Harvest v{}...", sonar_corelib::VERSION).bright_green()
    );
    println!();
}

#[derive(Parser)]
#[command(
    name = "sonar-harvest",
    about = "🔎 Provision SonarQube projects and harvest their findings into a per-file dataset",
    version,
    after_help = "💡 Examples:\n  sonar-harvest provision -k Scan07 -n Scan07 -s ./src\n  sonar-harvest harvest -b main -o AnalysisReport.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SonarQube server URL
    #[arg(long, global = true, value_name = "URL", help_heading = "SERVER")]
    url: Option<String>,

    /// SonarQube username
    #[arg(short, long, global = true, value_name = "USER", help_heading = "SERVER")]
    username: Option<String>,

    /// SonarQube password (falls back to SONAR_PASSWORD)
    #[arg(long, global = true, value_name = "PASSWORD", help_heading = "SERVER")]
    password: Option<String>,

    /// Project registry file
    #[arg(short, long, global = true, value_name = "FILE", help_heading = "FILES")]
    registry: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, global = true, value_name = "LEVEL", help_heading = "LOGGING")]
    verbosity: Option<Level>,
}

#[derive(Subcommand)]
enum Command {
    /// Create projects, issue analysis tokens and scan the sources
    Provision(ProvisionArgs),

    /// Collect issues and hotspots of every registered project into a dataset
    Harvest(HarvestArgs),
}

#[derive(Args)]
struct ProvisionArgs {
    /// Project keys, in the same order as the names
    #[arg(short = 'k', long = "key", value_name = "KEY", required = true)]
    keys: Vec<String>,

    /// Project names, in the same order as the keys
    #[arg(short = 'n', long = "name", value_name = "NAME", required = true)]
    names: Vec<String>,

    /// Directory with the sources to scan
    #[arg(short, long, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Directory that contains the sonar-scanner executable
    #[arg(long, value_name = "PATH")]
    scanner_path: Option<PathBuf>,

    /// Register the projects without scanning them
    #[arg(long)]
    skip_scan: bool,

    /// Token lifetime in days
    #[arg(long, value_name = "DAYS")]
    expiration_days: Option<u32>,
}

#[derive(Args)]
struct HarvestArgs {
    /// Branch to harvest
    #[arg(short, long, value_name = "BRANCH")]
    branch: Option<String>,

    /// Comma separated metric keys
    #[arg(short, long, value_name = "KEYS")]
    metrics: Option<String>,

    /// Output dataset file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(url) = &cli.url {
        config.sonar_url = url.clone();
    }
    if let Some(username) = &cli.username {
        config.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.password = password.clone();
    }
    if let Some(registry) = &cli.registry {
        config.registry_file = registry.clone();
    }

    match &cli.command {
        Command::Provision(args) => {
            if let Some(source) = &args.source {
                config.source_path = source.clone();
            }
            if let Some(scanner_path) = &args.scanner_path {
                config.scanner_path = Some(scanner_path.clone());
            }
            if args.skip_scan {
                config.scan = false;
            }
            if let Some(days) = args.expiration_days {
                config.token_expiration_days = days;
            }
        }
        Command::Harvest(args) => {
            if let Some(branch) = &args.branch {
                config.branch = branch.clone();
            }
            if let Some(metrics) = &args.metrics {
                config.metric_keys = metrics.clone();
            }
            if let Some(output) = &args.output {
                config.dataset_file = output.clone();
            }
        }
    }

    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging_ready = match cli.verbosity {
        Some(level) => logging::setup_logging(level),
        None => logging::setup_default_logging(),
    };
    if let Err(e) = logging_ready {
        eprintln!("{}", format!("⚠️  Logging disabled: {}", e).bright_yellow());
    }

    print_banner();

    let config = apply_overrides(&cli, Config::from_env()?);
    let harvester = Harvester::new(config)?;
    info!("🚀 Sonar Harvest initialized");

    match &cli.command {
        Command::Provision(args) => {
            let registry = harvester.provision(&args.keys, &args.names).await?;
            let created = registry.data.iter().filter(|r| r.is_success()).count();

            println!();
            println!("{}", "✅ Provisioning completed!".bright_green());
            println!(
                "{}",
                format!(
                    "📄 {} of {} projects created, registry saved to: {}",
                    created,
                    registry.data.len(),
                    harvester.config().registry_file.display()
                )
                .bright_blue()
            );
        }
        Command::Harvest(_) => {
            let dataset = harvester.harvest().await?;

            println!();
            println!("{}", "✅ Harvest completed!".bright_green());
            println!(
                "{}",
                format!(
                    "📄 {} records saved to: {}",
                    dataset.len(),
                    harvester.config().dataset_file.display()
                )
                .bright_blue()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_args_override_config() {
        let cli = Cli::parse_from([
            "sonar-harvest",
            "provision",
            "-k",
            "Scan07",
            "-n",
            "Scan 07",
            "--source",
            "/src/app",
            "--skip-scan",
            "--url",
            "https://sonar.example.com",
        ]);

        let config = apply_overrides(&cli, Config::default());
        assert_eq!(config.sonar_url, "https://sonar.example.com");
        assert_eq!(config.source_path, PathBuf::from("/src/app"));
        assert!(!config.scan);
    }

    #[test]
    fn test_harvest_args_override_config() {
        let cli = Cli::parse_from([
            "sonar-harvest",
            "harvest",
            "-b",
            "develop",
            "-m",
            "bugs",
            "-o",
            "out/report.json",
        ]);

        let config = apply_overrides(&cli, Config::default());
        assert_eq!(config.branch, "develop");
        assert_eq!(config.metric_keys, "bugs");
        assert_eq!(config.dataset_file, PathBuf::from("out/report.json"));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
