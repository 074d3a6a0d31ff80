//! svcmirror CLI.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;

use svcmirror::{
    apitree, GenerateReport, Generator, GeneratorConfig, GeneratorError, RedisConnector,
    RefreshScheduler, RegistryConfig, RegistryConnector,
};

mod ui;

#[derive(Parser)]
#[command(name = "svcmirror")]
#[command(about = "Mirrors registered remote services into a local proxy module tree")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the proxy tree, once or continuously with --every
    Generate {
        /// Services to mirror; every registered service when omitted
        services: Vec<String>,

        /// Destination directory for the generated tree
        #[arg(short, long, default_value = svcmirror::config::DEFAULT_DEST_DIR)]
        dest: PathBuf,

        /// Registry URL; falls back to SVCMIRROR_REGISTRY_URL, then localhost
        #[arg(short, long)]
        registry: Option<String>,

        /// Template tree scaffolded instead of the built-in assets
        #[arg(long)]
        template_dir: Option<PathBuf>,

        /// Refresh interval in seconds; 0 generates once and exits
        #[arg(short, long, default_value_t = 0)]
        every: u64,
    },

    /// List every service name the registry knows
    List {
        /// Registry URL; falls back to SVCMIRROR_REGISTRY_URL, then localhost
        #[arg(short, long)]
        registry: Option<String>,
    },

    /// Show registry records and their API trees without writing anything
    Inspect {
        /// Services to inspect; every registered service when omitted
        services: Vec<String>,

        /// Registry URL; falls back to SVCMIRROR_REGISTRY_URL, then localhost
        #[arg(short, long)]
        registry: Option<String>,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            services,
            dest,
            registry,
            template_dir,
            every,
        } => {
            let config = GeneratorConfig {
                base_dir: current_dir()?,
                dest_dir: dest,
                services,
                template_dir,
                refresh_every: (every > 0).then(|| Duration::from_secs(every)),
            };
            let connector = RedisConnector::new(registry_config(registry));

            match config.refresh_every {
                None => generate_once(config, connector).await?,
                Some(interval) => run_refresh(config, connector, interval).await?,
            }
        }

        Commands::List { registry } => {
            list_services(registry_config(registry)).await?;
        }

        Commands::Inspect { services, registry } => {
            inspect_services(services, registry_config(registry)).await?;
        }
    }

    Ok(())
}

fn current_dir() -> miette::Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to resolve the current directory: {}", e))
}

fn registry_config(url: Option<String>) -> RegistryConfig {
    match url {
        Some(url) => RegistryConfig { url },
        None => RegistryConfig::from_env(),
    }
}

async fn generate_once(config: GeneratorConfig, connector: RedisConnector) -> miette::Result<()> {
    let start = Instant::now();
    let spinner = ui::spinner("Generating service proxies...");

    let result = Generator::new(config).run_once(&connector).await;
    spinner.finish_and_clear();

    let report = result?;
    report_run(&report);
    ui::timing("Done", start.elapsed().as_millis());
    Ok(())
}

fn report_run(report: &GenerateReport) {
    ui::success(&format!(
        "Remote service definitions saved to {}",
        report.dest.display()
    ));
    ui::dim(&format!(
        "    {} services {} {} procedures",
        report.services,
        ui::symbols::DOT,
        report.procedures
    ));
    for warning in &report.warnings {
        ui::warn(&warning.to_string());
    }
}

async fn run_refresh(
    config: GeneratorConfig,
    connector: RedisConnector,
    interval: Duration,
) -> miette::Result<()> {
    ui::info(&format!(
        "Refreshing every {}s {} Ctrl-C stops",
        interval.as_secs(),
        ui::symbols::DOT
    ));
    println!();

    let mut scheduler = RefreshScheduler::new(Generator::new(config), connector, interval);

    // First run happens immediately; the timer only paces the re-runs.
    match scheduler.run_now().await {
        Ok(report) => report_run(&report),
        Err(e) => ui::error(&e.to_string()),
    }

    // The status line is re-rendered in place on a terminal; elsewhere the
    // tick reports are appended as plain lines.
    let attended = atty::is(atty::Stream::Stderr);
    let status = ui::status_line();

    loop {
        tokio::select! {
            result = scheduler.tick() => {
                report_tick(&status, attended, result);
            }
            _ = tokio::signal::ctrl_c() => {
                status.finish_and_clear();
                println!();
                ui::dim("Stopping refresh mode.");
                break;
            }
        }
    }

    Ok(())
}

fn report_tick(
    status: &ProgressBar,
    attended: bool,
    result: Result<GenerateReport, GeneratorError>,
) {
    let stamp = Local::now().format("%H:%M:%S");

    match result {
        Ok(report) => {
            for warning in &report.warnings {
                let line = ui::warn_line(&format!("[{}] {}", stamp, warning));
                if attended {
                    status.println(line);
                } else {
                    println!("{}", line);
                }
            }

            let line = format!(
                "[{}] Done. {} {} services {} {} procedures",
                stamp,
                ui::symbols::DOT,
                report.services,
                ui::symbols::DOT,
                report.procedures
            );
            if attended {
                status.set_message(line);
            } else {
                println!("  {}", line);
            }
        }
        Err(e) => {
            let line = ui::error_line(&format!("[{}] {}", stamp, e));
            if attended {
                status.println(line);
            } else {
                println!("{}", line);
            }
        }
    }
}

async fn list_services(config: RegistryConfig) -> miette::Result<()> {
    let connector = RedisConnector::new(config);
    let mut registry = connector.connect().await?;
    let names = registry.service_names().await?;
    registry.close().await?;

    if names.is_empty() {
        ui::dim("No services registered.");
        return Ok(());
    }

    for name in &names {
        ui::item(name);
    }
    ui::dim(&format!("    {} services", names.len()));
    Ok(())
}

async fn inspect_services(services: Vec<String>, config: RegistryConfig) -> miette::Result<()> {
    let connector = RedisConnector::new(config);
    let mut registry = connector.connect().await?;

    let names = if services.is_empty() {
        registry.service_names().await?
    } else {
        services
    };

    for name in &names {
        let record = registry.service_record(name).await?;
        ui::info(&format!(
            "{} {} {}:{}",
            record.name,
            ui::symbols::DOT,
            record.host,
            record.port
        ));

        let (tree, conflicts) = apitree::build(&record.apis);
        for path in apitree::flatten(&tree) {
            ui::dim(&format!("      {}", path));
        }
        for conflict in conflicts {
            ui::warn(&format!(
                "leaf at '{}' is shadowed by the paths nested beneath it",
                conflict.path
            ));
        }
    }

    registry.close().await?;
    Ok(())
}
