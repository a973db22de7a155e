// simulator/src/main.rs
use clap::{Parser, Subcommand};
use simulator::{Scenario, Simulation, SimulatorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "amm-sim")]
#[command(about = "Constant-product pool simulator", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Init {
        /// Output path
        #[arg(short, long, default_value = "./config.toml")]
        output: String,
    },

    /// Execute a scenario and print the JSON report
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "./config.toml")]
        config: String,

        /// Scenario file path
        #[arg(short, long)]
        scenario: String,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Run { config, .. } => Some(SimulatorConfig::from_file(config)?),
        Commands::Init { .. } => None,
    };

    // Initialize logging
    let log_level = if cli.debug {
        "debug".to_string()
    } else {
        config
            .as_ref()
            .map(|config| config.log_level.clone())
            .unwrap_or_else(|| "info".into())
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match (cli.command, config) {
        (Commands::Init { output }, _) => init_config(&output)?,
        (Commands::Run { scenario, output, .. }, Some(config)) => {
            run_scenario(&config, &scenario, output.as_deref())?
        }
        (Commands::Run { config, .. }, None) => anyhow::bail!("configuration {} was not loaded", config),
    }

    Ok(())
}

fn init_config(output: &str) -> anyhow::Result<()> {
    let config = SimulatorConfig::default();
    config.to_file(output)?;

    tracing::info!("Configuration written to {}", output);
    tracing::info!("Edit {} to change fees, taxes and minimum liquidity", output);

    Ok(())
}

fn run_scenario(config: &SimulatorConfig, scenario_path: &str, output: Option<&str>) -> anyhow::Result<()> {
    tracing::info!("Loading scenario from {}", scenario_path);
    let contents = std::fs::read_to_string(scenario_path)?;
    let scenario: Scenario = serde_json::from_str(&contents)?;

    let mut simulation = Simulation::new(config)?;
    let report = simulation.run(&scenario);

    let failed = report.steps.iter().filter(|step| !step.ok).count();
    tracing::info!(
        "Executed {} steps ({} failed); reserves {} / {}, total shares {}",
        report.steps.len(),
        failed,
        report.pool.reserve_a,
        report.pool.reserve_b,
        report.pool.total_shares
    );
    simulation.router().pool().verify_invariants()?;

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Report written to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
