use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kcoin_harness::logging;
use kcoin_harness::property::run_round_trips;
use kcoin_harness::sequence::{parse_sequence, run_sequence};
use kcoin_harness::{HarnessConfig, VaultClient};

#[derive(Parser)]
#[command(name = "kcoin-demo")]
#[command(about = "Drive the K Coin vault inside an in-process bank", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SharedArgs {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// TOML file with fixture and property settings
    #[arg(short, long, env = "KCOIN_DEMO_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run mint/burn round trips over generated amounts
    Test {
        #[command(flatten)]
        shared: SharedArgs,

        /// Number of round trips
        #[arg(long)]
        cases: Option<u32>,

        /// Smallest amount paid in, in lamports
        #[arg(long)]
        min_amount: Option<u64>,

        /// Largest amount paid in, in lamports
        #[arg(long)]
        max_amount: Option<u64>,

        /// Seed for reproducible amounts
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a method sequence such as "mint(1000) burn(2000)"
    Sequence {
        #[command(flatten)]
        shared: SharedArgs,

        /// Whitespace-separated calls
        #[arg(short, long)]
        methods: String,
    },
}

fn load_config(shared: &SharedArgs) -> anyhow::Result<HarnessConfig> {
    Ok(match &shared.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test {
            shared,
            cases,
            min_amount,
            max_amount,
            seed,
        } => {
            logging::init_logging(logging::default_level(shared.verbose, shared.debug));
            let mut config = load_config(&shared)?;
            if let Some(cases) = cases {
                config.property.cases = cases;
            }
            if let Some(min_amount) = min_amount {
                config.property.min_amount = min_amount;
            }
            if let Some(max_amount) = max_amount {
                config.property.max_amount = max_amount;
            }
            if seed.is_some() {
                config.property.seed = seed;
            }

            let mut client = VaultClient::bootstrap(&config.fixture).await?;
            let user = client.create_user().await?;
            let report = run_round_trips(&mut client, &user, &config.property).await?;

            for case in &report.cases {
                println!(
                    "mint({}) => {}, burn({}) => {}",
                    case.paid, case.minted, case.minted, case.refunded
                );
            }
            println!(
                "{} round trips passed ({} with rounding loss), seed {}",
                report.cases.len(),
                report.lossy_cases(),
                report.seed
            );
        }
        Commands::Sequence { shared, methods } => {
            logging::init_logging(logging::default_level(shared.verbose, shared.debug));
            let config = load_config(&shared)?;
            let calls = parse_sequence(&methods)?;

            let mut client = VaultClient::bootstrap(&config.fixture).await?;
            let user = client.create_user().await?;

            for (call, output) in run_sequence(&mut client, &user, &calls).await? {
                println!("{call} => {output}");
            }
        }
    }

    Ok(())
}
