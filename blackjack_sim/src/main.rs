use blackjack_lib::TableConfig;
use blackjack_sim::prelude::*;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "blackjack_sim",
    about = "Simulate blackjack strategies on independent tables"
)]
struct Args {
    /// Table rules as JSON, any field left out keeps its default
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "100")]
    simulations: u32,

    /// Rounds played per simulation
    #[arg(long, default_value = "50")]
    rounds: u32,

    #[arg(long)]
    seed: Option<u64>,

    /// Starting balance of every simulated player
    #[arg(long, default_value = "500")]
    balance: f64,

    /// Margin used by the ten-density betting strategy
    #[arg(long, default_value = "3")]
    margin: f64,

    /// Print the summaries as JSON
    #[arg(long)]
    json: bool,

    /// Repeat for more output (-v rounds, -vv every table event)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: Args) -> Result<(), SimulationError> {
    let mut builder = BlackjackSimulatorConfig::new();
    if let Some(path) = &args.config {
        let mut table = TableConfig::from_json_file(path)?;
        if table.decision_retry_limit.is_none() {
            table.decision_retry_limit = Some(BlackjackSimulatorConfigBuilder::DEFAULT_RETRY_LIMIT);
        }
        builder.table(table);
    }
    if let Some(seed) = args.seed {
        builder.seed(seed);
    }
    let config = builder
        .player_starting_balance(args.balance)
        .num_simulations(args.simulations)
        .rounds_per_simulation(args.rounds)
        .silent(args.verbose == 0)
        .build();

    let mut simulator = MulStrategyBlackjackSimulator::new(config)
        .simulation(
            "basic strategy / flat",
            Box::new(PlayerStrategy::new(BasicStrategy::new(), FlatBetting::default())),
        )
        .simulation(
            format!("basic strategy / margin {}", args.margin),
            Box::new(PlayerStrategy::new(
                BasicStrategy::new(),
                MarginBettingStrategy::new(args.margin),
            )),
        )
        .build()?;

    if args.json {
        simulator.run_json(Box::new(std::io::stdout()))
    } else {
        simulator.run(Box::new(std::io::stdout()))
    }
}

fn main() {
    let args = Args::parse();
    if let Err(e) = blackjack_sim::log(args.verbose) {
        eprintln!("unable to initialise logging: {e}");
    }
    if let Err(e) = run(args) {
        log::error!("simulation failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
