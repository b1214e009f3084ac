use blackjack_lib::{GamePlay, LogAnnouncer, Table, TableConfig};
use blackjack_sim::prelude::*;
use clap::Parser;

/// Plays rounds at a single table with every table event logged, for following a strategy hand
/// by hand.
#[derive(Parser)]
#[command(name = "play_n_rounds", about = "Play and log blackjack rounds at one table")]
struct Args {
    rounds: u32,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "500")]
    balance: f64,

    /// Number of players, each seated with basic strategy and margin betting
    #[arg(long, default_value = "1")]
    players: usize,
}

fn play(args: &Args) -> Result<(), SimulationError> {
    let config = TableConfig {
        seed: args.seed,
        decision_retry_limit: Some(BlackjackSimulatorConfigBuilder::DEFAULT_RETRY_LIMIT),
        ..TableConfig::default()
    };
    let num_positions = config.num_positions;
    let mut table = Table::new(config)?;
    for seat in (0..num_positions).step_by(2).take(args.players) {
        let strategy = PlayerStrategy::new(BasicStrategy::new(), MarginBettingStrategy::new(3.0));
        table.seat_player(format!("player {}", seat + 1), seat, args.balance, Box::new(strategy))?;
    }

    let mut game = GamePlay::new(table).with_announcer(Box::new(LogAnnouncer));
    let played = game.play_rounds(args.rounds)?;

    const WIDTH: usize = 80;
    println!("{}", "-".repeat(WIDTH));
    println!("{:-^WIDTH$}", format!("{} rounds", played));
    for player in game.table().players().iter().chain(game.table().departed()) {
        println!("{}", player);
    }
    println!("{}", game.stats());
    println!("{}", "-".repeat(WIDTH));
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = blackjack_sim::log(2) {
        eprintln!("unable to initialise logging: {e}");
    }
    if let Err(e) = play(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
