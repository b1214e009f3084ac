pub mod strategy;
pub mod write;

use blackjack_lib::{
    BlackjackGameError, ConfigError, DecisionPolicy, GamePlay, LogAnnouncer, Statistics, Table,
    TableConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::io::Write;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use thiserror::Error;

pub mod prelude {
    pub use super::{
        strategy::prelude::*, BlackjackSimulation, BlackjackSimulator, BlackjackSimulatorConfig,
        BlackjackSimulatorConfigBuilder, MulStrategyBlackjackSimulator,
        MulStrategyBlackjackSimulatorBuilder, SimulationError, SimulationSummary,
    };
}

/// Initialises terminal logging for the binaries. `verbosity` counts `-v` flags: none logs
/// warnings, one adds round summaries, two adds every table event.
pub fn log(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Error)
        .build();
    simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
}

/// What the simulator threads send to the writer: a summary for one finished simulation, or
/// `None` once the strategy with the given id has run all of its simulations.
pub type SummaryMessage = (Option<SimulationSummary>, usize);

/// Simple struct for recording all of the interesting data points accumulated during one or more
/// simulations of a single strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub label: String,
    pub simulations: u32,
    pub early_endings: u32,
    pub stats: Statistics,
}

impl SimulationSummary {
    pub fn new<S: Into<String>>(label: S) -> SimulationSummary {
        SimulationSummary {
            label: label.into(),
            simulations: 0,
            early_endings: 0,
            stats: Statistics::new(),
        }
    }

    pub fn merge(&mut self, other: &SimulationSummary) {
        self.simulations += other.simulations;
        self.early_endings += other.early_endings;
        self.stats.merge(&other.stats);
    }
}

impl Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 80;
        const TEXT_WIDTH: usize = "average winnings per hand".len() + 10;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;
        writeln!(f, "{}{}", "strategy: ", self.label)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "simulations", self.simulations)?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
            "number of early endings", self.early_endings
        )?;
        write!(f, "{}", self.stats)
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    GameError(#[from] BlackjackGameError),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error("unable to send summary: {0}")]
    SendingError(String),
    #[error("unable to write summaries: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("unable to serialize summaries: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("thread for simulation #{0} panicked")]
    ThreadPanicked(usize),
}

pub trait BlackjackSimulation: Send {
    /// The strategy under test, used to label output.
    fn label(&self) -> String;
    /// Required method, the method that will be called to run all simulations.
    fn run(&mut self) -> Result<(), SimulationError>;
    /// Required method, runs a single simulation and returns what it recorded. Nothing is reset
    /// afterwards.
    fn run_single_simulation(&mut self) -> Result<SimulationSummary, SimulationError>;
    /// Required method, the method that will display the stats accumulated so far.
    fn display_stats(&self);
    /// Required method, the method that will reset the simulation
    fn reset(&mut self);
    /// Required method, everything accumulated across the simulations run so far.
    fn summary(&self) -> SimulationSummary;
    fn num_simulations(&self) -> u32;
}

/// Struct for running a number of simulations for a specific strategy.
/// A `BlackjackSimulator` owns a table with the strategy seated at its first position, plays a
/// fixed number of rounds per simulation and restores every bankroll between simulations.
pub struct BlackjackSimulator {
    label: String,
    game: GamePlay,
    player_starting_balance: f64,
    num_simulations: u32,
    rounds_per_simulation: u32,
    accumulated: SimulationSummary,
    silent: bool,
}

impl BlackjackSimulator {
    /// Seats `policy` at a fresh table built from `config`. `index` offsets the configured seed so
    /// that simulators running side by side never deal the same shoe.
    pub fn new<S: Into<String>>(
        label: S,
        policy: Box<dyn DecisionPolicy + Send>,
        config: &BlackjackSimulatorConfig,
        index: usize,
    ) -> Result<BlackjackSimulator, SimulationError> {
        let label = label.into();
        let mut table_config = config.table.clone();
        table_config.seed = table_config
            .seed
            .map(|seed| seed.wrapping_add(index as u64));

        let mut table = Table::new(table_config)?;
        table.seat_player(label.clone(), 0, config.player_starting_balance, policy)?;
        let mut game = GamePlay::new(table);
        if !config.silent {
            game = game.with_announcer(Box::new(LogAnnouncer));
        }

        Ok(BlackjackSimulator {
            accumulated: SimulationSummary::new(label.clone()),
            label,
            game,
            player_starting_balance: config.player_starting_balance,
            num_simulations: config.num_simulations,
            rounds_per_simulation: config.rounds_per_simulation,
            silent: config.silent,
        })
    }

    pub fn game(&self) -> &GamePlay {
        &self.game
    }

    /// The simulated player's bankroll, whether still seated or not.
    pub fn player_balance(&self) -> f64 {
        let table = self.game.table();
        table
            .players()
            .iter()
            .chain(table.departed().iter())
            .map(|p| p.balance())
            .sum()
    }
}

impl BlackjackSimulation for BlackjackSimulator {
    fn label(&self) -> String {
        self.label.clone()
    }

    /// Method that will run every simulation, recording the necessary data.
    fn run(&mut self) -> Result<(), SimulationError> {
        for _ in 0..self.num_simulations {
            self.run_single_simulation()?;
            // Reset balances for next simulation
            self.reset();
        }
        Ok(())
    }

    fn run_single_simulation(&mut self) -> Result<SimulationSummary, SimulationError> {
        let played = self.game.play_rounds(self.rounds_per_simulation)?;
        let summary = SimulationSummary {
            label: self.label.clone(),
            simulations: 1,
            early_endings: u32::from(played < self.rounds_per_simulation),
            stats: self.game.take_stats(),
        };
        self.accumulated.merge(&summary);
        if !self.silent {
            log::info!(
                "{}: simulation #{} finished after {} rounds with ${:.2}",
                self.label,
                self.accumulated.simulations,
                played,
                self.player_balance()
            );
        }
        Ok(summary)
    }

    /// Method that will display the accumulated data recorded from running all simulations.
    fn display_stats(&self) {
        const WIDTH: usize = 80;
        println!("{}", "-".repeat(WIDTH));
        println!(
            "{:-^WIDTH$}",
            format!("running {} simulations", self.num_simulations)
        );
        println!("{}", self.accumulated);
        println!("{}", "-".repeat(WIDTH));
    }

    /// Method for resetting the state of the simulation, so it can be run again.
    fn reset(&mut self) {
        self.game
            .table_mut()
            .reset_balances(self.player_starting_balance);
    }

    fn summary(&self) -> SimulationSummary {
        self.accumulated.clone()
    }

    fn num_simulations(&self) -> u32 {
        self.num_simulations
    }
}

/// This struct is for testing multiple strategies at once under one configuration. Each strategy
/// runs on its own table in its own thread.
pub struct MulStrategyBlackjackSimulator {
    simulations: Vec<Box<dyn BlackjackSimulation>>,
    pub config: BlackjackSimulatorConfig,
}

impl MulStrategyBlackjackSimulator {
    /// Method that returns a new `MulStrategyBlackjackSimulatorBuilder` object.
    pub fn new(config: BlackjackSimulatorConfig) -> MulStrategyBlackjackSimulatorBuilder {
        MulStrategyBlackjackSimulatorBuilder {
            strategies: Vec::new(),
            config,
        }
    }

    pub fn simulations(&self) -> &[Box<dyn BlackjackSimulation>] {
        &self.simulations
    }

    /// A method for adding a simulation of `policy` to the simulator, configured with `self.config`.
    pub fn add_simulation<S: Into<String>>(
        &mut self,
        label: S,
        policy: Box<dyn DecisionPolicy + Send>,
    ) -> Result<(), SimulationError> {
        let index = self.simulations.len();
        let simulation = BlackjackSimulator::new(label, policy, &self.config, index)?;
        self.simulations.push(Box::new(simulation));
        Ok(())
    }

    /// Runs every strategy and writes the formatted summaries to `file_out`.
    pub fn run(&mut self, file_out: Box<dyn Write + Send + 'static>) -> Result<(), SimulationError> {
        self.run_with(move |receiver, ids| write::write_summaries(receiver, ids, file_out))
    }

    /// Runs every strategy and writes the summaries to `file_out` as JSON.
    pub fn run_json(
        &mut self,
        file_out: Box<dyn Write + Send + 'static>,
    ) -> Result<(), SimulationError> {
        self.run_with(move |receiver, ids| write::write_summaries_json(receiver, ids, file_out))
    }

    /// The method that will run each of the strategies in a configured simulation. Each strategy
    /// gets tested in a new thread, and the summary of every simulation is sent to `collect`,
    /// which runs on its own thread and decides what to do with them. Simulations that finish
    /// without error are kept, so the simulator can be run again.
    pub fn run_with<F, T>(&mut self, collect: F) -> Result<T, SimulationError>
    where
        F: FnOnce(Receiver<SummaryMessage>, HashSet<usize>) -> Result<T, SimulationError>
            + Send
            + 'static,
        T: Send + 'static,
    {
        // Open channel
        let (write_sender, write_receiver) = mpsc::channel::<SummaryMessage>();

        // Create unique id's for each simulation, that way the writing thread knows when one simulation is done
        let ids: HashSet<usize> = (1..=self.simulations.len()).collect();
        let write_handle = thread::spawn(move || collect(write_receiver, ids));

        let mut handles = vec![];
        for (i, mut simulation) in self.simulations.drain(..).enumerate() {
            let id = i + 1;
            let sender = write_sender.clone();
            let handle = thread::spawn(move || {
                for _ in 0..simulation.num_simulations() {
                    let summary = simulation.run_single_simulation()?;
                    sender
                        .send((Some(summary), id))
                        .map_err(|e| SimulationError::SendingError(e.to_string()))?;
                    simulation.reset();
                }
                // Tell the writing thread we are finished with this simulation
                sender
                    .send((None, id))
                    .map_err(|e| SimulationError::SendingError(e.to_string()))?;
                Ok::<_, SimulationError>(simulation)
            });
            handles.push((id, handle));
        }
        // Only the simulation threads hold senders from here on
        drop(write_sender);

        let mut first_error = None;
        for (id, handle) in handles {
            match handle.join() {
                Ok(Ok(simulation)) => self.simulations.push(simulation),
                Ok(Err(e)) => {
                    log::error!("error occurred for simulation #{id}: {e}");
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    log::error!("simulation #{id} panicked");
                    first_error.get_or_insert(SimulationError::ThreadPanicked(id));
                }
            }
        }

        // Make sure write_handle has finished as well
        let written = match write_handle.join() {
            Ok(result) => result,
            Err(_) => Err(SimulationError::ThreadPanicked(0)),
        };
        match first_error {
            Some(e) => Err(e),
            None => written,
        }
    }
}

/// Struct for building a `MulStrategyBlackjackSimulator` object
pub struct MulStrategyBlackjackSimulatorBuilder {
    strategies: Vec<(String, Box<dyn DecisionPolicy + Send>)>,
    config: BlackjackSimulatorConfig,
}

impl MulStrategyBlackjackSimulatorBuilder {
    /// Method for adding a new simulation, the rest of the configuration for the simulation is
    /// taken from the `BlackjackSimulatorConfig` passed during object creation.
    pub fn simulation<S: Into<String>>(
        &mut self,
        label: S,
        policy: Box<dyn DecisionPolicy + Send>,
    ) -> &mut Self {
        self.strategies.push((label.into(), policy));
        self
    }

    /// Method that builds a `MulStrategyBlackjackSimulator` object, failing if the table
    /// configuration is invalid.
    pub fn build(&mut self) -> Result<MulStrategyBlackjackSimulator, SimulationError> {
        let mut simulator = MulStrategyBlackjackSimulator {
            simulations: Vec::with_capacity(self.strategies.len()),
            config: self.config.clone(),
        };
        for (label, policy) in self.strategies.drain(..) {
            simulator.add_simulation(label, policy)?;
        }
        Ok(simulator)
    }
}

/// Struct for configuring a single `BlackjackSimulator` object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackjackSimulatorConfig {
    pub player_starting_balance: f64,
    pub num_simulations: u32,
    pub rounds_per_simulation: u32,
    pub silent: bool,
    pub table: TableConfig,
}

impl BlackjackSimulatorConfig {
    /// Associated method for returning a new `BlackjackSimulatorConfigBuilder` object. Allows the
    /// user to choose the parameters of the simulation such as the player's starting balance, the
    /// number of simulations run, and the rules of the table.
    pub fn new() -> BlackjackSimulatorConfigBuilder {
        BlackjackSimulatorConfigBuilder {
            player_starting_balance: None,
            num_simulations: None,
            rounds_per_simulation: None,
            silent: None,
            table: BlackjackSimulatorConfigBuilder::default_table(),
        }
    }
}

impl Default for BlackjackSimulatorConfig {
    /// Returns the standard configurations for a game of blackjack.
    fn default() -> Self {
        BlackjackSimulatorConfig::new().build()
    }
}

/// Struct to implement builder pattern for `BlackjackSimulatorConfig`
#[derive(Debug, Clone)]
pub struct BlackjackSimulatorConfigBuilder {
    player_starting_balance: Option<f64>,
    num_simulations: Option<u32>,
    rounds_per_simulation: Option<u32>,
    silent: Option<bool>,
    table: TableConfig,
}

impl BlackjackSimulatorConfigBuilder {
    /// Automated strategies answer every question again after a rejection, so a bounded retry
    /// limit turns a strategy bug into an error instead of a hang.
    pub const DEFAULT_RETRY_LIMIT: u32 = 10;

    fn default_table() -> TableConfig {
        TableConfig {
            decision_retry_limit: Some(BlackjackSimulatorConfigBuilder::DEFAULT_RETRY_LIMIT),
            ..TableConfig::default()
        }
    }

    /// Method for changing the starting balance of the player.
    pub fn player_starting_balance(&mut self, balance: f64) -> &mut Self {
        self.player_starting_balance = Some(balance);
        self
    }

    /// Method for setting the number of simulations run.
    pub fn num_simulations(&mut self, n: u32) -> &mut Self {
        self.num_simulations = Some(n);
        self
    }

    /// Method for setting the maximum number of rounds that will be played for each simulation
    pub fn rounds_per_simulation(&mut self, rounds: u32) -> &mut Self {
        self.rounds_per_simulation = Some(rounds);
        self
    }

    /// Method for setting a boolean flag, if set to false every round and simulation is logged.
    pub fn silent(&mut self, silent: bool) -> &mut Self {
        self.silent = Some(silent);
        self
    }

    /// Replaces every table rule at once, typically with a `TableConfig` loaded from JSON.
    pub fn table(&mut self, table: TableConfig) -> &mut Self {
        self.table = table;
        self
    }

    /// Method for choosing the number of decks used in the game
    pub fn num_decks(&mut self, decks: usize) -> &mut Self {
        self.table.num_decks = decks;
        self
    }

    /// Method for setting the number of riffle passes when shuffling is needed during the simulation
    pub fn num_shuffles(&mut self, shuffles: u32) -> &mut Self {
        self.table.shuffle_passes = shuffles;
        self
    }

    pub fn min_bet(&mut self, bet: f64) -> &mut Self {
        self.table.min_bet = bet;
        self
    }

    pub fn max_bet(&mut self, bet: f64) -> &mut Self {
        self.table.max_bet = bet;
        self
    }

    /// Method for setting a flag that determines if the game allows surrender or not
    pub fn surrender(&mut self, surrender: bool) -> &mut Self {
        self.table.surrender = surrender;
        self
    }

    /// Method for setting the flag that determines if the dealer must hit soft seventeens, default is false
    pub fn soft_seventeen(&mut self, seventeen: bool) -> &mut Self {
        self.table.dealer_hits_soft_17 = seventeen;
        self
    }

    /// Method for setting the flag that determines if insurance is offered when the dealer shows an ace.
    pub fn insurance(&mut self, insurance: bool) -> &mut Self {
        self.table.insurance = insurance;
        self
    }

    /// Seeds every table so a run can be reproduced.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.table.seed = Some(seed);
        self
    }

    /// Method for building a `BlackjackSimulatorConfig` object from the given builder.
    pub fn build(&mut self) -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig {
            player_starting_balance: self.player_starting_balance.unwrap_or(500.0),
            num_simulations: self.num_simulations.unwrap_or(100),
            rounds_per_simulation: self.rounds_per_simulation.unwrap_or(50),
            silent: self.silent.unwrap_or(true),
            table: self.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_lib::{ScriptedPolicy, Stay};
    use std::collections::BTreeMap;
    use crate::strategy::{BasicStrategy, FlatBetting, MarginBettingStrategy, PlayerStrategy};

    fn config(seed: u64) -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig::new()
            .num_simulations(4)
            .rounds_per_simulation(40)
            .num_decks(2)
            .seed(seed)
            .build()
    }

    fn basic_flat() -> Box<dyn DecisionPolicy + Send> {
        Box::new(PlayerStrategy::new(BasicStrategy::new(), FlatBetting::default()))
    }

    #[test]
    fn builder_defaults() {
        let config = BlackjackSimulatorConfig::default();
        assert_eq!(config.player_starting_balance, 500.0);
        assert_eq!(config.num_simulations, 100);
        assert_eq!(config.rounds_per_simulation, 50);
        assert!(config.silent);
        assert_eq!(config.table.num_decks, 6);
        assert_eq!(
            config.table.decision_retry_limit,
            Some(BlackjackSimulatorConfigBuilder::DEFAULT_RETRY_LIMIT)
        );
    }

    #[test]
    fn single_simulation_keeps_the_books_balanced() {
        let config = config(11);
        let mut simulator = BlackjackSimulator::new("basic", basic_flat(), &config, 0).unwrap();
        let house = config.table.house_balance;

        for _ in 0..config.num_simulations {
            let summary = simulator.run_single_simulation().unwrap();
            let table = simulator.game().table();
            assert!((table.total_money() - (house + 500.0)).abs() < 1e-6);
            assert!((simulator.player_balance() - 500.0 - summary.stats.winnings).abs() < 1e-6);
            assert!(summary.stats.rounds <= 40);
            assert!(summary.stats.hands >= summary.stats.rounds);
            simulator.reset();
            assert_eq!(simulator.player_balance(), 500.0);
        }

        let total = simulator.summary();
        assert_eq!(total.simulations, 4);
        assert!(total.stats.rounds > 0);
        assert_eq!(
            total.stats.hands,
            total.stats.wins + total.stats.pushes + total.stats.losses
        );
    }

    #[test]
    fn leaving_early_is_counted() {
        let config = BlackjackSimulatorConfig::new()
            .num_simulations(3)
            .rounds_per_simulation(500)
            .seed(3)
            .build();
        let policy = ScriptedPolicy::new().stays([
            Stay::Stay,
            Stay::Leave,
            Stay::Stay,
            Stay::Leave,
            Stay::Stay,
            Stay::Leave,
        ]);
        let mut simulator = BlackjackSimulator::new("quitter", Box::new(policy), &config, 0).unwrap();
        simulator.run().unwrap();
        let summary = simulator.summary();
        assert_eq!(summary.early_endings, 3);
        assert_eq!(summary.stats.rounds, 3);
        assert_eq!(simulator.player_balance(), 500.0);
    }

    #[test]
    fn invalid_table_is_rejected() {
        let config = BlackjackSimulatorConfig::new().min_bet(0.0).build();
        assert!(BlackjackSimulator::new("bad", basic_flat(), &config, 0).is_err());
        assert!(MulStrategyBlackjackSimulator::new(config)
            .simulation("bad", basic_flat())
            .build()
            .is_err());
    }

    #[test]
    fn run_multiple_strategies() {
        let mut simulator = MulStrategyBlackjackSimulator::new(config(5))
            .simulation("basic / flat", basic_flat())
            .simulation(
                "basic / margin",
                Box::new(PlayerStrategy::new(
                    BasicStrategy::new(),
                    MarginBettingStrategy::new(3.0),
                )),
            )
            .build()
            .unwrap();

        let summaries: BTreeMap<usize, SimulationSummary> =
            simulator.run_with(write::collect_summaries).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[&1].label, "basic / flat");
        assert_eq!(summaries[&2].label, "basic / margin");
        assert!(summaries.values().all(|s| s.simulations == 4));

        // every simulation comes back and can run again
        assert_eq!(simulator.simulations().len(), 2);
        let rerun = simulator.run_with(write::collect_summaries).unwrap();
        assert!(rerun
            .values()
            .all(|s| s.to_string().contains("number of early endings")));
    }

    #[test]
    fn empty_simulator_finishes() {
        let mut simulator = MulStrategyBlackjackSimulator::new(config(1)).build().unwrap();
        let summaries = simulator.run_with(write::collect_summaries).unwrap();
        assert!(summaries.is_empty());
    }
}
