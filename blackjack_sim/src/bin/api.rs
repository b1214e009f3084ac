use actix_web::{
    body::BoxBody,
    error, get,
    http::{header::ContentType, StatusCode},
    post, web, App, HttpResponse, HttpServer,
};
use blackjack_lib::{DecisionPolicy, TableConfig};
use blackjack_sim::prelude::*;
use blackjack_sim::write;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

type AppSimulator = web::Data<Mutex<Option<MulStrategyBlackjackSimulator>>>;

/// A struct for handling the configurations of the game. Meant to be deserialized from JSON.
#[derive(Debug, Deserialize)]
struct GameConfig {
    player_starting_balance: f64,
    num_simulations: u32,
    hands_per_simulation: u32,
    #[serde(default)]
    table: Option<TableConfig>,
}

impl TryFrom<GameConfig> for BlackjackSimulatorConfig {
    type Error = UserError;

    fn try_from(value: GameConfig) -> Result<Self, Self::Error> {
        let mut builder = BlackjackSimulatorConfig::new();
        if let Some(table) = value.table {
            table
                .validate()
                .map_err(|e| UserError::BadInput(e.to_string()))?;
            builder.table(table);
        }
        Ok(builder
            .player_starting_balance(value.player_starting_balance)
            .num_simulations(value.num_simulations)
            .rounds_per_simulation(value.hands_per_simulation)
            .build())
    }
}

/// A struct for deserializing the strategy configuration from json.
#[derive(Deserialize)]
struct SimConfig {
    decision_strategy: String,
    betting_strategy: String,
    betting_margin: Option<f64>,
}

/// An enum that will handle user facing errors
#[derive(Debug, Error)]
enum UserError {
    #[error("an internal error occurred")]
    InternalError,
    #[error("{0}")]
    SimulationCreationError(String),
    #[error("unable to add simulation, a simulator has not been created")]
    SimulatorNotCreated,
    #[error("{0}")]
    BadInput(String),
}

impl error::ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::SimulationCreationError(_)
            | UserError::SimulatorNotCreated
            | UserError::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// A `SimulationSummary` with the derived percentages spelled out for the client.
#[derive(Serialize)]
struct SimulationSummaryJson {
    id: usize,
    #[serde(flatten)]
    summary: SimulationSummary,
    win_pct: f64,
    push_pct: f64,
    lose_pct: f64,
    avg_winnings_per_hand: f64,
}

impl SimulationSummaryJson {
    fn new(id: usize, summary: SimulationSummary) -> Self {
        SimulationSummaryJson {
            id,
            win_pct: summary.stats.win_percentage(),
            push_pct: summary.stats.push_percentage(),
            lose_pct: summary.stats.loss_percentage(),
            avg_winnings_per_hand: summary.stats.average_winnings_per_hand(),
            summary,
        }
    }
}

/// Helper function to create a decision strategy i.e. a `DecisionStrategy` trait object at runtime.
fn create_decision_strategy<S: AsRef<str>>(
    name: S,
) -> Result<Box<dyn DecisionStrategy + Send + 'static>, &'static str> {
    let decision_strategy: Box<dyn DecisionStrategy + Send + 'static> = match name.as_ref() {
        "Basic Strategy" => Box::new(BasicStrategy::new()),
        _ => return Err("decision strategy not recognized"),
    };

    Ok(decision_strategy)
}

/// Helper function to create a betting strategy at runtime i.e. a `BettingStrategy` trait object.
fn create_betting_strategy<S: AsRef<str>>(
    name: S,
    margin: Option<f64>,
) -> Result<Box<dyn BettingStrategy + Send + 'static>, &'static str> {
    let betting_strategy: Box<dyn BettingStrategy + Send + 'static> = match name.as_ref() {
        "Flat" => Box::new(FlatBetting::new(margin.unwrap_or(1.0))),
        "Margin" => Box::new(MarginBettingStrategy::new(margin.unwrap_or(3.0))),
        _ => return Err("betting strategy not recognized"),
    };

    Ok(betting_strategy)
}

/// Helper function to create a complete player strategy at runtime.
fn create_strategy(params: &SimConfig) -> Result<PlayerStrategyDyn, &'static str> {
    let decision_strategy = create_decision_strategy(&params.decision_strategy)?;
    let betting_strategy = create_betting_strategy(&params.betting_strategy, params.betting_margin)?;
    Ok(PlayerStrategy::new(decision_strategy, betting_strategy))
}

/// A handler that will configure, and build a new `MulStrategyBlackjackSimulator` using the given parameters the body of the request
#[post("/config-game-params")]
async fn configure_simulation_parameters(
    params: web::Json<GameConfig>,
    app_sim: AppSimulator,
) -> Result<HttpResponse, UserError> {
    let config = BlackjackSimulatorConfig::try_from(params.into_inner())?;
    let mut guard = app_sim.lock().map_err(|_| UserError::InternalError)?;
    let simulator = MulStrategyBlackjackSimulator::new(config)
        .build()
        .map_err(|e| UserError::BadInput(e.to_string()))?;
    *guard = Some(simulator);
    Ok(HttpResponse::Ok().body("simulator created successfully"))
}

/// A handler that will add a simulation to the simulator.
#[post("/add-sim")]
async fn add_simulation(
    sim_params: web::Json<SimConfig>,
    app_sim: AppSimulator,
) -> Result<HttpResponse, UserError> {
    let mut guard = app_sim.lock().map_err(|_| UserError::InternalError)?;
    let simulator = guard.as_mut().ok_or(UserError::SimulatorNotCreated)?;

    let strategy = create_strategy(&sim_params)
        .map_err(|msg| UserError::SimulationCreationError(msg.to_owned()))?;
    let label = strategy.label();
    let policy: Box<dyn DecisionPolicy + Send> = Box::new(strategy);
    simulator
        .add_simulation(label, policy)
        .map_err(|e| UserError::SimulationCreationError(e.to_string()))?;
    Ok(HttpResponse::Ok().body("simulation added successfully"))
}

/// A handler that will run the simulation given the configurations.
/// Will return an error response if the game has not been configured and/or no simulations have been added.
#[get("/run-sim")]
async fn run_simulation(app_sim: AppSimulator) -> Result<HttpResponse, UserError> {
    let mut guard = app_sim.lock().map_err(|_| UserError::InternalError)?;
    let simulator = guard.as_mut().ok_or(UserError::SimulatorNotCreated)?;
    if simulator.simulations().is_empty() {
        return Err(UserError::BadInput(String::from(
            "no simulations have been added, unable to run.",
        )));
    }

    let summaries = simulator.run_with(write::collect_summaries).map_err(|e| {
        log::error!("simulation run failed: {e}");
        UserError::InternalError
    })?;
    let body: Vec<SimulationSummaryJson> = summaries
        .into_iter()
        .map(|(id, summary)| SimulationSummaryJson::new(id, summary))
        .collect();
    let json = serde_json::to_string(&body).map_err(|_| UserError::InternalError)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(json))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = blackjack_sim::log(1) {
        eprintln!("unable to initialise logging: {e}");
    }
    let address = "127.0.0.1";
    let port = 8080;
    log::info!("listening at {}:{}...", address, port);

    let app_sim: AppSimulator = web::Data::new(Mutex::new(None));

    HttpServer::new(move || {
        App::new()
            .app_data(app_sim.clone())
            .service(configure_simulation_parameters)
            .service(add_simulation)
            .service(run_simulation)
    })
    .bind((address, port))?
    .run()
    .await
}
