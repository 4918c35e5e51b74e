//! HTTP "best move" service.
//!
//! `POST /` with a body of the form
//!
//! ```text
//! <color><board>
//! [<earlier board>]...
//! ```
//!
//! answers the text form of the chosen move (`-1` for pass). The first line is
//! the player to move (`X` or `O`) immediately followed by the board; optional
//! further lines list earlier boards, oldest first, for superko. Anything that
//! cannot be parsed is answered with a fixed error message. Every other route
//! and method answers 400.
//!
//! Each request gets a fresh rollout engine and tree, run on Tokio's blocking
//! pool.

use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use thiserror::Error;
use tracing::{info, warn};

use crate::board::{Board, BoardError, Color};
use crate::constants::SERVICE_SIMULATIONS;
use crate::mcts::{MoveSearch, SearchConfig, SearchEngine};
use crate::position::Position;

/// Answer for any request that cannot be parsed.
pub const BAD_REQUEST: &str = "Request body formatted incorrectly.";

/// Errors raised while parsing a request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("empty request")]
    Empty,
    #[error("invalid color {0:?}")]
    Color(char),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Settings of the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub simulations: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            simulations: SERVICE_SIMULATIONS,
        }
    }
}

/// Parse a request body into a match root.
pub fn parse_request(body: &str) -> Result<Position, RequestError> {
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next().ok_or(RequestError::Empty)?;

    let mut chars = first.chars();
    let symbol = chars.next().ok_or(RequestError::Empty)?;
    let color = Color::from_symbol(symbol).ok_or(RequestError::Color(symbol))?;
    let board: Board = chars.as_str().parse()?;
    let history = lines
        .map(str::parse::<Board>)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Position::new_match(color, board, history))
}

/// Search a request's position and answer the chosen move's text form.
pub fn handle_request(body: &str, simulations: u32) -> String {
    let mut root = match parse_request(body) {
        Ok(root) => root,
        Err(e) => {
            warn!(error = %e, "rejecting request");
            return BAD_REQUEST.to_string();
        }
    };

    let config = SearchConfig::default().with_simulations(simulations);
    let mut engine = SearchEngine::rollout(&config);
    let slot = engine.best_move(&mut root);
    let answer = root.move_at(slot).to_string();
    info!(color = %root.color(), answer = %answer, "answered request");
    answer
}

async fn best_move(State(config): State<ServiceConfig>, body: Bytes) -> (StatusCode, String) {
    let body = match std::str::from_utf8(&body) {
        Ok(text) => text.to_owned(),
        Err(e) => {
            warn!(error = %e, "rejecting request");
            return (StatusCode::OK, BAD_REQUEST.to_string());
        }
    };
    let simulations = config.simulations;
    match tokio::task::spawn_blocking(move || handle_request(&body, simulations)).await {
        Ok(answer) => (StatusCode::OK, answer),
        Err(e) => {
            warn!(error = %e, "search task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

async fn bad_request() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, BAD_REQUEST)
}

/// Build the service's router.
pub fn router(config: ServiceConfig) -> Router {
    Router::new()
        .route("/", post(best_move).fallback(bad_request))
        .fallback(bad_request)
        .with_state(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}

/// Serve on `addr` until Ctrl+C.
pub async fn serve(addr: SocketAddr, config: ServiceConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server on {}", addr);
    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shut down gracefully");
    Ok(())
}
