// src/lib.rs
//
// Job-application tracker: a client-side core (auth session, live
// application cache, statistics, theme) plus a small relay server for
// the AI features. Presentation layers sit on top of `state`; the
// relay binary lives in main.rs.

pub mod admin;
pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod state;
pub mod store;
pub mod web;

pub use config::RelayConfig;
pub use error::{AppError, Result};
pub use state::{AppState, SessionManager};
pub use web::start_relay_server;
