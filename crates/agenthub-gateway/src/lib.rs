//! HTTP boundary of the hub: mission registration, execution control,
//! agent result callbacks, and history/stats read paths, served by
//! axum.

mod error;
mod export;
mod middleware;
mod routes;
mod server;
mod state;

pub use server::{router, HubServer};
pub use state::AppState;
