//! # Chat API
//! 
//! HTTP handlers, DTOs, and the router for the chat orchestrator.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
