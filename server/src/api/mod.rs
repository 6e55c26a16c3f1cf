//! Admission API (C9): validates URL batches, mints scrape tasks, and
//! exposes queue telemetry over HTTP (spec §4.9).

mod auth;
mod middleware;
mod routes;
mod server;

pub use server::ApiServer;
