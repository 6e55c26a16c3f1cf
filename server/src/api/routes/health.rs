//! Liveness endpoint (spec §6: "GET /ping returns literal pong").

pub async fn ping() -> &'static str {
    "pong"
}
