mod api;
mod app;
mod broker;
mod core;
mod domain;
mod rag;
mod scrape;
mod utils;
mod worker;

use app::App;

#[tokio::main]
async fn main() {
    if let Err(e) = App::run().await {
        eprintln!("\nError: {e}\n");
        std::process::exit(1);
    }
}
