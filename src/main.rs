//! Artist Portfolio Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    artist_portfolio_backend::run().await
}
