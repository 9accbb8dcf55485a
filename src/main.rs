#[tokio::main]
async fn main() {
    if let Err(error) = game_client::run_with_config().await {
        tracing::error!(%error, "client exited with error");
        std::process::exit(1);
    }
}
