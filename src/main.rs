#[tokio::main]
async fn main() {
    if let Err(e) = voicenote::app::run().await {
        tracing::error!("Fatal error: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
