use anyhow::Result;

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    deepsearch_bridge::run().await
}
