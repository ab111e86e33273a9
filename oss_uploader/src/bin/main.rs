use anyhow::Result;
use clap::Parser;
use oss_uploader::app::UploaderApp;

#[tokio::main]
async fn main() -> Result<()> {
    let app = UploaderApp::parse();

    // Per-file failures are reported on the console; only configuration errors end the run early.
    app.run().await?;

    Ok(())
}
