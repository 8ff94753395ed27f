//! Standalone in-memory table store for trying the harness locally.
//!
//! ```text
//! mock_store [addr]        # default 127.0.0.1:8080
//! ```

use table_hammer::mock_server::{MockOptions, MockServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let server = MockServer::bind(&addr, MockOptions::default()).await?;
    println!("Listening on: {}", server.addr());

    tokio::signal::ctrl_c().await?;
    println!("Shutting down");
    Ok(())
}
