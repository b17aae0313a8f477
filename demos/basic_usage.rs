//! Basic usage example: feature flags loaded from a JSON file and refreshed in the background.

use refresh_kit::{
    error::Result, map::BytesReaderExt, observability::CollectingReporter, FileReader,
    Refreshable, SourceReaderExt,
};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Example flags document
#[derive(Clone, Debug, Deserialize)]
struct Flags {
    new_checkout: bool,
    max_cart_items: u32,
}

/// Domain view derived from the raw flags
#[allow(dead_code)]
#[derive(Clone, Debug)]
struct CheckoutSettings {
    enabled: bool,
    cart_limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Refresh Kit - Basic Example ===\n");

    // 1. Write an initial flags file
    println!("1. Writing initial flags file...");
    let path = std::env::temp_dir().join("refresh-kit-demo-flags.json");
    write_flags(&path, r#"{"new_checkout": false, "max_cart_items": 10}"#);
    println!("   ✓ {}\n", path.display());

    // 2. Build the pipeline: file bytes -> JSON -> domain settings
    println!("2. Loading settings (initial load must succeed)...");
    let source = FileReader::new(&path)
        .json::<Flags>()
        .map(|flags: Flags| {
            Ok(CheckoutSettings {
                enabled: flags.new_checkout,
                cart_limit: flags.max_cart_items as usize,
            })
        });

    let ctx = CancellationToken::new();
    let reporter = CollectingReporter::new();
    let settings = Refreshable::<CheckoutSettings>::builder(source)
        .with_interval(Duration::from_millis(200))
        .with_reporter(reporter.clone())
        .build(&ctx)
        .await?;
    println!("   ✓ Settings loaded: {:?}\n", settings.value());

    // 3. Update the file and wait for a refresh
    println!("3. Enabling new checkout...");
    write_flags(&path, r#"{"new_checkout": true, "max_cart_items": 25}"#);
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("   ✓ Settings refreshed: {:?}\n", settings.value());

    // 4. Corrupt the file: the last good value is kept
    println!("4. Writing a broken flags file...");
    write_flags(&path, r#"{"new_checkout": tru"#);
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("   ✓ Still serving: {:?}", settings.value());
    for message in reporter.messages() {
        println!("   ! reported: {}", message);
    }
    println!();

    // 5. Stop refreshing
    println!("5. Cancelling background refresh...");
    ctx.cancel();
    let _ = std::fs::remove_file(&path);
    println!("   ✓ Done\n");

    println!("=== Example Complete ===\n");

    Ok(())
}

fn write_flags(path: &std::path::Path, body: &str) {
    if let Err(e) = std::fs::write(path, body) {
        eprintln!("failed to write {}: {}", path.display(), e);
    }
}
