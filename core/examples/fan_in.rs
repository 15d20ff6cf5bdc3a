// trickle/examples/fan_in.rs

use std::time::Duration;
use tracing::info;
use trickle::{all, race, Controller, Factory, Step, TrickleError};

fn fetch(name: &'static str, delay_ms: u64) -> Step<String> {
  Step::new(move |drip, _| {
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(delay_ms)).await;
      info!(name, delay_ms, "Fetched.");
      drip.advance(format!("{} ({}ms)", name, delay_ms));
    });
    Ok(())
  })
}

#[tokio::main]
async fn main() -> Result<(), TrickleError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Fan-in Example ---");

  let factory = Factory::new().single_use();
  let sequences: Vec<Controller<String>> = vec![
    factory.create(vec![fetch("users", 30)])?,
    factory.create(vec![fetch("orders", 10)])?,
    factory.create(vec![fetch("stock", 20)])?,
  ];

  let everything = all(&sequences).await?;
  info!(?everything, "All sequences finished (in registration order).");

  let first = race(vec![
    factory.create(vec![fetch("primary", 25)])?,
    factory.create(vec![fetch("replica", 5)])?,
  ])
  .await?;
  info!(%first, "Race winner.");
  assert!(first.starts_with("replica"));

  Ok(())
}
