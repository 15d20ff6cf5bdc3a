// trickle/examples/sequence_stop.rs

use tracing::{error, info};
use trickle::{Controller, Factory, TrickleError};

#[tokio::main]
async fn main() -> Result<(), TrickleError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Sequence Stop Example ---");

  let controller: Controller<Vec<String>> = Factory::new().empty()?;

  controller
    .push(|drip, mut log: Vec<String>| {
      let msg = "Step One Executed.".to_string();
      info!("{}", msg);
      log.push(msg);
      drip.advance(log);
      Ok(())
    })?
    .push(|drip, mut log| {
      let msg = "Step Two Executed - Issuing STOP.".to_string();
      info!("{}", msg);
      log.push(msg);
      drip.stop(log); // Discards everything still queued
      Ok(())
    })?
    .push(|drip, mut log| {
      // This step should not be reached
      let msg = "Step Three Executed (SHOULD NOT HAPPEN).".to_string();
      error!("{}", msg);
      log.push(msg);
      drip.advance(log);
      Ok(())
    })?;

  info!("Starting sequence (expecting stop)...");
  let log = controller.await?;

  info!("Execution Log:");
  for entry in &log {
    info!("- {}", entry);
  }
  assert_eq!(log.len(), 2, "Incorrect number of steps executed.");
  assert!(
    !log.iter().any(|s| s.contains("Step Three")),
    "Step after stop was unexpectedly executed."
  );

  Ok(())
}
