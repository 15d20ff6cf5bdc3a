// trickle/examples/basic_sequence.rs

use std::time::Duration;
use tracing::info;
use trickle::{Controller, Factory, Step, TrickleError};

// 1. Define the payload passed between steps
#[derive(Clone, Debug, Default)]
struct Tally {
  message_log: Vec<String>,
  counter: i32,
}

#[tokio::main]
async fn main() -> Result<(), TrickleError> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Sequence Example ---");

  // 2. Create a controller with its first step. The first advance is deferred
  //    to the runtime, so more steps can still be pushed below.
  let controller: Controller<Tally> = Factory::new().create_seeded(
    Tally {
      message_log: Vec::new(),
      counter: 5, // Start counter at 5
    },
    vec![Step::new(|drip, mut tally: Tally| {
      tally.counter += 1;
      let msg = format!("Alpha executed: counter = {}", tally.counter);
      info!("{}", msg);
      tally.message_log.push(msg);
      drip.advance(tally);
      Ok(())
    })],
  )?;

  // 3. An asynchronous step: hand the advancer to a task and return at once.
  controller.push(|drip, mut tally| {
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(10)).await;
      tally.counter *= 2;
      let msg = format!("Beta executed: counter = {}", tally.counter);
      info!("{}", msg);
      tally.message_log.push(msg);
      drip.advance(tally);
    });
    Ok(())
  })?;

  controller.push(|drip, mut tally| {
    tally.counter -= 1;
    let msg = format!("Gamma executed: counter = {}", tally.counter);
    info!("{}", msg);
    tally.message_log.push(msg);
    drip.advance(tally);
    Ok(())
  })?;

  // 4. Await the sequence like any other future
  info!("Waiting for the sequence...");
  let final_tally = controller.await?;

  info!("Final counter value: {}", final_tally.counter);
  info!("Execution log:");
  for log_entry in &final_tally.message_log {
    info!("- {}", log_entry);
  }

  // Expected: (5+1)*2 - 1 = 11
  assert_eq!(final_tally.counter, 11);
  assert_eq!(final_tally.message_log.len(), 3);

  Ok(())
}
