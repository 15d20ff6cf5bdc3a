// trickle/examples/manual_direct.rs

//! Direct-invocation steps driven by a captured controller, started manually.

use std::sync::Arc;
use tracing::info;
use trickle::{Controller, Factory, ManualScheduler, Mode, TrickleError};

fn main() -> Result<(), TrickleError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Manual Start + Direct Mode Example ---");

  let scheduler = Arc::new(ManualScheduler::new());
  let factory = Factory::with_scheduler(scheduler.clone()).with_mode(Mode::DIRECT | Mode::MANUAL_START);
  let controller: Controller<(String, usize)> = factory.empty()?;

  // Direct steps receive only their payload; they capture the controller to advance it.
  let next = controller.clone();
  controller.push_direct(move |(text, count)| {
    info!(%text, count, "Splitting words.");
    let words = text.split_whitespace().count();
    next.advance((text, words));
    Ok(())
  })?;

  let next = controller.clone();
  controller.push_direct(move |(text, words)| {
    info!(words, "Checking length.");
    if words > 3 {
      // Skip the padding step below.
      next.skip_with(1, (text.to_uppercase(), words));
    } else {
      next.advance((text, words));
    }
    Ok(())
  })?;

  let next = controller.clone();
  controller.push_direct(move |(text, words)| {
    next.advance((format!("{} ...", text), words));
    Ok(())
  })?;

  info!(state = ?controller.state(), "Controller is idle until advanced.");
  controller.advance(("a quick brown fox jumps".to_string(), 0));
  assert_eq!(scheduler.pending(), 0);

  let (text, words) = controller
    .completion()
    .peek()
    .expect("every step advanced synchronously")?;
  info!(%text, words, "Finished.");
  assert_eq!(text, "A QUICK BROWN FOX JUMPS");
  assert_eq!(words, 5);
  Ok(())
}
