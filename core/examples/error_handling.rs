// trickle/examples/error_handling.rs

use tracing::{info, warn};
use trickle::{Controller, Factory, Step, TrickleError};

#[derive(Debug, thiserror::Error)]
enum PaymentError {
  #[error("card declined for order {0}")]
  Declined(u32),
}

#[tokio::main]
async fn main() -> Result<(), TrickleError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Error Handling Example ---");

  // A step that fails: the error rejects the sequence and later steps never run.
  let checkout: Controller<u32> = Factory::new().create_seeded(
    1042,
    vec![
      Step::new(|drip, order| {
        info!(order, "Reserving stock.");
        drip.advance(order);
        Ok(())
      }),
      Step::new(|_drip, order| {
        info!(order, "Charging card.");
        Err(PaymentError::Declined(order).into())
      }),
      Step::new(|drip, order| {
        warn!(order, "Shipping (SHOULD NOT HAPPEN).");
        drip.advance(order);
        Ok(())
      }),
    ],
  )?;

  // Recover on the chain cursor: the root completion stays rejected.
  checkout.register_failure(|err| {
    if let Some(PaymentError::Declined(order)) = err.downcast_ref::<PaymentError>() {
      warn!(order = *order, error = %err, "Payment failed; falling back to order 0.");
      return Ok(0);
    }
    Err(err.into())
  });

  let recovered = (&checkout).await?;
  info!(recovered, "Recovered value.");
  assert_eq!(recovered, 0);

  match checkout.completion().await {
    Err(TrickleError::StepFailure { step, reason }) => info!(step, %reason, "Root completion rejected as expected."),
    other => warn!(?other, "Unexpected root outcome."),
  }

  // A contract violation is reported synchronously, before anything runs.
  let violation = checkout.push_direct(|_order| Ok(()));
  if let Err(err) = violation {
    info!(error = %err, "Rejected a direct step on an advancer-taking controller.");
  }

  Ok(())
}
