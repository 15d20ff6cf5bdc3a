// tests/fan_in_tests.rs
mod common;

use common::*;
use std::time::Duration;
use trickle::{all, race, Completion, Controller, Factory, Step, TrickleError};

fn delayed(result: &'static str, delay: Duration) -> Step<&'static str> {
  Step::new(move |drip, _| {
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      drip.advance(result);
    });
    Ok(())
  })
}

fn immediate(result: &'static str) -> Step<&'static str> {
  Step::new(move |drip, _| {
    drip.advance(result);
    Ok(())
  })
}

#[tokio::test]
async fn test_all_collects_controller_results_in_order() {
  setup_tracing();
  let factory = Factory::new();
  let slow: Controller<&'static str> = factory.create(vec![delayed("result 0", Duration::from_millis(10))]).unwrap();
  let fast: Controller<&'static str> = factory.create(vec![immediate("result 1")]).unwrap();

  let results = all([&slow, &fast]).await.unwrap();
  assert_eq!(results, vec!["result 0", "result 1"]);
}

#[tokio::test]
async fn test_race_settles_with_the_first_controller() {
  setup_tracing();
  let factory = Factory::new();
  let slow: Controller<&'static str> = factory.create(vec![delayed("result 00", Duration::from_millis(20))]).unwrap();
  let fast: Controller<&'static str> = factory.create(vec![immediate("result 11")]).unwrap();

  assert_eq!(race([&slow, &fast]).await.unwrap(), "result 11");
}

#[tokio::test]
async fn test_all_rejects_with_the_first_failure() {
  setup_tracing();
  let factory = Factory::new();
  let ok: Controller<&'static str> = factory.create(vec![delayed("fine", Duration::from_millis(10))]).unwrap();
  let broken: Controller<&'static str> = factory
    .create(vec![Step::new(|_drip, _| Err(TestError::Step("broken".to_string()).into()))])
    .unwrap();

  match all([&ok, &broken]).await {
    Err(err @ TrickleError::StepFailure { .. }) => {
      assert_eq!(err.downcast_ref::<TestError>(), Some(&TestError::Step("broken".to_string())));
    }
    other => panic!("Expected StepFailure, got {:?}", other),
  }
}

#[test]
fn test_all_mixes_controllers_and_bare_completions() {
  setup_tracing();
  let (scheduler, factory) = manual_factory();
  let controller: Controller<i32> = factory.create(vec![incrementing_step()]).unwrap();
  controller.register_success(|v| Ok(v * 100));
  let bare = Completion::<i32>::new();

  let gathered = all([controller.cursor(), bare.clone(), Completion::new()]);
  scheduler.run_pending();
  bare.resolve(7);
  assert!(!gathered.is_settled(), "the third item is still pending");

  let third = Completion::<i32>::new();
  let gathered = all(vec![controller.cursor(), bare, third.clone()]);
  third.resolve(-1);
  assert_eq!(gathered.peek().unwrap().unwrap(), vec![100, 7, -1]);
}
