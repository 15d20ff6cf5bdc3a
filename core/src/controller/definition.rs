// trickle/src/controller/definition.rs

//! Contains the `Controller<T>` struct definition, its construction, step
//! registration, continuation registration and read accessors.

use crate::completion::{AsCompletion, Completion, CompletionState};
use crate::core::control::ControllerState;
use crate::core::mode::Mode;
use crate::core::queue::StepQueue;
use crate::core::step::{Step, StepResult};
use crate::error::{TrickleError, TrickleResult};
use crate::scheduler::Schedule;
use crate::controller::advancer::Advancer;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Mutable per-controller bookkeeping, guarded by one lock.
pub(crate) struct SequenceState<T> {
  pub(crate) queue: StepQueue<T>,
  /// The payload the most recent step was invoked with.
  pub(crate) payload: Option<T>,
  pub(crate) started: bool,
  /// Number of steps invoked so far.
  pub(crate) invocations: usize,
  /// Steps of this controller currently on the call stack.
  pub(crate) depth: usize,
  /// Payloads of advances that arrived past the inline nesting limit, in
  /// arrival order. Drained by the invocation at the limit once its step returns.
  pub(crate) deferred: VecDeque<T>,
}

pub(crate) struct Shared<T> {
  pub(crate) mode: Mode,
  pub(crate) state: Mutex<SequenceState<T>>,
  /// Root completion. Never replaced.
  pub(crate) completion: Completion<T>,
  /// Attachment point for the next `register_success` / `register_failure`.
  pub(crate) cursor: Mutex<Completion<T>>,
}

/// A sequential step-execution controller.
///
/// Steps are queued in order and invoked one at a time. Each step passes
/// control forward explicitly through an [`Advancer`] (or, in direct mode,
/// through a captured clone of the controller), and the controller settles its
/// [`Completion`] when the queue runs dry, a step stops the sequence, or a
/// step fails.
///
/// `Controller<T>` is a cheap handle; clones drive the same sequence.
pub struct Controller<T> {
  pub(crate) shared: Arc<Shared<T>>,
}

impl<T> Clone for Controller<T> {
  fn clone(&self) -> Self {
    Controller {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<T> Controller<T>
where
  T: Clone + Send + 'static,
{
  /// Creates a controller seeded with `T::default()`.
  ///
  /// Unless `mode` selects manual start, the first advance is handed to
  /// `scheduler`, so steps may still be appended until that task runs.
  pub fn create<I>(mode: Mode, scheduler: Arc<dyn Schedule>, steps: I) -> TrickleResult<Self>
  where
    T: Default,
    I: IntoIterator<Item = Step<T>>,
  {
    Self::create_seeded(mode, scheduler, T::default(), steps)
  }

  /// Creates a controller whose deferred first advance carries `seed`.
  ///
  /// In manual-start mode `seed` is unused; the caller supplies the first
  /// payload through [`advance`](Self::advance).
  #[instrument(
    name = "Controller::create",
    skip_all,
    fields(
      payload_type = %std::any::type_name::<T>(),
      mode = %mode,
    ),
    err(Display)
  )]
  pub fn create_seeded<I>(mode: Mode, scheduler: Arc<dyn Schedule>, seed: T, steps: I) -> TrickleResult<Self>
  where
    I: IntoIterator<Item = Step<T>>,
  {
    let controller = Self::unstarted(mode);
    if mode.is_direct() && mode.is_single_use() {
      event!(Level::DEBUG, "Direct steps are handed no advancer; the single-use flag has no effect.");
    }
    controller.append(steps)?;

    if mode.is_manual_start() {
      event!(Level::DEBUG, "Controller created idle; waiting for a manual advance.");
      return Ok(controller);
    }

    controller.shared.state.lock().started = true;
    let deferred = controller.clone();
    scheduler
      .schedule(Box::new(move || deferred.advance(seed)))
      .inspect_err(|e| event!(Level::ERROR, error = %e, "Could not schedule the first advance."))?;
    event!(Level::DEBUG, "Controller created; first advance scheduled.");
    Ok(controller)
  }

  pub(crate) fn unstarted(mode: Mode) -> Self {
    let completion = Completion::new();
    Controller {
      shared: Arc::new(Shared {
        mode,
        state: Mutex::new(SequenceState {
          queue: StepQueue::new(),
          payload: None,
          started: false,
          invocations: 0,
          depth: 0,
          deferred: VecDeque::new(),
        }),
        cursor: Mutex::new(completion.clone()),
        completion,
      }),
    }
  }

  // --- Step registration ---

  /// Appends steps to the back of the queue, in iteration order.
  ///
  /// Every step must use the calling convention of the controller's mode:
  /// [`Step::direct`] in direct mode, [`Step::new`] otherwise. A mismatch is a
  /// `ContractViolation`, returned before anything is queued.
  ///
  /// Steps appended after the controller has settled are discarded.
  pub fn append<I>(&self, steps: I) -> TrickleResult<&Self>
  where
    I: IntoIterator<Item = Step<T>>,
  {
    let steps: Vec<Step<T>> = steps.into_iter().collect();
    for (position, step) in steps.iter().enumerate() {
      self.ensure_invocable(position, step)?;
    }

    let mut state = self.shared.state.lock();
    if self.shared.completion.is_settled() {
      event!(
        Level::WARN,
        discarded = steps.len(),
        "Steps appended after the sequence settled; they will never run."
      );
      return Ok(self);
    }
    for step in steps {
      state.queue.push_back(step);
    }
    event!(Level::TRACE, pending = state.queue.len(), "Steps appended.");
    Ok(self)
  }

  /// Appends one advancer-taking step: `|advancer, payload| { ...; Ok(()) }`.
  pub fn push<F>(&self, step: F) -> TrickleResult<&Self>
  where
    F: FnOnce(Advancer<T>, T) -> StepResult + Send + 'static,
  {
    self.append(std::iter::once(Step::new(step)))
  }

  /// Appends one direct step: `|payload| { ...; Ok(()) }`.
  pub fn push_direct<F>(&self, step: F) -> TrickleResult<&Self>
  where
    F: FnOnce(T) -> StepResult + Send + 'static,
  {
    self.append(std::iter::once(Step::direct(step)))
  }

  fn ensure_invocable(&self, position: usize, step: &Step<T>) -> TrickleResult<()> {
    let mode = self.shared.mode;
    if step.is_direct() != mode.is_direct() {
      event!(Level::ERROR, position, convention = step.convention(), %mode, "Rejected step with the wrong calling convention.");
      return Err(TrickleError::contract_violation(format!(
        "step at position {} uses the {} calling convention, which a controller in '{}' mode cannot invoke",
        position,
        step.convention(),
        mode
      )));
    }
    Ok(())
  }

  // --- Continuation registration (chain cursor) ---

  /// Runs `handler` after the current cursor fulfills and moves the cursor to
  /// the derived completion.
  pub fn register_success<F>(&self, handler: F) -> &Self
  where
    F: FnOnce(T) -> anyhow::Result<T> + Send + 'static,
  {
    // The handler may run inline if the cursor already settled, so the cursor
    // lock is not held while deriving.
    let current = self.shared.cursor.lock().clone();
    let derived = current.then(handler);
    *self.shared.cursor.lock() = derived;
    self
  }

  /// Runs `handler` if anything up to the current cursor rejects and moves
  /// the cursor to the derived completion.
  pub fn register_failure<F>(&self, handler: F) -> &Self
  where
    F: FnOnce(TrickleError) -> anyhow::Result<T> + Send + 'static,
  {
    let current = self.shared.cursor.lock().clone();
    let derived = current.catch(handler);
    *self.shared.cursor.lock() = derived;
    self
  }

  // --- Accessors ---

  pub fn mode(&self) -> Mode {
    self.shared.mode
  }

  /// The payload the most recently invoked step received.
  pub fn payload(&self) -> Option<T> {
    self.shared.state.lock().payload.clone()
  }

  /// The root completion.
  pub fn completion(&self) -> Completion<T> {
    self.shared.completion.clone()
  }

  /// The chain cursor: the completion derived by the latest registration, or
  /// the root if none was made.
  pub fn cursor(&self) -> Completion<T> {
    self.shared.cursor.lock().clone()
  }

  /// An unguarded advancer for this controller. Direct-mode steps capture one
  /// of these (or a controller clone) to pass control forward.
  ///
  /// The advancer returned here is never single-use, whatever the mode says:
  /// a controller in `DIRECT | SINGLE_USE` mode behaves exactly like a
  /// `DIRECT` one.
  pub fn advancer(&self) -> Advancer<T> {
    Advancer::reusable(self.clone())
  }

  pub fn pending_steps(&self) -> usize {
    self.shared.state.lock().queue.len()
  }

  /// Number of steps invoked so far.
  pub fn invocations(&self) -> usize {
    self.shared.state.lock().invocations
  }

  pub fn state(&self) -> ControllerState {
    match self.shared.completion.state() {
      CompletionState::Fulfilled => ControllerState::Fulfilled,
      CompletionState::Rejected => ControllerState::Rejected,
      CompletionState::Pending if self.shared.state.lock().started => ControllerState::Advancing,
      CompletionState::Pending => ControllerState::Idle,
    }
  }
}

impl<T> AsCompletion<T> for Controller<T>
where
  T: Clone + Send + 'static,
{
  fn as_completion(&self) -> Completion<T> {
    self.cursor()
  }
}

impl<T> IntoFuture for Controller<T>
where
  T: Clone + Send + 'static,
{
  type Output = TrickleResult<T>;
  type IntoFuture = Completion<T>;

  fn into_future(self) -> Self::IntoFuture {
    self.cursor()
  }
}

impl<T> IntoFuture for &Controller<T>
where
  T: Clone + Send + 'static,
{
  type Output = TrickleResult<T>;
  type IntoFuture = Completion<T>;

  fn into_future(self) -> Self::IntoFuture {
    self.cursor()
  }
}

impl<T> fmt::Debug for Controller<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.shared.state.lock();
    f.debug_struct("Controller")
      .field("mode", &self.shared.mode)
      .field("pending_steps", &state.queue.len())
      .field("invocations", &state.invocations)
      .field("completion", &self.shared.completion)
      .finish()
  }
}
