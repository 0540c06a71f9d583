// fixtures/scoped.rs - The scoped fixture runner
//
// A fixture has three phases:
//   1. setup    - establish some state and hand back a context value
//   2. body     - the actual test, which receives the context
//   3. teardown - undo whatever setup did
//
// Test frameworks in other languages often write this as a function that
// "pauses" in the middle to let the test run. Rust has no such suspension
// point for plain functions, so we do it explicitly: call setup, call the body
// closure, then call teardown no matter how the body exited.
//
// "No matter how" includes panics. A failed `assert!` inside the body panics,
// so the body is run under `catch_unwind` and the panic is only resumed once
// teardown has finished.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use thiserror::Error;

/// Why a fixture invocation failed.
///
/// The same error type `E` is used for all three phases, which keeps the
/// runner usable with `anyhow::Error` as well as with a crate's own error enum.
#[derive(Debug, Error)]
pub enum FixtureError<E> {
    /// Setup could not establish its state. Teardown was not run.
    #[error("fixture setup failed: {0}")]
    Setup(E),

    /// The body returned an error. Teardown ran and succeeded.
    #[error("test body failed: {0}")]
    Body(E),

    /// The body succeeded but cleaning up afterwards failed.
    #[error("fixture teardown failed: {0}")]
    Teardown(E),

    /// The body failed and teardown failed too.
    #[error("test body failed: {body}; teardown also failed: {teardown}")]
    BodyAndTeardown { body: E, teardown: E },
}

impl<E> FixtureError<E> {
    /// The error the body returned, if the body is what failed.
    pub fn body_error(&self) -> Option<&E> {
        match self {
            FixtureError::Body(body) | FixtureError::BodyAndTeardown { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The error teardown returned, if teardown failed.
    pub fn teardown_error(&self) -> Option<&E> {
        match self {
            FixtureError::Teardown(teardown)
            | FixtureError::BodyAndTeardown { teardown, .. } => Some(teardown),
            _ => None,
        }
    }

    pub fn is_setup(&self) -> bool {
        matches!(self, FixtureError::Setup(_))
    }

    /// Take the body's error back out, dropping any teardown error.
    pub fn into_body_error(self) -> Option<E> {
        match self {
            FixtureError::Body(body) | FixtureError::BodyAndTeardown { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Run `body` between `setup` and `teardown`.
///
/// - If `setup` fails, neither `body` nor `teardown` is called.
/// - Otherwise `teardown` is called exactly once, after `body`, whether the
///   body returned `Ok`, returned `Err` or panicked.
/// - A body error is returned as [`FixtureError::Body`], or as
///   [`FixtureError::BodyAndTeardown`] when cleanup failed as well.
/// - A body panic is resumed after teardown. If teardown failed too, the new
///   panic message carries both the original message and the teardown error.
///
/// A panicking teardown counts as a teardown failure. If the body already
/// failed, the runner panics with a message carrying both failures;
/// otherwise the teardown panic is resumed as-is.
///
/// The body borrows the context; teardown receives it back by value so it
/// can release whatever the context holds.
///
/// # Example
///
/// ```
/// use db_fixtures::fixtures::run_scoped;
///
/// let mut log = Vec::new();
/// let result: Result<usize, _> = run_scoped(
///     || Ok::<_, String>(vec![1, 2, 3]),
///     |rows| Ok(rows.len()),
///     |rows| {
///         log.push(format!("cleared {} rows", rows.len()));
///         Ok(())
///     },
/// );
///
/// assert_eq!(result.unwrap(), 3);
/// assert_eq!(log, ["cleared 3 rows"]);
/// ```
pub fn run_scoped<C, T, E, S, B, D>(setup: S, body: B, teardown: D) -> Result<T, FixtureError<E>>
where
    S: FnOnce() -> Result<C, E>,
    B: FnOnce(&mut C) -> Result<T, E>,
    D: FnOnce(C) -> Result<(), E>,
    E: fmt::Display,
{
    tracing::debug!("fixture setup");
    let mut context = setup().map_err(FixtureError::Setup)?;

    tracing::debug!("fixture body");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut context)));

    tracing::debug!("fixture teardown");
    let cleanup = panic::catch_unwind(AssertUnwindSafe(|| teardown(context)));

    settle(outcome, cleanup)
}

/// Async version of [`run_scoped`] with the same guarantees.
///
/// Futures cannot easily borrow from the runner's stack, so the body gets its
/// own clone of the context. Contexts are expected to be cheap handles such
/// as connection pools.
///
/// # Cancellation
///
/// Dropping the returned future before it completes (for example through
/// `tokio::time::timeout`) skips teardown, so whatever setup created stays
/// behind.
pub async fn run_scoped_async<C, T, E, S, SF, B, BF, D, DF>(
    setup: S,
    body: B,
    teardown: D,
) -> Result<T, FixtureError<E>>
where
    C: Clone,
    S: FnOnce() -> SF,
    SF: Future<Output = Result<C, E>>,
    B: FnOnce(C) -> BF,
    BF: Future<Output = Result<T, E>>,
    D: FnOnce(C) -> DF,
    DF: Future<Output = Result<(), E>>,
    E: fmt::Display,
{
    tracing::debug!("fixture setup");
    let context = setup().await.map_err(FixtureError::Setup)?;

    tracing::debug!("fixture body");
    let body_context = context.clone();
    // Calling `body` happens inside the async block too, so a panic while
    // building the future is caught the same way as one while polling it.
    let outcome = AssertUnwindSafe(async move { body(body_context).await })
        .catch_unwind()
        .await;

    tracing::debug!("fixture teardown");
    let cleanup = AssertUnwindSafe(async move { teardown(context).await })
        .catch_unwind()
        .await;

    settle(outcome, cleanup)
}

/// Combine the body outcome and the teardown outcome into the runner result.
///
/// Both sides are `Err(payload)` when the phase panicked.
fn settle<T, E>(
    outcome: Result<Result<T, E>, Box<dyn Any + Send>>,
    cleanup: Result<Result<(), E>, Box<dyn Any + Send>>,
) -> Result<T, FixtureError<E>>
where
    E: fmt::Display,
{
    match (outcome, cleanup) {
        (Ok(Ok(value)), Ok(Ok(()))) => Ok(value),
        (Ok(Ok(_)), Ok(Err(teardown))) => {
            tracing::warn!(error = %teardown, "fixture teardown failed");
            Err(FixtureError::Teardown(teardown))
        }
        (Ok(Ok(_)), Err(teardown_panic)) => panic::resume_unwind(teardown_panic),
        (Ok(Err(body)), Ok(Ok(()))) => Err(FixtureError::Body(body)),
        (Ok(Err(body)), Ok(Err(teardown))) => {
            tracing::error!(
                body_error = %body,
                teardown_error = %teardown,
                "fixture teardown failed after test body failure"
            );
            Err(FixtureError::BodyAndTeardown { body, teardown })
        }
        (Ok(Err(body)), Err(teardown_panic)) => {
            let teardown = panic_message(teardown_panic.as_ref());
            tracing::error!(
                body_error = %body,
                teardown_panic = %teardown,
                "fixture teardown panicked after test body failure"
            );
            panic!("test body failed: {body}; fixture teardown panicked: {teardown}");
        }
        (Err(payload), Ok(Ok(()))) => panic::resume_unwind(payload),
        (Err(payload), Ok(Err(teardown))) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                panic = %message,
                teardown_error = %teardown,
                "fixture teardown failed after test body panic"
            );
            panic!("{message}; fixture teardown also failed: {teardown}");
        }
        (Err(payload), Err(teardown_panic)) => {
            let message = panic_message(payload.as_ref());
            let teardown = panic_message(teardown_panic.as_ref());
            tracing::error!(
                panic = %message,
                teardown_panic = %teardown,
                "fixture teardown panicked after test body panic"
            );
            panic!("{message}; fixture teardown panicked: {teardown}");
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test body panicked".to_string()
    }
}
