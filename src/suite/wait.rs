// ABOUTME: Bounded fixed-interval polling for state transitions.
// ABOUTME: Cooperative re-check with a hard deadline, built on tokio time.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// One observation made by a poll operation.
pub enum PollState<T> {
    /// The awaited transition happened.
    Done(T),
    /// Not there yet; the string describes what was observed instead.
    Pending(String),
}

/// Why a poll did not produce a value.
#[derive(Debug)]
pub enum PollError<E> {
    /// The operation itself failed; polling stops immediately.
    Op(E),
    /// The deadline passed without the transition occurring.
    Timeout { waited: Duration, last: String },
}

impl<E> From<E> for PollError<E> {
    fn from(err: E) -> Self {
        PollError::Op(err)
    }
}

/// Re-run `op` every `interval` until it reports [`PollState::Done`] or
/// `deadline` elapses. The deadline is hard: a backend that never reaches the
/// awaited state produces a timeout, not a hang. Runs under paused tokio time
/// in tests, so deadline behavior is testable without wall-clock delays.
pub async fn poll_until<T, E, F, Fut>(
    interval: Duration,
    deadline: Duration,
    mut op: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollState<T>, E>>,
{
    let started = Instant::now();
    let mut last = "nothing observed yet".to_string();

    loop {
        match op().await? {
            PollState::Done(value) => return Ok(value),
            PollState::Pending(observed) => last = observed,
        }

        if started.elapsed() >= deadline {
            return Err(PollError::Timeout {
                waited: started.elapsed(),
                last,
            });
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn resolves_once_the_transition_happens() {
        let mut calls = 0;
        let result: Result<u32, PollError<&str>> = poll_until(
            Duration::from_secs(1),
            Duration::from_secs(30),
            || {
                calls += 1;
                let calls = calls;
                async move {
                    Ok(if calls >= 3 {
                        PollState::Done(calls)
                    } else {
                        PollState::Pending(format!("call {calls}"))
                    })
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_hard_and_reports_last_state() {
        let result: Result<(), PollError<&str>> = poll_until(
            Duration::from_secs(4),
            Duration::from_secs(120),
            || async { Ok(PollState::Pending("running".to_string())) },
        )
        .await;

        match result {
            Err(PollError::Timeout { waited, last }) => {
                assert!(waited >= Duration::from_secs(120));
                assert_eq!(last, "running");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn operation_errors_stop_polling_immediately() {
        let result: Result<(), PollError<&str>> = poll_until(
            Duration::from_secs(1),
            Duration::from_secs(30),
            || async { Err("backend gone") },
        )
        .await;

        assert!(matches!(result, Err(PollError::Op("backend gone"))));
    }
}
