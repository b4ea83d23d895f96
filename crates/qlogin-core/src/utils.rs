use std::{thread, time::Duration};

use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::oneshot;

// ============== Blocking Reads ==============

/// Run a blocking read on a detached thread and await its result.
///
/// The thread is not tied to the runtime, so a read that never returns does
/// not hold up runtime shutdown.
pub async fn read_detached<F>(read: F) -> Option<String>
where
    F: FnOnce() -> Option<String> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    thread::spawn(move || {
        let _ = tx.send(read());
    });
    rx.await.ok().flatten()
}

/// Race a blocking read against a timer; whichever finishes first wins.
///
/// The losing read is not interrupted. It keeps running in the background and
/// its value is dropped when it eventually arrives.
pub async fn read_line_timeout<F>(read: F, timeout: Duration) -> Option<String>
where
    F: FnOnce() -> Option<String> + Send + 'static,
{
    tokio::time::timeout(timeout, read_detached(read))
        .await
        .ok()
        .flatten()
}

// ============== Identifiers ==============

/// Random alphanumeric identifier (used to key slider tickets at the broker).
pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn timeout_wins_over_a_read_that_never_returns() {
        let started = Instant::now();
        let out = read_line_timeout(
            || {
                thread::sleep(Duration::from_secs(30));
                Some("late".to_string())
            },
            Duration::from_millis(100),
        )
        .await;

        assert_eq!(out, None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn fast_read_wins_over_timeout() {
        let out = read_line_timeout(|| Some("ok".to_string()), Duration::from_secs(5)).await;
        assert_eq!(out.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn end_of_input_reads_as_none() {
        assert_eq!(read_detached(|| None).await, None);
    }

    #[test]
    fn random_id_is_alphanumeric_with_requested_length() {
        let id = random_id(8);
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_id(16), random_id(16));
    }
}
