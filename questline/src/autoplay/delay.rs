use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Waits `duration` unless `cancel` fires first. Returns `true` when the full delay elapsed.
///
/// A zero duration returns at once (still reporting an already-fired token).
pub async fn cancelable_delay(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn zero_delay_does_not_wait() {
        let token = CancellationToken::new();
        assert!(cancelable_delay(Duration::ZERO, &token).await);
        token.cancel();
        assert!(!cancelable_delay(Duration::ZERO, &token).await);
    }

    #[tokio::test]
    async fn cancel_interrupts_long_delay() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let began = Instant::now();
        assert!(!cancelable_delay(Duration::from_secs(30), &token).await);
        assert!(began.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn short_delay_elapses() {
        let token = CancellationToken::new();
        assert!(cancelable_delay(Duration::from_millis(5), &token).await);
    }
}
