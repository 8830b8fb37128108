use tokio::time::Instant;

/// Sleep until an optional deadline
///
/// With no deadline this never completes, which lets an unarmed timer sit
/// in a `tokio::select!` branch without firing.
pub async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_deadline() {
        let start = Instant::now();
        sleep_until_opt(Some(start + Duration::from_millis(250))).await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unarmed_never_fires() {
        let result = tokio::time::timeout(Duration::from_secs(60), sleep_until_opt(None)).await;
        assert!(result.is_err());
    }
}
