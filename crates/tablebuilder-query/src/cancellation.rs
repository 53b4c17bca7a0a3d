use std::future::Future;
use tablebuilder_core::error::{Result, TableBuilderError};
use tokio_util::sync::CancellationToken;

/// Fail with `Cancelled` if the token has been signalled
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(TableBuilderError::Cancelled);
    }
    Ok(())
}

/// Await `future` unless the token fires first. A token that is already
/// signalled wins without polling the future.
pub async fn cancellable<T, F>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TableBuilderError::Cancelled),
        result = future => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signalled_token_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(&cancel, async { Ok(1) }).await;
        assert!(matches!(result, Err(TableBuilderError::Cancelled)));
        assert!(ensure_not_cancelled(&cancel).is_err());
    }

    #[tokio::test]
    async fn test_future_result_passes_through() {
        let cancel = CancellationToken::new();
        assert_eq!(cancellable(&cancel, async { Ok(7) }).await.unwrap(), 7);
        assert!(ensure_not_cancelled(&cancel).is_ok());
    }
}
