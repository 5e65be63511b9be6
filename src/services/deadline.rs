use std::future::Future;
use std::time::Duration;

use crate::domain::errors::{Backend, DriveError, DriveResult};

/// Run a store call under a deadline
///
/// An elapsed deadline becomes `Unavailable` for `backend`; the store's own
/// error is converted with its `Into<DriveError>` impl.
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    backend: Backend,
    operation: &'static str,
    call: F,
) -> DriveResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DriveError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(DriveError::unavailable(
            backend,
            format!("{} timed out after {:?}", operation, limit),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ErrorKind, RepositoryError};

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_is_unavailable() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, RepositoryError>(())
        };
        let err = bounded(Duration::from_secs(5), Backend::MetadataStore, "slow call", slow)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_inner_error_is_converted() {
        let failing = async { Err::<(), _>(RepositoryError::not_found(crate::domain::Resource::File)) };
        let err = bounded(Duration::from_secs(5), Backend::MetadataStore, "lookup", failing)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
