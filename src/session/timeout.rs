//! Timeout wrapper for single browser calls
//!
//! A CDP call whose response never arrives would otherwise park the run until
//! the run timeout fires. Every call in `ChromiumSession` goes through here.

use std::future::Future;
use std::time::Duration;

use super::SessionError;

/// Apply `tokio::time::timeout` to one browser operation
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err(SessionError::Timeout)` - The call did not complete within `after`
/// * `Err(_)` - The operation's own error
pub async fn with_call_timeout<F, T>(
    operation: F,
    after: Duration,
    operation_name: &'static str,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match tokio::time::timeout(after, operation).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::Timeout {
            operation: operation_name,
            after,
        }),
    }
}
