//! Bounded backend calls
//!
//! Every store and generator call made by the core goes through one of these
//! helpers so a stalled backend cannot hold a request forever.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Run a store operation under a deadline
///
/// An elapsed deadline is reported as [`Error::StoreUnavailable`].
pub(crate) async fn store_call<T, F>(deadline: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::store(format!(
            "{} timed out after {:?}",
            operation, deadline
        ))),
    }
}

/// Run a generator call under a deadline
///
/// An elapsed deadline is reported as [`Error::GeneratorUnreachable`].
pub(crate) async fn generator_call<T, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::generator_unreachable(format!(
            "no answer within {:?}",
            deadline
        ))),
    }
}
