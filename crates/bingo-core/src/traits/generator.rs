// # Number Generator Trait
//
// The generator is the external service that produces the day's target
// integer. The core never generates numbers itself; it only decides when a
// new number is needed and caches the answer.
//
// ## Contract
//
// - One call produces one integer
// - No retries inside implementations: a failed call is terminal for the
//   request that triggered it
// - Implementations bound their own transport time; the resolver applies a
//   second, outer deadline

use async_trait::async_trait;

/// Trait for number generator implementations
///
/// # Errors
///
/// - [`crate::Error::GeneratorUnreachable`]: transport failure, timeout or
///   non-success status
/// - [`crate::Error::GeneratorResponseInvalid`]: the reply is not an integer
#[async_trait]
pub trait NumberGenerator: Send + Sync {
    /// Ask the generator for the number of the day
    async fn generate(&self) -> Result<i64, crate::Error>;

    /// Name of the generator, for logs
    fn generator_name(&self) -> &'static str;
}
