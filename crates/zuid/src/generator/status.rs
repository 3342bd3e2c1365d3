use crate::ZuidId;
use core::time::Duration;

/// Represents the result of attempting to generate a new identifier.
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the generator cannot produce a new ID
///   until `yield_for` has elapsed. Only [`StrictZuidGenerator`] ever returns
///   this variant.
///
/// [`StrictZuidGenerator`]: crate::StrictZuidGenerator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated identifier.
        id: ZuidId,
    },
    /// The sequence is exhausted for the current tick, or the clock moved
    /// backwards. Retry after `yield_for`.
    Pending {
        /// How long to back off before polling again.
        yield_for: Duration,
    },
}
