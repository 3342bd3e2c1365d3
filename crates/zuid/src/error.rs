/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `zuid` can emit.
///
/// Encoding itself is infallible. Errors only surface at the edges: when a
/// caller builds a validated [`MachineId`]/[`WorkerId`] from an untrusted value,
/// or parses an identifier from its decimal text form.
///
/// [`MachineId`]: crate::MachineId
/// [`WorkerId`]: crate::WorkerId
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The machine id does not fit in the 4-bit machine field.
    #[error("machine id {0} is out of range (expected 0..={max})", max = crate::ZuidId::MAX_MACHINE_ID)]
    MachineIdOutOfRange(u64),

    /// The worker id does not fit in the 3-bit worker field.
    #[error("worker id {0} is out of range (expected 0..={max})", max = crate::ZuidId::MAX_WORKER_ID)]
    WorkerIdOutOfRange(u64),

    /// The input is not the decimal form of a signed 64-bit identifier.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}
