use crate::{IdGenStatus, MachineId, WorkerId, ZuidId};
use core::time::Duration;

/// A minimal interface for per-worker identifier generators.
///
/// Generators are owned by exactly one worker and take `&mut self`; the
/// sequence counter is never shared, so no synchronization is involved.
pub trait ZuidGenerator {
    /// The machine ID embedded in every generated ID.
    fn machine_id(&self) -> MachineId;

    /// The worker ID embedded in every generated ID.
    fn worker_id(&self) -> WorkerId;

    /// The current sequence counter value.
    fn sequence(&self) -> u16;

    /// Attempts to generate the next ID, sampling the clock once.
    fn poll_id(&mut self) -> IdGenStatus;

    /// Generates the next ID, calling `f` with the back-off duration every
    /// time the generator reports [`IdGenStatus::Pending`].
    fn next_id(&mut self, mut f: impl FnMut(Duration)) -> ZuidId
    where
        Self: Sized,
    {
        loop {
            match self.poll_id() {
                IdGenStatus::Ready { id } => break id,
                IdGenStatus::Pending { yield_for } => f(yield_for),
            }
        }
    }
}
