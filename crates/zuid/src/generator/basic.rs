#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{IdGenStatus, MachineId, TimeSource, WorkerId, ZuidGenerator, ZuidId};

/// The default per-worker generator.
///
/// Every call samples a fresh timestamp, encodes it with the current sequence
/// value, then advances the sequence, wrapping from 2047 to 0. It never
/// returns [`IdGenStatus::Pending`].
///
/// The sequence is **not** reset when the clock ticks over to a new
/// millisecond, and it starts from zero on every process start. Uniqueness
/// across restarts relies on the timestamp having moved on.
///
/// ## Known gap
///
/// A worker emitting more than 2048 IDs inside a single millisecond wraps the
/// sequence and can reproduce an already issued `(machine, worker, sequence,
/// seconds, millis)` tuple, i.e. a duplicate ID. [`StrictZuidGenerator`]
/// closes this gap at the cost of occasionally waiting for the clock.
///
/// [`StrictZuidGenerator`]: crate::StrictZuidGenerator
///
/// # Example
///
/// ```
/// use zuid::{BasicZuidGenerator, MachineId, SystemClock, WorkerId, ZuidGenerator};
///
/// let mut generator = BasicZuidGenerator::new(
///     MachineId::new(3).unwrap(),
///     WorkerId::new(2).unwrap(),
///     SystemClock,
/// );
/// let id = generator.next_id(|_| unreachable!());
/// assert_eq!(id.machine_id(), 3);
/// assert_eq!(id.worker_id(), 2);
/// assert_eq!(id.sequence(), 0);
/// ```
pub struct BasicZuidGenerator<T: TimeSource> {
    machine_id: MachineId,
    worker_id: WorkerId,
    sequence: u16,
    time: T,
}

impl<T: TimeSource> BasicZuidGenerator<T> {
    /// Creates a generator whose sequence starts at zero.
    pub fn new(machine_id: MachineId, worker_id: WorkerId, time: T) -> Self {
        Self::from_components(machine_id, worker_id, 0, time)
    }

    /// Creates a generator with an explicit starting sequence.
    ///
    /// Values above 2047 are folded into the 11-bit sequence space.
    pub fn from_components(
        machine_id: MachineId,
        worker_id: WorkerId,
        sequence: u16,
        time: T,
    ) -> Self {
        Self {
            machine_id,
            worker_id,
            sequence: sequence & ZuidId::SEQUENCE_MASK as u16,
            time,
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn generate(&mut self) -> ZuidId {
        let id = ZuidId::from_parts(
            self.machine_id,
            self.worker_id,
            self.sequence,
            self.time.now(),
        );
        self.sequence = (self.sequence + 1) & ZuidId::SEQUENCE_MASK as u16;
        id
    }
}

impl<T: TimeSource> ZuidGenerator for BasicZuidGenerator<T> {
    fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    fn sequence(&self) -> u16 {
        self.sequence
    }

    fn poll_id(&mut self) -> IdGenStatus {
        IdGenStatus::Ready {
            id: self.generate(),
        }
    }
}
