use core::{cmp::Ordering, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{IdGenStatus, MachineId, TimeSource, Timestamp, WorkerId, ZuidGenerator, ZuidId};

/// A per-worker generator that never reuses a sequence value within one
/// millisecond.
///
/// Differences from [`BasicZuidGenerator`]:
/// - the sequence resets to zero whenever the clock advances past the last
///   issued tick;
/// - once all 2048 sequence values of a tick are used, it returns
///   [`IdGenStatus::Pending`] for one millisecond instead of wrapping;
/// - if the clock moves backwards, it returns [`IdGenStatus::Pending`] until
///   the clock catches up with the last issued tick.
///
/// IDs from one worker are unique as long as the worker is not restarted
/// within the same millisecond it last issued an ID in.
///
/// [`BasicZuidGenerator`]: crate::BasicZuidGenerator
pub struct StrictZuidGenerator<T: TimeSource> {
    machine_id: MachineId,
    worker_id: WorkerId,
    /// Next sequence value to issue within `last_tick`; `SEQUENCE_SPACE` once
    /// the tick is exhausted.
    sequence: u16,
    last_tick: Option<Timestamp>,
    time: T,
}

impl<T: TimeSource> StrictZuidGenerator<T> {
    pub fn new(machine_id: MachineId, worker_id: WorkerId, time: T) -> Self {
        Self::from_components(machine_id, worker_id, 0, time)
    }

    /// Creates a generator with an explicit starting sequence for its first
    /// tick. Values above 2047 are folded into the 11-bit sequence space.
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
            last_tick: None,
            time,
        }
    }

    fn issue(&mut self, tick: Timestamp) -> IdGenStatus {
        let id = ZuidId::from_parts(self.machine_id, self.worker_id, self.sequence, tick);
        self.sequence += 1;
        self.last_tick = Some(tick);
        IdGenStatus::Ready { id }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: Timestamp, last: Timestamp) -> IdGenStatus {
        let behind = (last.as_millis() - now.as_millis()).max(1) as u64;
        IdGenStatus::Pending {
            yield_for: Duration::from_millis(behind),
        }
    }
}

impl<T: TimeSource> ZuidGenerator for StrictZuidGenerator<T> {
    fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    fn sequence(&self) -> u16 {
        self.sequence.min(ZuidId::MAX_SEQUENCE as u16)
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn poll_id(&mut self) -> IdGenStatus {
        let now = self.time.now();
        let Some(last) = self.last_tick else {
            return self.issue(now);
        };

        match now.cmp(&last) {
            Ordering::Equal => {
                if u64::from(self.sequence) < ZuidId::SEQUENCE_SPACE {
                    self.issue(now)
                } else {
                    IdGenStatus::Pending {
                        yield_for: Duration::from_millis(1),
                    }
                }
            }
            Ordering::Greater => {
                self.sequence = 0;
                self.issue(now)
            }
            Ordering::Less => Self::cold_clock_behind(now, last),
        }
    }
}
