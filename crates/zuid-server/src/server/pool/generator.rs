use zuid::{
    BasicZuidGenerator, IdGenStatus, MachineId, StrictZuidGenerator, SystemClock, WorkerId,
    ZuidGenerator,
};

/// Clock used by every worker's generator.
pub type Clock = SystemClock;

/// The generator a worker owns, picked once at startup by
/// `--strict-sequence`.
pub enum Generator {
    /// Wrapping counter; never waits, may repeat past 2048 ids per ms.
    Basic(BasicZuidGenerator<Clock>),
    /// Per-millisecond counter; waits for the next ms instead of wrapping.
    Strict(StrictZuidGenerator<Clock>),
}

impl Generator {
    pub fn new(machine_id: MachineId, worker_id: WorkerId, strict: bool) -> Self {
        if strict {
            Self::Strict(StrictZuidGenerator::new(machine_id, worker_id, SystemClock))
        } else {
            Self::Basic(BasicZuidGenerator::new(machine_id, worker_id, SystemClock))
        }
    }
}

impl ZuidGenerator for Generator {
    fn machine_id(&self) -> MachineId {
        match self {
            Self::Basic(g) => g.machine_id(),
            Self::Strict(g) => g.machine_id(),
        }
    }

    fn worker_id(&self) -> WorkerId {
        match self {
            Self::Basic(g) => g.worker_id(),
            Self::Strict(g) => g.worker_id(),
        }
    }

    fn sequence(&self) -> u16 {
        match self {
            Self::Basic(g) => g.sequence(),
            Self::Strict(g) => g.sequence(),
        }
    }

    fn poll_id(&mut self) -> IdGenStatus {
        match self {
            Self::Basic(g) => g.poll_id(),
            Self::Strict(g) => g.poll_id(),
        }
    }
}
