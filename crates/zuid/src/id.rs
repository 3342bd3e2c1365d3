use crate::{Error, Result, Timestamp};
use core::{fmt, str::FromStr};

/// A 64-bit time-ordered identifier.
///
/// - 4 bits machine ID
/// - 3 bits worker ID
/// - 11 bits sequence
/// - 35 bits seconds since the Unix epoch
/// - 10 bits milliseconds within the second
///
/// ```text
///  Bit Index:  62       59 58      56 55          45 44          10 9            0
///              +-----------+----------+--------------+--------------+--------------+
///  Field:      | machine(4)| worker(3)| sequence (11)| seconds (35) | millis (10)  |
///              +-----------+----------+--------------+--------------+--------------+
///              |<------------------- MSB ---- 63 bits ---- LSB ------------------->|
/// ```
///
/// The value is stored as a signed 64-bit integer. With a machine ID of at
/// most 15 the sign bit is never set, so every identifier is non-negative.
///
/// The sequence field sits *above* the timestamp. Within one worker,
/// identifiers therefore increase strictly until the sequence wraps from
/// 2047 back to 0.
///
/// # Example
///
/// ```
/// use zuid::ZuidId;
///
/// let id = ZuidId::from_components(3, 2, 7, 1_000_000, 500);
/// assert_eq!(id.machine_id(), 3);
/// assert_eq!(id.worker_id(), 2);
/// assert_eq!(id.sequence(), 7);
/// assert_eq!(id.seconds(), 1_000_000);
/// assert_eq!(id.millis(), 500);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZuidId {
    id: i64,
}

impl ZuidId {
    /// Bitmask for the 4-bit machine ID field. Occupies bits 59 through 62.
    pub const MACHINE_ID_MASK: u64 = (1 << 4) - 1;

    /// Bitmask for the 3-bit worker ID field. Occupies bits 56 through 58.
    pub const WORKER_ID_MASK: u64 = (1 << 3) - 1;

    /// Bitmask for the 11-bit sequence field. Occupies bits 45 through 55.
    pub const SEQUENCE_MASK: u64 = (1 << 11) - 1;

    /// Bitmask for the 35-bit seconds field. Occupies bits 10 through 44.
    pub const SECONDS_MASK: u64 = (1 << 35) - 1;

    /// Bitmask for the 10-bit milliseconds field. Occupies bits 0 through 9.
    pub const MILLIS_MASK: u64 = (1 << 10) - 1;

    pub const MACHINE_ID_SHIFT: u32 = 59;
    pub const WORKER_ID_SHIFT: u32 = 56;
    pub const SEQUENCE_SHIFT: u32 = 45;
    pub const SECONDS_SHIFT: u32 = 10;
    pub const MILLIS_SHIFT: u32 = 0;

    /// Largest machine ID a cluster may use (16 machines).
    pub const MAX_MACHINE_ID: u64 = Self::MACHINE_ID_MASK;

    /// Largest worker ID a process may use (8 workers).
    pub const MAX_WORKER_ID: u64 = Self::WORKER_ID_MASK;

    /// Largest sequence value before the counter wraps to zero.
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    /// Number of distinct sequence values.
    pub const SEQUENCE_SPACE: u64 = Self::SEQUENCE_MASK + 1;

    /// Largest number of seconds the layout can hold (roughly year 3058).
    pub const MAX_SECONDS: u64 = Self::SECONDS_MASK;

    /// Packs the components into an identifier.
    ///
    /// No range validation is performed. Callers guarantee `machine_id < 16`,
    /// `worker_id < 8`, `sequence < 2048` and `millis < 1000`. A `seconds`
    /// value outside the 35-bit budget (or negative) is not detected and
    /// bleeds into the sequence and worker fields.
    pub const fn from_components(
        machine_id: u64,
        worker_id: u64,
        sequence: u64,
        seconds: i64,
        millis: u64,
    ) -> Self {
        debug_assert!(machine_id <= Self::MACHINE_ID_MASK, "machine_id overflow");
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        debug_assert!(millis < 1000, "millis overflow");

        let raw = (machine_id << Self::MACHINE_ID_SHIFT)
            | (worker_id << Self::WORKER_ID_SHIFT)
            | (sequence << Self::SEQUENCE_SHIFT)
            | ((seconds as u64) << Self::SECONDS_SHIFT)
            | (millis << Self::MILLIS_SHIFT);
        Self { id: raw as i64 }
    }

    /// Packs validated ids, a sequence value and a sampled [`Timestamp`].
    pub const fn from_parts(
        machine_id: MachineId,
        worker_id: WorkerId,
        sequence: u16,
        timestamp: Timestamp,
    ) -> Self {
        Self::from_components(
            machine_id.get() as u64,
            worker_id.get() as u64,
            sequence as u64,
            timestamp.seconds,
            timestamp.millis as u64,
        )
    }

    const fn bits(&self) -> u64 {
        self.id as u64
    }

    /// Extracts the machine ID.
    pub const fn machine_id(&self) -> u64 {
        (self.bits() >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK
    }

    /// Extracts the worker ID.
    pub const fn worker_id(&self) -> u64 {
        (self.bits() >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence counter value.
    pub const fn sequence(&self) -> u64 {
        (self.bits() >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Extracts the seconds since the Unix epoch.
    pub const fn seconds(&self) -> i64 {
        ((self.bits() >> Self::SECONDS_SHIFT) & Self::SECONDS_MASK) as i64
    }

    /// Extracts the milliseconds within the second.
    pub const fn millis(&self) -> u64 {
        (self.bits() >> Self::MILLIS_SHIFT) & Self::MILLIS_MASK
    }

    /// Extracts the embedded wall-clock time.
    pub const fn timestamp(&self) -> Timestamp {
        Timestamp::new(self.seconds(), self.millis() as u16)
    }

    /// Returns the raw signed value.
    pub const fn to_raw(&self) -> i64 {
        self.id
    }

    /// Wraps a raw signed value without inspecting it.
    pub const fn from_raw(raw: i64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a zero-padded 19-digit string, which sorts
    /// lexicographically in the same order as the numeric value.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl fmt::Display for ZuidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for ZuidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("machine_id", 4, self.machine_id()),
            ("worker_id", 3, self.worker_id()),
            ("sequence", 11, self.sequence()),
            ("seconds", 35, self.seconds() as u64),
            ("millis", 10, self.millis()),
        ];

        writeln!(f, "ZuidId {{")?;
        writeln!(f, "    raw id     : 0x{:016x} ({})", self.id, self.id)?;
        writeln!(f, "    padded     : {}", self.to_padded_string())?;
        writeln!(f, "    layout     :")?;
        for (name, bits, value) in fields {
            writeln!(f, "        {name:<10} ({bits:>2}) = {value} (0x{value:x})")?;
        }
        write!(f, "}}")
    }
}

impl FromStr for ZuidId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<i64>()
            .map(Self::from_raw)
            .map_err(|_| Error::InvalidIdentifier(s.to_string()))
    }
}

impl From<ZuidId> for i64 {
    fn from(id: ZuidId) -> Self {
        id.to_raw()
    }
}

/// A cluster member identifier, validated to fit in 4 bits (`0..=15`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineId(u8);

impl MachineId {
    /// Validates `raw` against the machine field width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MachineIdOutOfRange`] when `raw > 15`.
    pub const fn new(raw: u8) -> Result<Self> {
        if raw as u64 > ZuidId::MAX_MACHINE_ID {
            return Err(Error::MachineIdOutOfRange(raw as u64));
        }
        Ok(Self(raw))
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for MachineId {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self> {
        u8::try_from(raw)
            .map_err(|_| Error::MachineIdOutOfRange(raw as u64))
            .and_then(Self::new)
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A worker identifier within one process, validated to fit in 3 bits
/// (`0..=7`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(u8);

impl WorkerId {
    /// Validates `raw` against the worker field width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerIdOutOfRange`] when `raw > 7`.
    pub const fn new(raw: u8) -> Result<Self> {
        if raw as u64 > ZuidId::MAX_WORKER_ID {
            return Err(Error::WorkerIdOutOfRange(raw as u64));
        }
        Ok(Self(raw))
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<usize> for WorkerId {
    type Error = Error;

    fn try_from(raw: usize) -> Result<Self> {
        u8::try_from(raw)
            .map_err(|_| Error::WorkerIdOutOfRange(raw as u64))
            .and_then(Self::new)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
