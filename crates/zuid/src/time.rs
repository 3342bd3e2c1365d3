use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time as whole seconds since the Unix epoch plus the
/// milliseconds elapsed within that second.
///
/// Ordering compares seconds first, then milliseconds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub millis: u16,
}

impl Timestamp {
    pub const fn new(seconds: i64, millis: u16) -> Self {
        Self { seconds, millis }
    }

    /// Total milliseconds since the Unix epoch.
    pub const fn as_millis(&self) -> i64 {
        self.seconds * 1000 + self.millis as i64
    }
}

/// A trait for time sources that return the current wall-clock time.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests.
///
/// # Example
///
/// ```
/// use zuid::{TimeSource, Timestamp};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn now(&self) -> Timestamp {
///         Timestamp::new(1_000_000, 500)
///     }
/// }
///
/// assert_eq!(FixedTime.now().millis, 500);
/// ```
pub trait TimeSource {
    /// Samples the current time.
    fn now(&self) -> Timestamp;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// The system wall clock.
///
/// Every call samples `SystemTime::now()`, so the clock follows NTP
/// adjustments and may move backwards. A clock set before 1970 yields
/// negative seconds.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => Timestamp::new(since.as_secs() as i64, since.subsec_millis() as u16),
            Err(before) => {
                let before = before.duration();
                let mut seconds = -(before.as_secs() as i64);
                let mut millis = before.subsec_millis();
                if millis > 0 {
                    seconds -= 1;
                    millis = 1000 - millis;
                }
                Timestamp::new(seconds, millis as u16)
            }
        }
    }
}
