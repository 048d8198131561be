use std::cell::Cell;
use std::rc::Rc;
use time::{Duration, OffsetDateTime, UtcOffset};

/// Source of "now" for everything time dependent in the core.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock pinned to one UTC offset.
///
/// `time` refuses to read the local offset once a process has more than one
/// thread, so the offset is captured up front with [`SystemClock::local`]
/// before anything spawns, and reused for every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Captures the local offset now, falling back to UTC when it cannot be
    /// determined.
    pub fn local() -> Self {
        Self::new(local_offset())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<OffsetDateTime>>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, SystemClock};
    use time::Duration;
    use time::macros::{datetime, offset};

    #[test]
    fn fixed_clock_clones_share_time() {
        let clock = FixedClock::new(datetime!(2025-01-01 00:00 UTC));
        let shared = clock.clone();

        clock.advance(Duration::days(1));

        assert_eq!(shared.now(), datetime!(2025-01-02 00:00 UTC));
    }

    #[test]
    fn system_clock_keeps_its_offset_across_threads() {
        let clock = SystemClock::new(offset!(+9));
        let reading = std::thread::spawn(move || clock.now()).join().unwrap();

        assert_eq!(reading.offset(), offset!(+9));
        assert_eq!(clock.now().offset(), offset!(+9));
    }
}
