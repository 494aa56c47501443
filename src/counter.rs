use std::time::Instant;

/// Monotonic tick source used to time the transform.
///
/// On a microcontroller this is the CPU cycle counter; the host
/// implementation counts nanoseconds.
pub trait CycleCounter {
    fn now(&mut self) -> u64;
}

/// Nanoseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct InstantCounter {
    origin: Instant,
}

impl InstantCounter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleCounter for InstantCounter {
    fn now(&mut self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}
