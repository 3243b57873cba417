//! IdGenerator port.
//!
//! Ids are ULIDs stamped with the injected clock's time, so records created
//! under a [`FixedClock`](super::FixedClock) share a predictable timestamp
//! prefix while the random part keeps them unique.

use ulid::Ulid;

use crate::domain::{AttemptId, HistoryId, JobId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_job_id(&self) -> JobId;

    fn generate_history_id(&self) -> HistoryId;

    fn generate_attempt_id(&self) -> AttemptId;
}

/// Clock-stamped ULID generator.
#[derive(Debug, Clone)]
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_job_id(&self) -> JobId {
        JobId::from(self.next())
    }

    fn generate_history_id(&self) -> HistoryId {
        HistoryId::from(self.next())
    }

    fn generate_attempt_id(&self) -> AttemptId {
        AttemptId::from(self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_job_id();
        let id2 = id_gen.generate_job_id();
        let id3 = id_gen.generate_job_id();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn fixed_clock_pins_the_timestamp_part() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let job = id_gen.generate_job_id();
        let history = id_gen.generate_history_id();

        assert_ne!(job.as_ulid(), history.as_ulid());
        let expected = fixed_time.timestamp_millis() as u64;
        assert_eq!(job.as_ulid().timestamp_ms(), expected);
        assert_eq!(history.as_ulid().timestamp_ms(), expected);
    }
}
