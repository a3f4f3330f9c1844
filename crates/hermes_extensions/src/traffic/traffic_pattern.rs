use tracing::warn;

use crate::{constants::DAILY_PATTERN_BUCKETS, types::PatternId};

/// Daily speed profile in km/h, one value per quarter of an hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficPattern {
    id: PatternId,
    speeds: [u8; DAILY_PATTERN_BUCKETS],
}

impl TrafficPattern {
    /// Speeds above 255 are capped. Missing buckets stay empty, extra ones are dropped.
    pub fn new(id: PatternId, values: &[u16]) -> Self {
        if values.len() != DAILY_PATTERN_BUCKETS {
            warn!(
                "Traffic pattern {} has {} values instead of {}",
                id,
                values.len(),
                DAILY_PATTERN_BUCKETS
            );
        }

        let mut speeds = [0; DAILY_PATTERN_BUCKETS];
        for (speed, value) in speeds.iter_mut().zip(values) {
            *speed = (*value).min(u16::from(u8::MAX)) as u8;
        }

        TrafficPattern { id, speeds }
    }

    pub fn id(&self) -> PatternId {
        self.id
    }

    pub fn speeds(&self) -> &[u8; DAILY_PATTERN_BUCKETS] {
        &self.speeds
    }

    pub fn max_speed(&self) -> u8 {
        self.speeds.iter().copied().max().unwrap_or(0)
    }

    pub fn non_zero_buckets(&self) -> usize {
        self.speeds.iter().filter(|speed| **speed > 0).count()
    }
}

/// Index of the quarter hour bucket holding `hour:minute`.
pub fn quarter_bucket(hour: u8, minute: u8) -> usize {
    let minute_pointer = match minute {
        0..15 => 0,
        15..30 => 1,
        30..45 => 2,
        _ => 3,
    };

    (usize::from(hour) * 4 + minute_pointer).min(DAILY_PATTERN_BUCKETS - 1)
}
