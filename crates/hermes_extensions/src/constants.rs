pub(crate) const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub(crate) const METERS_PER_DEGREE: f64 = 111_320.0;

pub(crate) const DAYS_PER_WEEK: usize = 7;

/// 15 minute buckets over 24 hours
pub(crate) const DAILY_PATTERN_BUCKETS: usize = 96;
