use tracing::warn;

/// Numeric value stored as a scaled integer capped at `max`.
///
/// Values outside `0..=max` are clamped and reported with a warning. Fractions are rounded
/// to the nearest integer after scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedValue {
    field: &'static str,
    scale: f64,
    max: u32,
}

impl ClampedValue {
    pub const fn new(field: &'static str, max: u32) -> Self {
        Self::scaled(field, 1.0, max)
    }

    pub const fn scaled(field: &'static str, scale: f64, max: u32) -> Self {
        ClampedValue { field, scale, max }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn encode(&self, value: f64) -> u32 {
        let scaled = (value * self.scale).round();

        if scaled.is_nan() || scaled < 0.0 {
            warn!("{} value {} is negative, stored as 0", self.field, value);
            return 0;
        }

        if scaled > f64::from(self.max) {
            warn!(
                "{} value {} exceeds the maximum of {}, clamped",
                self.field, value, self.max
            );
            return self.max;
        }

        scaled as u32
    }

    pub fn decode(&self, encoded: u32) -> f64 {
        f64::from(encoded) / self.scale
    }
}
