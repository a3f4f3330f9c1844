use crate::error::CodecError;

/// A fixed range of bits inside a packed record.
///
/// Values are divided by `factor` before being stored, so a width of 120 with a factor of 10
/// occupies the value 12. Encoding a value above `max` is rejected instead of wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    name: &'static str,
    shift: u32,
    bits: u32,
    factor: u32,
    max: u32,
}

impl BitField {
    pub const fn new(name: &'static str, shift: u32, bits: u32, max: u32) -> Self {
        Self::with_factor(name, shift, bits, 1, max)
    }

    pub const fn with_factor(
        name: &'static str,
        shift: u32,
        bits: u32,
        factor: u32,
        max: u32,
    ) -> Self {
        BitField {
            name,
            shift,
            bits,
            factor,
            max,
        }
    }

    pub const fn flag(name: &'static str, shift: u32) -> Self {
        Self::new(name, shift, 1, 1)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// First bit after this field
    pub const fn end(&self) -> u32 {
        self.shift + self.bits
    }

    fn mask(&self) -> u64 {
        ((1_u64 << self.bits) - 1) << self.shift
    }

    pub fn encode(&self, value: u32, record: &mut u64) -> Result<(), CodecError> {
        if value > self.max {
            return Err(CodecError::ValueTooLarge {
                field: self.name,
                value,
                max: self.max,
            });
        }

        let stored = u64::from(value / self.factor);
        *record = (*record & !self.mask()) | ((stored << self.shift) & self.mask());
        Ok(())
    }

    pub fn encode_flag(&self, value: bool, record: &mut u64) -> Result<(), CodecError> {
        self.encode(u32::from(value), record)
    }

    pub fn decode(&self, record: u64) -> u32 {
        let stored = (record & self.mask()) >> self.shift;
        // stored never exceeds 2^bits
        stored as u32 * self.factor
    }

    pub fn decode_flag(&self, record: u64) -> bool {
        self.decode(record) != 0
    }
}
