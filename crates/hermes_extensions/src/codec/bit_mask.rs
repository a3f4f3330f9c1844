use std::marker::PhantomData;

use crate::error::CodecError;

/// A named flag and the bit it sets in its builder's mask.
pub trait MaskFlag: Copy + 'static {
    const ALL: &'static [Self];

    fn bit(self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitMask<F> {
    bits: u32,
    flags: PhantomData<F>,
}

impl<F: MaskFlag> Default for BitMask<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: MaskFlag> BitMask<F> {
    pub fn empty() -> Self {
        BitMask {
            bits: 0,
            flags: PhantomData,
        }
    }

    /// Ignores bits that do not belong to any flag.
    pub fn from_bits(bits: u32) -> Self {
        let known = F::ALL.iter().fold(0, |mask, flag| mask | flag.bit());

        BitMask {
            bits: bits & known,
            flags: PhantomData,
        }
    }

    pub fn insert(&mut self, flag: F) {
        self.bits |= flag.bit();
    }

    pub fn with(mut self, flag: F) -> Self {
        self.insert(flag);
        self
    }

    pub fn contains(&self, flag: F) -> bool {
        self.bits & flag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn flags(&self) -> impl Iterator<Item = F> + '_ {
        F::ALL.iter().copied().filter(|flag| self.contains(*flag))
    }

    pub fn to_u8(&self, field: &'static str) -> Result<u8, CodecError> {
        u8::try_from(self.bits).map_err(|_| CodecError::ValueTooLarge {
            field,
            value: self.bits,
            max: u32::from(u8::MAX),
        })
    }

    pub fn to_u16(&self, field: &'static str) -> Result<u16, CodecError> {
        u16::try_from(self.bits).map_err(|_| CodecError::ValueTooLarge {
            field,
            value: self.bits,
            max: u32::from(u16::MAX),
        })
    }
}
