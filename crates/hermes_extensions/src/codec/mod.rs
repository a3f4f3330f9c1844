//! Primitives used by the extension stores to pack tag derived values into a few bits.

pub mod bit_field;
pub mod bit_mask;
pub mod clamped_value;
pub mod lookup_table;

pub use bit_field::BitField;
pub use bit_mask::{BitMask, MaskFlag};
pub use clamped_value::ClampedValue;
pub use lookup_table::{Lookup, LookupTable};
