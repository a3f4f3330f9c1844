/// Result of looking up an optional tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Absent,
    Known(u8),
    Unrecognized,
}

/// Maps enumerated tag values to small integers.
///
/// The `unrecognized` code is reserved for values that are present but not in the table, so it
/// never collides with a known entry or with the absence of a value.
#[derive(Debug, Clone, Copy)]
pub struct LookupTable {
    entries: &'static [(&'static str, u8)],
    unrecognized: u8,
}

impl LookupTable {
    pub const fn new(entries: &'static [(&'static str, u8)], unrecognized: u8) -> Self {
        LookupTable {
            entries,
            unrecognized,
        }
    }

    pub fn lookup(&self, value: Option<&str>) -> Lookup {
        let Some(value) = value else {
            return Lookup::Absent;
        };

        let value = value.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| *name == value)
            .map_or(Lookup::Unrecognized, |(_, code)| Lookup::Known(*code))
    }

    /// Code to store, `absent` when the value is missing.
    pub fn encode(&self, value: Option<&str>, absent: u8) -> u8 {
        match self.lookup(value) {
            Lookup::Absent => absent,
            Lookup::Known(code) => code,
            Lookup::Unrecognized => self.unrecognized,
        }
    }

    /// First name registered for `code`
    pub fn decode(&self, code: u8) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, entry)| *entry == code)
            .map(|(name, _)| *name)
    }

    pub fn unrecognized(&self) -> u8 {
        self.unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMOOTHNESS: LookupTable =
        LookupTable::new(&[("excellent", 1), ("good", 2), ("bad", 4)], 15);

    #[test]
    fn test_absent_and_unrecognized_are_distinct() {
        assert_eq!(SMOOTHNESS.lookup(None), Lookup::Absent);
        assert_eq!(SMOOTHNESS.lookup(Some("Good ")), Lookup::Known(2));
        assert_eq!(SMOOTHNESS.lookup(Some("wobbly")), Lookup::Unrecognized);

        assert_eq!(SMOOTHNESS.encode(None, 0), 0);
        assert_eq!(SMOOTHNESS.encode(Some("wobbly"), 0), 15);
    }

    #[test]
    fn test_decode_returns_the_category() {
        for name in ["excellent", "good", "bad"] {
            let code = SMOOTHNESS.encode(Some(name), 0);
            assert_eq!(SMOOTHNESS.decode(code), Some(name));
        }
        assert_eq!(SMOOTHNESS.decode(15), None);
    }
}
