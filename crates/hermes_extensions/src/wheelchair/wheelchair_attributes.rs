use crate::{
    codec::BitField,
    error::CodecError,
    wheelchair::{
        measurements::KERB_HEIGHT_MAX,
        wheelchair_types::{SMOOTHNESS_MAX, SURFACE_MAX, TRACK_TYPE_MAX},
    },
};

pub const RECORD_BYTES: usize = 5;

const WIDTH_MAX: u32 = 300;
const INCLINE_MAX: u32 = 30;

const HAS_VALUES: BitField = BitField::flag("wheelchair", 0);
const SURFACE: BitField = BitField::new("surface", HAS_VALUES.end(), 5, SURFACE_MAX);
const SMOOTHNESS: BitField = BitField::new("smoothness", SURFACE.end(), 4, SMOOTHNESS_MAX);
const TRACK_TYPE: BitField = BitField::new("tracktype", SMOOTHNESS.end(), 3, TRACK_TYPE_MAX);
const INCLINE: BitField = BitField::new("incline", TRACK_TYPE.end(), 5, INCLINE_MAX);
const KERB_HEIGHT: BitField = BitField::new("kerb height", INCLINE.end(), 4, KERB_HEIGHT_MAX);
const WIDTH: BitField = BitField::with_factor("width", KERB_HEIGHT.end(), 5, 10, WIDTH_MAX);
const SIDE: BitField = BitField::new("side", WIDTH.end(), 2, 2);
const HAS_KERB_HEIGHT: BitField = BitField::flag("has kerb height", SIDE.end());
const HAS_INCLINE: BitField = BitField::flag("has incline", HAS_KERB_HEIGHT.end());
const SURFACE_QUALITY_KNOWN: BitField =
    BitField::flag("surface quality known", HAS_INCLINE.end());
const SUITABLE: BitField = BitField::flag("suitable", SURFACE_QUALITY_KNOWN.end());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Unknown,
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Unknown => Side::Unknown,
        }
    }

    fn code(&self) -> u32 {
        match self {
            Side::Unknown => 0,
            Side::Left => 1,
            Side::Right => 2,
        }
    }

    fn from_code(code: u32) -> Side {
        match code {
            1 => Side::Left,
            2 => Side::Right,
            _ => Side::Unknown,
        }
    }
}

/// Accessibility of a footway, or of one sidewalk of a road.
///
/// Surface, smoothness and track type are ranked codes where 0 means unknown and a higher code is
/// worse. Width and kerb height are in centimeters, incline in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelchairAttributes {
    pub surface: u8,
    pub smoothness: u8,
    pub track_type: u8,
    pub width: Option<u32>,
    pub incline: Option<u8>,
    pub kerb_height: Option<u8>,
    pub side: Side,
    pub surface_quality_known: bool,
    pub suitable: bool,
}

impl WheelchairAttributes {
    pub fn has_values(&self) -> bool {
        *self != WheelchairAttributes::default()
    }

    /// Whether surface, smoothness or track type is known
    pub fn has_classification(&self) -> bool {
        self.surface > 0 || self.smoothness > 0 || self.track_type > 0
    }

    /// Values set on `other` replace the ones of `self`.
    pub fn merge(&self, other: &WheelchairAttributes) -> WheelchairAttributes {
        let pick = |mine: u8, theirs: u8| if theirs > 0 { theirs } else { mine };

        WheelchairAttributes {
            surface: pick(self.surface, other.surface),
            smoothness: pick(self.smoothness, other.smoothness),
            track_type: pick(self.track_type, other.track_type),
            width: other.width.or(self.width),
            incline: other.incline.or(self.incline),
            kerb_height: other.kerb_height.or(self.kerb_height),
            side: if other.side == Side::Unknown {
                self.side
            } else {
                other.side
            },
            surface_quality_known: self.surface_quality_known || other.surface_quality_known,
            suitable: self.suitable || other.suitable,
        }
    }

    pub fn encode(&self) -> Result<[u8; RECORD_BYTES], CodecError> {
        if !self.has_values() {
            return Ok([0; RECORD_BYTES]);
        }

        let mut record = 0_u64;
        HAS_VALUES.encode_flag(true, &mut record)?;
        SURFACE.encode(u32::from(self.surface), &mut record)?;
        SMOOTHNESS.encode(u32::from(self.smoothness), &mut record)?;
        TRACK_TYPE.encode(u32::from(self.track_type), &mut record)?;

        if let Some(incline) = self.incline {
            HAS_INCLINE.encode_flag(true, &mut record)?;
            INCLINE.encode(u32::from(incline), &mut record)?;
        }

        if let Some(kerb_height) = self.kerb_height {
            HAS_KERB_HEIGHT.encode_flag(true, &mut record)?;
            KERB_HEIGHT.encode(u32::from(kerb_height), &mut record)?;
        }

        if let Some(width) = self.width {
            WIDTH.encode(width, &mut record)?;
        }

        SIDE.encode(self.side.code(), &mut record)?;
        SURFACE_QUALITY_KNOWN.encode_flag(self.surface_quality_known, &mut record)?;
        SUITABLE.encode_flag(self.suitable, &mut record)?;

        let mut bytes = [0; RECORD_BYTES];
        bytes.copy_from_slice(&record.to_le_bytes()[..RECORD_BYTES]);
        Ok(bytes)
    }

    /// `None` for the all zero record of edges without attributes.
    pub fn decode(bytes: &[u8; RECORD_BYTES]) -> Option<WheelchairAttributes> {
        let mut buffer = [0; 8];
        buffer[..RECORD_BYTES].copy_from_slice(bytes);
        let record = u64::from_le_bytes(buffer);

        if !HAS_VALUES.decode_flag(record) {
            return None;
        }

        let width = WIDTH.decode(record);

        // every field decodes within its declared maximum
        Some(WheelchairAttributes {
            surface: SURFACE.decode(record) as u8,
            smoothness: SMOOTHNESS.decode(record) as u8,
            track_type: TRACK_TYPE.decode(record) as u8,
            width: (width > 0).then_some(width),
            incline: HAS_INCLINE
                .decode_flag(record)
                .then(|| INCLINE.decode(record) as u8),
            kerb_height: HAS_KERB_HEIGHT
                .decode_flag(record)
                .then(|| KERB_HEIGHT.decode(record) as u8),
            side: Side::from_code(SIDE.decode(record)),
            surface_quality_known: SURFACE_QUALITY_KNOWN.decode_flag(record),
            suitable: SUITABLE.decode_flag(record),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_fits_in_the_record() {
        assert_eq!(SUITABLE.end(), 33);
        assert!(SUITABLE.end() as usize <= RECORD_BYTES * 8);
    }

    #[test]
    fn test_encoding_keeps_every_field() {
        let attributes = WheelchairAttributes {
            surface: 30,
            smoothness: 8,
            track_type: 5,
            width: Some(120),
            incline: Some(0),
            kerb_height: Some(15),
            side: Side::Right,
            surface_quality_known: true,
            suitable: true,
        };

        let bytes = attributes.encode().unwrap();
        assert_eq!(WheelchairAttributes::decode(&bytes), Some(attributes));
    }

    #[test]
    fn test_width_is_stored_in_decimeters() {
        let attributes = WheelchairAttributes {
            width: Some(95),
            ..Default::default()
        };

        let decoded = WheelchairAttributes::decode(&attributes.encode().unwrap()).unwrap();
        assert_eq!(decoded.width, Some(90));
    }

    #[test]
    fn test_empty_attributes_are_unknown() {
        let bytes = WheelchairAttributes::default().encode().unwrap();
        assert_eq!(bytes, [0; RECORD_BYTES]);
        assert_eq!(WheelchairAttributes::decode(&bytes), None);
    }

    #[test]
    fn test_out_of_range_field_is_rejected() {
        let attributes = WheelchairAttributes {
            incline: Some(31),
            ..Default::default()
        };

        assert!(matches!(
            attributes.encode(),
            Err(CodecError::ValueTooLarge { field: "incline", .. })
        ));
    }

    #[test]
    fn test_merge_prefers_side_values() {
        let general = WheelchairAttributes {
            surface: 2,
            width: Some(200),
            surface_quality_known: true,
            ..Default::default()
        };
        let left = WheelchairAttributes {
            surface: 13,
            kerb_height: Some(3),
            ..Default::default()
        };

        let merged = general.merge(&left);
        assert_eq!(merged.surface, 13);
        assert_eq!(merged.width, Some(200));
        assert_eq!(merged.kerb_height, Some(3));
        assert!(merged.surface_quality_known);
    }
}
