/// OSM road classes relevant to traffic matching, stored per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RoadType {
    Ignore = 0,
    Motorway = 1,
    MotorwayLink = 2,
    Motorroad = 3,
    Trunk = 4,
    TrunkLink = 5,
    Primary = 6,
    PrimaryLink = 7,
    Secondary = 8,
    SecondaryLink = 9,
    Tertiary = 10,
    TertiaryLink = 11,
    Residential = 12,
    Unclassified = 13,
}

impl RoadType {
    pub fn from_highway(highway: &str) -> RoadType {
        match highway.to_lowercase().as_str() {
            "motorway" => RoadType::Motorway,
            "motorway_link" => RoadType::MotorwayLink,
            "motorroad" => RoadType::Motorroad,
            "trunk" => RoadType::Trunk,
            "trunk_link" => RoadType::TrunkLink,
            "primary" => RoadType::Primary,
            "primary_link" => RoadType::PrimaryLink,
            "secondary" => RoadType::Secondary,
            "secondary_link" => RoadType::SecondaryLink,
            "tertiary" => RoadType::Tertiary,
            "tertiary_link" => RoadType::TertiaryLink,
            "residential" => RoadType::Residential,
            "unclassified" => RoadType::Unclassified,
            _ => RoadType::Ignore,
        }
    }

    pub fn from_code(code: u8) -> RoadType {
        match code {
            1 => RoadType::Motorway,
            2 => RoadType::MotorwayLink,
            3 => RoadType::Motorroad,
            4 => RoadType::Trunk,
            5 => RoadType::TrunkLink,
            6 => RoadType::Primary,
            7 => RoadType::PrimaryLink,
            8 => RoadType::Secondary,
            9 => RoadType::SecondaryLink,
            10 => RoadType::Tertiary,
            11 => RoadType::TertiaryLink,
            12 => RoadType::Residential,
            13 => RoadType::Unclassified,
            _ => RoadType::Ignore,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn is_link(&self) -> bool {
        matches!(
            self,
            RoadType::MotorwayLink
                | RoadType::TrunkLink
                | RoadType::PrimaryLink
                | RoadType::SecondaryLink
                | RoadType::TertiaryLink
        )
    }

    pub fn functional_class(&self) -> Option<FunctionalClass> {
        match self {
            RoadType::Ignore => None,
            RoadType::Motorway
            | RoadType::MotorwayLink
            | RoadType::Motorroad
            | RoadType::Trunk
            | RoadType::TrunkLink => Some(FunctionalClass::Class1),
            RoadType::Primary | RoadType::PrimaryLink => Some(FunctionalClass::Class2),
            RoadType::Secondary | RoadType::SecondaryLink => Some(FunctionalClass::Class3),
            RoadType::Tertiary | RoadType::TertiaryLink => Some(FunctionalClass::Class4),
            RoadType::Residential => Some(FunctionalClass::Class5),
            RoadType::Unclassified => Some(FunctionalClass::Unclassified),
        }
    }
}

/// Road importance of a traffic link, class 1 being the most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionalClass {
    Class1,
    Class2,
    Class3,
    Class4,
    Class5,
    Unclassified,
}

impl FunctionalClass {
    pub fn from_code(code: u8) -> Option<FunctionalClass> {
        match code {
            1 => Some(FunctionalClass::Class1),
            2 => Some(FunctionalClass::Class2),
            3 => Some(FunctionalClass::Class3),
            4 => Some(FunctionalClass::Class4),
            5 => Some(FunctionalClass::Class5),
            _ => None,
        }
    }

    pub fn higher(&self) -> FunctionalClass {
        match self {
            FunctionalClass::Class1 | FunctionalClass::Class2 => FunctionalClass::Class1,
            FunctionalClass::Class3 => FunctionalClass::Class2,
            FunctionalClass::Class4 => FunctionalClass::Class3,
            FunctionalClass::Class5 => FunctionalClass::Class4,
            FunctionalClass::Unclassified => FunctionalClass::Class5,
        }
    }

    pub fn lower(&self) -> FunctionalClass {
        match self {
            FunctionalClass::Class1 => FunctionalClass::Class2,
            FunctionalClass::Class2 => FunctionalClass::Class3,
            FunctionalClass::Class3 => FunctionalClass::Class4,
            FunctionalClass::Class4 => FunctionalClass::Class5,
            FunctionalClass::Class5 | FunctionalClass::Unclassified => {
                FunctionalClass::Unclassified
            }
        }
    }

    /// Classes tried in turn when matching a link of this class: the class itself, the next
    /// higher and lower ones, unclassified roads, and class 5 last since it matches too easily.
    pub fn fallback_sequence(&self) -> Vec<FunctionalClass> {
        let mut sequence = vec![*self];

        if *self != FunctionalClass::Class1 {
            sequence.push(self.higher());
        }
        if *self != FunctionalClass::Unclassified {
            sequence.push(self.lower());
            sequence.push(FunctionalClass::Unclassified);
        }
        if matches!(self, FunctionalClass::Unclassified | FunctionalClass::Class1) {
            sequence.push(FunctionalClass::Class5);
        }

        let mut seen = Vec::with_capacity(sequence.len());
        sequence.retain(|class| {
            if seen.contains(class) {
                false
            } else {
                seen.push(*class);
                true
            }
        });
        sequence
    }

    /// Whether an edge of `road_type` may carry traffic of a link of this class. Ramps only match
    /// link roads.
    pub fn accepts(&self, road_type: RoadType, ramp: bool) -> bool {
        if ramp && !road_type.is_link() {
            return false;
        }
        road_type.functional_class() == Some(*self)
    }
}
