use crate::{
    constants::DAYS_PER_WEEK,
    geometry::compute_geometry_distance,
    geopoint::GeoPoint,
    traffic::road_type::FunctionalClass,
    types::{PatternId, TrafficLinkId},
};

/// Weekly pattern ids, Monday first.
pub type WeeklyPatterns = [PatternId; DAYS_PER_WEEK];

/// Side of a traffic link travelled: `From` follows the digitized geometry, `To` runs against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelDirection {
    From,
    To,
}

impl TravelDirection {
    pub fn from_code(code: &str) -> Option<TravelDirection> {
        match code.trim() {
            "F" | "f" => Some(TravelDirection::From),
            "T" | "t" => Some(TravelDirection::To),
            _ => None,
        }
    }
}

/// Directions a link can be travelled in, the `DIR_TRAVEL` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTravel {
    Both,
    FromOnly,
    ToOnly,
}

impl LinkTravel {
    pub fn from_code(code: &str) -> Option<LinkTravel> {
        match code.trim() {
            "B" | "b" => Some(LinkTravel::Both),
            "F" | "f" => Some(LinkTravel::FromOnly),
            "T" | "t" => Some(LinkTravel::ToOnly),
            _ => None,
        }
    }

    pub fn directions(&self) -> &'static [TravelDirection] {
        match self {
            LinkTravel::Both => &[TravelDirection::From, TravelDirection::To],
            LinkTravel::FromOnly => &[TravelDirection::From],
            LinkTravel::ToOnly => &[TravelDirection::To],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLink {
    id: TrafficLinkId,
    geometry: Vec<GeoPoint>,
    length: f64,
    functional_class: FunctionalClass,
    ramp: bool,
    travel: LinkTravel,
    from_patterns: Option<WeeklyPatterns>,
    to_patterns: Option<WeeklyPatterns>,
}

impl TrafficLink {
    pub fn new(
        id: TrafficLinkId,
        geometry: Vec<GeoPoint>,
        functional_class: FunctionalClass,
        ramp: bool,
        travel: LinkTravel,
    ) -> Self {
        TrafficLink {
            id,
            length: compute_geometry_distance(&geometry),
            geometry,
            functional_class,
            ramp,
            travel,
            from_patterns: None,
            to_patterns: None,
        }
    }

    pub fn id(&self) -> TrafficLinkId {
        self.id
    }

    pub fn geometry(&self) -> &[GeoPoint] {
        &self.geometry
    }

    /// Length of the link in meters
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn functional_class(&self) -> FunctionalClass {
        self.functional_class
    }

    pub fn is_ramp(&self) -> bool {
        self.ramp
    }

    pub fn travel(&self) -> LinkTravel {
        self.travel
    }

    /// Geometry in the order it is travelled in `direction`.
    pub fn directional_geometry(&self, direction: TravelDirection) -> Vec<GeoPoint> {
        match direction {
            TravelDirection::From => self.geometry.clone(),
            TravelDirection::To => self.geometry.iter().rev().copied().collect(),
        }
    }

    pub fn set_patterns(&mut self, direction: TravelDirection, patterns: WeeklyPatterns) {
        match direction {
            TravelDirection::From => self.from_patterns = Some(patterns),
            TravelDirection::To => self.to_patterns = Some(patterns),
        }
    }

    pub fn patterns(&self, direction: TravelDirection) -> Option<&WeeklyPatterns> {
        match direction {
            TravelDirection::From => self.from_patterns.as_ref(),
            TravelDirection::To => self.to_patterns.as_ref(),
        }
    }

    /// Travelled directions that have patterns assigned
    pub fn matchable_directions(&self) -> Vec<TravelDirection> {
        self.travel
            .directions()
            .iter()
            .copied()
            .filter(|direction| self.patterns(*direction).is_some())
            .collect()
    }

    /// Links without a usable geometry or without any pattern cannot carry traffic.
    pub fn is_potential_traffic_segment(&self) -> bool {
        self.geometry.len() >= 2 && self.length > 0.0 && !self.matchable_directions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(travel: LinkTravel) -> TrafficLink {
        TrafficLink::new(
            1,
            vec![GeoPoint::new(4.0, 50.0), GeoPoint::new(4.001, 50.0)],
            FunctionalClass::Class3,
            false,
            travel,
        )
    }

    #[test]
    fn test_to_direction_reverses_geometry() {
        let link = link(LinkTravel::Both);
        let to = link.directional_geometry(TravelDirection::To);

        assert_eq!(to[0], link.geometry()[1]);
        assert_eq!(to[1], link.geometry()[0]);
        assert!((link.length() - 71.5).abs() < 1.0);
    }

    #[test]
    fn test_only_directions_with_patterns_are_matched() {
        let mut link = link(LinkTravel::Both);
        assert!(!link.is_potential_traffic_segment());

        link.set_patterns(TravelDirection::To, [3; DAYS_PER_WEEK]);
        assert_eq!(link.matchable_directions(), vec![TravelDirection::To]);
        assert!(link.is_potential_traffic_segment());

        let mut one_way = self::link(LinkTravel::FromOnly);
        one_way.set_patterns(TravelDirection::To, [3; DAYS_PER_WEEK]);
        assert!(!one_way.is_potential_traffic_segment());
    }
}
