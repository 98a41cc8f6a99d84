use serde::{Deserialize, Serialize};

/// Draw and Delete are mutually exclusive; Idle means neither is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    Idle,
    Draw,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeType {
    #[default]
    Distance,
    Time,
}

impl RangeType {
    /// Value of the `range_type` query parameter and the derived `measure` property.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Cycling,
    Walking,
    Accessibility,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [
        Self::Driving,
        Self::Cycling,
        Self::Walking,
        Self::Accessibility,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Driving => "Driving",
            Self::Cycling => "Cycling",
            Self::Walking => "Walking",
            Self::Accessibility => "Accessibility",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[serde(rename = "m")]
    Meters,
    #[default]
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
}

impl DistanceUnit {
    const METERS_PER_MILE: f64 = 1609.34;
    const SQ_MILES_PER_SQ_KM: f64 = 0.386_102;

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }

    pub const fn area_label(self) -> &'static str {
        match self {
            Self::Meters => "m²",
            Self::Kilometers => "km²",
            Self::Miles => "mi²",
        }
    }

    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            Self::Meters => meters,
            Self::Kilometers => meters / 1000.0,
            Self::Miles => meters / Self::METERS_PER_MILE,
        }
    }

    pub fn from_square_km(self, square_km: f64) -> f64 {
        match self {
            Self::Meters => square_km * 1_000_000.0,
            Self::Kilometers => square_km,
            Self::Miles => square_km * Self::SQ_MILES_PER_SQ_KM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub mode: ControlMode,
    pub range_type: RangeType,
    pub travel_mode: TravelMode,
    pub draw_multiple: bool,
    pub show_intervals: bool,
    /// Selected range in the configured distance unit, or in minutes.
    pub range_value: f64,
}
