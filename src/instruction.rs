//! Turn-by-turn instruction text.
//!
//! Maps OSRM-style maneuver descriptors (type + optional modifier)
//! to human-readable phrases, and formats the distance to the next
//! maneuver. Pure and platform-agnostic.

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Maneuver categories understood by the instruction table.
///
/// Serialized as the OSRM type string. Unknown strings are kept
/// verbatim in `Other` so they can still be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ManeuverType {
    Turn,
    Depart,
    Arrive,
    NewName,
    Continue,
    Merge,
    OnRamp,
    OffRamp,
    Fork,
    EndOfRoad,
    Roundabout,
    Rotary,
    Other(String),
}

impl ManeuverType {
    pub fn as_str(&self) -> &str {
        match self {
            ManeuverType::Turn => "turn",
            ManeuverType::Depart => "depart",
            ManeuverType::Arrive => "arrive",
            ManeuverType::NewName => "new name",
            ManeuverType::Continue => "continue",
            ManeuverType::Merge => "merge",
            ManeuverType::OnRamp => "on ramp",
            ManeuverType::OffRamp => "off ramp",
            ManeuverType::Fork => "fork",
            ManeuverType::EndOfRoad => "end of road",
            ManeuverType::Roundabout => "roundabout",
            ManeuverType::Rotary => "rotary",
            ManeuverType::Other(s) => s.as_str(),
        }
    }
}

impl Default for ManeuverType {
    fn default() -> Self {
        ManeuverType::Other(String::new())
    }
}

impl From<&str> for ManeuverType {
    // OSRM spells multi-word types with spaces; hyphenated forms are accepted too.
    fn from(s: &str) -> Self {
        match s {
            "turn" => ManeuverType::Turn,
            "depart" => ManeuverType::Depart,
            "arrive" => ManeuverType::Arrive,
            "new name" | "new-name" => ManeuverType::NewName,
            "continue" => ManeuverType::Continue,
            "merge" => ManeuverType::Merge,
            "on ramp" | "on-ramp" => ManeuverType::OnRamp,
            "off ramp" | "off-ramp" => ManeuverType::OffRamp,
            "fork" => ManeuverType::Fork,
            "end of road" | "end-of-road" => ManeuverType::EndOfRoad,
            "roundabout" => ManeuverType::Roundabout,
            "rotary" => ManeuverType::Rotary,
            other => ManeuverType::Other(other.to_string()),
        }
    }
}

impl From<String> for ManeuverType {
    fn from(s: String) -> Self {
        ManeuverType::from(s.as_str())
    }
}

impl From<ManeuverType> for String {
    fn from(t: ManeuverType) -> Self {
        match t {
            ManeuverType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A routing maneuver: what to do, and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    #[serde(rename = "type", default)]
    pub kind: ManeuverType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// `[lng, lat]`, as delivered by the routing backend.
    pub location: [f64; 2],
}

impl Maneuver {
    pub fn new(kind: ManeuverType, modifier: Option<&str>, at: LatLng) -> Self {
        Self {
            kind,
            modifier: modifier.map(str::to_string),
            location: [at.lng, at.lat],
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::from_lng_lat(self.location)
    }

    fn modifier_str(&self) -> &str {
        self.modifier.as_deref().unwrap_or("")
    }
}

/// The instruction currently shown to the traveler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationInstruction {
    pub text: String,
    pub distance_text: String,
    /// Glyph key for the direction icon: modifier, else type, else "continue".
    pub maneuver_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
}

impl NavigationInstruction {
    pub fn new(maneuver: &Maneuver, road_name: Option<&str>, distance_m: f64) -> Self {
        let maneuver_type = match (maneuver.modifier_str(), maneuver.kind.as_str()) {
            ("", "") => "continue",
            ("", kind) => kind,
            (modifier, _) => modifier,
        };

        Self {
            text: generate_instruction(maneuver),
            distance_text: format_distance_text(distance_m),
            maneuver_type: maneuver_type.to_string(),
            road_name: road_name.filter(|n| !n.is_empty()).map(str::to_string),
        }
    }
}

/// Generate the instruction phrase for a maneuver.
pub fn generate_instruction(maneuver: &Maneuver) -> String {
    let modifier = maneuver.modifier_str();

    match &maneuver.kind {
        ManeuverType::Turn => turn_text(modifier),
        ManeuverType::Depart => format!("Head {}", or_straight(modifier)),
        ManeuverType::Arrive => "You have arrived at your destination".to_string(),
        ManeuverType::NewName => "Continue straight".to_string(),
        ManeuverType::Continue => format!("Continue {}", or_straight(modifier)),
        ManeuverType::Merge => join("Merge", modifier),
        ManeuverType::OnRamp => join("Take the ramp", modifier),
        ManeuverType::OffRamp => join("Take the exit", modifier),
        ManeuverType::Fork => join("At the fork, take", modifier),
        ManeuverType::EndOfRoad => join("At the end of the road, turn", modifier),
        ManeuverType::Roundabout => "Enter the roundabout".to_string(),
        ManeuverType::Rotary => "Enter the rotary".to_string(),
        ManeuverType::Other(kind) => match (kind.as_str(), modifier) {
            ("", "") => "Continue".to_string(),
            (kind, modifier) => join(kind, modifier).trim_start().to_string(),
        },
    }
}

fn turn_text(modifier: &str) -> String {
    match modifier {
        "left" => "Turn left".to_string(),
        "right" => "Turn right".to_string(),
        "sharp left" => "Sharp left turn".to_string(),
        "sharp right" => "Sharp right turn".to_string(),
        "slight left" => "Slight left".to_string(),
        "slight right" => "Slight right".to_string(),
        other => join("Turn", other),
    }
}

fn or_straight(modifier: &str) -> &str {
    if modifier.is_empty() {
        "straight"
    } else {
        modifier
    }
}

fn join(phrase: &str, modifier: &str) -> String {
    if modifier.is_empty() {
        phrase.to_string()
    } else {
        format!("{phrase} {modifier}")
    }
}

/// Format the distance to the next maneuver.
pub fn format_distance_text(meters: f64) -> String {
    if meters > 1000.0 {
        format!("In {:.1} km", meters / 1000.0)
    } else {
        format!("In {} m", meters.round() as i64)
    }
}
