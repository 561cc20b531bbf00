//! Body classification and identification of the major solar system bodies

use crate::OrreryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enum representing the major solar system bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    pub const ALL: [Body; 11] = [
        Body::Sun,
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Moon,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    /// Get the body's name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Earth => "Earth",
            Body::Moon => "Moon",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
        }
    }

    /// Identify a major body by its English name
    pub fn from_name(name: &str) -> Option<Body> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// Classification of a body, driving photometry and shadow handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlanetType {
    Star,
    Planet,
    Moon,
    Observer,
    Artificial,
    Asteroid,
    Plutino,
    Comet,
    DwarfPlanet,
    Cubewano,
    ScatteredDiscObject,
    OortCloudObject,
    InterstellarObject,
    Sednoid,
    #[default]
    Undefined,
}

impl PlanetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanetType::Star => "star",
            PlanetType::Planet => "planet",
            PlanetType::Moon => "moon",
            PlanetType::Observer => "observer",
            PlanetType::Artificial => "artificial",
            PlanetType::Asteroid => "asteroid",
            PlanetType::Plutino => "plutino",
            PlanetType::Comet => "comet",
            PlanetType::DwarfPlanet => "dwarf planet",
            PlanetType::Cubewano => "cubewano",
            PlanetType::ScatteredDiscObject => "scattered disc object",
            PlanetType::OortCloudObject => "Oort cloud object",
            PlanetType::InterstellarObject => "interstellar object",
            PlanetType::Sednoid => "sednoid",
            PlanetType::Undefined => "undefined",
        }
    }

    /// Minor planets use the H,G magnitude system when H and G are known
    pub fn is_minor_planet(&self) -> bool {
        matches!(
            self,
            PlanetType::Asteroid
                | PlanetType::Plutino
                | PlanetType::DwarfPlanet
                | PlanetType::Cubewano
                | PlanetType::ScatteredDiscObject
                | PlanetType::OortCloudObject
                | PlanetType::Sednoid
        )
    }

    pub fn is_comet(&self) -> bool {
        matches!(self, PlanetType::Comet | PlanetType::InterstellarObject)
    }
}

impl fmt::Display for PlanetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanetType {
    type Err = OrreryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [
            PlanetType::Star,
            PlanetType::Planet,
            PlanetType::Moon,
            PlanetType::Observer,
            PlanetType::Artificial,
            PlanetType::Asteroid,
            PlanetType::Plutino,
            PlanetType::Comet,
            PlanetType::DwarfPlanet,
            PlanetType::Cubewano,
            PlanetType::ScatteredDiscObject,
            PlanetType::OortCloudObject,
            PlanetType::InterstellarObject,
            PlanetType::Sednoid,
            PlanetType::Undefined,
        ];
        all.into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OrreryError::InvalidConfiguration(format!("unknown body type '{s}'")))
    }
}

impl TryFrom<String> for PlanetType {
    type Error = OrreryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PlanetType> for String {
    fn from(t: PlanetType) -> Self {
        t.as_str().to_string()
    }
}
