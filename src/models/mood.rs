use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Self-reported feeling attached to a completed run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Energized,
    Accomplished,
    Peaceful,
    Happy,
    Grateful,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Energized,
        Mood::Accomplished,
        Mood::Peaceful,
        Mood::Happy,
        Mood::Grateful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Energized => "energized",
            Mood::Accomplished => "accomplished",
            Mood::Peaceful => "peaceful",
            Mood::Happy => "happy",
            Mood::Grateful => "grateful",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mood::Energized => "Energized",
            Mood::Accomplished => "Accomplished",
            Mood::Peaceful => "Peaceful",
            Mood::Happy => "Happy",
            Mood::Grateful => "Grateful",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownMood(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Peaceful".parse::<Mood>(), Ok(Mood::Peaceful));
        assert_eq!("  grateful ".parse::<Mood>(), Ok(Mood::Grateful));
    }

    #[test]
    fn rejects_moods_outside_the_set() {
        assert_eq!(
            "tired".parse::<Mood>(),
            Err(ValidationError::UnknownMood("tired".into()))
        );
    }

    #[test]
    fn serializes_as_lowercase_tag() {
        let json = serde_json::to_string(&Mood::Accomplished).unwrap();
        assert_eq!(json, "\"accomplished\"");
    }
}
