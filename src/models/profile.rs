use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown for runners with no profile or no usable name.
pub const FALLBACK_NAME: &str = "Runner";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Profile {
    /// "First Last", else "@username", else a generic name.
    pub fn display_name(&self) -> String {
        let full_name = [non_blank(&self.first_name), non_blank(&self.last_name)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        if !full_name.is_empty() {
            return full_name;
        }

        match non_blank(&self.username) {
            Some(username) => format!("@{username}"),
            None => FALLBACK_NAME.to_string(),
        }
    }

    /// Up to two uppercase initials for the avatar badge.
    pub fn initials(&self) -> String {
        initials_for(&self.display_name())
    }
}

pub fn initials_for(name: &str) -> String {
    name.trim_start_matches('@')
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
