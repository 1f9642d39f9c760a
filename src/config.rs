use crate::error::{ConfigError, RequestError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub const DEFAULT_SESSION_CAP: u32 = 10;
pub const MAX_SESSION_CAP: u32 = 50;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Upper bound on sessions generated per class in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SessionCap(u32);

impl SessionCap {
    pub fn new(value: u32) -> Result<Self, RequestError> {
        if (1..=MAX_SESSION_CAP).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RequestError::InvalidCap { max: MAX_SESSION_CAP })
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for SessionCap {
    fn default() -> Self {
        Self(DEFAULT_SESSION_CAP)
    }
}

impl TryFrom<u32> for SessionCap {
    type Error = RequestError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionCap> for u32 {
    fn from(value: SessionCap) -> Self {
        value.0
    }
}

/// Hour type code -> preferred room type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPreference {
    pub hour_type: String,
    pub room_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Hour type used when a course unit declares no requirements.
    pub default_hour_type: String,
    pub room_preferences: Vec<RoomPreference>,
    /// Preferred room type for hour types missing from the table.
    pub fallback_room_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_hour_type: "T".to_string(),
            room_preferences: vec![RoomPreference {
                hour_type: "PL".to_string(),
                room_type: "LAB".to_string(),
            }],
            fallback_room_type: "TEO".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn preferred_room_type(&self, hour_type: &str) -> &str {
        self.room_preferences
            .iter()
            .find(|p| p.hour_type == hour_type)
            .map(|p| p.room_type.as_str())
            .unwrap_or(&self.fallback_room_type)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// JSON catalog snapshot to serve; an empty catalog when unset.
    pub catalog_path: Option<String>,
    pub generation: GenerationConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = lookup("TIMETABLE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .parse()
            .map_err(|source| ConfigError::BindAddr { value: bind, source })?;

        let mut generation = GenerationConfig::default();
        if let Some(code) = lookup("TIMETABLE_DEFAULT_HOUR_TYPE").filter(|c| !c.is_empty()) {
            generation.default_hour_type = code;
        }

        Ok(Self {
            bind_addr,
            catalog_path: lookup("TIMETABLE_CATALOG").filter(|p| !p.is_empty()),
            generation,
        })
    }
}
