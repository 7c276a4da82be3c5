use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Mode of transport from a step to the following one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Bike,
    Train,
    Bus,
    Ferry,
    Plane,
    Walk,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bike => "bike",
            Self::Train => "train",
            Self::Bus => "bus",
            Self::Ferry => "ferry",
            Self::Plane => "plane",
            Self::Walk => "walk",
        };
        f.write_str(s)
    }
}

impl FromStr for TransportMode {
    type Err = TransportModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bike" => Ok(Self::Bike),
            "train" => Ok(Self::Train),
            "bus" => Ok(Self::Bus),
            "ferry" => Ok(Self::Ferry),
            "plane" => Ok(Self::Plane),
            "walk" => Ok(Self::Walk),
            other => Err(TransportModeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`TransportMode`] string.
#[derive(Debug, Clone)]
pub struct TransportModeParseError(pub String);

impl fmt::Display for TransportModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transport mode: {:?}", self.0)
    }
}

impl std::error::Error for TransportModeParseError {}

// ---------------------------------------------------------------------------

/// Difficulty rating of a cycling leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RouteDifficulty {
    Easy,
    Moderate,
    Hard,
    VeryHard,
}

impl fmt::Display for RouteDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Easy => "easy",
            Self::Moderate => "moderate",
            Self::Hard => "hard",
            Self::VeryHard => "very_hard",
        };
        f.write_str(s)
    }
}

impl FromStr for RouteDifficulty {
    type Err = RouteDifficultyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "moderate" => Ok(Self::Moderate),
            "hard" => Ok(Self::Hard),
            "very_hard" => Ok(Self::VeryHard),
            other => Err(RouteDifficultyParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`RouteDifficulty`] string.
#[derive(Debug, Clone)]
pub struct RouteDifficultyParseError(pub String);

impl fmt::Display for RouteDifficultyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid route difficulty: {:?}", self.0)
    }
}

impl std::error::Error for RouteDifficultyParseError {}

// ---------------------------------------------------------------------------

/// Category of a step activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Sightseeing,
    Food,
    Lodging,
    Maintenance,
    Rest,
    Other,
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sightseeing => "sightseeing",
            Self::Food => "food",
            Self::Lodging => "lodging",
            Self::Maintenance => "maintenance",
            Self::Rest => "rest",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for ActivityCategory {
    type Err = ActivityCategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sightseeing" => Ok(Self::Sightseeing),
            "food" => Ok(Self::Food),
            "lodging" => Ok(Self::Lodging),
            "maintenance" => Ok(Self::Maintenance),
            "rest" => Ok(Self::Rest),
            "other" => Ok(Self::Other),
            other => Err(ActivityCategoryParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ActivityCategory`] string.
#[derive(Debug, Clone)]
pub struct ActivityCategoryParseError(pub String);

impl fmt::Display for ActivityCategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid activity category: {:?}", self.0)
    }
}

impl std::error::Error for ActivityCategoryParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A destination -- a place one or more steps are bound to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Destination {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A step -- one day (or leg) of the itinerary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Step {
    pub id: i64,
    pub destination_id: i64,
    pub date: NaiveDate,
    pub position: i32,
    pub notes: Option<String>,
    pub transport_mode: Option<TransportMode>,
    pub transport_duration_min: Option<i32>,
    pub transport_distance_km: Option<f64>,
    pub bike_distance_km: Option<f64>,
    pub bike_difficulty: Option<RouteDifficulty>,
    pub bike_waypoints: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// An activity -- an ordered sub-event within a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: i64,
    pub step_id: i64,
    pub name: String,
    pub category: Option<ActivityCategory>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub position: i32,
}

/// A step joined with its destination (for the itinerary views).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepWithDestination {
    // Step fields
    pub id: i64,
    pub destination_id: i64,
    pub date: NaiveDate,
    pub position: i32,
    pub notes: Option<String>,
    pub transport_mode: Option<TransportMode>,
    pub transport_duration_min: Option<i32>,
    pub transport_distance_km: Option<f64>,
    pub bike_distance_km: Option<f64>,
    pub bike_difficulty: Option<RouteDifficulty>,
    pub bike_waypoints: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    // Destination fields
    pub destination_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub destination_category: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
