// Sensor presentation for K-index readings.
// Maps coordinator readings to the name, unit, icon, and attributes a host displays.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::meteoagent::{Day, KIndex};
use crate::state::RefreshCoordinator;

pub const UNIT_OF_MEASUREMENT: &str = "K";

/// Descriptive band for a K-index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn from_value(value: u8) -> Self {
        match value {
            5.. => Severity::High,
            4 => Severity::Medium,
            1..=3 => Severity::Low,
            0 => Severity::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

/// One displayed K-index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KIndexSensor {
    day: Day,
}

impl KIndexSensor {
    pub fn new(day: Day) -> Self {
        Self { day }
    }

    /// One sensor per forecast day.
    pub fn all() -> [KIndexSensor; 2] {
        Day::ALL.map(KIndexSensor::new)
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn name(&self) -> String {
        format!("MeteoAgent K-index for {}", self.day.title())
    }

    pub fn unique_id(&self) -> String {
        format!("meteoagent_kindex_{}", self.day.as_str())
    }

    pub fn unit_of_measurement(&self) -> &'static str {
        UNIT_OF_MEASUREMENT
    }

    pub fn state_class(&self) -> StateClass {
        StateClass::Measurement
    }

    pub fn native_value(&self, coordinator: &RefreshCoordinator) -> Option<KIndex> {
        coordinator.reading(self.day)
    }

    pub fn icon(&self, value: Option<KIndex>) -> &'static str {
        match value.map(KIndex::value) {
            Some(5..) => "mdi:head-alert-outline",
            Some(4) => "mdi:head-snowflake-outline",
            _ => "mdi:head-heart-outline",
        }
    }

    /// Extra state attributes; empty while no reading is available.
    pub fn attributes(&self, value: Option<KIndex>) -> Value {
        match value {
            Some(index) => json!({ "severity": Severity::from_value(index.value()).as_str() }),
            None => json!({}),
        }
    }

    /// Full displayable state for this sensor.
    pub fn state(&self, coordinator: &RefreshCoordinator) -> SensorState {
        let value = self.native_value(coordinator);
        SensorState {
            unique_id: self.unique_id(),
            name: self.name(),
            value: value.map(KIndex::value),
            unit: UNIT_OF_MEASUREMENT,
            icon: self.icon(value),
            attributes: self.attributes(value),
        }
    }
}

/// Serializable view of a sensor as a host would render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub value: Option<u8>,
    pub unit: &'static str,
    pub icon: &'static str,
    pub attributes: Value,
}
