//! Sensor readings and the tracked parameter set
//!
//! A [`Reading`] is what the ingestion side hands us; a [`StoredReading`] is
//! the same record once the history store has stamped it with its ingestion
//! time. Numeric fields are optional: anything that is not a finite JSON
//! number is treated as absent rather than as zero.

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::MilkTrendError;

/// Sensor parameter tracked by the analysis engine
#[derive(
    ValueEnum, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    /// Acidity
    Ph,
    /// Temperature (°C)
    Temperature,
    /// Turbidity (NTU)
    Turbidity,
    /// Total dissolved solids (ppm)
    Tds,
    /// Dissolved-gas proxy (ppm)
    Gas,
}

impl Parameter {
    /// All tracked parameters, in report order
    pub const ALL: [Parameter; 5] = [
        Parameter::Ph,
        Parameter::Temperature,
        Parameter::Turbidity,
        Parameter::Tds,
        Parameter::Gas,
    ];

    /// Wire name of the parameter
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ph => "ph",
            Self::Temperature => "temperature",
            Self::Turbidity => "turbidity",
            Self::Tds => "tds",
            Self::Gas => "gas",
        }
    }

    /// Read this parameter from a reading
    pub fn value(&self, reading: &Reading) -> Option<f64> {
        match self {
            Self::Ph => reading.ph,
            Self::Temperature => reading.temperature,
            Self::Turbidity => reading.turbidity,
            Self::Tds => reading.tds,
            Self::Gas => reading.gas,
        }
    }

    /// Every unordered pair drawn from `parameters`, in the order given
    pub fn pairs(parameters: &[Parameter]) -> Vec<(Parameter, Parameter)> {
        let mut pairs = Vec::new();
        for (i, &a) in parameters.iter().enumerate() {
            for &b in &parameters[i + 1..] {
                if a != b {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One snapshot of sensor values plus optional context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub turbidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub tds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub gas: Option<f64>,
    /// Cattle breed the milk came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cattle_type: Option<String>,
    /// Season at collection time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    /// Score assigned upstream by the grading engine, when it ran
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl Reading {
    /// Empty reading
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for one parameter
    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        self.set(parameter, Some(value));
        self
    }

    /// Set or clear one parameter. Non-finite values are stored as absent.
    pub fn set(&mut self, parameter: Parameter, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        match parameter {
            Parameter::Ph => self.ph = value,
            Parameter::Temperature => self.temperature = value,
            Parameter::Turbidity => self.turbidity = value,
            Parameter::Tds => self.tds = value,
            Parameter::Gas => self.gas = value,
        }
    }

    /// Parse one reading or an array of readings from a JSON document
    pub fn parse_batch(input: &str) -> crate::error::Result<Vec<Reading>> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| MilkTrendError::InvalidReading(e.to_string()))?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            obj @ serde_json::Value::Object(_) => vec![obj],
            other => {
                return Err(MilkTrendError::InvalidReading(format!(
                    "expected an object or an array of objects, got {}",
                    other
                )))
            }
        };

        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| MilkTrendError::InvalidReading(e.to_string()))
            })
            .collect()
    }
}

impl AsRef<Reading> for Reading {
    fn as_ref(&self) -> &Reading {
        self
    }
}

/// A reading after ingestion, stamped with the time it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    #[serde(flatten)]
    pub reading: Reading,
    /// Ingestion time, epoch milliseconds
    pub timestamp: i64,
    /// Ingestion time, RFC 3339 UTC
    pub date: String,
}

impl StoredReading {
    /// Stamp a reading with an ingestion time
    pub fn stamp(reading: Reading, timestamp: i64) -> Self {
        Self {
            reading,
            timestamp,
            date: format_millis(timestamp),
        }
    }
}

impl AsRef<Reading> for StoredReading {
    fn as_ref(&self) -> &Reading {
        &self.reading
    }
}

/// Format epoch milliseconds as an RFC 3339 UTC string
pub fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_pairs() {
        let pairs = Parameter::pairs(&Parameter::ALL);
        assert_eq!(pairs.len(), 10);
        assert_eq!(pairs[0], (Parameter::Ph, Parameter::Temperature));
        assert_eq!(pairs[9], (Parameter::Tds, Parameter::Gas));

        let subset = Parameter::pairs(&[Parameter::Gas, Parameter::Ph, Parameter::Gas]);
        assert_eq!(subset, vec![(Parameter::Gas, Parameter::Ph), (Parameter::Ph, Parameter::Gas)]);
    }

    #[test]
    fn test_non_numeric_fields_are_absent() {
        let json = r#"{"ph": "acidic", "temperature": 4.5, "tds": null, "gas": true, "season": "summer"}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.ph, None);
        assert_eq!(reading.temperature, Some(4.5));
        assert_eq!(reading.tds, None);
        assert_eq!(reading.gas, None);
        assert_eq!(reading.turbidity, None);
        assert_eq!(reading.season.as_deref(), Some("summer"));
    }

    #[test]
    fn test_stored_reading_is_flat() {
        let stored = StoredReading::stamp(Reading::new().with(Parameter::Ph, 6.6), 0);
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["ph"], 6.6);
        assert_eq!(value["timestamp"], 0);
        assert_eq!(value["date"], "1970-01-01T00:00:00.000Z");

        let back: StoredReading = serde_json::from_value(value).unwrap();
        assert_eq!(back, stored);
    }

    #[test]
    fn test_parse_batch() {
        let one = Reading::parse_batch(r#"{"ph": 6.7}"#).unwrap();
        assert_eq!(one.len(), 1);

        let many =
            Reading::parse_batch(r#"[{"ph": 6.7}, {"gas": 120, "cattleType": "jersey"}]"#).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].gas, Some(120.0));
        assert_eq!(many[1].cattle_type.as_deref(), Some("jersey"));

        assert!(Reading::parse_batch("42").is_err());
        assert!(Reading::parse_batch("not json").is_err());
    }

    #[test]
    fn test_set_rejects_non_finite() {
        let reading = Reading::new().with(Parameter::Gas, f64::NAN);
        assert_eq!(reading.gas, None);
    }
}
