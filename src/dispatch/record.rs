//! Alert records and the store path they arrive on.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::DispatchError;

/// Location of an alert record in the append-only store: `{collection}/{device_id}/{alert_id}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlertPath {
    /// Device that raised the alert.
    pub device_id: String,
    /// Alert id, unique per device.
    pub alert_id: String,
}

impl AlertPath {
    /// Parses `path` against `collection`. A single leading `/` is accepted.
    ///
    /// ```
    /// use agentvisor::dispatch::AlertPath;
    ///
    /// let p = AlertPath::parse("/sos_alerts/d1/a1", "sos_alerts").unwrap();
    /// assert_eq!(p.device_id, "d1");
    /// assert!(AlertPath::parse("sos_alerts/d1", "sos_alerts").is_err());
    /// ```
    pub fn parse(path: &str, collection: &str) -> Result<Self, DispatchError> {
        let invalid = || DispatchError::InvalidPath {
            path: path.to_string(),
            collection: collection.to_string(),
        };

        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(device), Some(alert), None)
                if c == collection && !device.is_empty() && !alert.is_empty() =>
            {
                Ok(Self {
                    device_id: device.to_string(),
                    alert_id: alert.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for AlertPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_id, self.alert_id)
    }
}

/// Geolocation attached to an alert. Either field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
}

/// One appended alert, as written by the device.
///
/// Written by an untrusted producer: every field is optional and unknown
/// fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AlertRecord {
    #[serde(default, rename = "deviceId", deserialize_with = "lenient_string")]
    pub device_id: Option<String>,
    #[serde(default, rename = "alertId", deserialize_with = "lenient_string")]
    pub alert_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_location")]
    pub location: Option<Location>,
}

impl AlertRecord {
    /// Decodes a record from raw JSON. Anything but a JSON object is rejected.
    pub fn from_value(value: Value) -> Result<Self, DispatchError> {
        if !value.is_object() {
            return Err(DispatchError::Decode {
                details: format!("alert record must be an object, got {}", type_name(&value)),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Latitude as notification text (`""` when absent).
    pub fn latitude_text(&self) -> String {
        coordinate_text(self.location.as_ref().and_then(|l| l.latitude.as_ref()))
    }

    /// Longitude as notification text (`""` when absent).
    pub fn longitude_text(&self) -> String {
        coordinate_text(self.location.as_ref().and_then(|l| l.longitude.as_ref()))
    }
}

/// Renders one coordinate.
///
/// Floats keep their decimal point (`41.0`), integers print as-is, strings
/// pass through; any other value, or none, becomes `""`.
pub fn coordinate_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(float_text).unwrap_or_default()
            }
        }
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

// Display never switches to exponent form; whole floats get their `.0` back.
fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f}.0")
    } else {
        format!("{f}")
    }
}

/// A `location` that is not an object is treated as missing.
fn lenient_location<'de, D>(de: D) -> Result<Option<Location>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_parsing() {
        let p = AlertPath::parse("sos_alerts/d1/a1", "sos_alerts").unwrap();
        assert_eq!(p.device_id, "d1");
        assert_eq!(p.alert_id, "a1");
        assert_eq!(p.to_string(), "d1/a1");

        for bad in [
            "sos_alerts/d1",
            "sos_alerts/d1/a1/x",
            "other/d1/a1",
            "sos_alerts//a1",
            "//sos_alerts/d1/a1",
            "",
        ] {
            let err = AlertPath::parse(bad, "sos_alerts").unwrap_err();
            assert_eq!(err.as_label(), "dispatch_invalid_path", "{bad}");
        }
    }

    #[test]
    fn coordinates_render_like_the_device_wrote_them() {
        assert_eq!(coordinate_text(Some(&json!(41.0))), "41.0");
        assert_eq!(coordinate_text(Some(&json!(29.0153))), "29.0153");
        assert_eq!(coordinate_text(Some(&json!(0.00001))), "0.00001");
        assert_eq!(coordinate_text(Some(&json!(-0.0000123))), "-0.0000123");
        assert_eq!(coordinate_text(Some(&json!(-3.0))), "-3.0");
        assert_eq!(coordinate_text(Some(&json!(41))), "41");
        assert_eq!(coordinate_text(Some(&json!(-12))), "-12");
        assert_eq!(coordinate_text(Some(&json!(0))), "0");
        assert_eq!(coordinate_text(Some(&json!("41.0"))), "41.0");
        assert_eq!(coordinate_text(Some(&json!(true))), "");
        assert_eq!(coordinate_text(Some(&Value::Null)), "");
        assert_eq!(coordinate_text(None), "");
    }

    #[test]
    fn location_fields_are_independent() {
        let r = AlertRecord::from_value(json!({
            "deviceId": "d1",
            "alertId": "a3",
            "location": {"latitude": 41.0}
        }))
        .unwrap();
        assert_eq!(r.latitude_text(), "41.0");
        assert_eq!(r.longitude_text(), "");
    }

    #[test]
    fn malformed_location_is_treated_as_missing() {
        let r = AlertRecord::from_value(json!({"location": "somewhere"})).unwrap();
        assert_eq!(r.location, None);
        assert_eq!(r.latitude_text(), "");
    }

    #[test]
    fn foreign_id_types_are_ignored() {
        let r = AlertRecord::from_value(json!({"deviceId": 7, "alertId": "a1"})).unwrap();
        assert_eq!(r.device_id, None);
        assert_eq!(r.alert_id.as_deref(), Some("a1"));
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = AlertRecord::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.as_label(), "dispatch_decode");
    }
}
