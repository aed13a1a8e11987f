use serde::{Deserialize, Serialize};

use crate::config::DispatcherConfig;
use crate::dispatch::record::AlertRecord;

/// Value of `data.type` on every alert notification.
pub const ALERT_TYPE: &str = "sos";

/// Visible part of the push notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationText {
    pub title: String,
    pub body: String,
}

/// Data part of the push notification. Every value is a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertData {
    #[serde(rename = "type")]
    pub kind: String,
    pub latitude: String,
    pub longitude: String,
}

/// Push message published for one alert.
///
/// Serializes to the push service's message shape:
/// `{"notification": {title, body}, "data": {type, latitude, longitude}, "topic"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub notification: NotificationText,
    pub data: AlertData,
    pub topic: String,
}

impl NotificationPayload {
    /// Builds the payload for `record`. Never fails: missing coordinates become `""`.
    pub fn for_alert(record: &AlertRecord, cfg: &DispatcherConfig) -> Self {
        Self {
            notification: NotificationText {
                title: cfg.title.clone(),
                body: cfg.body.clone(),
            },
            data: AlertData {
                kind: ALERT_TYPE.to_string(),
                latitude: record.latitude_text(),
                longitude: record.longitude_text(),
            },
            topic: cfg.topic.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let record = AlertRecord::from_value(json!({
            "deviceId": "d1",
            "alertId": "a1",
            "location": {"latitude": 41.0, "longitude": 29.0}
        }))
        .unwrap();
        let payload = NotificationPayload::for_alert(&record, &DispatcherConfig::default());

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "notification": {
                    "title": "🚨 ACİL DURUM: SOS SİNYALİ ALINDI!",
                    "body": "Bir yaşlıdan SOS çağrısı geldi!"
                },
                "data": {"type": "sos", "latitude": "41.0", "longitude": "29.0"},
                "topic": "sos_alerts"
            })
        );
    }
}
