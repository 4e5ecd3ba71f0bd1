// Wire types for the discovery API.
//
// Field names match the JSON payload of `GET /device/list` exactly.
// Optional and defaulted fields tolerate records from older agents that
// omit them.

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// A device record as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub serial: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub http_port: Option<u16>,
    #[serde(default)]
    pub https_port: Option<u16>,
    #[serde(default)]
    pub online: bool,
    /// Seconds since the Unix epoch. Fractional values are floored.
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub last_update: i64,
    #[serde(default)]
    pub ifaces: Vec<InterfaceResponse>,
}

/// Accept an integer or a float timestamp; floats are floored.
fn epoch_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Timestamp {
        Whole(i64),
        Fractional(f64),
    }

    match Timestamp::deserialize(deserializer)? {
        Timestamp::Whole(secs) => Ok(secs),
        #[allow(clippy::cast_possible_truncation)]
        Timestamp::Fractional(secs) if secs.is_finite() => Ok(secs.floor() as i64),
        Timestamp::Fractional(secs) => Err(D::Error::custom(format!(
            "timestamp {secs} is not a finite number"
        ))),
    }
}

/// A network interface nested under a [`DeviceResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceResponse {
    pub mac: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub ipv6: Option<String>,
}
