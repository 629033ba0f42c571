/*!
 # Configuration

 Models for the host configuration file and the platform block this plugin
 reads from it.
*/

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::Result;

/// The host configuration file, reduced to the parts the plugin looks at
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub platforms: Vec<Value>,
    #[serde(default)]
    pub accessories: Vec<Value>,
}

impl HostConfig {
    #[instrument]
    pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&raw)?;
        debug!(
            "Loaded host config with {} platforms, {} accessories",
            config.platforms.len(),
            config.accessories.len()
        );
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// First platform entry whose `platform` field equals `name`
    pub fn platform(&self, name: &str) -> Option<&Value> {
        find_entry(&self.platforms, "platform", name)
    }

    pub fn has_platform(&self, name: &str) -> bool {
        self.platform(name).is_some()
    }

    pub fn has_accessory(&self, name: &str) -> bool {
        find_entry(&self.accessories, "accessory", name).is_some()
    }
}

fn find_entry<'a>(entries: &'a [Value], key: &str, name: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|entry| entry.get(key).and_then(Value::as_str) == Some(name))
}

/// The plugin's platform block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(
        default,
        rename = "deviceCfgs",
        deserialize_with = "deserialize_devices"
    )]
    pub devices: Vec<DeviceConfig>,
}

impl PlatformConfig {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(PlatformConfig::deserialize(value)?)
    }

    /// Device entries that carry both an address and a token
    pub fn usable_devices(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.iter().filter(|device| {
            let usable = device.credentials().is_some();
            if !usable {
                debug!("Skipping device entry without ip or token: {:?}", device.ip);
            }
            usable
        })
    }
}

/// Accepts anything for `deviceCfgs`: a non-array means no devices, and
/// entries that fail to decode are dropped.
fn deserialize_devices<'de, D>(deserializer: D) -> std::result::Result<Vec<DeviceConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        _ => {
            warn!("deviceCfgs is not an array, ignoring it");
            return Ok(Vec::new());
        }
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match DeviceConfig::deserialize(entry) {
            Ok(device) => Some(device),
            Err(e) => {
                warn!("Ignoring device entry {}: {}", index, e);
                None
            }
        })
        .collect())
}

/// Reads a string field, treating any other JSON type as absent
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Reads a flag by truthiness: `0`, `""` and `null` are false, any other
/// number, string, array or object is true.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// One configured bulb
///
/// Only a non-string `ip` or `token` makes an entry unreadable. The other
/// fields fall back to absent or to their truthiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Network address
    #[serde(default)]
    pub ip: Option<String>,
    /// Authentication token
    #[serde(default)]
    pub token: Option<String>,
    /// Free-form label, only used in logs
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub light_disable: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub light_name: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub is_color: bool,
}

impl DeviceConfig {
    /// Address and token, when both are present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let ip = non_empty(&self.ip)?;
        let token = non_empty(&self.token)?;
        Some((ip, token))
    }

    /// Name of the light accessory, unless it is disabled or unnamed
    pub fn light_name(&self) -> Option<&str> {
        if self.light_disable {
            return None;
        }
        non_empty(&self.light_name)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_platform_lookup() {
        let host = HostConfig::from_json(
            r#"{
                "bridge": { "name": "Homebridge" },
                "platforms": [
                    { "platform": "Other" },
                    { "platform": "MiLightBulbPlatform", "deviceCfgs": [] }
                ],
                "accessories": [ { "accessory": "Fan" } ]
            }"#,
        )
        .unwrap();

        assert!(host.has_platform("MiLightBulbPlatform"));
        assert!(!host.has_platform("Fan"));
        assert!(host.has_accessory("Fan"));
        assert!(!host.has_accessory("MiLightBulbPlatform"));
    }

    #[test]
    fn test_missing_sections() {
        let host = HostConfig::from_json("{}").unwrap();
        assert!(!host.has_platform("MiLightBulbPlatform"));
    }

    #[test]
    fn test_device_fields() {
        let platform = PlatformConfig::from_value(&json!({
            "platform": "MiLightBulbPlatform",
            "deviceCfgs": [{
                "type": "MiSmartBulb",
                "ip": "192.168.1.10",
                "token": "abcdef",
                "lightName": "Lamp",
                "isColor": true
            }]
        }))
        .unwrap();

        assert_eq!(platform.devices.len(), 1);
        let device = &platform.devices[0];
        assert_eq!(device.credentials(), Some(("192.168.1.10", "abcdef")));
        assert_eq!(device.light_name(), Some("Lamp"));
        assert_eq!(device.kind.as_deref(), Some("MiSmartBulb"));
        assert!(device.is_color);
        assert!(!device.light_disable);
    }

    #[test]
    fn test_credentials_require_both_fields() {
        let mut device = DeviceConfig {
            ip: Some("192.168.1.10".into()),
            token: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(device.credentials(), None);

        device.token = None;
        assert_eq!(device.credentials(), None);

        device.token = Some("abcdef".into());
        device.ip = Some(String::new());
        assert_eq!(device.credentials(), None);
    }

    #[test]
    fn test_light_name() {
        let mut device = DeviceConfig {
            light_name: Some("Lamp".into()),
            light_disable: true,
            ..Default::default()
        };
        assert_eq!(device.light_name(), None);

        device.light_disable = false;
        assert_eq!(device.light_name(), Some("Lamp"));

        device.light_name = Some(String::new());
        assert_eq!(device.light_name(), None);
    }

    #[test]
    fn test_lenient_device_list() {
        let platform = PlatformConfig::from_value(&json!({
            "platform": "MiLightBulbPlatform",
            "deviceCfgs": { "ip": "192.168.1.10" }
        }))
        .unwrap();
        assert!(platform.devices.is_empty());

        let platform = PlatformConfig::from_value(&json!({
            "platform": "MiLightBulbPlatform",
            "deviceCfgs": [
                { "ip": 42, "token": "abcdef" },
                { "ip": "192.168.1.11", "token": "abcdef" }
            ]
        }))
        .unwrap();
        assert_eq!(platform.devices.len(), 1);
        assert_eq!(platform.devices[0].ip.as_deref(), Some("192.168.1.11"));
    }

    #[test]
    fn test_loosely_typed_flags() {
        let platform = PlatformConfig::from_value(&json!({
            "platform": "MiLightBulbPlatform",
            "deviceCfgs": [
                {
                    "ip": "192.168.1.10",
                    "token": "abcdef",
                    "lightName": "Lamp",
                    "isColor": "true"
                },
                {
                    "ip": "192.168.1.11",
                    "token": "abcdef",
                    "lightName": "Desk",
                    "lightDisable": 0,
                    "isColor": 1
                }
            ]
        }))
        .unwrap();

        assert_eq!(platform.usable_devices().count(), 2);
        let lamp = &platform.devices[0];
        assert!(lamp.is_color);
        assert!(!lamp.light_disable);
        assert_eq!(lamp.light_name(), Some("Lamp"));
        let desk = &platform.devices[1];
        assert!(desk.is_color);
        assert!(!desk.light_disable);
        assert_eq!(desk.light_name(), Some("Desk"));
    }

    #[test]
    fn test_flag_truthiness() {
        let flag = |value: Value| {
            DeviceConfig::deserialize(json!({ "lightDisable": value }))
                .unwrap()
                .light_disable
        };
        assert!(flag(json!(true)));
        assert!(flag(json!(1)));
        assert!(flag(json!("false")));
        assert!(flag(json!({})));
        assert!(!flag(json!(false)));
        assert!(!flag(json!(0)));
        assert!(!flag(json!(0.0)));
        assert!(!flag(json!("")));
        assert!(!flag(Value::Null));
    }

    #[test]
    fn test_non_string_labels_are_absent() {
        let platform = PlatformConfig::from_value(&json!({
            "platform": "MiLightBulbPlatform",
            "name": 5,
            "deviceCfgs": [{
                "type": 7,
                "ip": "192.168.1.10",
                "token": "abcdef",
                "lightName": ["Lamp"]
            }]
        }))
        .unwrap();

        assert_eq!(platform.name, None);
        assert_eq!(platform.devices.len(), 1);
        let device = &platform.devices[0];
        assert_eq!(device.kind, None);
        assert_eq!(device.light_name(), None);
        assert_eq!(device.credentials(), Some(("192.168.1.10", "abcdef")));
    }
}
