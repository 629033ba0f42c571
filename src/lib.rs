/*!
 # Xiaomi Smart Bulb Bridge

 A Rust library that exposes Xiaomi (Yeelight family) smart bulbs as
 accessories inside a home-automation host.

 Every characteristic operation is forwarded to the bulb through a
 [`DeviceRpc`] handle. The transport itself is not part of this crate: the
 host injects a [`DeviceConnector`] that knows how to open an authenticated
 session from an address and a token.

 ## Features

 * Platform registration from the host configuration file
 * Power on/off
 * Brightness
 * Hue and saturation (color-capable bulbs)
 * Color temperature (1700K-6500K, color-capable bulbs)

 ## Example

 ```rust,no_run
 use std::sync::Arc;
 use mi_light_bridge::*;

 # async fn run(connector: Arc<dyn DeviceConnector>) -> Result<()> {
 let host = HostConfig::load("config.json")?;
 if let Some(platform) = MiLightBulbPlatform::register(&host, connector)? {
     for accessory in platform.accessories().await? {
         let on = accessory.get(CharacteristicKind::On).await?;
         println!("{}: {:?}", accessory.name(), on);
     }
 }
 # Ok(())
 # }
 ```
*/

use thiserror::Error;

/// Error types for the bulb bridge
#[derive(Error, Debug)]
pub enum Error {
    /// The RPC transport failed (unreachable device, rejected token, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The device answered, but not with "ok"
    #[error("{0}")]
    Device(String),

    /// The device answered a property query with a value of the wrong shape
    #[error("Unexpected result for {method}: {result}")]
    UnexpectedResult {
        method: String,
        result: serde_json::Value,
    },

    /// The accessory does not expose this characteristic
    #[error("Characteristic {0:?} is not supported by this accessory")]
    UnsupportedCharacteristic(CharacteristicKind),

    /// The host supplied a value of the wrong type for a characteristic
    #[error("Invalid value {value:?} for characteristic {kind:?}")]
    InvalidValue {
        kind: CharacteristicKind,
        value: CharacteristicValue,
    },

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading the configuration file
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error decoding JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod accessory;
pub mod color;
pub mod config;
pub mod device;
pub mod light;
pub mod platform;
pub mod rpc;

// Re-export key types
pub use accessory::{
    Accessory, Characteristic, CharacteristicKind, CharacteristicProps, CharacteristicValue,
    Service, ServiceKind,
};
pub use color::{Hsv, Rgb};
pub use config::{DeviceConfig, HostConfig, PlatformConfig};
pub use device::MiSmartBulb;
pub use light::{LightAccessory, LightSpec};
pub use platform::{MiLightBulbPlatform, PLATFORM_NAME, PLUGIN_NAME};
pub use rpc::{DeviceConnector, DeviceRpc};
