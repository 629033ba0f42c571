/*!
 # Platform registration

 Entry point the host calls at startup. The platform reads its block from
 the host configuration and turns each usable device entry into a
 [`MiSmartBulb`].
*/

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::accessory::Accessory;
use crate::config::{HostConfig, PlatformConfig};
use crate::device::MiSmartBulb;
use crate::rpc::DeviceConnector;
use crate::Result;

/// Package name the plugin registers under
pub const PLUGIN_NAME: &str = "homebridge-mi-light-bulb";
/// Value of the `platform` field that selects this plugin
pub const PLATFORM_NAME: &str = "MiLightBulbPlatform";

/// The registered platform
pub struct MiLightBulbPlatform {
    config: PlatformConfig,
    connector: Arc<dyn DeviceConnector>,
}

impl MiLightBulbPlatform {
    /// Registers the platform if the host configuration has an entry for it
    ///
    /// Returns `Ok(None)` when no `MiLightBulbPlatform` entry exists.
    #[instrument(skip_all)]
    pub fn register(
        host: &HostConfig,
        connector: Arc<dyn DeviceConnector>,
    ) -> Result<Option<Self>> {
        let Some(entry) = host.platform(PLATFORM_NAME) else {
            info!("No {} entry in the host configuration", PLATFORM_NAME);
            return Ok(None);
        };

        let config = PlatformConfig::from_value(entry)?;
        debug!("Registering {} from {}", PLATFORM_NAME, PLUGIN_NAME);
        Ok(Some(Self::new(config, connector)))
    }

    pub fn new(config: PlatformConfig, connector: Arc<dyn DeviceConnector>) -> Self {
        info!("Mi light bulb is OK");
        Self { config, connector }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Connects every usable device and collects their accessories
    ///
    /// Entries without an address or token are skipped silently.
    #[instrument(skip(self))]
    pub async fn accessories(&self) -> Result<Vec<Arc<dyn Accessory>>> {
        let mut accessories = Vec::new();
        for config in self.config.usable_devices() {
            let device = MiSmartBulb::connect(config.clone(), self.connector.as_ref())?;
            accessories.extend(device.accessories());
        }

        info!("Exposing {} accessories", accessories.len());
        Ok(accessories)
    }
}
