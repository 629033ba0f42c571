use std::sync::Arc;
use tracing::{debug, instrument};

use crate::accessory::Accessory;
use crate::config::DeviceConfig;
use crate::light::{LightAccessory, LightSpec};
use crate::rpc::{DeviceConnector, DeviceRpc};
use crate::{Error, Result};

/// One configured Xiaomi smart bulb and the accessories it exposes
pub struct MiSmartBulb {
    /// Configuration entry this bulb was created from
    config: DeviceConfig,
    /// RPC session shared by every accessory of this bulb
    rpc: Arc<dyn DeviceRpc>,
    /// Light accessory, absent when disabled or unnamed
    light: Option<Arc<LightAccessory>>,
}

impl MiSmartBulb {
    /// Opens an RPC session through `connector` and builds the bulb
    ///
    /// Fails with [`Error::Config`] when the entry lacks an address or a token.
    #[instrument(skip_all, fields(ip = ?config.ip))]
    pub fn connect(config: DeviceConfig, connector: &dyn DeviceConnector) -> Result<Self> {
        let (ip, token) = config
            .credentials()
            .ok_or_else(|| Error::Config("device entry needs both ip and token".to_string()))?;
        let rpc = connector.connect(ip, token)?;
        Ok(Self::new(config, rpc))
    }

    /// Builds the bulb around an already opened RPC session
    pub fn new(config: DeviceConfig, rpc: Arc<dyn DeviceRpc>) -> Self {
        let light = light_spec(&config)
            .map(|spec| Arc::new(LightAccessory::new(spec, Arc::clone(&rpc))));

        let device = Self { config, rpc, light };
        debug!(
            "Initializing {} device: {}, accessories size: {}",
            device.config.kind.as_deref().unwrap_or("MiSmartBulb"),
            device.config.ip.as_deref().unwrap_or_default(),
            device.accessories().len()
        );
        device
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The RPC session of this bulb
    pub fn rpc(&self) -> &Arc<dyn DeviceRpc> {
        &self.rpc
    }

    pub fn light(&self) -> Option<&Arc<LightAccessory>> {
        self.light.as_ref()
    }

    /// Every accessory this bulb exposes to the host
    pub fn accessories(&self) -> Vec<Arc<dyn Accessory>> {
        self.light
            .iter()
            .map(|light| Arc::clone(light) as Arc<dyn Accessory>)
            .collect()
    }
}

/// Layout of the light accessory a device entry asks for, if any
pub fn light_spec(config: &DeviceConfig) -> Option<LightSpec> {
    config
        .light_name()
        .map(|name| LightSpec::new(name, config.is_color))
}
