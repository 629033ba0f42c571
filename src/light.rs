/*!
 # Light accessory

 Maps the Lightbulb characteristics onto the bulb's RPC verbs.

 The bulb only accepts full RGB values, so hue and saturation writes are
 built from the last known HSV triple. Until a hue or saturation read has
 populated that baseline, those writes succeed without contacting the bulb.
*/

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument, trace};

use crate::accessory::{
    Accessory, Characteristic, CharacteristicKind, CharacteristicProps, CharacteristicValue,
    Service, ServiceKind,
};
use crate::color::{Hsv, Rgb};
use crate::rpc::{self, DeviceRpc, DEFAULT_DURATION, DEFAULT_EFFECT};
use crate::{Error, Result};

pub const MANUFACTURER: &str = "XiaoMi";
pub const MODEL: &str = "Smart Bulb";
pub const SERIAL_NUMBER: &str = "Undefined";

/// Color temperature bounds and step advertised to the host
pub const COLOR_TEMPERATURE_PROPS: CharacteristicProps =
    CharacteristicProps::new(1700.0, 6500.0, 100.0);

/// Static description of a light accessory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSpec {
    pub name: String,
    /// Whether hue, saturation and color temperature are exposed
    pub is_color: bool,
}

impl LightSpec {
    pub fn new(name: impl Into<String>, is_color: bool) -> Self {
        Self {
            name: name.into(),
            is_color,
        }
    }

    /// Whether the Lightbulb service carries this characteristic
    pub fn supports(&self, kind: CharacteristicKind) -> bool {
        match kind {
            CharacteristicKind::On | CharacteristicKind::Brightness => true,
            CharacteristicKind::Hue
            | CharacteristicKind::Saturation
            | CharacteristicKind::ColorTemperature => self.is_color,
            _ => false,
        }
    }

    pub fn services(&self) -> Vec<Service> {
        let info = Service::new(ServiceKind::AccessoryInformation, None)
            .with(Characteristic::fixed(CharacteristicKind::Manufacturer, MANUFACTURER))
            .with(Characteristic::fixed(CharacteristicKind::Model, MODEL))
            .with(Characteristic::fixed(CharacteristicKind::SerialNumber, SERIAL_NUMBER));

        let mut light = Service::new(ServiceKind::Lightbulb, Some(&self.name))
            .with(Characteristic::dynamic(CharacteristicKind::On))
            .with(Characteristic::dynamic(CharacteristicKind::Brightness));
        if self.is_color {
            light = light
                .with(Characteristic::dynamic(CharacteristicKind::Hue))
                .with(Characteristic::dynamic(CharacteristicKind::Saturation))
                .with(
                    Characteristic::dynamic(CharacteristicKind::ColorTemperature)
                        .with_props(COLOR_TEMPERATURE_PROPS),
                );
        }

        vec![info, light]
    }
}

/// A light exposed by one bulb
pub struct LightAccessory {
    spec: LightSpec,
    rpc: Arc<dyn DeviceRpc>,
    /// Last known color, `None` until first observed
    hsv: Mutex<Option<Hsv>>,
}

impl std::fmt::Debug for LightAccessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightAccessory")
            .field("spec", &self.spec)
            .field("hsv", &*self.hsv.lock())
            .finish_non_exhaustive()
    }
}

impl LightAccessory {
    pub fn new(spec: LightSpec, rpc: Arc<dyn DeviceRpc>) -> Self {
        Self {
            spec,
            rpc,
            hsv: Mutex::new(None),
        }
    }

    pub fn spec(&self) -> &LightSpec {
        &self.spec
    }

    /// The cached HSV baseline, if any
    pub fn cached_hsv(&self) -> Option<Hsv> {
        *self.hsv.lock()
    }

    /// Reads the power state
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn get_power(&self) -> Result<bool> {
        let result = self.call("getPower", rpc::GET_PROP, vec![json!("power")]).await?;
        Ok(result.first().and_then(Value::as_str) == Some("on"))
    }

    /// Turns the bulb on or off
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn set_power(&self, on: bool) -> Result<()> {
        let state = if on { "on" } else { "off" };
        self.command("setPower", rpc::SET_POWER, vec![json!(state)])
            .await
    }

    /// Reads the brightness percentage
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn get_brightness(&self) -> Result<i64> {
        let result = self.call("getBrightness", rpc::GET_PROP, vec![json!("bright")]).await?;
        rpc::first_integer(rpc::GET_PROP, &result)
    }

    /// Sets the brightness percentage
    ///
    /// Values of zero or below succeed without reaching the bulb. Through
    /// [`Accessory::set`], a fractional value is rounded to the nearest
    /// integer after its sign is checked, and positive values below 0.5 are
    /// sent as 1.
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn set_brightness(&self, value: i64) -> Result<()> {
        if value <= 0 {
            debug!("Ignoring brightness {}", value);
            return Ok(());
        }
        self.command("setBrightness", rpc::SET_BRIGHT, vec![json!(value)])
            .await
    }

    /// Reads the hue in degrees, refreshing the HSV baseline
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn get_hue(&self) -> Result<f64> {
        Ok(self.read_color("getColor").await?.h)
    }

    /// Sets the hue, keeping the cached saturation and value
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn set_hue(&self, hue: f64) -> Result<()> {
        match self.update_hsv(|hsv| hsv.with_hue(hue)) {
            Some(hsv) => self.write_color("setColor", hsv).await,
            None => {
                debug!("No color baseline yet, skipping hue {}", hue);
                Ok(())
            }
        }
    }

    /// Reads the saturation percentage, refreshing the HSV baseline
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn get_saturation(&self) -> Result<f64> {
        Ok(self.read_color("getSaturation").await?.s)
    }

    /// Sets the saturation, keeping the cached hue and value
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn set_saturation(&self, saturation: f64) -> Result<()> {
        match self.update_hsv(|hsv| hsv.with_saturation(saturation)) {
            Some(hsv) => self.write_color("setSaturation", hsv).await,
            None => {
                debug!("No color baseline yet, skipping saturation {}", saturation);
                Ok(())
            }
        }
    }

    /// Reads the color temperature
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn get_color_temperature(&self) -> Result<i64> {
        let result = self
            .call("getColorTemperature", rpc::GET_PROP, vec![json!("ct")])
            .await?;
        rpc::first_integer(rpc::GET_PROP, &result)
    }

    /// Sets the color temperature
    #[instrument(skip(self), fields(light = %self.spec.name))]
    pub async fn set_color_temperature(&self, value: i64) -> Result<()> {
        debug!("Setting color temperature to {}", value);
        self.command(
            "setColorTemperature",
            rpc::SET_CT_ABX,
            vec![json!(value), json!(DEFAULT_EFFECT), json!(DEFAULT_DURATION)],
        )
        .await
    }

    async fn read_color(&self, operation: &str) -> Result<Hsv> {
        let result = self.call(operation, rpc::GET_PROP, vec![json!("rgb")]).await?;
        let packed = rpc::first_integer(rpc::GET_PROP, &result)?;
        let rgb = Rgb::from_packed((packed & 0xFF_FFFF) as u32);
        let hsv = rgb.to_hsv();
        trace!("Color {:?} read as {:?}", rgb, hsv);

        *self.hsv.lock() = Some(hsv);
        Ok(hsv)
    }

    /// Applies `change` to the cached baseline and stores the result
    fn update_hsv(&self, change: impl FnOnce(Hsv) -> Hsv) -> Option<Hsv> {
        let mut cached = self.hsv.lock();
        let updated = change((*cached)?);
        *cached = Some(updated);
        Some(updated)
    }

    async fn write_color(&self, operation: &str, hsv: Hsv) -> Result<()> {
        let rgb = hsv.to_rgb();
        trace!("Color {:?} written as {:?}", hsv, rgb);
        self.command(
            operation,
            rpc::SET_RGB,
            vec![
                json!(rgb.to_packed()),
                json!(DEFAULT_EFFECT),
                json!(DEFAULT_DURATION),
            ],
        )
        .await
    }

    /// Issues a set-type call and checks for "ok"
    async fn command(&self, operation: &str, method: &str, params: Vec<Value>) -> Result<()> {
        let result = self.call(operation, method, params).await?;
        rpc::expect_ok(&result)
    }

    async fn call(&self, operation: &str, method: &str, params: Vec<Value>) -> Result<Vec<Value>> {
        match self.rpc.call(method, params).await {
            Ok(result) => {
                debug!("{} - {} result: {:?}", self.spec.name, operation, result);
                Ok(result)
            }
            Err(e) => {
                error!("{} - {} error: {}", self.spec.name, operation, e);
                Err(e)
            }
        }
    }

    async fn get_value(&self, kind: CharacteristicKind) -> Result<CharacteristicValue> {
        if !self.spec.supports(kind) {
            return match kind {
                CharacteristicKind::Manufacturer => Ok(MANUFACTURER.into()),
                CharacteristicKind::Model => Ok(MODEL.into()),
                CharacteristicKind::SerialNumber => Ok(SERIAL_NUMBER.into()),
                _ => Err(Error::UnsupportedCharacteristic(kind)),
            };
        }

        match kind {
            CharacteristicKind::On => self.get_power().await.map(Into::into),
            CharacteristicKind::Brightness => self.get_brightness().await.map(Into::into),
            CharacteristicKind::Hue => self.get_hue().await.map(Into::into),
            CharacteristicKind::Saturation => self.get_saturation().await.map(Into::into),
            CharacteristicKind::ColorTemperature => {
                self.get_color_temperature().await.map(Into::into)
            }
            _ => Err(Error::UnsupportedCharacteristic(kind)),
        }
    }

    async fn set_value(&self, kind: CharacteristicKind, value: CharacteristicValue) -> Result<()> {
        if !self.spec.supports(kind) {
            return Err(Error::UnsupportedCharacteristic(kind));
        }

        let invalid = |value: &CharacteristicValue| Error::InvalidValue {
            kind,
            value: value.clone(),
        };
        match kind {
            CharacteristicKind::On => {
                let on = value.as_bool().ok_or_else(|| invalid(&value))?;
                self.set_power(on).await
            }
            CharacteristicKind::Brightness => {
                let raw = value
                    .as_f64()
                    .filter(|raw| raw.is_finite())
                    .ok_or_else(|| invalid(&value))?;
                // The sign decides the no-op, so a positive fraction is sent as 1
                let brightness = if raw > 0.0 {
                    (raw.round() as i64).max(1)
                } else {
                    raw.floor() as i64
                };
                self.set_brightness(brightness).await
            }
            CharacteristicKind::Hue => {
                let hue = value.as_f64().ok_or_else(|| invalid(&value))?;
                self.set_hue(hue).await
            }
            CharacteristicKind::Saturation => {
                let saturation = value.as_f64().ok_or_else(|| invalid(&value))?;
                self.set_saturation(saturation).await
            }
            CharacteristicKind::ColorTemperature => {
                let temperature = value.as_i64().ok_or_else(|| invalid(&value))?;
                self.set_color_temperature(temperature).await
            }
            _ => Err(Error::UnsupportedCharacteristic(kind)),
        }
    }
}

impl Accessory for LightAccessory {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn services(&self) -> Vec<Service> {
        self.spec.services()
    }

    fn get(&self, kind: CharacteristicKind) -> BoxFuture<'_, Result<CharacteristicValue>> {
        Box::pin(self.get_value(kind))
    }

    fn set(
        &self,
        kind: CharacteristicKind,
        value: CharacteristicValue,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.set_value(kind, value))
    }
}
