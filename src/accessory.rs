/*!
 # Accessory model

 Describes what an accessory exposes to the host: services, the
 characteristics inside them with their bounds, and the values exchanged on
 get/set. Type identifiers follow the HomeKit Accessory Protocol.
*/

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::Result;

/// Expands a HAP short type id into its full UUID
const fn hap_uuid(short: u32) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_1000_8000_0026_BB76_5291)
}

/// Supported service types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Static manufacturer/model information
    AccessoryInformation,
    /// A controllable light
    Lightbulb,
}

impl ServiceKind {
    pub const fn uuid(self) -> Uuid {
        match self {
            ServiceKind::AccessoryInformation => hap_uuid(0x3E),
            ServiceKind::Lightbulb => hap_uuid(0x43),
        }
    }
}

/// Supported characteristic types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    Manufacturer,
    Model,
    SerialNumber,
    /// Power state (bool)
    On,
    /// Brightness percentage (int)
    Brightness,
    /// Hue in degrees (float)
    Hue,
    /// Saturation percentage (float)
    Saturation,
    /// Color temperature (int)
    ColorTemperature,
}

impl CharacteristicKind {
    pub const fn uuid(self) -> Uuid {
        match self {
            CharacteristicKind::Manufacturer => hap_uuid(0x20),
            CharacteristicKind::Model => hap_uuid(0x21),
            CharacteristicKind::SerialNumber => hap_uuid(0x30),
            CharacteristicKind::On => hap_uuid(0x25),
            CharacteristicKind::Brightness => hap_uuid(0x08),
            CharacteristicKind::Hue => hap_uuid(0x13),
            CharacteristicKind::Saturation => hap_uuid(0x2F),
            CharacteristicKind::ColorTemperature => hap_uuid(0xCE),
        }
    }

    /// Bounds the host applies when none are set explicitly
    pub const fn default_props(self) -> Option<CharacteristicProps> {
        match self {
            CharacteristicKind::Brightness | CharacteristicKind::Saturation => {
                Some(CharacteristicProps::new(0.0, 100.0, 1.0))
            }
            CharacteristicKind::Hue => Some(CharacteristicProps::new(0.0, 360.0, 1.0)),
            CharacteristicKind::ColorTemperature => {
                Some(CharacteristicProps::new(140.0, 500.0, 1.0))
            }
            _ => None,
        }
    }
}

/// Numeric bounds of a characteristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicProps {
    pub min_value: f64,
    pub max_value: f64,
    pub min_step: f64,
}

impl CharacteristicProps {
    pub const fn new(min_value: f64, max_value: f64, min_step: f64) -> Self {
        Self {
            min_value,
            max_value,
            min_step,
        }
    }
}

/// A value read from or written to a characteristic
#[derive(Debug, Clone, PartialEq)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl CharacteristicValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CharacteristicValue::Bool(b) => Some(*b),
            CharacteristicValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Integer view, floats are rounded
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CharacteristicValue::Int(i) => Some(*i),
            CharacteristicValue::Float(f) if f.is_finite() => Some(f.round() as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CharacteristicValue::Int(i) => Some(*i as f64),
            CharacteristicValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        CharacteristicValue::Bool(value)
    }
}

impl From<i64> for CharacteristicValue {
    fn from(value: i64) -> Self {
        CharacteristicValue::Int(value)
    }
}

impl From<f64> for CharacteristicValue {
    fn from(value: f64) -> Self {
        CharacteristicValue::Float(value)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        CharacteristicValue::String(value.to_string())
    }
}

/// One characteristic inside a service
#[derive(Debug, Clone, PartialEq)]
pub struct Characteristic {
    pub kind: CharacteristicKind,
    /// Bounds set by the accessory, overriding the host defaults
    pub props: Option<CharacteristicProps>,
    /// Fixed value for static characteristics, `None` when served by get/set
    pub value: Option<CharacteristicValue>,
}

impl Characteristic {
    /// A characteristic served by the accessory's get/set operations
    pub const fn dynamic(kind: CharacteristicKind) -> Self {
        Self {
            kind,
            props: None,
            value: None,
        }
    }

    /// A characteristic with a fixed value
    pub fn fixed(kind: CharacteristicKind, value: impl Into<CharacteristicValue>) -> Self {
        Self {
            kind,
            props: None,
            value: Some(value.into()),
        }
    }

    pub fn with_props(mut self, props: CharacteristicProps) -> Self {
        self.props = Some(props);
        self
    }

    /// Bounds in effect: explicit ones, else the host defaults
    pub const fn effective_props(&self) -> Option<CharacteristicProps> {
        match self.props {
            Some(props) => Some(props),
            None => self.kind.default_props(),
        }
    }
}

/// A group of characteristics exposed under one service type
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub kind: ServiceKind,
    pub name: Option<String>,
    pub characteristics: Vec<Characteristic>,
}

impl Service {
    pub fn new(kind: ServiceKind, name: Option<&str>) -> Self {
        Self {
            kind,
            name: name.map(str::to_string),
            characteristics: Vec::new(),
        }
    }

    pub fn with(mut self, characteristic: Characteristic) -> Self {
        self.characteristics.push(characteristic);
        self
    }

    pub fn characteristic(&self, kind: CharacteristicKind) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.kind == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = CharacteristicKind> + '_ {
        self.characteristics.iter().map(|c| c.kind)
    }
}

/// An endpoint the host can control
///
/// `get` and `set` resolve exactly once per call.
pub trait Accessory: Send + Sync {
    fn name(&self) -> &str;

    fn services(&self) -> Vec<Service>;

    fn get(&self, kind: CharacteristicKind) -> BoxFuture<'_, Result<CharacteristicValue>>;

    fn set(
        &self,
        kind: CharacteristicKind,
        value: CharacteristicValue,
    ) -> BoxFuture<'_, Result<()>>;
}
