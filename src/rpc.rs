/*!
 # Device RPC seam

 The bulb speaks a small set of JSON RPC verbs. Opening the authenticated
 session and framing the calls belongs to an external transport; this module
 only defines the interface the rest of the crate talks to and the rules for
 reading the device's answers.
*/

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use crate::{Error, Result};

pub const GET_PROP: &str = "get_prop";
pub const SET_POWER: &str = "set_power";
pub const SET_BRIGHT: &str = "set_bright";
pub const SET_RGB: &str = "set_rgb";
pub const SET_CT_ABX: &str = "set_ct_abx";

/// Transition effect sent with color and color temperature changes
pub const DEFAULT_EFFECT: &str = "sudden";
/// Transition duration in milliseconds
pub const DEFAULT_DURATION: u32 = 500;

/// Value the device answers set-type calls with on success
const OK: &str = "ok";

/// One RPC session with a single bulb
///
/// `call` resolves with the device's result array. Implementations report
/// network, authentication and timeout failures as [`Error::Transport`];
/// callers pass those through untouched.
pub trait DeviceRpc: Send + Sync {
    fn call(&self, method: &str, params: Vec<Value>) -> BoxFuture<'_, Result<Vec<Value>>>;
}

/// Opens RPC sessions for configured devices
pub trait DeviceConnector: Send + Sync {
    fn connect(&self, address: &str, token: &str) -> Result<Arc<dyn DeviceRpc>>;
}

/// Checks the answer to a set-type call
///
/// Succeeds only when the first element is the string `"ok"`. Anything else
/// becomes [`Error::Device`] carrying that element.
pub fn expect_ok(result: &[Value]) -> Result<()> {
    match result.first() {
        Some(Value::String(s)) if s == OK => Ok(()),
        Some(Value::String(s)) => Err(Error::Device(s.clone())),
        Some(other) => Err(Error::Device(other.to_string())),
        None => Err(Error::Device(Value::Null.to_string())),
    }
}

/// Reads the first element of a `get_prop` answer as an integer
///
/// Bulbs report numeric properties either as JSON numbers or as decimal
/// strings, both are accepted.
pub fn first_integer(method: &str, result: &[Value]) -> Result<i64> {
    let parsed = match result.first() {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    trace!("Parsed {:?} from {} result", parsed, method);
    parsed.ok_or_else(|| unexpected(method, result))
}

/// Reads the first element of a `get_prop` answer as a string
pub fn first_str<'a>(method: &str, result: &'a [Value]) -> Result<&'a str> {
    result
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| unexpected(method, result))
}

fn unexpected(method: &str, result: &[Value]) -> Error {
    Error::UnexpectedResult {
        method: method.to_string(),
        result: Value::Array(result.to_vec()),
    }
}
