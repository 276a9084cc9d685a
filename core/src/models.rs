//! Domain DTOs for the optimization API.
//!
//! # Design
//! Request payloads (`OptimizationData`) are built locally by
//! [`ParameterSet`](crate::ParameterSet). Response types are read-only
//! projections of the server's JSON: the fields this crate relies on are
//! typed, everything else is kept verbatim in `extra` so nothing the server
//! sends is dropped.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::enums::OptimizationState;

/// Request body of create/update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationData {
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub addresses: Vec<Map<String, Value>>,
}

/// A destination with resolved coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub time: Option<Value>,
    pub alias: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_depot: Option<u8>,
}

impl AddressEntry {
    /// The entry as a raw map, ready for
    /// [`ParameterSet::add_address`](crate::ParameterSet::add_address).
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// An optimization problem as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub optimization_problem_id: String,
    /// State code as sent by the server. Codes this crate does not know are
    /// kept; [`state`](Self::state) gives the typed view.
    #[serde(rename = "state", deserialize_with = "state_code")]
    pub state_code: u16,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub addresses: Vec<Value>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Optimization {
    /// `None` when the server reports a state newer than [`OptimizationState`].
    pub fn state(&self) -> Option<OptimizationState> {
        u8::try_from(self.state_code).ok().and_then(OptimizationState::from_code)
    }

    pub fn is_solved(&self) -> bool {
        self.state() == Some(OptimizationState::Optimized)
    }
}

/// A state code sent either as a number or as a numeric string.
fn state_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u16),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(code) => Ok(code),
        Code::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("state `{text}` is not a numeric code"))),
    }
}

/// One vehicle's ordered sequence of stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    #[serde(default)]
    pub addresses: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl<T> PagedList<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Offset of the page after this one, if the server reported more items.
    pub fn next_offset(&self) -> Option<u64> {
        let consumed = u64::from(self.offset.unwrap_or(0)) + self.items.len() as u64;
        (consumed < self.total && !self.items.is_empty()).then_some(consumed)
    }
}

impl<T> IntoIterator for PagedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Truthiness of a loosely typed JSON value: `null`, `false`, `0`, `""`, `[]`
/// and `{}` are false.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}
