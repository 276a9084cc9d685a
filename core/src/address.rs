//! Destinations of an optimization problem.
//!
//! Addresses can be depots, i.e. departure points. An address belongs to one
//! route and one optimization problem, except for depots, which a multi-route
//! (VRP) solution may share between routes.

use serde_json::{Map, Value};

use crate::error::ParamValueError;
use crate::params::{has_required_keys, ParameterSet};

/// Keys every address entry must carry.
pub const REQUIRED_ADDRESS_KEYS: &[&str] = &["address", "lat", "lng"];

impl ParameterSet {
    /// Append one address to the optimization body.
    ///
    /// The entry is stored verbatim. Entries missing any of `address`, `lat`
    /// or `lng` are rejected and the list is left as it was.
    pub fn add_address(&mut self, fields: Map<String, Value>) -> Result<(), ParamValueError> {
        if !has_required_keys(&fields, REQUIRED_ADDRESS_KEYS) {
            log::debug!("rejected address without {REQUIRED_ADDRESS_KEYS:?}");
            return Err(ParamValueError::new("addresses", "Params are not complete"));
        }
        self.data_mut().addresses.push(fields);
        Ok(())
    }

    pub fn addresses(&self) -> &[Map<String, Value>] {
        &self.optimization_data().addresses
    }
}
