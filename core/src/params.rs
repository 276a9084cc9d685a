//! Parameter accumulation for optimization requests.
//!
//! # Design
//! A `ParameterSet` owns the two halves of a request: the query string
//! (`params`, always seeded with the API key) and the JSON body
//! (`OptimizationData`). Values enter only through the field registry in
//! [`crate::fields`], which decides both whether a value is acceptable and
//! which half it belongs to. Batch updates are validated in full before any
//! value is stored, so a rejected batch leaves the set untouched.

use serde_json::{Map, Value};

use crate::enums::{AlgorithmType, DeviceType, DistanceUnit, Format, Metric, Optimize, RoutePathOutput, TravelMode};
use crate::error::ParamValueError;
use crate::fields::{self, Target};
use crate::models::OptimizationData;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    params: Map<String, Value>,
    data: OptimizationData,
}

impl ParameterSet {
    pub fn new(api_key: impl Into<String>) -> Self {
        let mut params = Map::new();
        params.insert("api_key".to_string(), Value::String(api_key.into()));
        Self {
            params,
            data: OptimizationData::default(),
        }
    }

    /// Validate and store one field at its default destination.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), ParamValueError> {
        self.store(field, value.into(), None)
    }

    /// Like [`set`](Self::set), but a target-selectable field goes to `target`.
    /// Fields with a fixed destination ignore `target`.
    pub fn set_to(&mut self, field: &str, value: impl Into<Value>, target: Target) -> Result<(), ParamValueError> {
        self.store(field, value.into(), Some(target))
    }

    /// Validate a whole batch, then merge it.
    ///
    /// Fixed-route fields land where the registry says regardless of the map
    /// they were passed in; `member_id` and `device_type` follow the map they
    /// were passed in. Nothing is stored unless every entry is valid.
    pub fn add(&mut self, query_fields: &Map<String, Value>, body_fields: &Map<String, Value>) -> Result<(), ParamValueError> {
        let batches = [(query_fields, Target::Query), (body_fields, Target::Body)];
        let mut staged = Vec::with_capacity(query_fields.len() + body_fields.len());
        for (batch, requested) in batches {
            for (name, value) in batch {
                if name == "addresses" {
                    return Err(reject(ParamValueError::new(
                        "addresses",
                        "Addresses are added one at a time with add_address",
                    )));
                }
                let target = fields::validate(name, value, Some(requested)).map_err(reject)?;
                staged.push((target, name, value));
            }
        }
        for (target, name, value) in staged {
            self.insert(target, name.clone(), value.clone());
        }
        Ok(())
    }

    pub fn set_format(&mut self, format: Format) -> Result<(), ParamValueError> {
        self.set("format", format.as_str())
    }

    pub fn set_travel_mode(&mut self, mode: TravelMode) -> Result<(), ParamValueError> {
        self.set("travel_mode", mode.as_str())
    }

    pub fn set_optimize(&mut self, optimize: Optimize) -> Result<(), ParamValueError> {
        self.set("optimize", optimize.as_str())
    }

    pub fn set_distance_unit(&mut self, unit: DistanceUnit) -> Result<(), ParamValueError> {
        self.set("distance_unit", unit.as_str())
    }

    pub fn set_route_path_output(&mut self, output: RoutePathOutput) -> Result<(), ParamValueError> {
        self.set("route_path_output", output.as_str())
    }

    pub fn set_algorithm_type(&mut self, algorithm: AlgorithmType) -> Result<(), ParamValueError> {
        self.set("algorithm_type", algorithm.code())
    }

    pub fn set_metric(&mut self, metric: Metric) -> Result<(), ParamValueError> {
        self.set("metric", metric.code())
    }

    pub fn set_device_type(&mut self, device: DeviceType, target: Target) -> Result<(), ParamValueError> {
        self.set_to("device_type", device.as_str(), target)
    }

    pub fn set_member_id(&mut self, member_id: i64, target: Target) -> Result<(), ParamValueError> {
        self.set_to("member_id", member_id, target)
    }

    pub fn set_route_name(&mut self, name: &str) -> Result<(), ParamValueError> {
        self.set("route_name", name)
    }

    pub fn set_optimization_problem_id(&mut self, id: &str) -> Result<(), ParamValueError> {
        self.set("optimization_problem_id", id)
    }

    /// Whether every key in `keys` is already in the query string.
    pub fn has_query_params(&self, keys: &[&str]) -> bool {
        has_required_keys(&self.params, keys)
    }

    /// The query-string half, including `api_key`.
    pub fn query_params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// The body's `parameters` map.
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.data.parameters
    }

    pub fn optimization_data(&self) -> &OptimizationData {
        &self.data
    }

    pub fn into_optimization_data(self) -> OptimizationData {
        self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut OptimizationData {
        &mut self.data
    }

    fn store(&mut self, name: &str, value: Value, requested: Option<Target>) -> Result<(), ParamValueError> {
        let target = fields::validate(name, &value, requested).map_err(reject)?;
        self.insert(target, name.to_string(), value);
        Ok(())
    }

    fn insert(&mut self, target: Target, name: String, value: Value) {
        match target {
            Target::Query => self.params.insert(name, value),
            Target::Body => self.data.parameters.insert(name, value),
        };
    }
}

/// Whether every key in `keys` is present in `map`.
pub fn has_required_keys(map: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|key| map.contains_key(*key))
}

fn reject(err: ParamValueError) -> ParamValueError {
    log::debug!("rejected `{}`: {}", err.field, err.constraint);
    err
}
