//! Synchronous client core for the Route4Me optimization API.
//!
//! # Overview
//! Validates request fields, accumulates them into query-string and body
//! halves, composes `HttpRequest` values and decodes `HttpResponse` values.
//! The host supplies the actual HTTP round-trip through [`Transport`], so the
//! core stays deterministic and testable (host-does-IO pattern).
//!
//! # Design
//! - [`fields`] is the single registry of accepted fields: rule + destination.
//! - [`ParameterSet`] owns one request's state, seeded from an explicit API
//!   key; batches are validated before anything is stored.
//! - [`NetworkClient`] turns (method, path, subdomain, query, body) into an
//!   `HttpRequest` and decodes JSON answers.
//! - [`Optimizations`] is the CRUD façade over the optimization endpoint;
//!   [`geocode`] batches geocoding of addresses without coordinates.
//!
//! # Example
//!
//! ```
//! use route4me_core::test_support::StubTransport;
//! use route4me_core::{AlgorithmType, ClientConfig, NetworkClient, Optimizations, ParameterSet};
//! use serde_json::json;
//!
//! let mut params = ParameterSet::new("demo-key");
//! params.set_algorithm_type(AlgorithmType::Tsp)?;
//! params.set_route_name("Single Driver Route")?;
//! params.add_address(
//!     json!({"address": "754 5th Ave New York, NY 10019", "lat": 40.7636197, "lng": -73.9744388})
//!         .as_object()
//!         .cloned()
//!         .unwrap_or_default(),
//! )?;
//!
//! let transport = StubTransport::new();
//! transport.push_json(200, json!({"optimization_problem_id": "ABC", "state": 4}));
//! let optimizations = Optimizations::new(NetworkClient::new(ClientConfig::new("demo-key"), transport));
//!
//! let created = optimizations.create(&params, None)?;
//! assert!(created.is_solved());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod enums;
pub mod error;
pub mod fields;
pub mod geocode;
pub mod http;
pub mod models;
pub mod optimizations;
pub mod params;

#[doc(hidden)]
pub mod test_support;

pub use address::REQUIRED_ADDRESS_KEYS;
pub use client::{NetworkClient, Transport};
pub use config::ClientConfig;
pub use enums::{
    AlgorithmType, DeviceType, DistanceUnit, Format, Metric, OptimizationState, Optimize, RoutePathOutput,
    StateFilter, TravelMode,
};
pub use error::{ApiError, ConfigError, ParamValueError};
pub use fields::Target;
pub use geocode::{fix_geocodes, GeocodeOutcome, GeocodedDestination};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use models::{AddressEntry, Optimization, OptimizationData, PagedList, Route};
pub use optimizations::Optimizations;
pub use params::{has_required_keys, ParameterSet};
