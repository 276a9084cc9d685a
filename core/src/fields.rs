//! Static registry of request fields.
//!
//! Every field the accumulator accepts is listed once in [`FIELDS`] with the
//! rule its value must satisfy and where an accepted value is stored. Lookups
//! go through [`lookup`]; there is no name-based dispatch beyond this table.

use serde_json::Value;

use crate::enums::{DeviceType, DistanceUnit, Format, Optimize, RoutePathOutput, TravelMode};
use crate::error::ParamValueError;

/// Where an accepted value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The query string (`params`).
    Query,
    /// The request body, under `parameters`.
    Body,
}

/// Routing of a field, fixed or chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Fixed(Target),
    /// The caller picks; `default` applies when it does not.
    Selectable { default: Target },
}

impl Route {
    pub fn resolve(self, requested: Option<Target>) -> Target {
        match self {
            Route::Fixed(target) => target,
            Route::Selectable { default } => requested.unwrap_or(default),
        }
    }
}

/// The check a value must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Integer,
    Float,
    Text,
    /// Membership in a table of wire values.
    Choice {
        values: &'static [&'static str],
        message: &'static str,
    },
    /// Integer 0 or 1.
    Flag,
    /// Integer in `min..=max`.
    Range {
        min: i64,
        max: i64,
        message: &'static str,
    },
    /// `YYYY-MM-DD HH:MM:SS`.
    Timestamp,
}

impl Rule {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Rule::Integer => is_integer(value),
            Rule::Float => value.is_f64(),
            Rule::Text => value.is_string(),
            Rule::Choice { values, .. } => value.as_str().is_some_and(|s| values.contains(&s)),
            Rule::Flag => value.as_i64().is_some_and(|n| n == 0 || n == 1),
            Rule::Range { min, max, .. } => value.as_i64().is_some_and(|n| (min..=max).contains(&n)),
            Rule::Timestamp => value.as_str().is_some_and(is_device_timestamp),
        }
    }

    pub fn constraint(self) -> &'static str {
        match self {
            Rule::Integer => "Must be Integer or Long",
            Rule::Float => "Must be Float",
            Rule::Text => "Must be String",
            Rule::Choice { message, .. } | Rule::Range { message, .. } => message,
            Rule::Flag => "Must be 0 or 1",
            Rule::Timestamp => "Must be YYYY-MM-DD HH:MM:SS format",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rule: Rule,
    pub route: Route,
}

impl FieldSpec {
    /// Check `value` and report where it belongs.
    pub fn validate(&self, value: &Value, requested: Option<Target>) -> Result<Target, ParamValueError> {
        if self.rule.accepts(value) {
            Ok(self.route.resolve(requested))
        } else {
            Err(ParamValueError::new(self.name, self.rule.constraint()))
        }
    }
}

const QUERY: Route = Route::Fixed(Target::Query);
const BODY: Route = Route::Fixed(Target::Body);
const SELECTABLE: Route = Route::Selectable { default: Target::Body };

const fn field(name: &'static str, rule: Rule, route: Route) -> FieldSpec {
    FieldSpec { name, rule, route }
}

pub static FIELDS: &[FieldSpec] = &[
    field(
        "format",
        Rule::Choice {
            values: Format::WIRE_VALUES,
            message: "Must be CSV, SERIALIZED, XML",
        },
        QUERY,
    ),
    field("member_id", Rule::Integer, SELECTABLE),
    field("route_id", Rule::Text, QUERY),
    field("tx_id", Rule::Text, QUERY),
    field("vehicle_id", Rule::Integer, BODY),
    field("course", Rule::Integer, QUERY),
    field("speed", Rule::Float, QUERY),
    field("lat", Rule::Float, QUERY),
    field("lng", Rule::Float, QUERY),
    field("altitude", Rule::Float, QUERY),
    field("device_guid", Rule::Text, QUERY),
    field("app_version", Rule::Text, QUERY),
    field("device_timestamp", Rule::Timestamp, QUERY),
    field(
        "algorithm_type",
        Rule::Range {
            min: 1,
            max: 7,
            message: "Must be ALGORITHM_TYPE: TSP, VRP, CVRP_TW_SD, CVRP_TW_MD, TSP_TW, TSP_TW_CR and BBCVRP",
        },
        BODY,
    ),
    field("route_name", Rule::Text, BODY),
    field("optimization_problem_id", Rule::Text, QUERY),
    field("remote_ip", Rule::Integer, BODY),
    field(
        "travel_mode",
        Rule::Choice {
            values: TravelMode::WIRE_VALUES,
            message: "Must be DRIVING, WALKING, TRUCKING",
        },
        BODY,
    ),
    field(
        "optimize",
        Rule::Choice {
            values: Optimize::WIRE_VALUES,
            message: "Must be DISTANCE, TIME, TIME_WITH_TRAFFIC",
        },
        BODY,
    ),
    field(
        "distance_unit",
        Rule::Choice {
            values: DistanceUnit::WIRE_VALUES,
            message: "Must be MI or KM",
        },
        BODY,
    ),
    field(
        "device_type",
        Rule::Choice {
            values: DeviceType::WIRE_VALUES,
            message: "Must be WEB, IPHONE, IPAD, ANDROID_PHONE, ANDROID_TABLET",
        },
        SELECTABLE,
    ),
    field(
        "route_path_output",
        Rule::Choice {
            values: RoutePathOutput::WIRE_VALUES,
            message: "Must be NONE or POINTS",
        },
        QUERY,
    ),
    field("route_time", Rule::Integer, BODY),
    field("route_max_duration", Rule::Integer, BODY),
    field("vehicle_capacity", Rule::Integer, BODY),
    field("parts", Rule::Integer, BODY),
    field("limit", Rule::Integer, QUERY),
    field("offset", Rule::Integer, QUERY),
    field("vehicle_max_distance_mi", Rule::Integer, BODY),
    field("route_email", Rule::Text, BODY),
    field(
        "metric",
        Rule::Range {
            min: 1,
            max: 7,
            message: "Must be METRIC: EUCLIDEAN, MANHATTAN, GEODESIC, MATRIX, EXACT_2D",
        },
        BODY,
    ),
    field("store_route", Rule::Flag, BODY),
    field("reoptimize", Rule::Flag, QUERY),
    field("share_route", Rule::Flag, BODY),
    field("rt", Rule::Flag, BODY),
    field("directions", Rule::Flag, QUERY),
    field("device_tracking_history", Rule::Flag, QUERY),
];

pub fn lookup(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|entry| entry.name == name)
}

/// Validate one named value against the registry.
///
/// Unknown names are rejected like any other invalid value.
pub fn validate(name: &str, value: &Value, requested: Option<Target>) -> Result<Target, ParamValueError> {
    match lookup(name) {
        Some(entry) => entry.validate(value, requested),
        None => Err(ParamValueError::new(name, "Unknown parameter")),
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

/// `YYYY-MM-DD HH:MM:SS` with month 01-12, day 01-31, hour 00-23 and
/// minute/second 00-59. Calendar validity (e.g. Feb 31) is not checked.
pub fn is_device_timestamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 19 {
        return false;
    }
    let separators = [(4, b'-'), (7, b'-'), (10, b' '), (13, b':'), (16, b':')];
    if separators.iter().any(|&(at, sep)| bytes[at] != sep) {
        return false;
    }
    let number = |from: usize, to: usize| -> Option<u32> {
        let digits = &bytes[from..to];
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        Some(digits.iter().fold(0, |acc, d| acc * 10 + u32::from(d - b'0')))
    };
    let parts = (
        number(0, 4),
        number(5, 7),
        number(8, 10),
        number(11, 13),
        number(14, 16),
        number(17, 19),
    );
    match parts {
        (Some(_), Some(month), Some(day), Some(hour), Some(minute), Some(second)) => {
            (1..=12).contains(&month) && (1..=31).contains(&day) && hour <= 23 && minute <= 59 && second <= 59
        }
        _ => false,
    }
}
