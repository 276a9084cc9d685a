//! Enumerations understood by the Route4Me v4 API.
//!
//! String choices are sent as their wire value (`as_str`); numeric codes are
//! sent as integers (`code`). The field registry validates against the same
//! tables, so a typed setter and a raw `serde_json::Value` are checked
//! identically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParamValueError;

macro_rules! string_choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every accepted wire value, in declaration order.
            pub const WIRE_VALUES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

macro_rules! numeric_code {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(self) -> u8 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

string_choice! {
    /// Response format of list-style endpoints.
    Format { Csv => "csv", Serialized => "serialized", Xml => "xml" }
}

string_choice! {
    TravelMode { Driving => "Driving", Walking => "Walking", Trucking => "Trucking" }
}

string_choice! {
    /// What the optimizer minimises.
    Optimize { Distance => "Distance", Time => "Time", TimeWithTraffic => "timeWithTraffic" }
}

string_choice! {
    DistanceUnit { Mi => "mi", Km => "km" }
}

string_choice! {
    /// Device that submitted the request.
    DeviceType {
        Web => "web",
        IPhone => "iphone",
        IPad => "ipad",
        AndroidPhone => "android_phone",
        AndroidTablet => "android_tablet",
    }
}

string_choice! {
    /// Whether route path points are included in responses.
    RoutePathOutput { None => "None", Points => "Points" }
}

numeric_code! {
    /// Optimization strategy requested from the solver.
    AlgorithmType {
        Tsp = 1,
        Vrp = 2,
        CvrpTwSd = 3,
        CvrpTwMd = 4,
        TspTw = 5,
        TspTwCr = 6,
        Bbcvrp = 7,
    }
}

numeric_code! {
    /// Distance metric used to build the cost matrix.
    Metric {
        Euclidean = 1,
        Manhattan = 2,
        Geodesic = 3,
        Matrix = 4,
        Exact2d = 5,
    }
}

numeric_code! {
    /// Lifecycle state of an optimization problem, owned by the remote service.
    OptimizationState {
        Initial = 1,
        MatrixProcessing = 2,
        Optimizing = 3,
        Optimized = 4,
        Error = 5,
        ComputingDirections = 6,
        InQueue = 7,
    }
}

impl OptimizationState {
    pub fn name(self) -> &'static str {
        match self {
            OptimizationState::Initial => "Initial",
            OptimizationState::MatrixProcessing => "MatrixProcessing",
            OptimizationState::Optimizing => "Optimizing",
            OptimizationState::Optimized => "Optimized",
            OptimizationState::Error => "Error",
            OptimizationState::ComputingDirections => "ComputingDirections",
            OptimizationState::InQueue => "InQueue",
        }
    }

    /// Normalize a mix of states, numeric strings, names and CSV strings.
    ///
    /// Order is preserved and duplicates are kept.
    pub fn parse_many<I, S>(states: I) -> Result<Vec<OptimizationState>, ParamValueError>
    where
        I: IntoIterator<Item = S>,
        S: Into<StateFilter>,
    {
        let mut parsed = Vec::new();
        for filter in states {
            match filter.into() {
                StateFilter::State(state) => parsed.push(state),
                StateFilter::Raw(raw) => {
                    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                        parsed.push(token.parse()?);
                    }
                }
            }
        }
        Ok(parsed)
    }
}

impl fmt::Display for OptimizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizationState {
    type Err = ParamValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let by_code = s.parse::<u8>().ok().and_then(OptimizationState::from_code);
        by_code
            .or_else(|| {
                OptimizationState::ALL
                    .iter()
                    .copied()
                    .find(|state| state.name().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| ParamValueError::new("state", format!("Unknown optimization state `{s}`")))
    }
}

impl TryFrom<u8> for OptimizationState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, String> {
        OptimizationState::from_code(code).ok_or_else(|| format!("unknown optimization state {code}"))
    }
}

impl From<OptimizationState> for u8 {
    fn from(state: OptimizationState) -> Self {
        state.code()
    }
}

impl Serialize for OptimizationState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for OptimizationState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        OptimizationState::try_from(code).map_err(serde::de::Error::custom)
    }
}

/// One entry of a state filter: a typed state or caller-supplied text.
///
/// Text may be a numeric code (`"4"`), a state name (`"Optimized"`) or a
/// comma separated list of either (`"4,5"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateFilter {
    State(OptimizationState),
    Raw(String),
}

impl From<OptimizationState> for StateFilter {
    fn from(state: OptimizationState) -> Self {
        StateFilter::State(state)
    }
}

impl From<&str> for StateFilter {
    fn from(raw: &str) -> Self {
        StateFilter::Raw(raw.to_string())
    }
}

impl From<String> for StateFilter {
    fn from(raw: String) -> Self {
        StateFilter::Raw(raw)
    }
}

impl From<&StateFilter> for StateFilter {
    fn from(filter: &StateFilter) -> Self {
        filter.clone()
    }
}
