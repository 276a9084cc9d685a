//! Batch geocoding of destinations that lack coordinates.
//!
//! All addresses go to the geocoder in one request, `||`-joined, and come back
//! as an ordered XML list of `<destination lat=".." lng=".." destination=".."/>`
//! elements. Results are paired with the inputs by position: the i-th
//! destination borrows `time`, `alias` and `is_depot` from the i-th input.
//! Destinations beyond the end of the input list are reported as errors.
//!
//! Pairing by position assumes the geocoder answers one destination per
//! input, in input order. If it drops or reorders entries the remaining pairs
//! are silently misaligned; the mismatch is only logged.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::client::{NetworkClient, Transport};
use crate::error::ApiError;
use crate::models::{is_truthy, AddressEntry};

pub const GEOCODER_PATH: &str = "/api/geocoder.php";
pub const GEOCODER_SUBDOMAIN: &str = "www";
const ADDRESS_DELIMITER: &str = "||";

/// One `<destination>` element of a geocoder response.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedDestination {
    pub destination: String,
    pub lat: f64,
    pub lng: f64,
    /// Every attribute of the element, including the three above.
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeOutcome {
    /// Destinations that had no input at their position.
    pub errors: Vec<GeocodedDestination>,
    pub addresses: Vec<AddressEntry>,
}

/// Query of the batched geocode request: `format=xml` and every `address`
/// followed by `||`. Inputs without a textual address contribute an empty
/// slot so positions stay aligned.
pub fn geocode_query(addresses: &[Map<String, Value>]) -> Map<String, Value> {
    let joined: String = addresses
        .iter()
        .map(|entry| {
            let address = entry.get("address").and_then(Value::as_str).unwrap_or_default();
            format!("{address}{ADDRESS_DELIMITER}")
        })
        .collect();
    let mut query = Map::new();
    query.insert("format".to_string(), Value::from("xml"));
    query.insert("addresses".to_string(), Value::from(joined));
    query
}

/// Ordered destinations of a geocoder XML response.
pub fn parse_destinations(xml: &str) -> Result<Vec<GeocodedDestination>, ApiError> {
    let mut reader = Reader::from_str(xml);
    let mut destinations = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"destination" =>
            {
                destinations.push(destination_from(&element, destinations.len())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(destinations)
}

/// Pair destinations with inputs by position.
pub fn reconcile(inputs: &[Map<String, Value>], destinations: Vec<GeocodedDestination>) -> GeocodeOutcome {
    if destinations.len() != inputs.len() {
        log::warn!(
            "geocoder returned {} destinations for {} addresses; pairing by position",
            destinations.len(),
            inputs.len()
        );
    }
    let mut outcome = GeocodeOutcome::default();
    for (position, destination) in destinations.into_iter().enumerate() {
        let Some(input) = inputs.get(position) else {
            outcome.errors.push(destination);
            continue;
        };
        outcome.addresses.push(AddressEntry {
            address: destination.destination,
            lat: destination.lat,
            lng: destination.lng,
            time: present(input, "time"),
            alias: present(input, "alias"),
            is_depot: is_truthy(input.get("is_depot")).then_some(1),
        });
    }
    outcome
}

/// Geocode `addresses` in one round-trip and pair the results back.
pub fn fix_geocodes<T: Transport>(
    client: &NetworkClient<T>,
    addresses: &[Map<String, Value>],
) -> Result<GeocodeOutcome, ApiError> {
    let query = geocode_query(addresses);
    let xml = client.get_text(GEOCODER_PATH, GEOCODER_SUBDOMAIN, Some(&query))?;
    let destinations = parse_destinations(&xml)?;
    Ok(reconcile(addresses, destinations))
}

fn destination_from(element: &BytesStart<'_>, position: usize) -> Result<GeocodedDestination, ApiError> {
    let mut attributes = BTreeMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(xml_error)?.into_owned();
        attributes.insert(key, value);
    }
    let coordinate = |name: &str| -> Result<f64, ApiError> {
        attributes
            .get(name)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .ok_or_else(|| ApiError::Deserialization(format!("destination {position} has no valid `{name}`")))
    };
    Ok(GeocodedDestination {
        destination: attributes.get("destination").cloned().unwrap_or_default(),
        lat: coordinate("lat")?,
        lng: coordinate("lng")?,
        attributes,
    })
}

fn present(input: &Map<String, Value>, key: &str) -> Option<Value> {
    input.get(key).filter(|value| !value.is_null()).cloned()
}

fn xml_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::Deserialization(format!("invalid geocoder XML: {err}"))
}
