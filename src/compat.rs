//! Translation from SerpApi's Google Flights parameters.
//!
//! SerpApi codes: `type` 1 round trip, 2 one-way, 3 multi-city;
//! `travel_class` 1 economy .. 4 first; `stops` 0 any, 1 nonstop,
//! 2 one stop or fewer, 3 two stops or fewer. Parameters with no place in the
//! `tfs` message are reported in [`Coverage::unmatched`] instead of being
//! approximated. [`Translation::serpapi_params`] keeps the full parameter
//! set for a direct SerpApi call when the URLs are not enough.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CompatError, EncodeError};
use crate::expand::{self, Expansion, Hop};
use crate::query::{
    parse_date, validate_location, CabinClass, Passengers, Request, SearchOptions, StopPreference,
};
use crate::url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    /// Parameters represented in the generated URLs.
    pub encoded: Vec<String>,
    /// Parameters that could not be represented, with the reason.
    pub unmatched: Vec<String>,
}

/// A generated URL with the coverage it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub requests: Vec<Request>,
    pub coverage: Coverage,
    params: Map<String, Value>,
}

/// Keys SerpApi's `google_flights` engine accepts.
const SERPAPI_KEYS: &[&str] = &[
    "engine",
    "departure_id",
    "arrival_id",
    "outbound_date",
    "return_date",
    "hl",
    "gl",
    "currency",
    "type",
    "travel_class",
    "adults",
    "children",
    "infants_in_seat",
    "infants_on_lap",
    "stops",
    "include_airlines",
    "exclude_airlines",
    "bags",
    "max_price",
    "sort_by",
    "emissions",
    "layover_duration",
    "exclude_conns",
    "max_duration",
    "outbound_times",
    "return_times",
    "multi_city_json",
    "departure_token",
    "booking_token",
    "deep_search",
    "show_hidden",
    "no_cache",
    "async",
    "zero_trace",
    "api_key",
    "output",
    "json_restrictor",
];

fn is_empty_param(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn csv(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl Translation {
    pub fn urls(&self) -> Result<Vec<String>, EncodeError> {
        self.requests.iter().map(url::encode_url).collect()
    }

    /// One entry per URL. Every URL comes from the same parameters, so they
    /// share the request-wide coverage.
    pub fn links(&self) -> Result<Vec<Link>, EncodeError> {
        Ok(self
            .urls()?
            .into_iter()
            .map(|url| Link {
                url,
                coverage: self.coverage.clone(),
            })
            .collect())
    }

    /// The input cleaned into a ready-to-send SerpApi request: unknown keys
    /// and empty values dropped, airline lists joined into CSV, and `engine`
    /// defaulting to `google_flights`.
    pub fn serpapi_params(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in &self.params {
            if !SERPAPI_KEYS.contains(&key.as_str()) || is_empty_param(value) {
                continue;
            }
            let value = match (key.as_str(), value) {
                ("include_airlines" | "exclude_airlines", Value::Array(items)) => {
                    Value::String(csv(items))
                }
                _ => value.clone(),
            };
            out.insert(key.clone(), value);
        }
        out.entry("engine")
            .or_insert_with(|| Value::String("google_flights".into()));
        out
    }
}

/// Raw SerpApi parameters, typed but not yet cross-checked.
#[derive(Debug, Default)]
struct Params {
    departure_id: Option<String>,
    arrival_id: Option<String>,
    outbound_date: Option<String>,
    return_date: Option<String>,
    trip_type: Option<u64>,
    travel_class: Option<u64>,
    stops: Option<u64>,
    adults: Option<u32>,
    children: Option<u32>,
    infants_in_seat: Option<u32>,
    infants_on_lap: Option<u32>,
    include_airlines: Option<String>,
    multi_city_json: Option<Value>,
    hl: Option<String>,
    gl: Option<String>,
    currency: Option<String>,
}

fn text(key: &'static str, value: &Value) -> Result<Option<String>, CompatError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        _ => Err(CompatError::WrongType {
            key,
            expected: "a string",
        }),
    }
}

fn integer(key: &'static str, value: &Value) -> Result<Option<u64>, CompatError> {
    let wrong = CompatError::WrongType {
        key,
        expected: "a non-negative integer",
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(Some).ok_or(wrong),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(|_| wrong),
        _ => Err(wrong),
    }
}

// SerpApi takes a CSV string; a JSON array of codes is accepted too.
fn airline_list(value: &Value) -> Result<Option<String>, CompatError> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => {
            let joined = csv(items);
            Ok((!joined.is_empty()).then_some(joined))
        }
        Value::Array(_) => Err(CompatError::WrongType {
            key: "include_airlines",
            expected: "a CSV string or an array of strings",
        }),
        other => text("include_airlines", other),
    }
}

fn count(key: &'static str, value: &Value) -> Result<Option<u32>, CompatError> {
    integer(key, value)?
        .map(|n| {
            u32::try_from(n).map_err(|_| CompatError::InvalidValue {
                key,
                value: n.to_string(),
            })
        })
        .transpose()
}

/// True when a parameter with no URL equivalent was actually set.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty() && s != "0" && s != "false",
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn required<T>(key: &'static str, value: Option<T>) -> Result<T, CompatError> {
    value.ok_or(CompatError::MissingKey(key))
}

fn date(key: &'static str, value: &str) -> Result<chrono::NaiveDate, CompatError> {
    parse_date(value).map_err(|_| CompatError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn location(key: &'static str, code: &str) -> Result<(), CompatError> {
    validate_location(code).map_err(|_| CompatError::InvalidValue {
        key,
        value: code.to_string(),
    })
}

fn parse_params(
    obj: &Map<String, Value>,
    encoded: &mut BTreeSet<String>,
    unmatched: &mut BTreeSet<String>,
) -> Result<Params, CompatError> {
    let mut p = Params::default();

    for (key, value) in obj {
        match key.as_str() {
            "departure_id" => p.departure_id = text("departure_id", value)?,
            "arrival_id" => p.arrival_id = text("arrival_id", value)?,
            "outbound_date" => p.outbound_date = text("outbound_date", value)?,
            "return_date" => p.return_date = text("return_date", value)?,
            "type" => p.trip_type = integer("type", value)?,
            "travel_class" => p.travel_class = integer("travel_class", value)?,
            "stops" => p.stops = integer("stops", value)?,
            "adults" => p.adults = count("adults", value)?,
            "children" => p.children = count("children", value)?,
            "infants_in_seat" => p.infants_in_seat = count("infants_in_seat", value)?,
            "infants_on_lap" => p.infants_on_lap = count("infants_on_lap", value)?,
            "include_airlines" => p.include_airlines = airline_list(value)?,
            "multi_city_json" => {
                if !value.is_null() {
                    p.multi_city_json = Some(value.clone());
                }
            }
            "hl" => p.hl = text("hl", value)?,
            "gl" => p.gl = text("gl", value)?,
            "currency" => p.currency = text("currency", value)?,
            "exclude_airlines" => {
                if is_set(value) {
                    unmatched.insert("exclude_airlines (no tfs field)".into());
                }
            }
            "outbound_times" | "return_times" => {
                if is_set(value) {
                    unmatched.insert(format!("{key} (time windows are not encoded)"));
                }
            }
            "bags" | "max_price" | "sort_by" | "emissions" | "layover_duration"
            | "exclude_conns" | "max_duration" => {
                if is_set(value) {
                    unmatched.insert(format!("{key} (no URL equivalent)"));
                }
            }
            "deep_search" | "show_hidden" | "departure_token" | "booking_token" => {
                if is_set(value) {
                    unmatched.insert(format!("{key} (SerpApi-only)"));
                }
            }
            // transport-level settings of the SerpApi request itself
            "engine" | "api_key" | "no_cache" | "async" | "zero_trace" | "output"
            | "json_restrictor" => {}
            other => {
                unmatched.insert(format!("{other} (unrecognized)"));
            }
        }
        if !value.is_null() && matches!(key.as_str(), "hl" | "gl" | "currency") {
            encoded.insert(key.clone());
        }
    }

    Ok(p)
}

fn options_from(p: &Params, encoded: &mut BTreeSet<String>) -> Result<SearchOptions, CompatError> {
    let mut options = SearchOptions::default();

    if let Some(class) = p.travel_class {
        options.cabin = match class {
            1 => CabinClass::Economy,
            2 => CabinClass::PremiumEconomy,
            3 => CabinClass::Business,
            4 => CabinClass::First,
            _ => {
                return Err(CompatError::InvalidValue {
                    key: "travel_class",
                    value: class.to_string(),
                })
            }
        };
        encoded.insert("travel_class".into());
    }

    if let Some(stops) = p.stops {
        options.stops = match stops {
            0 => StopPreference::Any,
            1 => StopPreference::Nonstop,
            2 => StopPreference::MaxOneStop,
            3 => StopPreference::MaxTwoStops,
            _ => {
                return Err(CompatError::InvalidValue {
                    key: "stops",
                    value: stops.to_string(),
                })
            }
        };
        encoded.insert("stops".into());
    }

    let defaults = Passengers::default();
    options.passengers = Passengers {
        adults: p.adults.unwrap_or(defaults.adults),
        children: p.children.unwrap_or(defaults.children),
        infants_in_seat: p.infants_in_seat.unwrap_or(defaults.infants_in_seat),
        infants_on_lap: p.infants_on_lap.unwrap_or(defaults.infants_on_lap),
    };
    for (key, set) in [
        ("adults", p.adults.is_some()),
        ("children", p.children.is_some()),
        ("infants_in_seat", p.infants_in_seat.is_some()),
        ("infants_on_lap", p.infants_on_lap.is_some()),
    ] {
        if set {
            encoded.insert(key.into());
        }
    }

    if let Some(ref airlines) = p.include_airlines {
        options.airlines = airlines
            .split(',')
            .map(|a| a.trim().to_uppercase())
            .filter(|a| !a.is_empty())
            .collect();
        encoded.insert("include_airlines".into());
    }

    if let Some(ref hl) = p.hl {
        options.locale.language = hl.clone();
    }
    if let Some(ref gl) = p.gl {
        options.locale.country = gl.clone();
    }
    if let Some(ref currency) = p.currency {
        options.locale.currency = currency.clone();
    }

    Ok(options)
}

fn itinerary(value: &Value) -> Result<Vec<Hop>, CompatError> {
    let parsed;
    let value = match value {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s).map_err(|e| CompatError::InvalidValue {
                key: "multi_city_json",
                value: e.to_string(),
            })?;
            &parsed
        }
        other => other,
    };

    let legs = value.as_array().ok_or(CompatError::WrongType {
        key: "multi_city_json",
        expected: "a JSON array of legs",
    })?;
    if legs.is_empty() {
        return Err(CompatError::InvalidValue {
            key: "multi_city_json",
            value: "[]".into(),
        });
    }

    legs.iter()
        .map(|leg| {
            let leg = leg.as_object().ok_or(CompatError::WrongType {
                key: "multi_city_json",
                expected: "an array of objects",
            })?;
            let field = |key: &'static str| -> Result<String, CompatError> {
                let value = leg.get(key).unwrap_or(&Value::Null);
                required(key, text(key, value)?)
            };
            let origin = field("departure_id")?;
            let destination = field("arrival_id")?;
            location("departure_id", &origin)?;
            location("arrival_id", &destination)?;
            Ok(Hop {
                origin,
                destination,
                date: date("date", &field("date")?)?,
            })
        })
        .collect()
}

/// Translates a SerpApi parameter object into requests, one per airport pair
/// (or one for a multi-city itinerary), plus a coverage report.
pub fn translate(params: &Value) -> Result<Translation, CompatError> {
    let obj = params.as_object().ok_or(CompatError::NotAnObject)?;

    let mut encoded = BTreeSet::new();
    let mut unmatched = BTreeSet::new();
    let p = parse_params(obj, &mut encoded, &mut unmatched)?;
    let options = options_from(&p, &mut encoded)?;

    let multi_city = p.trip_type == Some(3) || p.multi_city_json.is_some();

    let expansion = if multi_city {
        let json = required("multi_city_json", p.multi_city_json.as_ref())?;
        encoded.insert("multi_city_json".into());
        encoded.insert("type".into());
        Expansion::Itinerary(itinerary(json)?)
    } else {
        let departure = required("departure_id", p.departure_id.clone())?;
        let arrival = required("arrival_id", p.arrival_id.clone())?;
        for code in expand::split_codes(&departure) {
            location("departure_id", &code)?;
        }
        for code in expand::split_codes(&arrival) {
            location("arrival_id", &code)?;
        }
        let outbound = date(
            "outbound_date",
            &required("outbound_date", p.outbound_date.clone())?,
        )?;

        let return_date = match (p.trip_type, &p.return_date) {
            (Some(1), None) => return Err(CompatError::MissingKey("return_date")),
            (Some(1) | None, Some(d)) => Some(date("return_date", d)?),
            (Some(2) | None, None) => None,
            (Some(2), Some(_)) => {
                unmatched.insert("return_date (ignored for one-way)".into());
                None
            }
            (Some(other), _) => {
                return Err(CompatError::InvalidValue {
                    key: "type",
                    value: other.to_string(),
                })
            }
        };

        encoded.extend(
            ["departure_id", "arrival_id", "outbound_date"]
                .into_iter()
                .map(String::from),
        );
        if return_date.is_some() {
            encoded.insert("return_date".into());
        }
        if p.trip_type.is_some() {
            encoded.insert("type".into());
        }

        Expansion::Pairs {
            origins: departure,
            destinations: arrival,
            depart: outbound,
            return_date,
        }
    };

    let expanded = expand::expand_reported(&expansion, &options)?;
    for code in &expanded.skipped {
        unmatched.insert(format!("{code} -> {code} (same-airport pair skipped)"));
    }

    Ok(Translation {
        requests: expanded.requests,
        coverage: Coverage {
            encoded: encoded.into_iter().collect(),
            unmatched: unmatched.into_iter().collect(),
        },
        params: obj.clone(),
    })
}
