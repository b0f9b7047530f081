//! Turns multi-airport searches into one request per airport pair.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::query::{Leg, Request, SearchOptions};
use crate::url;

/// One hop of a multi-city itinerary before options are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Comma-separated origin and destination lists sharing the same dates.
    /// With a return date every pair becomes a round trip.
    Pairs {
        origins: String,
        destinations: String,
        depart: NaiveDate,
        return_date: Option<NaiveDate>,
    },
    /// A single multi-city itinerary.
    Itinerary(Vec<Hop>),
}

/// Splits `"SYD, mel,,BNE"` into `["SYD", "MEL", "BNE"]`.
pub fn split_codes(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(normalize_code)
        .collect()
}

// Place ids like /m/0vzm are case-sensitive; IATA codes are not.
fn normalize_code(code: &str) -> String {
    if code.starts_with('/') {
        code.to_string()
    } else {
        code.to_uppercase()
    }
}

/// Requests built from an [`Expansion`], plus the airport pairs left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expanded {
    pub requests: Vec<Request>,
    /// Codes listed as both an origin and a destination. Each such pair
    /// would fly nowhere and gets no request.
    pub skipped: Vec<String>,
}

/// Expands into requests, origin-major then destination, in input order.
/// Same-airport pairs are dropped; see [`expand_reported`] to learn which.
pub fn expand(expansion: &Expansion, options: &SearchOptions) -> Result<Vec<Request>, EncodeError> {
    expand_reported(expansion, options).map(|e| e.requests)
}

/// Like [`expand`], but also returns the same-airport pairs that were skipped.
/// Fails when every pair is a same-airport pair.
pub fn expand_reported(
    expansion: &Expansion,
    options: &SearchOptions,
) -> Result<Expanded, EncodeError> {
    match expansion {
        Expansion::Pairs {
            origins,
            destinations,
            depart,
            return_date,
        } => {
            let origins = split_codes(origins);
            let destinations = split_codes(destinations);
            if origins.is_empty() {
                return Err(EncodeError::invalid("origin", "at least one code is required"));
            }
            if destinations.is_empty() {
                return Err(EncodeError::invalid(
                    "destination",
                    "at least one code is required",
                ));
            }

            let mut requests = Vec::with_capacity(origins.len() * destinations.len());
            let mut skipped = Vec::new();
            for origin in &origins {
                for destination in &destinations {
                    if origin == destination {
                        tracing::warn!(code = %origin, "skipping same-airport pair");
                        skipped.push(origin.clone());
                        continue;
                    }
                    let request = match return_date {
                        Some(back) => {
                            Request::round_trip(origin, destination, *depart, *back, options)?
                        }
                        None => Request::one_way(origin, destination, *depart, options)?,
                    };
                    requests.push(request);
                }
            }
            if requests.is_empty() {
                if let Some(code) = skipped.first() {
                    return Err(EncodeError::invalid(
                        "leg",
                        format!("origin and destination are both {code}"),
                    ));
                }
            }
            tracing::debug!(
                origins = origins.len(),
                destinations = destinations.len(),
                skipped = skipped.len(),
                "expanded airport pairs"
            );
            Ok(Expanded { requests, skipped })
        }
        Expansion::Itinerary(hops) => {
            let legs = hops
                .iter()
                .map(|h| {
                    Leg::new(
                        normalize_code(h.origin.trim()),
                        normalize_code(h.destination.trim()),
                        h.date,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expanded {
                requests: vec![Request::multi_city(legs, options)?],
                skipped: Vec::new(),
            })
        }
    }
}

pub fn expand_urls(expansion: &Expansion, options: &SearchOptions) -> Result<Vec<String>, EncodeError> {
    expand(expansion, options)?
        .iter()
        .map(url::encode_url)
        .collect()
}
