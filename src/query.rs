use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// Maximum travellers the search page accepts in one booking.
pub const MAX_PASSENGERS: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passengers {
    pub adults: u32,
    pub children: u32,
    pub infants_in_seat: u32,
    pub infants_on_lap: u32,
}

impl Default for Passengers {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            infants_in_seat: 0,
            infants_on_lap: 0,
        }
    }
}

impl Passengers {
    pub fn total(&self) -> u32 {
        self.adults
            .saturating_add(self.children)
            .saturating_add(self.infants_in_seat)
            .saturating_add(self.infants_on_lap)
    }

    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.adults == 0 {
            return Err(EncodeError::invalid(
                "passengers",
                "at least one adult is required",
            ));
        }

        if self.infants_on_lap > self.adults {
            return Err(EncodeError::invalid(
                "passengers",
                format!(
                    "infants on lap ({}) cannot exceed number of adults ({})",
                    self.infants_on_lap, self.adults
                ),
            ));
        }

        let total = self.total();
        if total > MAX_PASSENGERS {
            return Err(EncodeError::invalid(
                "passengers",
                format!("total passengers ({total}) exceeds maximum of {MAX_PASSENGERS}"),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn from_str_loose(s: &str) -> Result<Self, EncodeError> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "economy" | "e" => Ok(Self::Economy),
            "premium-economy" | "premium" => Ok(Self::PremiumEconomy),
            "business" | "b" => Ok(Self::Business),
            "first" | "f" => Ok(Self::First),
            _ => Err(EncodeError::invalid(
                "cabin class",
                format!("\"{s}\" (expected economy, premium-economy, business or first)"),
            )),
        }
    }

    pub fn tag(self) -> u64 {
        match self {
            Self::Economy => 1,
            Self::PremiumEconomy => 2,
            Self::Business => 3,
            Self::First => 4,
        }
    }

    pub fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            1 => Some(Self::Economy),
            2 => Some(Self::PremiumEconomy),
            3 => Some(Self::Business),
            4 => Some(Self::First),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::PremiumEconomy => "premium economy",
            Self::Business => "business class",
            Self::First => "first class",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    OneWay,
    RoundTrip,
    MultiCity,
}

impl TripType {
    pub fn from_str_loose(s: &str) -> Result<Self, EncodeError> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "one-way" | "oneway" => Ok(Self::OneWay),
            "round-trip" | "roundtrip" => Ok(Self::RoundTrip),
            "multi-city" | "multicity" => Ok(Self::MultiCity),
            _ => Err(EncodeError::invalid(
                "trip type",
                format!("\"{s}\" (expected one-way, round-trip or multi-city)"),
            )),
        }
    }

    pub fn tag(self) -> u64 {
        match self {
            Self::RoundTrip => 1,
            Self::OneWay => 2,
            Self::MultiCity => 3,
        }
    }

    pub fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            1 => Some(Self::RoundTrip),
            2 => Some(Self::OneWay),
            3 => Some(Self::MultiCity),
            _ => None,
        }
    }

    pub fn accepts_leg_count(self, legs: usize) -> bool {
        match self {
            Self::OneWay => legs == 1,
            Self::RoundTrip => legs == 2,
            Self::MultiCity => legs >= 2,
        }
    }

    pub fn expected_legs(self) -> &'static str {
        match self {
            Self::OneWay => "exactly 1",
            Self::RoundTrip => "exactly 2",
            Self::MultiCity => "2 or more",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OneWay => "one-way",
            Self::RoundTrip => "round-trip",
            Self::MultiCity => "multi-city",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopPreference {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "nonstop")]
    Nonstop,
    #[serde(rename = "max-1-stop")]
    MaxOneStop,
    #[serde(rename = "max-2-stops")]
    MaxTwoStops,
}

impl StopPreference {
    /// Value of the per-leg max stops field; `None` leaves it off the wire.
    pub fn max_stops(self) -> Option<u64> {
        match self {
            Self::Any => None,
            Self::Nonstop => Some(0),
            Self::MaxOneStop => Some(1),
            Self::MaxTwoStops => Some(2),
        }
    }

    pub fn from_max_stops(n: u64) -> Option<Self> {
        match n {
            0 => Some(Self::Nonstop),
            1 => Some(Self::MaxOneStop),
            2 => Some(Self::MaxTwoStops),
            _ => None,
        }
    }

    pub fn from_str_loose(s: &str) -> Result<Self, EncodeError> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "any" => Ok(Self::Any),
            "nonstop" | "0" => Ok(Self::Nonstop),
            "max-1" | "max-1-stop" | "1" => Ok(Self::MaxOneStop),
            "max-2" | "max-2-stops" | "2" => Ok(Self::MaxTwoStops),
            _ => Err(EncodeError::invalid(
                "stops",
                format!("\"{s}\" (expected any, nonstop, max-1 or max-2)"),
            )),
        }
    }
}

impl fmt::Display for StopPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "any",
            Self::Nonstop => "nonstop",
            Self::MaxOneStop => "max 1 stop",
            Self::MaxTwoStops => "max 2 stops",
        })
    }
}

/// Language, market and currency. These ride next to the blob as plain
/// query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localization {
    pub language: String,
    pub country: String,
    pub currency: String,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            language: "en".into(),
            country: "US".into(),
            currency: "USD".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegFilters {
    /// Restrict the leg to these carriers (IATA airline or alliance codes).
    pub airlines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub filters: LegFilters,
}

impl Leg {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self, EncodeError> {
        let leg = Self {
            origin: origin.into(),
            destination: destination.into(),
            date,
            filters: LegFilters::default(),
        };
        leg.validate()?;
        Ok(leg)
    }

    pub fn with_airlines(mut self, airlines: Vec<String>) -> Self {
        self.filters.airlines = airlines;
        self
    }

    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.origin.is_empty() {
            return Err(EncodeError::invalid("origin", "must not be empty"));
        }
        if self.destination.is_empty() {
            return Err(EncodeError::invalid("destination", "must not be empty"));
        }
        if self.origin == self.destination {
            return Err(EncodeError::invalid(
                "leg",
                format!("origin and destination are both {}", self.origin),
            ));
        }
        if self.filters.airlines.iter().any(|a| a.is_empty()) {
            return Err(EncodeError::invalid("airlines", "empty airline code"));
        }
        Ok(())
    }

    fn reverses(&self, other: &Leg) -> bool {
        self.origin == other.destination && self.destination == other.origin
    }
}

/// Every option a search accepts besides its airports and dates, with the
/// defaults the search page itself uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub passengers: Passengers,
    pub cabin: CabinClass,
    pub stops: StopPreference,
    /// Applied to every leg.
    pub airlines: Vec<String>,
    pub locale: Localization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub trip: TripType,
    pub legs: Vec<Leg>,
    pub passengers: Passengers,
    pub cabin: CabinClass,
    pub stops: StopPreference,
    pub locale: Localization,
}

impl Request {
    fn assemble(
        trip: TripType,
        legs: Vec<Leg>,
        options: &SearchOptions,
    ) -> Result<Self, EncodeError> {
        let legs = legs
            .into_iter()
            .map(|leg| leg.with_airlines(options.airlines.clone()))
            .collect();
        let request = Self {
            trip,
            legs,
            passengers: options.passengers.clone(),
            cabin: options.cabin,
            stops: options.stops,
            locale: options.locale.clone(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn one_way(
        origin: &str,
        destination: &str,
        date: NaiveDate,
        options: &SearchOptions,
    ) -> Result<Self, EncodeError> {
        let leg = Leg::new(origin, destination, date)?;
        Self::assemble(TripType::OneWay, vec![leg], options)
    }

    pub fn round_trip(
        origin: &str,
        destination: &str,
        depart: NaiveDate,
        return_date: NaiveDate,
        options: &SearchOptions,
    ) -> Result<Self, EncodeError> {
        let legs = vec![
            Leg::new(origin, destination, depart)?,
            Leg::new(destination, origin, return_date)?,
        ];
        Self::assemble(TripType::RoundTrip, legs, options)
    }

    pub fn multi_city(legs: Vec<Leg>, options: &SearchOptions) -> Result<Self, EncodeError> {
        Self::assemble(TripType::MultiCity, legs, options)
    }

    pub fn validate(&self) -> Result<(), EncodeError> {
        if !self.trip.accepts_leg_count(self.legs.len()) {
            return Err(EncodeError::invalid(
                "legs",
                format!(
                    "{} trip needs {} leg(s), got {}",
                    self.trip,
                    self.trip.expected_legs(),
                    self.legs.len()
                ),
            ));
        }

        for leg in &self.legs {
            leg.validate()?;
        }

        if self.trip == TripType::RoundTrip && !self.legs[1].reverses(&self.legs[0]) {
            return Err(EncodeError::invalid(
                "legs",
                "round-trip return leg must reverse the outbound airports",
            ));
        }

        self.passengers.validate()
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, EncodeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| EncodeError::invalid("date", format!("\"{s}\" (expected YYYY-MM-DD)")))
}

/// Accepts a three-character IATA code or a Knowledge Graph place id such as
/// `/m/04jpl`.
pub fn validate_location(code: &str) -> Result<(), EncodeError> {
    let is_iata = code.len() == 3
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    let is_place_id = ["/m/", "/g/"].iter().any(|prefix| {
        code.strip_prefix(prefix).is_some_and(|rest| {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
    });

    if is_iata || is_place_id {
        Ok(())
    } else {
        Err(EncodeError::invalid(
            "location",
            format!("\"{code}\" (expected an IATA code like SYD or a place id like /m/0vzm)"),
        ))
    }
}

pub enum SearchQuery {
    Structured(Request),
    NaturalLanguage(String, Localization),
}

impl SearchQuery {
    /// Builds the free-text search box form of a request.
    pub fn natural_language(request: &Request) -> Self {
        Self::NaturalLanguage(describe(request), request.locale.clone())
    }

    pub fn to_url_params(&self) -> Result<Vec<(String, String)>, EncodeError> {
        match self {
            Self::Structured(request) => crate::url::to_url_params(request),
            Self::NaturalLanguage(text, locale) => {
                let mut params = vec![("q".to_string(), text.clone())];
                params.extend(crate::url::locale_params(locale));
                Ok(params)
            }
        }
    }

    pub fn to_url(&self) -> Result<String, EncodeError> {
        Ok(crate::url::build_url(&self.to_url_params()?))
    }
}

fn describe(request: &Request) -> String {
    let legs = &request.legs;
    let mut text = match (request.trip, legs.as_slice()) {
        (TripType::RoundTrip, [out, back]) => format!(
            "flights from {} to {} on {} returning {}",
            out.origin, out.destination, out.date, back.date
        ),
        (TripType::OneWay, [leg]) => format!(
            "flights from {} to {} on {}",
            leg.origin, leg.destination, leg.date
        ),
        _ => {
            let hops: Vec<String> = legs
                .iter()
                .map(|l| format!("{} to {} on {}", l.origin, l.destination, l.date))
                .collect();
            format!("flights {}", hops.join(" then "))
        }
    };

    let p = &request.passengers;
    let infants = p.infants_in_seat.saturating_add(p.infants_on_lap);
    let mut who = Vec::new();
    if p.adults > 1 {
        who.push(format!("{} adults", p.adults));
    } else if p.adults == 1 && (p.children > 0 || infants > 0) {
        who.push("1 adult".to_string());
    }
    if p.children > 0 {
        who.push(format!("{} children", p.children));
    }
    if infants > 0 {
        who.push(format!("{infants} infants"));
    }
    if !who.is_empty() {
        text.push_str(" for ");
        text.push_str(&who.join(", "));
    }

    if request.cabin != CabinClass::Economy {
        text.push_str(" in ");
        text.push_str(request.cabin.label());
    }

    match request.stops {
        StopPreference::Any => {}
        StopPreference::Nonstop => text.push_str(" nonstop"),
        other => {
            text.push_str(" with ");
            text.push_str(&other.to_string());
        }
    }

    text
}
