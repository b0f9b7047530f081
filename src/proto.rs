//! Encoder and decoder for the `tfs` search message.
//!
//! Layout (see [`crate::schema`]): repeated leg sub-messages, a packed list of
//! passenger kinds, the cabin class and the trip type. Each leg carries its
//! date, optional max stops and airline filters, then origin and destination
//! wrapped in their own location sub-messages.

use chrono::NaiveDate;

use crate::error::{DecodeError, EncodeError};
use crate::query::{
    CabinClass, Leg, LegFilters, Localization, Passengers, Request, StopPreference, TripType,
};
use crate::schema::{self, info, leg as leg_fields, location, passenger, FieldSpec};
use crate::wire::{self, Reader, WireType};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn put_varint(spec: &FieldSpec, value: u64, buf: &mut Vec<u8>) {
    wire::encode_varint_field(spec.number, value, buf);
}

fn put_bytes(spec: &FieldSpec, bytes: &[u8], buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    wire::encode_bytes_field(spec.number, bytes, buf)
}

fn encode_location(code: &str) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    put_bytes(&location::CODE, code.as_bytes(), &mut buf)?;
    Ok(buf)
}

/// Encodes one leg body. `stops` is repeated into every leg since the format
/// has no request-wide stop field.
pub fn encode_leg(leg: &Leg, stops: StopPreference) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();

    let date = leg.date.format(DATE_FORMAT).to_string();
    put_bytes(&leg_fields::DATE, date.as_bytes(), &mut buf)?;

    if let Some(max_stops) = stops.max_stops() {
        put_varint(&leg_fields::MAX_STOPS, max_stops, &mut buf);
    }

    for airline in &leg.filters.airlines {
        put_bytes(&leg_fields::AIRLINES, airline.as_bytes(), &mut buf)?;
    }

    put_bytes(&leg_fields::ORIGIN, &encode_location(&leg.origin)?, &mut buf)?;
    put_bytes(
        &leg_fields::DESTINATION,
        &encode_location(&leg.destination)?,
        &mut buf,
    )?;

    Ok(buf)
}

fn passengers_to_enums(p: &Passengers) -> Vec<u64> {
    let mut vals = Vec::with_capacity(p.total() as usize);
    vals.extend(std::iter::repeat_n(passenger::ADULT, p.adults as usize));
    vals.extend(std::iter::repeat_n(passenger::CHILD, p.children as usize));
    vals.extend(std::iter::repeat_n(
        passenger::INFANT_IN_SEAT,
        p.infants_in_seat as usize,
    ));
    vals.extend(std::iter::repeat_n(
        passenger::INFANT_ON_LAP,
        p.infants_on_lap as usize,
    ));
    vals
}

/// Serializes a validated request. Localization is not part of the message.
pub fn encode(request: &Request) -> Result<Vec<u8>, EncodeError> {
    request.validate()?;

    let mut buf = Vec::new();

    for leg in &request.legs {
        let body = encode_leg(leg, request.stops)?;
        put_bytes(&info::LEG, &body, &mut buf)?;
    }

    let pax = passengers_to_enums(&request.passengers);
    if !pax.is_empty() {
        let mut packed = Vec::new();
        for v in pax {
            wire::encode_varint(v, &mut packed);
        }
        put_bytes(&info::PASSENGERS, &packed, &mut buf)?;
    }

    put_varint(&info::CABIN, request.cabin.tag(), &mut buf);
    put_varint(&info::TRIP, request.trip.tag(), &mut buf);

    Ok(buf)
}

fn check_wire_type(spec: &FieldSpec, found: WireType) -> Result<(), DecodeError> {
    if spec.shape.accepts(found) {
        Ok(())
    } else {
        Err(DecodeError::WireTypeMismatch {
            field: spec.name,
            expected: spec.shape.wire_type() as u8,
            found: found as u8,
        })
    }
}

fn read_text(spec: &FieldSpec, reader: &mut Reader<'_>) -> Result<String, DecodeError> {
    let bytes = reader.read_bytes()?;
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidValue {
        field: spec.name,
        value: "invalid UTF-8".into(),
    })
}

fn skip_unknown(
    container: &str,
    field: u32,
    wire_type: WireType,
    reader: &mut Reader<'_>,
) -> Result<(), DecodeError> {
    tracing::debug!(container, field, ?wire_type, "skipping unknown field");
    reader.skip(wire_type)
}

fn decode_location(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut code = None;

    while !reader.is_empty() {
        let (number, wire_type) = reader.read_tag()?;
        match schema::lookup(location::FIELDS, number).copied() {
            Some(location::CODE) => {
                check_wire_type(&location::CODE, wire_type)?;
                code = Some(read_text(&location::CODE, &mut reader)?);
            }
            _ => skip_unknown("location", number, wire_type, &mut reader)?,
        }
    }

    code.ok_or(DecodeError::MissingField(location::CODE.name))
}

/// Decodes one leg body, returning the leg and the stop preference it carried.
pub fn decode_leg(bytes: &[u8]) -> Result<(Leg, StopPreference), DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut date = None;
    let mut stops = StopPreference::Any;
    let mut airlines = Vec::new();
    let mut origin = None;
    let mut destination = None;

    while !reader.is_empty() {
        let (number, wire_type) = reader.read_tag()?;
        let Some(spec) = schema::lookup(leg_fields::FIELDS, number).copied() else {
            skip_unknown("leg", number, wire_type, &mut reader)?;
            continue;
        };
        check_wire_type(&spec, wire_type)?;

        match spec {
            leg_fields::DATE => date = Some(read_text(&spec, &mut reader)?),
            leg_fields::MAX_STOPS => {
                let n = reader.read_varint()?;
                stops = StopPreference::from_max_stops(n).ok_or(DecodeError::InvalidValue {
                    field: spec.name,
                    value: n.to_string(),
                })?;
            }
            leg_fields::AIRLINES => airlines.push(read_text(&spec, &mut reader)?),
            leg_fields::ORIGIN => origin = Some(decode_location(reader.read_bytes()?)?),
            leg_fields::DESTINATION => {
                destination = Some(decode_location(reader.read_bytes()?)?)
            }
            _ => reader.skip(wire_type)?,
        }
    }

    let date = date.ok_or(DecodeError::MissingField(leg_fields::DATE.name))?;
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|_| DecodeError::MalformedDate(date.clone()))?;
    let origin = origin.ok_or(DecodeError::MissingField(leg_fields::ORIGIN.name))?;
    let destination =
        destination.ok_or(DecodeError::MissingField(leg_fields::DESTINATION.name))?;

    let leg = Leg {
        origin,
        destination,
        date,
        filters: LegFilters { airlines },
    };
    Ok((leg, stops))
}

fn add_passenger(p: &mut Passengers, kind: u64) -> Result<(), DecodeError> {
    let slot = match kind {
        passenger::ADULT => &mut p.adults,
        passenger::CHILD => &mut p.children,
        passenger::INFANT_IN_SEAT => &mut p.infants_in_seat,
        passenger::INFANT_ON_LAP => &mut p.infants_on_lap,
        _ => {
            return Err(DecodeError::InvalidValue {
                field: info::PASSENGERS.name,
                value: kind.to_string(),
            })
        }
    };
    *slot = slot.saturating_add(1);
    Ok(())
}

/// Parses a message body. Fields may arrive in any order and unknown ones are
/// skipped. The returned request carries the default localization.
pub fn decode(bytes: &[u8]) -> Result<Request, DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut legs = Vec::new();
    let mut leg_stops = Vec::new();
    let mut passengers = Passengers {
        adults: 0,
        ..Passengers::default()
    };
    let mut cabin = None;
    let mut trip = None;

    while !reader.is_empty() {
        let (number, wire_type) = reader.read_tag()?;
        let Some(spec) = schema::lookup(info::FIELDS, number).copied() else {
            skip_unknown("info", number, wire_type, &mut reader)?;
            continue;
        };
        check_wire_type(&spec, wire_type)?;

        match spec {
            info::LEG => {
                let (leg, stops) = decode_leg(reader.read_bytes()?)?;
                legs.push(leg);
                leg_stops.push(stops);
            }
            info::PASSENGERS if wire_type == WireType::Varint => {
                add_passenger(&mut passengers, reader.read_varint()?)?;
            }
            info::PASSENGERS => {
                let mut packed = Reader::new(reader.read_bytes()?);
                while !packed.is_empty() {
                    add_passenger(&mut passengers, packed.read_varint()?)?;
                }
            }
            info::CABIN => {
                let tag = reader.read_varint()?;
                cabin = Some(CabinClass::from_tag(tag).ok_or(DecodeError::InvalidValue {
                    field: spec.name,
                    value: tag.to_string(),
                })?);
            }
            info::TRIP => {
                let tag = reader.read_varint()?;
                trip = Some(TripType::from_tag(tag).ok_or(DecodeError::InvalidValue {
                    field: spec.name,
                    value: tag.to_string(),
                })?);
            }
            _ => reader.skip(wire_type)?,
        }
    }

    let trip = trip.ok_or(DecodeError::MissingField(info::TRIP.name))?;
    if !trip.accepts_leg_count(legs.len()) {
        return Err(DecodeError::InconsistentLegCount {
            trip,
            expected: trip.expected_legs(),
            found: legs.len(),
        });
    }

    let stops = leg_stops[0];
    if leg_stops.iter().any(|s| *s != stops) {
        tracing::warn!(?leg_stops, "legs disagree on max stops, using the first leg's");
    }

    Ok(Request {
        trip,
        legs,
        passengers,
        cabin: cabin.unwrap_or_default(),
        stops,
        locale: Localization::default(),
    })
}
