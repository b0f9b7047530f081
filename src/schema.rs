//! Field registry for the `tfs` message.
//!
//! The format is undocumented. Field numbers come from observed URLs, and
//! every field the codecs read or write is declared here once. Fields marked
//! `confirmed: false` have inferred semantics.

use crate::wire::WireType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Varint,
    Text,
    Message,
    /// Repeated varints packed into one length-delimited payload. Decoders
    /// also accept the unpacked form.
    PackedVarint,
}

impl Shape {
    pub fn wire_type(self) -> WireType {
        match self {
            Self::Varint => WireType::Varint,
            Self::Text | Self::Message | Self::PackedVarint => WireType::LengthDelimited,
        }
    }

    pub fn accepts(self, wire_type: WireType) -> bool {
        wire_type == self.wire_type()
            || (self == Self::PackedVarint && wire_type == WireType::Varint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Required,
    Optional,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub number: u32,
    pub shape: Shape,
    pub cardinality: Cardinality,
    pub confirmed: bool,
}

const fn field(
    name: &'static str,
    number: u32,
    shape: Shape,
    cardinality: Cardinality,
    confirmed: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        number,
        shape,
        cardinality,
        confirmed,
    }
}

/// Top-level search message.
pub mod info {
    use super::{field, Cardinality::*, FieldSpec, Shape::*};

    pub const LEG: FieldSpec = field("leg", 3, Message, Repeated, true);
    pub const PASSENGERS: FieldSpec = field("passengers", 8, PackedVarint, Repeated, true);
    pub const CABIN: FieldSpec = field("cabin class", 9, Varint, Optional, true);
    pub const TRIP: FieldSpec = field("trip type", 19, Varint, Required, true);

    /// Encode order.
    pub const FIELDS: &[FieldSpec] = &[LEG, PASSENGERS, CABIN, TRIP];
}

/// One itinerary leg.
pub mod leg {
    use super::{field, Cardinality::*, FieldSpec, Shape::*};

    pub const DATE: FieldSpec = field("date", 2, Text, Required, true);
    pub const MAX_STOPS: FieldSpec = field("max stops", 5, Varint, Optional, false);
    pub const AIRLINES: FieldSpec = field("airlines", 6, Text, Repeated, false);
    pub const ORIGIN: FieldSpec = field("origin", 13, Message, Required, true);
    pub const DESTINATION: FieldSpec = field("destination", 14, Message, Required, true);

    pub const FIELDS: &[FieldSpec] = &[DATE, MAX_STOPS, AIRLINES, ORIGIN, DESTINATION];
}

/// Airport or place wrapper used by a leg's origin and destination.
pub mod location {
    use super::{field, Cardinality::*, FieldSpec, Shape::*};

    pub const CODE: FieldSpec = field("location code", 2, Text, Required, true);

    pub const FIELDS: &[FieldSpec] = &[CODE];
}

/// Passenger kinds as they appear in the packed passengers list.
pub mod passenger {
    pub const ADULT: u64 = 1;
    pub const CHILD: u64 = 2;
    pub const INFANT_IN_SEAT: u64 = 3;
    pub const INFANT_ON_LAP: u64 = 4;
}

pub fn lookup(fields: &'static [FieldSpec], number: u32) -> Option<&'static FieldSpec> {
    fields.iter().find(|f| f.number == number)
}

/// Numbers must be unique within a message.
pub fn is_well_formed(fields: &[FieldSpec]) -> bool {
    fields
        .iter()
        .enumerate()
        .all(|(i, f)| fields[i + 1..].iter().all(|g| g.number != f.number))
}
