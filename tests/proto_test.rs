use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;

use gfurl::error::DecodeError;
use gfurl::proto;
use gfurl::query::{
    CabinClass, Leg, Localization, Passengers, Request, SearchOptions, StopPreference, TripType,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn encode_b64(request: &Request) -> String {
    STANDARD.encode(proto::encode(request).unwrap())
}

fn decode_b64(blob: &str) -> Result<Request, DecodeError> {
    proto::decode(&STANDARD.decode(blob).unwrap())
}

fn options(passengers: Passengers, cabin: CabinClass, stops: StopPreference) -> SearchOptions {
    SearchOptions {
        passengers,
        cabin,
        stops,
        ..SearchOptions::default()
    }
}

fn adults(n: u32) -> Passengers {
    Passengers {
        adults: n,
        ..Passengers::default()
    }
}

#[test]
fn basic_one_way_economy() {
    let request =
        Request::one_way("LAX", "NRT", date("2026-03-01"), &SearchOptions::default()).unwrap();
    assert_eq!(
        encode_b64(&request),
        "GhoSCjIwMjYtMDMtMDFqBRIDTEFYcgUSA05SVEIBAUgBmAEC"
    );
}

#[test]
fn round_trip_with_return_leg() {
    let request = Request::round_trip(
        "LAX",
        "NRT",
        date("2026-03-01"),
        date("2026-03-10"),
        &SearchOptions::default(),
    )
    .unwrap();
    assert_eq!(
        encode_b64(&request),
        "GhoSCjIwMjYtMDMtMDFqBRIDTEFYcgUSA05SVBoaEgoyMDI2LTAzLTEwagUSA05SVHIFEgNMQVhCAQFIAZgBAQ=="
    );
}

#[test]
fn nonstop_round_trip_reference_blob() {
    let request = Request::round_trip(
        "SYD",
        "MEL",
        date("2025-08-15"),
        date("2025-08-20"),
        &options(adults(1), CabinClass::Economy, StopPreference::Nonstop),
    )
    .unwrap();

    let bytes = proto::encode(&request).unwrap();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    assert_eq!(
        hex,
        "1a1c120a323032352d30382d313528006a051203535944720512034d454c\
         1a1c120a323032352d30382d323028006a0512034d454c72051203535944\
         4201014801980101"
    );
    assert_eq!(
        STANDARD.encode(&bytes),
        "GhwSCjIwMjUtMDgtMTUoAGoFEgNTWURyBRIDTUVMGhwSCjIwMjUtMDgtMjAoAGoFEgNNRUxyBRIDU1lEQgEBSAGYAQE="
    );
}

#[test]
fn multiple_passengers() {
    let pax = Passengers {
        adults: 2,
        children: 1,
        infants_in_seat: 1,
        infants_on_lap: 0,
    };
    let request = Request::one_way(
        "HEL",
        "BCN",
        date("2026-03-01"),
        &options(pax, CabinClass::Economy, StopPreference::Any),
    )
    .unwrap();
    assert_eq!(
        encode_b64(&request),
        "GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkIEAQECA0gBmAEC"
    );
}

#[test]
fn every_passenger_kind() {
    let pax = Passengers {
        adults: 2,
        children: 3,
        infants_in_seat: 1,
        infants_on_lap: 1,
    };
    let request = Request::one_way(
        "HEL",
        "BCN",
        date("2026-03-01"),
        &options(pax.clone(), CabinClass::Economy, StopPreference::Any),
    )
    .unwrap();

    let blob = encode_b64(&request);
    assert_eq!(blob, "GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkIHAQECAgIDBEgBmAEC");
    assert_eq!(decode_b64(&blob).unwrap().passengers, pax);
}

#[test]
fn business_class_with_max_stops() {
    let request = Request::one_way(
        "HEL",
        "BKK",
        date("2026-03-01"),
        &options(adults(1), CabinClass::Business, StopPreference::MaxOneStop),
    )
    .unwrap();
    assert_eq!(
        encode_b64(&request),
        "GhwSCjIwMjYtMDMtMDEoAWoFEgNIRUxyBRIDQktLQgEBSAOYAQI="
    );
}

#[test]
fn with_airline_filter() {
    let opts = SearchOptions {
        airlines: vec!["AY".into(), "IB".into()],
        ..SearchOptions::default()
    };
    let request = Request::one_way("HEL", "BCN", date("2026-03-01"), &opts).unwrap();
    assert_eq!(
        encode_b64(&request),
        "GiISCjIwMjYtMDMtMDEyAkFZMgJJQmoFEgNIRUxyBRIDQkNOQgEBSAGYAQI="
    );
}

#[test]
fn multi_city_three_legs() {
    let legs = vec![
        Leg::new("LAX", "NRT", date("2026-03-01")).unwrap(),
        Leg::new("NRT", "ICN", date("2026-03-05")).unwrap(),
        Leg::new("ICN", "LAX", date("2026-03-10")).unwrap(),
    ];
    let request = Request::multi_city(
        legs,
        &options(adults(2), CabinClass::PremiumEconomy, StopPreference::Any),
    )
    .unwrap();
    assert_eq!(
        encode_b64(&request),
        "GhoSCjIwMjYtMDMtMDFqBRIDTEFYcgUSA05SVBoaEgoyMDI2LTAzLTA1agUSA05SVHIFEgNJQ04aGhIKMjAyNi0wMy0xMGoFEgNJQ05yBRIDTEFYQgIBAUgCmAED"
    );
}

#[test]
fn place_ids_are_encoded_verbatim() {
    let request =
        Request::one_way("/m/04jpl", "/m/07dfk", date("2026-03-01"), &SearchOptions::default())
            .unwrap();
    let blob = encode_b64(&request);
    assert_eq!(
        blob,
        "GiQSCjIwMjYtMDMtMDFqChIIL20vMDRqcGxyChIIL20vMDdkZmtCAQFIAZgBAg=="
    );
    assert_eq!(decode_b64(&blob).unwrap().legs[0].origin, "/m/04jpl");
}

#[test]
fn decode_one_way() {
    let request = decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDTEFYcgUSA05SVEIBAUgBmAEC").unwrap();
    assert_eq!(request.trip, TripType::OneWay);
    assert_eq!(request.legs.len(), 1);
    assert_eq!(request.legs[0].origin, "LAX");
    assert_eq!(request.legs[0].destination, "NRT");
    assert_eq!(request.legs[0].date, date("2026-03-01"));
    assert_eq!(request.passengers, Passengers::default());
    assert_eq!(request.cabin, CabinClass::Economy);
    assert_eq!(request.stops, StopPreference::Any);
    assert_eq!(request.locale, Localization::default());
}

#[test]
fn decode_stops_and_airlines() {
    let biz = decode_b64("GhwSCjIwMjYtMDMtMDEoAWoFEgNIRUxyBRIDQktLQgEBSAOYAQI=").unwrap();
    assert_eq!(biz.cabin, CabinClass::Business);
    assert_eq!(biz.stops, StopPreference::MaxOneStop);

    let filtered = decode_b64("GiISCjIwMjYtMDMtMDEyAkFZMgJJQmoFEgNIRUxyBRIDQkNOQgEBSAGYAQI=").unwrap();
    assert_eq!(filtered.legs[0].filters.airlines, vec!["AY", "IB"]);
}

#[test]
fn round_trip_through_decode() {
    let legs = vec![
        Leg::new("LAX", "NRT", date("2026-03-01")).unwrap(),
        Leg::new("NRT", "ICN", date("2026-03-05")).unwrap(),
        Leg::new("ICN", "LAX", date("2026-03-10")).unwrap(),
    ];
    let mut request = Request::multi_city(
        legs,
        &options(adults(3), CabinClass::First, StopPreference::MaxTwoStops),
    )
    .unwrap();
    request.legs[0].filters.airlines = vec!["JL".into()];

    let decoded = proto::decode(&proto::encode(&request).unwrap()).unwrap();
    assert_eq!(decoded, request);
}

#[test]
fn unknown_fields_and_any_order() {
    // unknown varint first, trip before legs, unpacked passengers, an unknown
    // field inside the leg, cabin last
    let request = decode_b64("mAYHmAECQAFAARogEgoyMDI2LTAzLTAxagUSA0hFTHIFEgNCQ06SAwN4eXpIBA==").unwrap();
    assert_eq!(request.trip, TripType::OneWay);
    assert_eq!(request.passengers, adults(2));
    assert_eq!(request.cabin, CabinClass::First);
    assert_eq!(request.legs[0].origin, "HEL");
    assert_eq!(request.legs[0].destination, "BCN");
}

#[test]
fn disagreeing_leg_stops_use_first_leg() {
    let request = decode_b64(
        "GhwSCjIwMjYtMDMtMDEoAWoFEgNMQVhyBRIDTlJUGhwSCjIwMjYtMDMtMTAoAmoFEgNOUlRyBRIDTEFYQgEBSAGYAQE=",
    )
    .unwrap();
    assert_eq!(request.stops, StopPreference::MaxOneStop);
}

#[test]
fn missing_trip_type() {
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkIBAUgB"),
        Err(DecodeError::MissingField("trip type"))
    );
}

#[test]
fn round_trip_with_one_leg_is_inconsistent() {
    assert!(matches!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkIBAUgBmAEB"),
        Err(DecodeError::InconsistentLegCount {
            trip: TripType::RoundTrip,
            found: 1,
            ..
        })
    ));
}

#[test]
fn malformed_date() {
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMTMtMDFqBRIDSEVMcgUSA0JDTkIBAUgBmAEC"),
        Err(DecodeError::MalformedDate("2026-13-01".into()))
    );
}

#[test]
fn leg_missing_required_fields() {
    assert_eq!(
        decode_b64("GhMSCjIwMjYtMDMtMDFyBRIDQkNOQgEBSAGYAQI="),
        Err(DecodeError::MissingField("origin"))
    );
    assert_eq!(
        decode_b64("GhMSCjIwMjYtMDMtMDFqBRIDSEVMQgEBSAGYAQI="),
        Err(DecodeError::MissingField("destination"))
    );
    assert_eq!(
        decode_b64("Gg5qBRIDSEVMcgUSA0JDTkIBAUgBmAEC"),
        Err(DecodeError::MissingField("date"))
    );
}

#[test]
fn wrong_wire_type() {
    // cabin as a length-delimited field
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkIBAUoBAZgBAg=="),
        Err(DecodeError::WireTypeMismatch {
            field: "cabin class",
            expected: 0,
            found: 2,
        })
    );
    // date as a varint
    assert_eq!(
        decode_b64("GhAQB2oFEgNIRUxyBRIDQkNOQgEBSAGYAQI="),
        Err(DecodeError::WireTypeMismatch {
            field: "date",
            expected: 2,
            found: 0,
        })
    );
}

#[test]
fn unknown_enum_values() {
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkIBAUgFmAEC"),
        Err(DecodeError::InvalidValue {
            field: "cabin class",
            value: "5".into(),
        })
    );
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkIBAUgBmAEE"),
        Err(DecodeError::InvalidValue {
            field: "trip type",
            value: "4".into(),
        })
    );
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDSEVMcgUSA0JDTkICAQVIAZgBAg=="),
        Err(DecodeError::InvalidValue {
            field: "passengers",
            value: "5".into(),
        })
    );
}

#[test]
fn invalid_utf8_text() {
    // 0xff in place of the origin's first letter
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRID/0VMcgUSA0JDTkIBAUgBmAEC"),
        Err(DecodeError::InvalidValue {
            field: "location code",
            value: "invalid UTF-8".into(),
        })
    );
    assert_eq!(
        decode_b64("GhoSCjIwMjYtMDMt/zFqBRIDSEVMcgUSA0JDTkIBAUgBmAEC"),
        Err(DecodeError::InvalidValue {
            field: "date",
            value: "invalid UTF-8".into(),
        })
    );
}

#[test]
fn truncated_message() {
    assert!(matches!(
        decode_b64("GhoSCjIwMjYtMDMtMDFqBRIDTEFYcgUSA05SVEIBAUgBmAE="),
        Err(DecodeError::Truncated { .. })
    ));
}

#[test]
fn empty_input_has_no_trip() {
    assert_eq!(proto::decode(&[]), Err(DecodeError::MissingField("trip type")));
}

#[test]
fn encode_rejects_invalid_request() {
    let mut request =
        Request::one_way("LAX", "NRT", date("2026-03-01"), &SearchOptions::default()).unwrap();
    request.passengers.adults = 0;
    assert!(proto::encode(&request).is_err());
}
