use chrono::NaiveDate;

use gfurl::error::EncodeError;
use gfurl::query::{
    parse_date, validate_location, CabinClass, Leg, Passengers, Request, SearchOptions,
    SearchQuery, StopPreference, TripType,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn invalid_field(result: Result<impl std::fmt::Debug, EncodeError>) -> &'static str {
    match result {
        Err(EncodeError::InvalidField { field, .. }) => field,
        other => panic!("expected InvalidField, got {other:?}"),
    }
}

#[test]
fn cabin_class_parsing() {
    assert_eq!(CabinClass::from_str_loose("economy").unwrap(), CabinClass::Economy);
    assert_eq!(
        CabinClass::from_str_loose("premium_economy").unwrap(),
        CabinClass::PremiumEconomy
    );
    assert_eq!(CabinClass::from_str_loose("BUSINESS").unwrap(), CabinClass::Business);
    assert_eq!(CabinClass::from_str_loose("first").unwrap(), CabinClass::First);
    assert!(CabinClass::from_str_loose("cargo").is_err());
}

#[test]
fn enum_tags_match_wire_values() {
    assert_eq!(TripType::RoundTrip.tag(), 1);
    assert_eq!(TripType::OneWay.tag(), 2);
    assert_eq!(TripType::MultiCity.tag(), 3);
    assert_eq!(CabinClass::Economy.tag(), 1);
    assert_eq!(CabinClass::First.tag(), 4);
    assert_eq!(TripType::from_tag(0), None);
    assert_eq!(CabinClass::from_tag(5), None);
}

#[test]
fn stop_preference_values() {
    assert_eq!(StopPreference::Any.max_stops(), None);
    assert_eq!(StopPreference::Nonstop.max_stops(), Some(0));
    assert_eq!(StopPreference::from_max_stops(2), Some(StopPreference::MaxTwoStops));
    assert_eq!(StopPreference::from_max_stops(3), None);
    assert_eq!(
        StopPreference::from_str_loose("max-1").unwrap(),
        StopPreference::MaxOneStop
    );
}

#[test]
fn date_parsing() {
    assert_eq!(parse_date("2025-08-15").unwrap(), date("2025-08-15"));
    assert_eq!(invalid_field(parse_date("15/08/2025")), "date");
    assert_eq!(invalid_field(parse_date("2025-02-30")), "date");
}

#[test]
fn location_codes() {
    assert!(validate_location("SYD").is_ok());
    assert!(validate_location("/m/04jpl").is_ok());
    assert!(validate_location("/g/11b6d1x5xr").is_ok());
    assert!(validate_location("syd").is_err());
    assert!(validate_location("SYDN").is_err());
    assert!(validate_location("/m/").is_err());
}

#[test]
fn leg_rejects_same_origin_and_destination() {
    assert_eq!(invalid_field(Leg::new("SYD", "SYD", date("2025-08-15"))), "leg");
    assert_eq!(invalid_field(Leg::new("", "MEL", date("2025-08-15"))), "origin");
}

#[test]
fn passenger_validation() {
    let ok = Passengers {
        adults: 2,
        children: 3,
        infants_in_seat: 1,
        infants_on_lap: 1,
    };
    assert!(ok.validate().is_ok());

    let no_adults = Passengers {
        adults: 0,
        children: 1,
        ..Passengers::default()
    };
    assert_eq!(invalid_field(no_adults.validate()), "passengers");

    let too_many_laps = Passengers {
        adults: 1,
        infants_on_lap: 2,
        ..Passengers::default()
    };
    assert_eq!(invalid_field(too_many_laps.validate()), "passengers");

    let over_limit = Passengers {
        adults: 8,
        children: 2,
        ..Passengers::default()
    };
    assert_eq!(invalid_field(over_limit.validate()), "passengers");
}

#[test]
fn round_trip_builds_reversed_return_leg() {
    let request = Request::round_trip(
        "SYD",
        "MEL",
        date("2025-08-15"),
        date("2025-08-20"),
        &SearchOptions::default(),
    )
    .unwrap();
    assert_eq!(request.trip, TripType::RoundTrip);
    assert_eq!(request.legs[1].origin, "MEL");
    assert_eq!(request.legs[1].destination, "SYD");
    assert_eq!(request.legs[1].date, date("2025-08-20"));
}

#[test]
fn options_apply_airlines_to_every_leg() {
    let opts = SearchOptions {
        airlines: vec!["QF".into()],
        ..SearchOptions::default()
    };
    let request =
        Request::round_trip("SYD", "MEL", date("2025-08-15"), date("2025-08-20"), &opts).unwrap();
    assert!(request.legs.iter().all(|l| l.filters.airlines == ["QF"]));
}

#[test]
fn one_way_with_two_legs_is_rejected() {
    let mut request =
        Request::one_way("SYD", "MEL", date("2025-08-15"), &SearchOptions::default()).unwrap();
    request
        .legs
        .push(Leg::new("MEL", "SYD", date("2025-08-20")).unwrap());
    assert_eq!(invalid_field(request.validate()), "legs");
}

#[test]
fn round_trip_with_one_leg_is_rejected() {
    let mut request = Request::round_trip(
        "SYD",
        "MEL",
        date("2025-08-15"),
        date("2025-08-20"),
        &SearchOptions::default(),
    )
    .unwrap();
    request.legs.pop();
    assert_eq!(invalid_field(request.validate()), "legs");
}

#[test]
fn round_trip_return_must_reverse_outbound() {
    let mut request = Request::round_trip(
        "SYD",
        "MEL",
        date("2025-08-15"),
        date("2025-08-20"),
        &SearchOptions::default(),
    )
    .unwrap();
    request.legs[1].destination = "BNE".into();
    assert_eq!(invalid_field(request.validate()), "legs");
}

#[test]
fn multi_city_needs_two_legs() {
    let legs = vec![Leg::new("SYD", "MEL", date("2025-08-15")).unwrap()];
    assert_eq!(
        invalid_field(Request::multi_city(legs, &SearchOptions::default())),
        "legs"
    );
}

#[test]
fn natural_language_query() {
    let opts = SearchOptions {
        passengers: Passengers {
            adults: 2,
            children: 1,
            ..Passengers::default()
        },
        cabin: CabinClass::Business,
        stops: StopPreference::Nonstop,
        ..SearchOptions::default()
    };
    let request =
        Request::round_trip("SYD", "MEL", date("2025-08-15"), date("2025-08-20"), &opts).unwrap();

    let params = SearchQuery::natural_language(&request).to_url_params().unwrap();
    assert_eq!(params[0].0, "q");
    assert_eq!(
        params[0].1,
        "flights from SYD to MEL on 2025-08-15 returning 2025-08-20 for 2 adults, 1 children in business class nonstop"
    );
    assert_eq!(params[1], ("hl".to_string(), "en".to_string()));
}

#[test]
fn natural_language_caps_huge_infant_counts() {
    let mut request =
        Request::one_way("SYD", "MEL", date("2025-08-15"), &SearchOptions::default()).unwrap();
    request.passengers = Passengers {
        adults: 1,
        children: 0,
        infants_in_seat: u32::MAX,
        infants_on_lap: 1,
    };

    let SearchQuery::NaturalLanguage(text, _) = SearchQuery::natural_language(&request) else {
        panic!("expected a natural-language query");
    };
    assert_eq!(
        text,
        format!("flights from SYD to MEL on 2025-08-15 for 1 adult, {} infants", u32::MAX)
    );
}

#[test]
fn structured_query_carries_tfs_and_locale() {
    let request =
        Request::one_way("SYD", "MEL", date("2025-08-15"), &SearchOptions::default()).unwrap();
    let params = SearchQuery::Structured(request).to_url_params().unwrap();
    let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["tfs", "hl", "gl", "curr"]);
}
