use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::query::{Passengers, Request};

pub fn format_passengers(p: &Passengers) -> String {
    let mut parts = vec![format!(
        "{} adult{}",
        p.adults,
        if p.adults == 1 { "" } else { "s" }
    )];
    if p.children > 0 {
        parts.push(format!("{} child{}", p.children, if p.children == 1 { "" } else { "ren" }));
    }
    if p.infants_in_seat > 0 {
        parts.push(format!("{} infant(s) in seat", p.infants_in_seat));
    }
    if p.infants_on_lap > 0 {
        parts.push(format!("{} infant(s) on lap", p.infants_on_lap));
    }
    parts.join(", ")
}

pub fn render(request: &Request) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Date", "From", "To", "Airlines"]);

    for (i, leg) in request.legs.iter().enumerate() {
        let airlines = if leg.filters.airlines.is_empty() {
            "any".to_string()
        } else {
            leg.filters.airlines.join(", ")
        };
        table.add_row(vec![
            (i + 1).to_string(),
            leg.date.format("%Y-%m-%d").to_string(),
            leg.origin.clone(),
            leg.destination.clone(),
            airlines,
        ]);
    }

    let locale = &request.locale;
    format!(
        "Trip:       {}\nPassengers: {}\nCabin:      {}\nStops:      {}\nLocale:     {}-{}, {}\n{table}",
        request.trip,
        format_passengers(&request.passengers),
        request.cabin.label(),
        request.stops,
        locale.language,
        locale.country,
        locale.currency,
    )
}
