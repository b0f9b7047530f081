use std::io::Read;
use std::process;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use gfurl::compat;
use gfurl::error::{CompatError, DecodeError, EncodeError};
use gfurl::expand::{self, Expansion};
use gfurl::query::{
    parse_date, validate_location, CabinClass, Leg, Localization, Passengers, Request,
    SearchOptions, SearchQuery, StopPreference, TripType,
};
use gfurl::table;

#[derive(Parser)]
#[command(
    name = "gfurl",
    about = "Encode and decode Google Flights search URLs",
    version,
    after_help = "\
Examples:
  gfurl encode -f SYD -t MEL -d 2025-08-15 --return-date 2025-08-20 --max-stops 0
  gfurl encode -f SYD,BNE -t MEL,ADL -d 2025-08-15
  gfurl encode --leg \"2026-03-01 LAX NRT\" --leg \"2026-03-05 NRT ICN\" --leg \"2026-03-10 ICN LAX\"
  gfurl decode 'https://www.google.com/travel/flights?tfs=...&hl=en'
  gfurl serpapi '{\"departure_id\":\"SYD\",\"arrival_id\":\"MEL\",\"outbound_date\":\"2025-08-15\",\"type\":2}'"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Log debug output to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(
        about = "Build search URLs",
        long_about = "Build Google Flights search URLs.\n\
            Use -f/-t/-d for one-way or round-trip searches, or --leg for multi-city itineraries.\n\
            Comma-separate -f and -t to get one URL per origin/destination pair.",
        after_help = "\
Examples:
  One-way:      gfurl encode -f JFK -t LHR -d 2026-04-01
  Round-trip:   gfurl encode -f LAX -t NRT -d 2026-05-01 --return-date 2026-05-15
  Multi-city:   gfurl encode --leg \"2026-03-01 LAX NRT\" --leg \"2026-03-10 NRT SEA\"
  Business:     gfurl encode -f HEL -t BKK -d 2026-03-01 --seat business --max-stops 1
  Pairs:        gfurl encode -f SYD,BNE -t MEL,ADL -d 2025-08-15 --json --pretty"
    )]
    Encode(EncodeArgs),

    #[command(about = "Decode a search URL or tfs blob")]
    Decode {
        #[arg(value_name = "URL|BLOB", help = "Search URL, tfs=... query, or bare blob")]
        input: String,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as pretty-printed JSON")]
        pretty: bool,
    },

    #[command(
        about = "Translate SerpApi google_flights parameters into search URLs",
        long_about = "Translate a JSON object of SerpApi google_flights parameters into search URLs.\n\
            Pass - to read the object from stdin. Parameters that cannot be encoded are listed on stderr."
    )]
    Serpapi {
        #[arg(value_name = "JSON", help = "Parameter object, or - for stdin")]
        params: String,

        #[arg(
            long,
            help = "Output URLs, coverage and the cleaned SerpApi parameters as JSON"
        )]
        json: bool,
    },

    #[command(about = "Start MCP server for AI agents (stdio transport)")]
    Mcp,
}

#[derive(clap::Args)]
struct EncodeArgs {
    #[arg(
        short, long,
        value_name = "IATA",
        help = "Departure airport code (comma-separate for several)",
        long_help = "Departure airport IATA code (e.g. SYD) or place id (e.g. /m/04jpl). \
            Comma-separate for several origins. Required unless using --leg."
    )]
    from: Option<String>,

    #[arg(
        short, long,
        value_name = "IATA",
        help = "Arrival airport code (comma-separate for several)",
        long_help = "Arrival airport IATA code (e.g. MEL) or place id. \
            Comma-separate for several destinations. Required unless using --leg."
    )]
    to: Option<String>,

    #[arg(short, long, value_name = "YYYY-MM-DD", help = "Departure date")]
    date: Option<String>,

    #[arg(
        long,
        value_name = "\"DATE FROM TO\"",
        help = "Flight leg (repeatable, for multi-city)",
        long_help = "Define a flight leg as \"YYYY-MM-DD FROM TO\". Repeat for multi-city \
            itineraries. Replaces -f/-t/-d when used.",
        num_args = 1,
    )]
    leg: Vec<String>,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Return date (makes a round trip)")]
    return_date: Option<String>,

    #[arg(
        long,
        value_name = "TYPE",
        help = "Trip type [one-way, round-trip, multi-city] (inferred when omitted)"
    )]
    trip: Option<String>,

    #[arg(
        long,
        default_value = "economy",
        value_name = "CLASS",
        help = "Seat class [economy, premium-economy, business, first]"
    )]
    seat: String,

    #[arg(long, value_name = "N", help = "Maximum number of stops (0 = nonstop only)")]
    max_stops: Option<u32>,

    #[arg(long, value_name = "QF,VA,...", help = "Restrict to airlines (comma-separated IATA codes)")]
    airlines: Option<String>,

    #[arg(long, default_value = "1", value_name = "N", help = "Number of adult passengers")]
    adults: u32,

    #[arg(long, default_value = "0", value_name = "N", help = "Number of child passengers (2-11)")]
    children: u32,

    #[arg(long, default_value = "0", value_name = "N", help = "Infants with own seat (under 2)")]
    infants_in_seat: u32,

    #[arg(long, default_value = "0", value_name = "N", help = "Infants on adult's lap (under 2)")]
    infants_on_lap: u32,

    #[arg(long, default_value = "en", value_name = "CODE", help = "Language code (e.g. en, de, ja)")]
    lang: String,

    #[arg(long, default_value = "US", value_name = "CODE", help = "Country code (e.g. US, AU, GB)")]
    country: String,

    #[arg(long, default_value = "USD", value_name = "CODE", help = "Currency code (e.g. USD, AUD, EUR)")]
    currency: String,

    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,

    #[arg(long, help = "Open the URLs in the default browser")]
    open: bool,

    #[arg(long, help = "Build free-text search URLs instead of tfs URLs")]
    natural: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Compat(#[from] CompatError),

    #[error("failed to open browser: {0}")]
    Browser(String),

    #[error("{0}")]
    Mcp(String),
}

fn error_code(err: &CliError) -> i32 {
    match err {
        CliError::Usage(_) | CliError::Encode(_) | CliError::Compat(_) => 2,
        CliError::Decode(_) => 3,
        CliError::Browser(_) | CliError::Mcp(_) => 1,
    }
}

fn error_kind(err: &CliError) -> &'static str {
    match err {
        CliError::Usage(_) => "usage_error",
        CliError::Encode(EncodeError::ValueTooLarge(_)) => "value_too_large",
        CliError::Encode(EncodeError::InvalidField { .. }) => "invalid_input",
        CliError::Decode(DecodeError::InvalidBase64(_)) => "invalid_base64",
        CliError::Decode(DecodeError::MissingField(_)) => "missing_field",
        CliError::Decode(_) => "decode_error",
        CliError::Compat(_) => "invalid_params",
        CliError::Browser(_) => "browser_error",
        CliError::Mcp(_) => "mcp_error",
    }
}

fn die(err: &CliError, json_mode: bool) -> ! {
    if json_mode {
        let json = serde_json::json!({
            "error": {
                "kind": error_kind(err),
                "message": err.to_string(),
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {err}");
    }
    process::exit(error_code(err));
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| CliError::Usage(format!("cannot serialize output: {e}")))?;
    println!("{output}");
    Ok(())
}

fn split_airlines(list: &str) -> Vec<String> {
    list.split(',')
        .map(|a| a.trim().to_uppercase())
        .filter(|a| !a.is_empty())
        .collect()
}

fn search_options(args: &EncodeArgs) -> Result<SearchOptions, CliError> {
    let stops = match args.max_stops {
        None => StopPreference::Any,
        Some(n) => StopPreference::from_max_stops(u64::from(n)).ok_or_else(|| {
            CliError::Usage(format!("--max-stops must be 0, 1 or 2, got {n}"))
        })?,
    };

    Ok(SearchOptions {
        passengers: Passengers {
            adults: args.adults,
            children: args.children,
            infants_in_seat: args.infants_in_seat,
            infants_on_lap: args.infants_on_lap,
        },
        cabin: CabinClass::from_str_loose(&args.seat)?,
        stops,
        airlines: args.airlines.as_deref().map(split_airlines).unwrap_or_default(),
        locale: Localization {
            language: args.lang.clone(),
            country: args.country.clone(),
            currency: args.currency.clone(),
        },
    })
}

fn parse_leg(spec: &str) -> Result<Leg, CliError> {
    let parts: Vec<&str> = spec.split_whitespace().collect();
    let [date, from, to] = parts.as_slice() else {
        return Err(CliError::Usage(format!(
            "--leg must be \"DATE FROM TO\", got: \"{spec}\""
        )));
    };
    Ok(Leg::new(from.to_uppercase(), to.to_uppercase(), parse_date(date)?)?)
}

fn build_from_legs(args: &EncodeArgs, options: &SearchOptions) -> Result<Request, CliError> {
    if args.from.is_some() || args.to.is_some() || args.date.is_some() || args.return_date.is_some() {
        return Err(CliError::Usage(
            "--leg cannot be combined with -f/-t/-d/--return-date".into(),
        ));
    }

    let legs = args
        .leg
        .iter()
        .map(|spec| parse_leg(spec).map(|leg| leg.with_airlines(options.airlines.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let trip = match args.trip.as_deref() {
        Some(t) => TripType::from_str_loose(t)?,
        None if legs.len() == 1 => TripType::OneWay,
        None => TripType::MultiCity,
    };

    let request = Request {
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

fn build_requests(args: &EncodeArgs) -> Result<Vec<Request>, CliError> {
    let options = search_options(args)?;

    if !args.leg.is_empty() {
        return Ok(vec![build_from_legs(args, &options)?]);
    }

    let from = args
        .from
        .clone()
        .ok_or_else(|| CliError::Usage("--from is required (or use --leg)".into()))?;
    let to = args
        .to
        .clone()
        .ok_or_else(|| CliError::Usage("--to is required (or use --leg)".into()))?;
    let date = args
        .date
        .as_deref()
        .ok_or_else(|| CliError::Usage("--date is required (or use --leg)".into()))?;
    let return_date = args.return_date.as_deref().map(parse_date).transpose()?;

    if let Some(t) = args.trip.as_deref() {
        match (TripType::from_str_loose(t)?, return_date.is_some()) {
            (TripType::RoundTrip, false) => {
                return Err(CliError::Usage("round-trip requires --return-date".into()))
            }
            (TripType::OneWay, true) => {
                return Err(CliError::Usage("one-way cannot have --return-date".into()))
            }
            (TripType::MultiCity, _) => {
                return Err(CliError::Usage("multi-city trips are built with --leg".into()))
            }
            _ => {}
        }
    }

    let expansion = Expansion::Pairs {
        origins: from,
        destinations: to,
        depart: parse_date(date)?,
        return_date,
    };
    Ok(expand::expand(&expansion, &options)?)
}

#[derive(Serialize)]
struct EncodedUrl {
    url: String,
    request: Request,
}

// The codec takes any identifier; the CLI insists on IATA codes or place ids.
fn check_locations(requests: &[Request]) -> Result<(), CliError> {
    for leg in requests.iter().flat_map(|r| &r.legs) {
        validate_location(&leg.origin)?;
        validate_location(&leg.destination)?;
    }
    Ok(())
}

fn run_encode(args: &EncodeArgs) -> Result<(), CliError> {
    let requests = build_requests(args)?;
    check_locations(&requests)?;

    let mut encoded = Vec::with_capacity(requests.len());
    for request in requests {
        let query = if args.natural {
            SearchQuery::natural_language(&request)
        } else {
            SearchQuery::Structured(request.clone())
        };
        encoded.push(EncodedUrl {
            url: query.to_url()?,
            request,
        });
    }

    if args.open {
        for e in &encoded {
            println!("Opening: {}", e.url);
            open::that(&e.url).map_err(|err| CliError::Browser(err.to_string()))?;
        }
        return Ok(());
    }

    if args.json || args.pretty {
        return print_json(&encoded, args.pretty);
    }

    for e in &encoded {
        println!("{}", e.url);
    }
    Ok(())
}

fn run_decode(input: &str, json: bool, pretty: bool) -> Result<(), CliError> {
    let request = gfurl::decode_url(input)?;
    if json || pretty {
        return print_json(&request, pretty);
    }
    println!("{}", table::render(&request));
    Ok(())
}

fn read_params(arg: &str) -> Result<serde_json::Value, CliError> {
    let raw = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::Usage(format!("cannot read stdin: {e}")))?;
        buf
    } else {
        arg.to_string()
    };
    serde_json::from_str(&raw).map_err(|e| CliError::Usage(format!("invalid JSON: {e}")))
}

fn run_serpapi(params: &str, json: bool) -> Result<(), CliError> {
    let translation = compat::translate(&read_params(params)?)?;
    let urls = translation.urls()?;

    if json {
        let output = serde_json::json!({
            "urls": urls,
            "links": translation.links()?,
            "coverage": translation.coverage,
            "serpapi_fallback": translation.serpapi_params(),
        });
        println!("{output}");
        return Ok(());
    }

    for note in &translation.coverage.unmatched {
        eprintln!("note: not encoded: {note}");
    }
    for url in &urls {
        println!("{url}");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let (result, json_mode) = match &cli.command {
        Commands::Mcp => (gfurl::mcp::run().await.map_err(CliError::Mcp), false),
        Commands::Encode(args) => (run_encode(args), args.json || args.pretty),
        Commands::Decode {
            input,
            json,
            pretty,
        } => (run_decode(input, *json, *pretty), *json || *pretty),
        Commands::Serpapi { params, json } => (run_serpapi(params, *json), *json),
    };

    if let Err(e) = result {
        die(&e, json_mode);
    }
}
