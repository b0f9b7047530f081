use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::EncodeError;
use crate::expand::{self, Expansion};
use crate::query::{
    parse_date, CabinClass, Localization, Passengers, SearchOptions, SearchQuery, StopPreference,
};

#[derive(Debug, Deserialize, JsonSchema)]
struct BuildUrlArgs {
    #[schemars(
        description = "Departure airport IATA code(s) or place id. Comma-separate for multiple origins. Examples: SYD or SYD,BNE"
    )]
    from: String,
    #[schemars(
        description = "Arrival airport IATA code(s) or place id. Comma-separate for multiple destinations. Examples: MEL or MEL,ADL"
    )]
    to: String,
    #[schemars(description = "Departure date in YYYY-MM-DD format. Example: 2025-08-15")]
    date: String,
    #[schemars(
        description = "Return date in YYYY-MM-DD for round-trip. Each pair becomes a round trip"
    )]
    return_date: Option<String>,
    #[schemars(
        description = "One of: economy, premium-economy, business, first. Default: economy"
    )]
    seat: Option<String>,
    #[schemars(description = "Maximum stops: 0, 1 or 2. Omit for any number of stops")]
    max_stops: Option<u32>,
    #[schemars(description = "Restrict to airlines by IATA code, comma-separated. Example: QF,VA")]
    airlines: Option<String>,
    #[schemars(description = "Adult passengers (12+). Default: 1")]
    adults: Option<u32>,
    #[schemars(description = "Child passengers (2-11). Default: 0")]
    children: Option<u32>,
    #[schemars(description = "Infants with own seat (under 2). Default: 0")]
    infants_in_seat: Option<u32>,
    #[schemars(description = "Infants on adult's lap (under 2). Default: 0")]
    infants_on_lap: Option<u32>,
    #[schemars(description = "Language code. Examples: en, de, ja. Default: en")]
    language: Option<String>,
    #[schemars(description = "Country/market code. Examples: US, AU, GB. Default: US")]
    country: Option<String>,
    #[schemars(description = "Currency code. Examples: USD, AUD, EUR. Default: USD")]
    currency: Option<String>,
    #[schemars(
        description = "Return a natural-language search URL instead of the encoded tfs URL"
    )]
    natural: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DecodeUrlArgs {
    #[schemars(
        description = "Google Flights URL containing a tfs parameter, or the bare tfs value"
    )]
    url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct OpenUrlArgs {
    #[schemars(description = "URL to open. Must start with http:// or https://")]
    url: String,
}

fn search_options(args: &BuildUrlArgs) -> Result<SearchOptions, EncodeError> {
    let cabin = args
        .seat
        .as_deref()
        .map(CabinClass::from_str_loose)
        .transpose()?
        .unwrap_or_default();

    let stops = match args.max_stops {
        None => StopPreference::Any,
        Some(n) => StopPreference::from_max_stops(u64::from(n))
            .ok_or_else(|| EncodeError::invalid("max stops", format!("{n} (expected 0, 1 or 2)")))?,
    };

    let defaults = Passengers::default();
    let passengers = Passengers {
        adults: args.adults.unwrap_or(defaults.adults),
        children: args.children.unwrap_or(defaults.children),
        infants_in_seat: args.infants_in_seat.unwrap_or(defaults.infants_in_seat),
        infants_on_lap: args.infants_on_lap.unwrap_or(defaults.infants_on_lap),
    };

    let airlines = args
        .airlines
        .as_deref()
        .map(|s| {
            s.split(',')
                .map(|a| a.trim().to_uppercase())
                .filter(|a| !a.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut locale = Localization::default();
    if let Some(ref language) = args.language {
        locale.language = language.clone();
    }
    if let Some(ref country) = args.country {
        locale.country = country.clone();
    }
    if let Some(ref currency) = args.currency {
        locale.currency = currency.clone();
    }

    Ok(SearchOptions {
        passengers,
        cabin,
        stops,
        airlines,
        locale,
    })
}

fn build_urls(args: &BuildUrlArgs) -> Result<Vec<String>, EncodeError> {
    let options = search_options(args)?;
    let expansion = Expansion::Pairs {
        origins: args.from.clone(),
        destinations: args.to.clone(),
        depart: parse_date(&args.date)?,
        return_date: args.return_date.as_deref().map(parse_date).transpose()?,
    };

    let requests = expand::expand(&expansion, &options)?;
    requests
        .into_iter()
        .map(|request| {
            if args.natural.unwrap_or(false) {
                SearchQuery::natural_language(&request).to_url()
            } else {
                SearchQuery::Structured(request).to_url()
            }
        })
        .collect()
}

fn tool_error(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.into())]))
}

#[derive(Debug, Clone)]
struct GfurlMcp {
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GfurlMcp {
    fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Generate Google Flights URLs for the given search parameters. Comma-separated 'from' and 'to' lists produce one URL per origin/destination pair, origin-major. Returns one URL per line. NEVER construct Google Flights tfs URLs manually -- always use this tool."
    )]
    async fn gfurl_build_url(
        &self,
        Parameters(args): Parameters<BuildUrlArgs>,
    ) -> Result<CallToolResult, McpError> {
        match build_urls(&args) {
            Ok(urls) => Ok(CallToolResult::success(vec![Content::text(urls.join("\n"))])),
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(
        description = "Decode a Google Flights URL (or bare tfs value) back into its itinerary, passengers, cabin, stops and locale. Returns JSON."
    )]
    async fn gfurl_decode_url(
        &self,
        Parameters(args): Parameters<DecodeUrlArgs>,
    ) -> Result<CallToolResult, McpError> {
        let request = match crate::decode_url(&args.url) {
            Ok(r) => r,
            Err(e) => return tool_error(e.to_string()),
        };
        match serde_json::to_string_pretty(&request) {
            Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(description = "Open a URL in the default web browser. To open a flight search, call gfurl_build_url first and pass one of the returned URLs here.")]
    async fn open_url(
        &self,
        Parameters(args): Parameters<OpenUrlArgs>,
    ) -> Result<CallToolResult, McpError> {
        if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
            return tool_error("URL must start with http:// or https://");
        }

        match open::that(&args.url) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Opened: {}",
                args.url
            ))])),
            Err(e) => tool_error(format!("failed to open browser: {e}")),
        }
    }
}

#[tool_handler]
impl ServerHandler for GfurlMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gfurl".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Google Flights URL tool. Use gfurl_build_url to produce search URLs, gfurl_decode_url to inspect an existing one, and open_url to open a result in the browser.".into(),
            ),
        }
    }
}

pub async fn run() -> Result<(), String> {
    tracing::info!("starting MCP server on stdio");
    let service = GfurlMcp::new()
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| format!("failed to start MCP server: {e}"))?;
    service
        .waiting()
        .await
        .map_err(|e| format!("MCP server error: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(from: &str, to: &str) -> BuildUrlArgs {
        BuildUrlArgs {
            from: from.into(),
            to: to.into(),
            date: "2025-08-15".into(),
            return_date: None,
            seat: None,
            max_stops: None,
            airlines: None,
            adults: None,
            children: None,
            infants_in_seat: None,
            infants_on_lap: None,
            language: None,
            country: None,
            currency: None,
            natural: None,
        }
    }

    #[test]
    fn build_url_schema_requires_route_and_date() {
        let schema = serde_json::to_value(schemars::schema_for!(BuildUrlArgs)).unwrap();
        let required = schema["required"].as_array().unwrap();
        for field in ["from", "to", "date"] {
            assert!(required.contains(&serde_json::Value::from(field)));
        }
        assert!(!required.contains(&serde_json::Value::from("return_date")));
        assert!(schema["properties"]["from"]["description"]
            .as_str()
            .unwrap()
            .starts_with("Departure airport"));
    }

    #[test]
    fn defaults_match_search_page() {
        let options = search_options(&args("SYD", "MEL")).unwrap();
        assert_eq!(options, SearchOptions::default());
    }

    #[test]
    fn one_url_per_pair() {
        let urls = build_urls(&args("SYD,BNE", "MEL,ADL")).unwrap();
        assert_eq!(urls.len(), 4);
        assert!(urls.iter().all(|u| u.contains("tfs=")));
    }

    #[test]
    fn rejects_unknown_max_stops() {
        let mut a = args("SYD", "MEL");
        a.max_stops = Some(5);
        assert!(build_urls(&a).is_err());
    }

    #[test]
    fn natural_language_url() {
        let mut a = args("SYD", "MEL");
        a.natural = Some(true);
        let urls = build_urls(&a).unwrap();
        assert!(urls[0].contains("q=flights%20from%20SYD%20to%20MEL"));
    }
}
