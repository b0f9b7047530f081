pub mod compat;
pub mod error;
pub mod expand;
pub mod mcp;
pub mod proto;
pub mod query;
pub mod schema;
pub mod table;
pub mod url;
pub mod wire;

pub use error::{CompatError, DecodeError, EncodeError};
pub use expand::{Expanded, Expansion, Hop};
pub use query::{
    CabinClass, Leg, LegFilters, Localization, Passengers, Request, SearchOptions, SearchQuery,
    StopPreference, TripType,
};

/// Builds the full search-page URL for a request.
pub fn encode_url(request: &Request) -> Result<String, EncodeError> {
    url::encode_url(request)
}

/// Reads a search-page URL, a `tfs=` query string, or a bare blob.
pub fn decode_url(input: &str) -> Result<Request, DecodeError> {
    url::decode_url(input)
}

/// One URL per expanded request, in expansion order.
pub fn expand_urls(expansion: &Expansion, options: &SearchOptions) -> Result<Vec<String>, EncodeError> {
    expand::expand_urls(expansion, options)
}
