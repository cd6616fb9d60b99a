//! Geocoding/search client for the Nominatim API.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::error::GeocodeError;

/// One free-text search against the geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: u32) -> Self {
        Self {
            text: text.into(),
            limit,
        }
    }
}

/// A single search result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub address: Option<PlaceAddress>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
}

/// Structured address details (`addressdetails=1`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceAddress {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

/// A geocoding/search backend.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Run one search. A non-2xx reply is reported as `GeocodeError::Status`.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Place>, GeocodeError>;
}

/// Nominatim HTTP client.
pub struct NominatimClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Place>, GeocodeError> {
        let limit = query.limit.to_string();
        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("q", query.text.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<Vec<Place>>()
            .await
            .map_err(|e| GeocodeError::Decode(e.to_string()))
    }
}
