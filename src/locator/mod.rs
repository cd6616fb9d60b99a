//! Therapist locator: turns geocoder searches into a readable listing.
//!
//! Four keyword variants are searched in order. Results are deduplicated by
//! display name and the listing stops at five entries. `locate()` is total:
//! every failure becomes a fixed apology that still names the location.

pub mod nominatim;

pub use nominatim::{Geocoder, NominatimClient, Place, PlaceAddress, SearchQuery};

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::GeocoderConfig;
use crate::error::GeocodeError;

/// Keyword prefixes searched for each location, in order.
const SEARCH_TERMS: &[&str] = &[
    "therapist",
    "psychologist",
    "mental health clinic",
    "counseling center",
];

/// Results requested per search.
const RESULTS_PER_QUERY: u32 = 3;

/// Maximum entries in a listing.
pub const MAX_ENTRIES: usize = 5;

/// Display names shorter than this are dropped.
const MIN_NAME_CHARS: usize = 4;

const LISTING_FOOTER: &str = "\n\n💡 **Note**: Phone numbers aren't available through public maps. I recommend:\n\
• Calling the facility directly using the address\n\
• Searching online directories like Psychology Today or Healthgrades\n\
• Contacting your local mental health association\n\
• Using Google Maps or Yelp for additional contact information";

/// Listing header for `location`.
pub fn listing_header(location: &str) -> String {
    format!(
        "Here are mental health professionals and clinics I found near {}:\n\n",
        location
    )
}

/// Reply when every search succeeded but nothing usable came back.
pub fn no_results_reply(location: &str) -> String {
    format!(
        "I couldn't find specific therapist listings near {} using OpenStreetMap. \
         Please consider searching for local mental health directories or contacting \
         your local health department for professional referrals.",
        location
    )
}

/// Reply when the geocoder could not be reached or answered garbage.
pub fn unavailable_reply(location: &str) -> String {
    format!(
        "I'm having trouble accessing location services right now. For immediate help, \
         please contact your local mental health crisis hotline or search for therapists \
         in {} through online directories.",
        location
    )
}

/// First comma-delimited segment of the display name.
fn listing_name(place: &Place) -> &str {
    place.display_name.split(',').next().unwrap_or_default()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Compose an address from structured fields, falling back to the raw
/// display string when none are present.
fn compose_address(place: &Place) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(address) = &place.address {
        match (non_empty(&address.house_number), non_empty(&address.road)) {
            (Some(number), Some(road)) => parts.push(format!("{} {}", number, road)),
            (None, Some(road)) => parts.push(road.to_string()),
            _ => {}
        }

        let locality = address
            .city
            .as_ref()
            .or(address.town.as_ref())
            .or(address.village.as_ref());
        if let Some(locality) = locality.filter(|l| !l.is_empty()) {
            parts.push(locality.clone());
        }
        if let Some(state) = non_empty(&address.state) {
            parts.push(state.to_string());
        }
        if let Some(postcode) = non_empty(&address.postcode) {
            parts.push(postcode.to_string());
        }
    }

    if parts.is_empty() {
        place.display_name.clone()
    } else {
        parts.join(", ")
    }
}

/// Format one listing entry.
fn format_entry(name: &str, place: &Place) -> String {
    let mut entry = format!("**{}**\n", name);
    entry.push_str(&format!("📍 Address: {}\n", compose_address(place)));
    entry.push_str("📞 Phone: Contact facility directly or search online directories\n");
    if let (Some(lat), Some(lon)) = (non_empty(&place.lat), non_empty(&place.lon)) {
        entry.push_str(&format!("🗺️ Coordinates: {}, {}\n", lat, lon));
    }
    entry.push_str("---");
    entry
}

/// Finds mental-health professionals near a location.
pub struct TherapistLocator {
    geocoder: Arc<dyn Geocoder>,
}

impl TherapistLocator {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub fn from_config(config: &GeocoderConfig) -> Self {
        Self::new(Arc::new(NominatimClient::new(
            &config.base_url,
            &config.user_agent,
        )))
    }

    /// Build a listing of therapists near `location`.
    pub async fn locate(&self, location: &str) -> String {
        match self.collect_entries(location).await {
            Ok(entries) if !entries.is_empty() => {
                tracing::info!(%location, count = entries.len(), "Therapist listing built");
                format!(
                    "{}{}{}",
                    listing_header(location),
                    entries.join("\n\n"),
                    LISTING_FOOTER
                )
            }
            Ok(_) => {
                tracing::info!(%location, "No therapist listings found");
                no_results_reply(location)
            }
            Err(e) => {
                tracing::warn!(%location, error = %e, "Location search failed");
                unavailable_reply(location)
            }
        }
    }

    async fn collect_entries(&self, location: &str) -> Result<Vec<String>, GeocodeError> {
        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for term in SEARCH_TERMS {
            let query = SearchQuery::new(format!("{} {}", term, location), RESULTS_PER_QUERY);
            let places = match self.geocoder.search(&query).await {
                Ok(places) => places,
                Err(GeocodeError::Status { status }) => {
                    tracing::debug!(query = %query.text, status, "Search variant returned no data");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for place in &places {
                let name = listing_name(place);
                if name.is_empty() || seen.contains(name) || name.chars().count() < MIN_NAME_CHARS {
                    continue;
                }
                seen.insert(name.to_string());
                entries.push(format_entry(name, place));

                if entries.len() >= MAX_ENTRIES {
                    break;
                }
            }

            if entries.len() >= MAX_ENTRIES {
                break;
            }
        }

        Ok(entries)
    }
}
