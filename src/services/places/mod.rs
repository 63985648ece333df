pub mod google;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::AppError;
use crate::models::{photo_url, BusinessHour, DayName};
use crate::validation::Shape;

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("Google Places API key not configured")]
    MissingApiKey,

    #[error("{message}")]
    Upstream {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("places request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<PlacesError> for AppError {
    fn from(err: PlacesError) -> Self {
        match err {
            PlacesError::MissingApiKey => AppError::ApiKeyMissing,
            PlacesError::Upstream {
                status,
                code,
                message,
            } => AppError::Upstream {
                status,
                code,
                message,
            },
            PlacesError::Http(e) => AppError::Internal(e.into()),
        }
    }
}

// ── Upstream shapes ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodPoint {
    pub day: u8,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub open: PeriodPoint,
    pub close: Option<PeriodPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
    #[serde(default)]
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRef {
    pub photo_reference: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    pub formatted_address: Option<String>,
    pub geometry: Option<Geometry>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

pub struct Photo {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn text_search(&self, query: &str) -> Result<Vec<Place>, PlacesError>;
    async fn details(&self, place_id: &str) -> Result<Place, PlacesError>;
    async fn photo(&self, photo_reference: &str, max_width: u32) -> Result<Photo, PlacesError>;
}

// ── Search input ──

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceSearchPayload {
    #[validate(
        required(message = "query is required"),
        length(min = 1, message = "query is required")
    )]
    pub query: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlaceSearch {
    pub query: String,
}

impl Shape for PlaceSearch {
    type Draft = PlaceSearchPayload;

    fn from_draft(draft: PlaceSearchPayload) -> Self {
        PlaceSearch {
            query: draft.query.unwrap_or_default(),
        }
    }
}

// ── Client-facing shapes ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub location: Option<LatLng>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub types: Vec<String>,
    pub open_now: Option<bool>,
    pub photo_url: Option<String>,
}

impl PlaceSummary {
    pub fn new(place: Place, base_url: &str) -> Self {
        PlaceSummary {
            photo_url: place
                .photos
                .first()
                .map(|p| photo_url(base_url, &p.photo_reference)),
            open_now: place.opening_hours.as_ref().and_then(|h| h.open_now),
            location: place.geometry.map(|g| g.location),
            address: place.formatted_address.unwrap_or_default(),
            place_id: place.place_id,
            name: place.name,
            rating: place.rating,
            user_ratings_total: place.user_ratings_total,
            types: place.types,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacePhoto {
    pub photo_reference: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSchedule {
    pub place_id: String,
    pub name: String,
    pub business_hours: Vec<BusinessHour>,
    pub photos: Vec<PlacePhoto>,
}

impl PlaceSchedule {
    /// `None` when the place publishes no opening hours.
    pub fn new(place_id: &str, place: Place, base_url: &str) -> Option<Self> {
        let hours = place.opening_hours?;
        if hours.periods.is_empty() {
            return None;
        }

        Some(PlaceSchedule {
            place_id: place_id.to_string(),
            name: place.name,
            business_hours: business_hours_from_periods(&hours.periods),
            photos: place
                .photos
                .into_iter()
                .map(|p| PlacePhoto {
                    url: photo_url(base_url, &p.photo_reference),
                    photo_reference: p.photo_reference,
                    width: p.width,
                    height: p.height,
                })
                .collect(),
        })
    }
}

/// Folds Google opening periods into one entry per weekday, the same shape a
/// business stores. Days without a period are closed; split shifts collapse
/// to the earliest opening and latest closing.
pub fn business_hours_from_periods(periods: &[Period]) -> Vec<BusinessHour> {
    let mut week: Vec<BusinessHour> = DayName::ALL
        .iter()
        .map(|day| BusinessHour {
            day: day.index(),
            day_name: *day,
            start_time: "00:00".to_string(),
            end_time: "00:00".to_string(),
            is_closed: true,
        })
        .collect();

    // Open around the clock: a single period opening Sunday 00:00 with no close.
    if let [only] = periods {
        if only.close.is_none() && only.open.time == "0000" {
            for entry in &mut week {
                entry.start_time = "00:00".to_string();
                entry.end_time = "23:59".to_string();
                entry.is_closed = false;
            }
            return week;
        }
    }

    for period in periods {
        let Some(entry) = week.get_mut(period.open.day as usize) else {
            continue;
        };
        let Some(start) = clock(&period.open.time) else {
            tracing::warn!(time = %period.open.time, "unparseable opening time");
            continue;
        };
        let end = period
            .close
            .as_ref()
            .and_then(|c| clock(&c.time))
            .unwrap_or_else(|| "23:59".to_string());

        if entry.is_closed {
            entry.start_time = start;
            entry.end_time = end;
            entry.is_closed = false;
        } else {
            if start < entry.start_time {
                entry.start_time = start;
            }
            if end > entry.end_time {
                entry.end_time = end;
            }
        }
    }

    week
}

/// `"0930"` → `"09:30"`.
fn clock(hhmm: &str) -> Option<String> {
    if hhmm.len() != 4 || !hhmm.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (h, m) = hhmm.split_at(2);
    let in_range = h.parse::<u8>().is_ok_and(|h| h < 24) && m.parse::<u8>().is_ok_and(|m| m < 60);
    in_range.then(|| format!("{h}:{m}"))
}
