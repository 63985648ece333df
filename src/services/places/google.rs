use async_trait::async_trait;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Photo, Place, PlacesError, PlacesProvider};

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

pub struct GooglePlacesClient {
    api_key: String,
    client: reqwest::Client,
}

impl GooglePlacesClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn key(&self) -> Result<&str, PlacesError> {
        if self.api_key.is_empty() {
            Err(PlacesError::MissingApiKey)
        } else {
            Ok(&self.api_key)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        fallback_message: &str,
    ) -> Result<T, PlacesError> {
        let key = self.key()?;
        let envelope: Envelope<T> = self
            .client
            .get(format!("{BASE_URL}/{path}"))
            .query(params)
            .query(&[("key", key)])
            .send()
            .await?
            .json()
            .await?;

        match envelope.status.as_str() {
            "OK" | "ZERO_RESULTS" => envelope.payload.ok_or_else(|| PlacesError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                code: envelope.status.clone(),
                message: fallback_message.to_string(),
            }),
            _ => Err(PlacesError::Upstream {
                status: StatusCode::BAD_REQUEST,
                message: envelope
                    .error_message
                    .unwrap_or_else(|| fallback_message.to_string()),
                code: envelope.status,
            }),
        }
    }
}

/// Google wraps every Places response as `{status, error_message?, <payload>}`.
#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    error_message: Option<String>,
    #[serde(alias = "results", alias = "result")]
    payload: Option<T>,
}

#[async_trait]
impl PlacesProvider for GooglePlacesClient {
    async fn text_search(&self, query: &str) -> Result<Vec<Place>, PlacesError> {
        let results: Option<Vec<Place>> = self
            .get_json("textsearch/json", &[("query", query)], "Failed to search places")
            .await
            .map(Some)
            .or_else(|e| match e {
                // ZERO_RESULTS may omit the results array entirely
                PlacesError::Upstream { ref code, .. } if code == "ZERO_RESULTS" => Ok(None),
                other => Err(other),
            })?;

        Ok(results.unwrap_or_default())
    }

    async fn details(&self, place_id: &str) -> Result<Place, PlacesError> {
        self.get_json(
            "details/json",
            &[
                ("place_id", place_id),
                ("fields", "place_id,name,opening_hours,photos"),
            ],
            "Failed to fetch place details",
        )
        .await
    }

    async fn photo(&self, photo_reference: &str, max_width: u32) -> Result<Photo, PlacesError> {
        let key = self.key()?;
        let max_width = max_width.to_string();
        let resp = self
            .client
            .get(format!("{BASE_URL}/photo"))
            .query(&[
                ("maxwidth", max_width.as_str()),
                ("photo_reference", photo_reference),
                ("key", key),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PlacesError::Upstream {
                status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
                code: "PHOTO_FETCH_FAILED".to_string(),
                message: format!("Photo request failed with status {status}"),
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = resp.bytes().await?.to_vec();

        Ok(Photo {
            content_type,
            bytes,
        })
    }
}
