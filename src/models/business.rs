use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::validation::{clock_time, field_rule, only_digits, rule, Shape};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusinessStatus {
    Verified,
    #[default]
    Unverified,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    PlaceIdPhoto,
    LocalUpload,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DayName {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayName {
    /// Indexed the way the hours model numbers days: Sunday is 0.
    pub const ALL: [DayName; 7] = [
        DayName::Sunday,
        DayName::Monday,
        DayName::Tuesday,
        DayName::Wednesday,
        DayName::Thursday,
        DayName::Friday,
        DayName::Saturday,
    ];

    pub fn from_index(day: u8) -> Option<Self> {
        Self::ALL.get(day as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

// ── Stored document ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessAddress {
    pub lat: f64,
    pub long: f64,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub street_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessImage {
    pub source: ImageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessHour {
    pub day: u8,
    pub day_name: DayName,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub business_name: String,
    pub business_phone_number: String,
    pub business_owner_id: String,
    pub business_address: BusinessAddress,
    #[serde(default)]
    pub business_images: Vec<BusinessImage>,
    pub business_hours: Vec<BusinessHour>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub business_status: BusinessStatus,
    pub date_created: DateTime<Utc>,
}

// ── Input contract ──

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddressPayload {
    #[validate(required(message = "lat is required"))]
    pub lat: Option<f64>,
    #[validate(required(message = "long is required"))]
    pub long: Option<f64>,
    #[validate(
        required(message = "city is required"),
        length(min = 1, message = "city is required")
    )]
    pub city: Option<String>,
    #[validate(
        required(message = "country is required"),
        length(min = 1, message = "country is required")
    )]
    pub country: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub street_name: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "image_has_content"))]
pub struct ImagePayload {
    #[validate(required(message = "source is required"))]
    pub source: Option<ImageSource>,
    pub photo_reference: Option<String>,
    pub data: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "day_name_matches"))]
pub struct HourPayload {
    #[validate(
        required(message = "day is required"),
        range(min = 0, max = 6, message = "day must be between 0 and 6")
    )]
    pub day: Option<i64>,
    #[validate(required(message = "day_name is required"))]
    pub day_name: Option<DayName>,
    #[validate(
        required(message = "start_time is required"),
        custom(function = "clock_time", message = "start_time must be in HH:MM 24-hour format")
    )]
    pub start_time: Option<String>,
    #[validate(
        required(message = "end_time is required"),
        custom(function = "clock_time", message = "end_time must be in HH:MM 24-hour format")
    )]
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "one_entry_per_day", skip_on_field_errors = false))]
pub struct BusinessPayload {
    #[validate(
        required(message = "business_name is required"),
        length(min = 1, message = "business_name is required")
    )]
    pub business_name: Option<String>,
    #[validate(
        required(message = "business_phone_number is required"),
        length(min = 12, message = "business_phone_number must be at least 12 digits"),
        custom(
            function = "only_digits",
            message = "business_phone_number must contain only digits"
        )
    )]
    pub business_phone_number: Option<String>,
    #[validate(
        required(message = "business_owner_id is required"),
        length(min = 1, message = "business_owner_id is required")
    )]
    pub business_owner_id: Option<String>,
    #[validate(required(message = "business_address is required"), nested)]
    pub business_address: Option<AddressPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub business_images: Vec<ImagePayload>,
    #[serde(default)]
    #[validate(nested)]
    pub business_hours: Vec<HourPayload>,
    pub place_id: Option<String>,
    pub business_status: Option<BusinessStatus>,
}

fn image_has_content(image: &ImagePayload) -> Result<(), ValidationError> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    let Some(source) = image.source else {
        return Ok(());
    };
    match source {
        ImageSource::PlaceIdPhoto if !present(&image.photo_reference) => Err(rule(
            "image",
            "photo_reference required for place_id_photo, data required for local_upload",
        )),
        ImageSource::LocalUpload if !present(&image.data) => Err(rule(
            "image",
            "photo_reference required for place_id_photo, data required for local_upload",
        )),
        ImageSource::LocalUpload => {
            let data = image.data.as_deref().unwrap_or_default();
            if decode_upload(data).is_some() {
                Ok(())
            } else {
                Err(rule("image", "data must be base64-encoded image data"))
            }
        }
        ImageSource::PlaceIdPhoto => Ok(()),
    }
}

fn day_name_matches(hour: &HourPayload) -> Result<(), ValidationError> {
    let expected = hour
        .day
        .and_then(|d| u8::try_from(d).ok())
        .and_then(DayName::from_index);
    match (expected, hour.day_name) {
        (Some(expected), Some(given)) if expected != given => {
            Err(rule("day_name", "day_name does not match day"))
        }
        _ => Ok(()),
    }
}

fn one_entry_per_day(payload: &BusinessPayload) -> Result<(), ValidationError> {
    if payload.business_hours.len() != 7 {
        return Err(field_rule(
            "business_hours",
            "length",
            "business_hours must have exactly 7 days",
        ));
    }
    let mut seen = [false; 7];
    for hour in &payload.business_hours {
        if let Some(day) = hour.day.filter(|d| (0..7).contains(d)) {
            if seen[day as usize] {
                return Err(field_rule(
                    "business_hours",
                    "unique_days",
                    "business_hours must list each day once",
                ));
            }
            seen[day as usize] = true;
        }
    }
    Ok(())
}

/// Decodes an uploaded image given either as a data URL or as bare base64.
fn decode_upload(data: &str) -> Option<Vec<u8>> {
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,")?.1,
        None => data,
    };
    base64::engine::general_purpose::STANDARD.decode(encoded).ok()
}

/// Normalized business input.
#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub business_name: String,
    pub business_phone_number: String,
    pub business_owner_id: String,
    pub business_address: BusinessAddress,
    pub business_images: Vec<BusinessImage>,
    pub business_hours: Vec<BusinessHour>,
    pub place_id: Option<String>,
    pub business_status: Option<BusinessStatus>,
}

impl Shape for NewBusiness {
    type Draft = BusinessPayload;

    fn from_draft(draft: BusinessPayload) -> Self {
        let address = draft.business_address.unwrap_or_else(|| AddressPayload {
            lat: None,
            long: None,
            city: None,
            country: None,
            region: String::new(),
            street_name: String::new(),
        });

        NewBusiness {
            business_name: draft.business_name.unwrap_or_default(),
            business_phone_number: draft.business_phone_number.unwrap_or_default(),
            business_owner_id: draft.business_owner_id.unwrap_or_default(),
            business_address: BusinessAddress {
                lat: address.lat.unwrap_or_default(),
                long: address.long.unwrap_or_default(),
                city: address.city.unwrap_or_default(),
                country: address.country.unwrap_or_default(),
                region: address.region,
                street_name: address.street_name,
            },
            business_images: draft
                .business_images
                .into_iter()
                .map(|image| BusinessImage {
                    source: image.source.unwrap_or(ImageSource::LocalUpload),
                    photo_reference: image.photo_reference,
                    data: image.data,
                    is_primary: image.is_primary,
                })
                .collect(),
            business_hours: draft
                .business_hours
                .into_iter()
                .map(|hour| {
                    let day = hour.day.unwrap_or_default() as u8;
                    BusinessHour {
                        day,
                        day_name: hour
                            .day_name
                            .or_else(|| DayName::from_index(day))
                            .unwrap_or(DayName::Sunday),
                        start_time: hour.start_time.unwrap_or_default(),
                        end_time: hour.end_time.unwrap_or_default(),
                        is_closed: hour.is_closed,
                    }
                })
                .collect(),
            place_id: draft.place_id.filter(|p| !p.is_empty()),
            business_status: draft.business_status,
        }
    }
}

// ── Output ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessImageResponse {
    pub source: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessResponse {
    pub id: String,
    pub business_name: String,
    pub business_phone_number: String,
    pub business_owner_id: String,
    pub business_address: BusinessAddress,
    pub business_images: Vec<BusinessImageResponse>,
    pub business_hours: Vec<BusinessHour>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub business_status: BusinessStatus,
    pub date_created: String,
}

impl BusinessResponse {
    /// `base_url` prefixes proxied place photo URLs.
    pub fn new(id: &str, business: &Business, base_url: &str) -> Self {
        BusinessResponse {
            id: id.to_string(),
            business_name: business.business_name.clone(),
            business_phone_number: business.business_phone_number.clone(),
            business_owner_id: business.business_owner_id.clone(),
            business_address: business.business_address.clone(),
            business_images: business
                .business_images
                .iter()
                .map(|image| image_response(image, base_url))
                .collect(),
            business_hours: business.business_hours.clone(),
            place_id: business.place_id.clone(),
            business_status: business.business_status,
            date_created: super::iso(&business.date_created),
        }
    }
}

fn image_response(image: &BusinessImage, base_url: &str) -> BusinessImageResponse {
    let url = match image.source {
        ImageSource::PlaceIdPhoto => image
            .photo_reference
            .as_deref()
            .map(|reference| super::photo_url(base_url, reference)),
        ImageSource::LocalUpload => image.data.as_deref().map(|data| {
            if data.starts_with("data:") {
                data.to_string()
            } else {
                format!("data:image/jpeg;base64,{data}")
            }
        }),
    };

    BusinessImageResponse {
        source: image.source,
        photo_reference: image.photo_reference.clone(),
        url,
        is_primary: image.is_primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::validation::{check, Source};
    use serde_json::{json, Value};

    fn week() -> Value {
        let days: Vec<Value> = DayName::ALL
            .iter()
            .map(|d| {
                json!({
                    "day": d.index(),
                    "day_name": d,
                    "start_time": "09:00",
                    "end_time": "20:00",
                })
            })
            .collect();
        Value::Array(days)
    }

    fn payload() -> Value {
        json!({
            "business_name": "Sharp Cuts",
            "business_phone_number": "998901112233",
            "business_owner_id": "a1b2c3d4e5f60718",
            "business_address": {
                "lat": 41.31,
                "long": 69.24,
                "city": "Tashkent",
                "country": "Uzbekistan"
            },
            "business_images": [
                {"source": "place_id_photo", "photo_reference": "ref-1", "is_primary": true},
                {"source": "local_upload", "data": "aGVsbG8="}
            ],
            "business_hours": week(),
        })
    }

    fn errors_for(value: Value) -> Vec<(String, String)> {
        match check::<NewBusiness>(value.as_object().cloned().unwrap(), Source::Body) {
            Err(AppError::Validation(errors)) => {
                errors.into_iter().map(|e| (e.field, e.error)).collect()
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => vec![],
        }
    }

    #[test]
    fn valid_payload_is_normalized() {
        let business =
            check::<NewBusiness>(payload().as_object().cloned().unwrap(), Source::Body).unwrap();
        assert_eq!(business.business_address.region, "");
        assert_eq!(business.business_hours.len(), 7);
        assert_eq!(business.business_hours[0].day_name, DayName::Sunday);
        assert!(!business.business_hours[6].is_closed);
        assert!(business.business_images[0].is_primary);
        assert!(!business.business_images[1].is_primary);
        assert_eq!(business.business_status, None);
    }

    #[test]
    fn nested_violations_carry_dotted_paths() {
        let mut value = payload();
        value["business_address"]["city"] = json!("");
        value["business_hours"][3]["start_time"] = json!("9am");
        value["business_images"][0] = json!({"source": "place_id_photo"});

        let errors = errors_for(value);
        let fields: Vec<&str> = errors.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "business_address.city",
                "business_hours.3.start_time",
                "business_images.0"
            ]
        );
    }

    #[test]
    fn hours_must_cover_a_full_week() {
        let mut value = payload();
        value["business_hours"].as_array_mut().unwrap().pop();
        let errors = errors_for(value);
        assert_eq!(
            errors,
            vec![(
                "business_hours".to_string(),
                "business_hours must have exactly 7 days".to_string()
            )]
        );
    }

    #[test]
    fn duplicate_days_are_rejected() {
        let mut value = payload();
        value["business_hours"][1] = value["business_hours"][0].clone();
        let errors = errors_for(value);
        assert_eq!(
            errors,
            vec![(
                "business_hours".to_string(),
                "business_hours must list each day once".to_string()
            )]
        );
    }

    #[test]
    fn short_week_with_a_bad_entry_reports_both() {
        let mut value = payload();
        value["business_hours"].as_array_mut().unwrap().pop();
        value["business_hours"][2]["end_time"] = json!("late");
        let errors = errors_for(value);
        let fields: Vec<&str> = errors.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["business_hours", "business_hours.2.end_time"]);
    }

    #[test]
    fn mistyped_nested_fields_are_reported_with_missing_ones() {
        let mut value = payload();
        value["business_hours"][4]["day_name"] = json!("Funday");
        value["business_images"][0]["source"] = json!("camera");
        value.as_object_mut().unwrap().remove("business_name");
        let errors = errors_for(value);
        let fields: Vec<&str> = errors.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "business_hours.4.day_name",
                "business_images.0.source",
                "business_name"
            ]
        );
    }

    #[test]
    fn day_name_must_agree_with_day() {
        let mut value = payload();
        value["business_hours"][2]["day_name"] = json!("Friday");
        let errors = errors_for(value);
        assert_eq!(errors[0].0, "business_hours.2");
    }

    #[test]
    fn uploads_must_be_base64() {
        let mut value = payload();
        value["business_images"][1]["data"] = json!("not base64 !!");
        let errors = errors_for(value);
        assert_eq!(errors[0].0, "business_images.1");
        assert_eq!(errors[0].1, "data must be base64-encoded image data");
    }

    #[test]
    fn image_urls_are_formatted() {
        let business = Business {
            business_name: "Sharp Cuts".to_string(),
            business_phone_number: "998901112233".to_string(),
            business_owner_id: "owner".to_string(),
            business_address: BusinessAddress {
                lat: 0.0,
                long: 0.0,
                city: "Tashkent".to_string(),
                country: "Uzbekistan".to_string(),
                region: String::new(),
                street_name: String::new(),
            },
            business_images: vec![
                BusinessImage {
                    source: ImageSource::PlaceIdPhoto,
                    photo_reference: Some("abc".to_string()),
                    data: None,
                    is_primary: true,
                },
                BusinessImage {
                    source: ImageSource::LocalUpload,
                    photo_reference: None,
                    data: Some("aGVsbG8=".to_string()),
                    is_primary: false,
                },
            ],
            business_hours: vec![],
            place_id: None,
            business_status: BusinessStatus::Unverified,
            date_created: Utc::now(),
        };

        let response = BusinessResponse::new("id", &business, "https://api.example");
        assert_eq!(
            response.business_images[0].url.as_deref(),
            Some("https://api.example/places/photo/abc")
        );
        assert_eq!(
            response.business_images[1].url.as_deref(),
            Some("data:image/jpeg;base64,aGVsbG8=")
        );
    }
}
