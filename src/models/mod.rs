pub mod business;
pub mod business_owner;
pub mod otp;
pub mod user;

pub use business::{
    Business, BusinessAddress, BusinessHour, BusinessImage, BusinessResponse, BusinessStatus,
    DayName, ImageSource, NewBusiness,
};
pub use business_owner::{BusinessOwner, BusinessOwnerResponse, NewBusinessOwner};
pub use otp::{OtpCode, SendOtp, VerifyOtp};
pub use user::{NewUser, User, UserResponse};

use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 with millisecond precision, the format clients receive for every
/// timestamp.
pub fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// URL of a place photo as served through the photo proxy.
pub fn photo_url(base_url: &str, photo_reference: &str) -> String {
    format!("{base_url}/places/photo/{photo_reference}")
}
