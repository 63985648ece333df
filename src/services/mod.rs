pub mod business_owners;
pub mod businesses;
pub mod events;
pub mod ids;
pub mod lifecycle;
pub mod messaging;
pub mod otp;
pub mod places;
pub mod registration;
pub mod users;
