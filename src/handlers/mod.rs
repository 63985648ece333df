pub mod businesses;
pub mod otp;
pub mod places;
pub mod resources;
pub mod root;
