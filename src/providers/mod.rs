//! Upstream geolocation providers.

pub mod ipapi;
