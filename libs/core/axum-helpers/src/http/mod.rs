//! HTTP middleware shared by every app router.

pub mod security;

pub use security::security_headers;
