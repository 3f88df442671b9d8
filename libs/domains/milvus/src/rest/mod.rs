//! REST v2 transport for [`MilvusClient`](crate::client::MilvusClient).

mod client;
pub mod conversions;

pub use client::MilvusRestClient;
