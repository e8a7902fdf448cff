//! Transport layer for the Qortal client.

pub mod http;

pub use http::HttpTransport;
