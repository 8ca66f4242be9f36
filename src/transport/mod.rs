//! HTTP transport: one network call per invocation, classified errors out.

mod http;

pub use http::HttpTransport;
