//! Client Module
//!
//! HTTP transport abstraction and request construction.

pub mod http;
pub mod transport;

pub use transport::{ByteStream, HttpRequest, HttpResponse, HttpTransport};
