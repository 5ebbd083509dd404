//! Request types

mod headers;
mod method;
mod spec;

pub use headers::{AUTHORIZATION, CSRF_TOKEN, Header, Headers};
pub use method::HttpMethod;
pub use spec::{ApiRequest, JSON_API, RequestOptions};
