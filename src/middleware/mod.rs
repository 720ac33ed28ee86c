pub mod auth;
pub mod headers;
pub mod response;

pub use auth::{authenticate, AuthGate};
pub use headers::{preflight, with_response_headers, VERSION_HEADER};
pub use response::{ApiResponse, ApiResult};
