//! Wire protocol: the `{type, action, data}` envelope, newline-delimited
//! framing (with the exact-byte payload switch for upload/download), the
//! error code taxonomy, and per-action payload shapes.

pub mod envelope;
pub mod error_codes;
pub mod framing;
pub mod messages;
pub mod validation;

pub use envelope::{ErrorBody, RawRequest, RawResponse, RpcError, Status};
pub use error_codes::ErrorCode;
