//! Server-side translation of storage outcomes into HTTP status codes.
//!
//! The client in [`crate::client`] performs the inverse mapping; the two must
//! agree for errors to survive a round trip through the wire protocol.

use reqwest::StatusCode;
use zenea_store::{CheckError, FetchError, PutError};
use zenea_types::Block;

pub fn fetch_status(err: &FetchError) -> StatusCode {
    match err {
        FetchError::NotFound => StatusCode::NOT_FOUND,
        FetchError::InvalidContent | FetchError::Unable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Status for a `HEAD /block/{id}` probe.
pub fn check_status(result: &Result<bool, CheckError>) -> StatusCode {
    match result {
        Ok(true) => StatusCode::OK,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(CheckError::Unable) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Status for a put, plus the block to report if the put is a success.
///
/// `Exists` is a success on the wire: puts are idempotent.
pub fn put_status(result: &Result<Block, PutError>) -> (StatusCode, Option<&Block>) {
    match result {
        Ok(block) | Err(PutError::Exists(block)) => (StatusCode::OK, Some(block)),
        Err(PutError::Unavailable) => (StatusCode::BAD_GATEWAY, None),
        Err(PutError::NotPermitted) => (StatusCode::FORBIDDEN, None),
        Err(PutError::Overflow | PutError::Unable) => (StatusCode::INTERNAL_SERVER_ERROR, None),
    }
}
