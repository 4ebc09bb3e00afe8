//! Error types for the todo-mood API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status" — the mood manager in particular maps 404 to "no entry for this
//! day". A 4xx/5xx body that decodes as the server's `{"detail": string}`
//! envelope becomes `Api` with the server-provided message; everything else
//! lands in `Http` with the raw status code.
//!
//! `Unauthenticated` is raised by the managers when an operation is invoked
//! without a stored credential, so "not logged in" is never mistaken for
//! "succeeded with nothing to do".

use thiserror::Error;

/// Errors returned by `ApiClient` operations and the resource managers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response: no connection, bad URL.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The operation requires a credential and none is stored.
    #[error("not authenticated")]
    Unauthenticated,

    /// The server returned 404 — the requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a 4xx/5xx with a decodable `{"detail"}` envelope.
    #[error("{0}")]
    Api(String),

    /// The server returned a non-2xx status with no decodable error envelope.
    #[error("HTTP {0}")]
    Http(u16),

    /// The response body could not be deserialized into the expected type.
    #[error("response decoding failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized.
    #[error("request encoding failed: {0}")]
    Encode(String),
}
