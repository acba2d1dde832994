//! # Credential Retrieval Module
//!
//! Everything that happens before a stream connection exists: a JSON POST to
//! the gateway that trades the client identity for an endpoint and a ticket.
//!
//! ## Contained Modules:
//!
//! - **`gateway_http`**: A thin `reqwest` wrapper returning a standardized
//!   `ApiResponse`, with non-2xx answers reported as data.
//! - **`credentials`**: The `CredentialExchanger` trait, the request body, and
//!   the HTTP implementation used in production.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic JSON-over-HTTP client.
pub mod gateway_http;
/// Identity-for-ticket exchange.
pub mod credentials;

pub use credentials::{CredentialExchanger, HttpCredentialExchanger, OpenConnectionRequest};
