//! Wire types for the middleware API and health endpoints
//!
//! All bodies are JSON. Field names follow the published scheme's notation
//! (`W_i`, `UID_i`, `ID_j`, ...) on the wire; internally the types use plain
//! Rust names and serde renames.
//!
//! The smartcard material and session key are opaque strings produced by the
//! backend's cryptographic protocol. This client stores and displays them,
//! nothing more.

use serde::{Deserialize, Serialize};

/// POST body for both `/register_user` and `/authenticate_user`
#[derive(Debug, Clone, Serialize)]
pub struct CredentialRequest<'a> {
    pub user_id: &'a str,
    pub password: &'a str,
}

/// Smartcard secret material issued at registration
///
/// Five opaque hex-encoded strings. Treated as an unstructured record; the
/// client never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartCard {
    #[serde(rename = "W_i")]
    pub w: String,
    #[serde(rename = "X_i")]
    pub x: String,
    #[serde(rename = "Y_i")]
    pub y: String,
    #[serde(rename = "Z_i")]
    pub z: String,
    #[serde(rename = "E_i")]
    pub e: String,
}

/// Success response from `/register_user`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    /// Pseudonymous identifier issued by the registration center
    #[serde(rename = "UID_i")]
    pub uid: String,

    #[serde(rename = "SmartCard")]
    pub smartcard: SmartCard,
}

/// Success response from `/authenticate_user`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub session_key: String,
}

/// Failure body shape shared by all middleware endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Body returned by the health endpoints on GET `/`
///
/// Only the resource server includes `creds`; the middleware and the
/// registration center return a bare greeting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceGreeting {
    #[serde(default)]
    pub creds: Option<ServerCreds>,
}

/// Resource-server identity metadata embedded in its greeting
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerCreds {
    #[serde(rename = "ID_j")]
    pub id: String,
    #[serde(rename = "Loc_j")]
    pub location: String,
}
