//! Local bearer-credential claim decode.
//!
//! The token is treated as opaque, but in practice it is a three-part
//! `.`-separated signed structure whose middle part is base64url JSON
//! carrying a `UserId` claim. Decoding it locally saves a network
//! round-trip; any structural surprise yields `None` and the caller
//! falls back to asking the API.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::model::UserId;

/// Name of the claim carrying the user identifier.
const USER_ID_CLAIM: &str = "UserId";

/// Extract the user id from the token payload, without the network.
///
/// Returns `None` on any structural failure: wrong segment count,
/// undecodable base64, non-UTF-8 or non-JSON payload, absent claim,
/// or a claim that is not an integer.
pub fn user_id_from_token(token: &str) -> Option<UserId> {
    let mut segments = token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            tracing::debug!("token does not have three segments");
            return None;
        }
    };

    // Issuers differ on whether they pad the payload segment.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    let id = claim_as_id(claims.get(USER_ID_CLAIM)?);
    if id.is_none() {
        tracing::debug!("token {USER_ID_CLAIM} claim is not an integer");
    }
    id
}

/// The claim arrives as a JSON number or a numeric string, depending
/// on the issuer.
fn claim_as_id(claim: &Value) -> Option<UserId> {
    match claim {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
