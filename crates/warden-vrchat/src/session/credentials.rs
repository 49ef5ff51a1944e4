//! Picks the reusable credential after a successful authenticating call.

use crate::api::{UserResponse, VrchatApi};

/// First non-empty source wins: cookies on the response itself (parsed
/// cookies and raw `Set-Cookie` headers together), then the client's jar,
/// then the header currently being sent.
pub fn extract_credential(response: &UserResponse, api: &dyn VrchatApi) -> Option<String> {
    let pairs = response_pairs(response.cookies.iter().chain(&response.set_cookie));
    if !pairs.is_empty() {
        return Some(pairs.join("; "));
    }

    api.jar_credential()
        .filter(|c| !c.trim().is_empty())
        .or_else(|| api.outgoing_credential().filter(|c| !c.trim().is_empty()))
}

/// `name=value` from each cookie, attributes dropped, duplicates removed.
fn response_pairs<'a>(raw: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut pairs: Vec<String> = Vec::new();
    for cookie in raw {
        let pair = cookie.split(';').next().unwrap_or("").trim();
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        // deletion cookies carry an empty value
        if name.trim().is_empty() || value.trim().is_empty() {
            continue;
        }
        if !pairs.iter().any(|p| p == pair) {
            pairs.push(pair.to_string());
        }
    }
    pairs
}
