//! Per-page session identifier.
//!
//! Taken from the auth cookie when there is one, otherwise a random token.
//! Lives for the page only; nothing is persisted.

use rand::Rng;

/// Cookie names checked in order.
pub const AUTH_COOKIE_NAMES: &[&str] = &["auth_token", "session_id", "sessionid", "token"];

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const TOKEN_LEN: usize = 6;
const COOKIE_PREFIX_LEN: usize = 8;

/// Derive the session id from a `document.cookie` string.
pub fn session_id_from_cookies(cookies: &str) -> String {
    find_auth_cookie(cookies)
        .map(|value| value.chars().take(COOKIE_PREFIX_LEN).collect::<String>().to_uppercase())
        .unwrap_or_else(random_token)
}

fn find_auth_cookie(cookies: &str) -> Option<&str> {
    let pairs: Vec<(&str, &str)> = cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .collect();

    AUTH_COOKIE_NAMES.iter().find_map(|wanted| {
        pairs
            .iter()
            .find(|(name, value)| name == wanted && !value.is_empty())
            .map(|(_, value)| *value)
    })
}

/// Random upper-case alphanumeric token.
pub fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
