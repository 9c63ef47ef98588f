//! Stateless well-formedness checks for creation requests.

use crate::shortcode::{MAX_LENGTH, MIN_LENGTH};
use url::Url;

/// Returns `true` if `url` starts with an `http://` or `https://` scheme
/// (case-insensitive), has something after it and parses as a URL.
pub fn is_valid_url(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };

    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return false;
    }

    !rest.is_empty() && Url::parse(url).is_ok()
}

/// Returns `true` if `code` is ASCII alphanumeric and 3-20 characters long.
pub fn is_valid_shortcode(code: &str) -> bool {
    (MIN_LENGTH..=MAX_LENGTH).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Returns `true` if the validity period (in minutes) is positive.
///
/// Defaulting a missing or zero value is left to the caller.
pub fn is_valid_validity(minutes: i64) -> bool {
    minutes > 0
}
