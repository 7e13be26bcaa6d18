use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{ContentType, ValidationError};

pub const PLATFORM_DOMAIN: &str = "instagram.com";

static REEL_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/reels?/").expect("static regex"));

/// Check a submitted URL against the rules for `content_type`.
pub fn validate(url: &str, content_type: ContentType) -> Result<(), ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidDomain)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidDomain);
    }
    if !parsed.host_str().is_some_and(is_platform_host) {
        return Err(ValidationError::InvalidDomain);
    }

    if content_type == ContentType::Reels && !REEL_PATH.is_match(parsed.path()) {
        return Err(ValidationError::InvalidShapeForType);
    }

    Ok(())
}

fn is_platform_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == PLATFORM_DOMAIN
        || host
            .strip_suffix(PLATFORM_DOMAIN)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
