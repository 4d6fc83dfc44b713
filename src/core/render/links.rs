//! Link target classification.

use url::Url;

/// Where a link leads, relative to the site the client is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
}

const UNSAFE_SCHEMES: &[&str] = &["javascript", "vbscript", "data", "file"];

/// Classify a link target. `None` means the target is unsafe and must not be linked.
///
/// Parsing goes through [`Url`], which lowercases the scheme and strips the tabs and newlines
/// browsers ignore, so `JaVa\tScript:` is caught as well.
pub fn classify(href: &str, site_host: Option<&str>) -> Option<LinkKind> {
    let href = href.trim();
    let parsed = if href.starts_with("//") {
        Url::parse(&format!("https:{}", href))
    } else {
        Url::parse(href)
    };
    let url = match parsed {
        Ok(url) => url,
        // Relative reference: same site.
        Err(url::ParseError::RelativeUrlWithoutBase) => return Some(LinkKind::Internal),
        // Absolute but malformed: never treat it as same-site.
        Err(e) => {
            log::debug!("unparseable link target {:?}: {}", href, e);
            return match explicit_scheme(href) {
                Some(scheme) if UNSAFE_SCHEMES.contains(&scheme.as_str()) => None,
                _ => Some(LinkKind::External),
            };
        }
    };
    let scheme = url.scheme();
    if UNSAFE_SCHEMES.contains(&scheme) {
        return None;
    }
    if matches!(scheme, "http" | "https") {
        let same_site = match (url.host_str(), site_host) {
            (Some(host), Some(site)) => host.eq_ignore_ascii_case(site),
            _ => false,
        };
        if same_site {
            return Some(LinkKind::Internal);
        }
    }
    Some(LinkKind::External)
}

/// Lowercased scheme of `href` ignoring the tabs and newlines browsers strip, if it has one.
fn explicit_scheme(href: &str) -> Option<String> {
    let cleaned: String = href.chars().filter(|c| !matches!(c, '\t' | '\n' | '\r')).collect();
    let (scheme, _) = cleaned.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}
