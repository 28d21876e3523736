// URL identity: the key used to decide whether two URLs are the same page

use url::Url;

/// Canonical form of `url`: origin plus path, with query and fragment
/// dropped. Input that does not parse is returned unchanged.
///
/// Query-string routed applications collapse to one page under this rule.
pub fn canonicalize(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!("{}{}", parsed.origin().ascii_serialization(), parsed.path()),
        Err(_) => url.to_string(),
    }
}

/// True when both URLs canonicalize to the same value.
pub fn same_page(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}

/// Scheme, host and port of `url`, e.g. `http://localhost:3000`.
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// File-name friendly screen identifier derived from the URL path.
///
/// `/` maps to `home`; `/settings/Profile/` maps to `settings-profile`.
pub fn screen_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return "page".to_string();
    };

    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return "home".to_string();
    }

    let name = path.trim_matches('/').replace('/', "-").to_lowercase();
    if name.is_empty() {
        "index".to_string()
    } else {
        name
    }
}
