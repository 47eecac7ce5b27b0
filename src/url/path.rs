use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use url::Url;

/// Extracts the part of a URL that exclusion rules are matched against
///
/// Scheme, user-info, host, port and fragment are dropped; path, `;params`
/// and `?query` are kept. A trailing `?` with an empty query is preserved.
/// Input that is not an absolute URL is treated as a path already, minus
/// any fragment.
///
/// # Examples
///
/// ```
/// use robotgate::url::extract_path;
///
/// assert_eq!(extract_path("http://user@example.com/a;p?q=1#frag"), "/a;p?q=1");
/// assert_eq!(extract_path("http://example.com/a?"), "/a?");
/// assert_eq!(extract_path("http://example.com"), "/");
/// ```
pub fn extract_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if !parsed.cannot_be_a_base() => {
            let mut path = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }
            path
        }
        _ => url.split('#').next().unwrap_or_default().to_string(),
    }
}

/// Canonicalizes a path or rule pattern for comparison
///
/// Both rule patterns and query paths go through this transform:
/// a leading `/` is added unless the text starts with `/` or `*`, escaped
/// forward slashes (`%2f`, `%2F`) are protected as `%252f`, and the rest is
/// percent-decoded. An escaped slash therefore never compares equal to a
/// literal path separator.
///
/// # Examples
///
/// ```
/// use robotgate::url::sanitize_path;
///
/// assert_eq!(sanitize_path("a%3cd.html"), "/a<d.html");
/// assert_eq!(sanitize_path("/a%2fb.html"), "/a%2fb.html");
/// assert_eq!(sanitize_path("*.css"), "*.css");
/// ```
pub fn sanitize_path(text: &str) -> String {
    let rooted: Cow<'_, str> = if text.starts_with('/') || text.starts_with('*') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("/{}", text))
    };

    let protected = rooted.replace("%2f", "%252f").replace("%2F", "%252f");
    percent_decode_str(&protected)
        .decode_utf8_lossy()
        .into_owned()
}
