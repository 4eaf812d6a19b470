//! Utility functions and helpers

use once_cell::sync::Lazy;
use regex::Regex;

/// Extensions that wrap another extension (`main.js.map`, `app.css.gz`)
static TRANSFORM_EXTENSIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(gz|map)$").unwrap());

/// Marker webpack-style bundlers put in incremental watch fragments
const HOT_UPDATE_MARKER: &str = "hot-update";

/// Convert any path separators to forward slashes
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Drop a `?query` or `#fragment` suffix from an asset path
pub fn strip_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(pos) => &path[..pos],
        None => path,
    }
}

/// Whether the path belongs to a hot-update fragment
pub fn is_hot_update(path: &str) -> bool {
    path.contains(HOT_UPDATE_MARKER)
}

/// Derive the file "type" used in manifest keys.
///
/// `main.js` -> `js`, `main.js.map` -> `js.map`, `app.css.gz` -> `css.gz`.
/// A path without any dot yields its whole (query-stripped) file name.
pub fn file_type(path: &str) -> String {
    let clean = strip_query(path);
    let file_name = basename(clean);
    let mut parts: Vec<&str> = file_name.split('.').collect();

    let ext = parts.pop().unwrap_or_default();
    if TRANSFORM_EXTENSIONS.is_match(ext) && parts.len() > 1 {
        if let Some(inner) = parts.pop() {
            return format!("{}.{}", inner, ext);
        }
    }

    ext.to_string()
}

/// Plain extension of a path, lowercase, without query string
pub fn extension(path: &str) -> Option<String> {
    let file_name = basename(strip_query(path));
    file_name
        .rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext.to_lowercase())
}

/// Last path segment, accepting both separators
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Everything before the last path segment, without the trailing separator
pub fn dirname(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Join a directory and a file name with a forward slash
pub fn join_posix(dir: &str, file: &str) -> String {
    if dir.is_empty() || dir == "." {
        file.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), file)
    }
}

/// Prefix an output-relative path with the public URL path.
///
/// An empty public path leaves the asset path untouched.
pub fn join_public(public_path: &str, path: &str) -> String {
    if public_path.is_empty() {
        return path.to_string();
    }

    format!(
        "{}/{}",
        public_path.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert_eq!(file_type("main.js"), "js");
        assert_eq!(file_type("main.abc123.js"), "js");
        assert_eq!(file_type("main.js.map"), "js.map");
        assert_eq!(file_type("styles.css.GZ"), "css.GZ");
        assert_eq!(file_type("fonts/icons.woff2?v=4"), "woff2");
        assert_eq!(file_type("map"), "map");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("main.js?v=3"), "main.js");
        assert_eq!(strip_query("icons.svg#sprite"), "icons.svg");
        assert_eq!(strip_query("main.js"), "main.js");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("build/app.CSS").as_deref(), Some("css"));
        assert_eq!(extension("main.js?x=1").as_deref(), Some("js"));
        assert_eq!(extension("LICENSE"), None);
        assert_eq!(extension(".htaccess"), None);
    }

    #[test]
    fn test_paths() {
        assert_eq!(basename("images/logo.png"), "logo.png");
        assert_eq!(dirname("images/logo.png"), "images");
        assert_eq!(dirname("logo.png"), "");
        assert_eq!(join_posix("images", "logo.png"), "images/logo.png");
        assert_eq!(join_posix("", "logo.png"), "logo.png");
        assert_eq!(normalize_separators("images\\logo.png"), "images/logo.png");
    }

    #[test]
    fn test_join_public() {
        assert_eq!(join_public("/build/", "main.js"), "/build/main.js");
        assert_eq!(join_public("/build", "main.js"), "/build/main.js");
        assert_eq!(join_public("https://cdn.example.com/", "a/b.css"), "https://cdn.example.com/a/b.css");
        assert_eq!(join_public("", "main.js"), "main.js");
    }

    #[test]
    fn test_hot_update() {
        assert!(is_hot_update("main.abcd1234.hot-update.js"));
        assert!(!is_hot_update("main.js"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
