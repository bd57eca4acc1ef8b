// src/server/static_files.rs

//! Static file resolution and live-reload script injection.

use std::path::{Component, Path, PathBuf};

/// Path of the Server-Sent Events endpoint browsers subscribe to.
pub const RELOAD_PATH: &str = "/__sitepipe/reload";

const RELOAD_SCRIPT: &str = concat!(
    "<script>(function(){",
    "var es=new EventSource(\"/__sitepipe/reload\");",
    "es.addEventListener(\"reload\",function(){location.reload();});",
    "})();</script>"
);

/// Map a request path onto a file below `root`.
///
/// Directory paths (including `/`) resolve to their `index.html`. Returns
/// `None` for missing files and for anything trying to leave `root`.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode(request_path)?;
    let mut path = root.to_path_buf();

    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => path.push(part),
            _ => return None,
        }
    }

    if path.is_dir() {
        path.push("index.html");
    }
    path.is_file().then_some(path)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    let decoded = String::from_utf8(out).ok()?;
    // Backslashes and NULs never name a legitimate site file.
    if decoded.contains(['\\', '\0']) {
        return None;
    }
    Some(decoded)
}

/// Content type by file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",
        _ => "application/octet-stream",
    }
}

pub fn is_html(path: &Path) -> bool {
    content_type(path).starts_with("text/html")
}

/// Insert the live-reload client before the last `</body>`, or append it.
pub fn inject_reload_script(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT.len());
            out.push_str(&html[..idx]);
            out.push_str(RELOAD_SCRIPT);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{RELOAD_SCRIPT}"),
    }
}
