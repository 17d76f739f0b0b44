// Pure helpers shared by the DOM glue. No web-sys types here so the host
// tests can include this file directly.

pub const DEFAULT_CONFIG_PATH: &str = "config/product.json";
pub const DOM_EVENT_PREFIX: &str = "configurator:";

#[inline]
pub fn config_path(attr: Option<&str>) -> &str {
    match attr.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => DEFAULT_CONFIG_PATH,
    }
}

/// Name of the DOM `CustomEvent` mirroring a bus event.
#[inline]
pub fn dom_event_name(event: &str) -> String {
    format!("{DOM_EVENT_PREFIX}{event}")
}

/// `device-mobile`, `device-tablet`, `device-desktop`.
#[inline]
pub fn device_body_class(class: &str) -> String {
    format!("device-{class}")
}

pub fn progress_label(loaded: usize, total: usize, percentage: u32) -> String {
    if total == 0 || loaded >= total {
        "All finishes ready".to_string()
    } else {
        format!("Preparing finishes {loaded}/{total} ({percentage}%)")
    }
}

/// Decoded byte size of a base64 `data:` URL payload.
pub fn data_url_size(data_url: &str) -> usize {
    let payload = match data_url.split_once(',') {
        Some((_, p)) => p,
        None => return 0,
    };
    let trimmed = payload.trim_end_matches('=');
    let padding = payload.len() - trimmed.len();
    ((payload.len() / 4) * 3).saturating_sub(padding.min(2))
}

/// Resource Timing entry names are absolute; the model `src` is usually
/// relative to the page.
pub fn resource_matches(entry_name: &str, src: &str) -> bool {
    let src = src.trim_start_matches("./");
    if src.is_empty() {
        return false;
    }
    let name = entry_name
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or(entry_name);
    name == src || name.ends_with(&format!("/{src}"))
}

/// Scene Viewer ships with Chrome on Android; Firefox and Oculus browsers
/// lack the intent handler.
pub fn scene_viewer_available(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ua.contains("android") && !ua.contains("firefox") && !ua.contains("oculusbrowser")
}

pub fn error_toast_text(message: &str, details: Option<&str>) -> String {
    match details {
        Some(d) if !d.is_empty() => format!("{message}: {d}"),
        _ => message.to_string(),
    }
}
