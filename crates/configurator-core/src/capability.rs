//! Host capability probing.
//!
//! Pure functions over a [`HostInfo`] snapshot. The web front-end builds a
//! fresh snapshot from `window`/`navigator`/`location` on every query, so
//! orientation and resize changes are always reflected.

use crate::constants::{
    IPADOS_DESKTOP_UA_MAJOR, LOOPBACK_HOSTS, MIN_ANDROID_AR_VERSION, MIN_IOS_AR_MAJOR,
    MOBILE_MAX_WIDTH, MOBILE_UA_PATTERNS, TABLET_MAX_WIDTH,
};
use serde::Serialize;

/// AR entry points the browser advertises.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArFlags {
    /// `<a rel="ar">` is supported (iOS Quick Look).
    pub quick_look: bool,
    /// Scene Viewer intent is available (Android).
    pub scene_viewer: bool,
    /// `navigator.xr` is present.
    pub webxr: bool,
}

/// Snapshot of everything the prober looks at.
#[derive(Clone, Debug, Default)]
pub struct HostInfo {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub user_agent: String,
    pub max_touch_points: u32,
    /// `location.protocol`, including the trailing colon.
    pub protocol: String,
    pub hostname: String,
    pub ar: ArFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArMode {
    QuickLook,
    SceneViewer,
    WebXr,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArSupport {
    pub supported: bool,
    pub mode: Option<ArMode>,
    /// Why AR is unavailable; `None` when supported.
    pub reason: Option<String>,
}

impl ArSupport {
    fn unsupported(reason: &str) -> Self {
        Self {
            supported: false,
            mode: None,
            reason: Some(reason.to_string()),
        }
    }

    fn supported(mode: ArMode) -> Self {
        Self {
            supported: true,
            mode: Some(mode),
            reason: None,
        }
    }
}

pub const REASON_INSECURE: &str = "AR requires HTTPS connection";
pub const REASON_IOS_VERSION: &str = "Unsupported iOS version";
pub const REASON_ANDROID_VERSION: &str = "Unsupported Android version";
pub const REASON_DEVICE: &str = "AR not supported on this device";
pub const REASON_BROWSER: &str = "AR not supported in this browser";

#[inline]
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_UA_PATTERNS.iter().any(|p| ua.contains(p))
}

/// Classify the host. The mobile check runs first and wins ties.
pub fn classify_device(host: &HostInfo) -> DeviceClass {
    let width = host.viewport_width;
    if width <= MOBILE_MAX_WIDTH
        || is_mobile_user_agent(&host.user_agent)
        || host.max_touch_points > 0
    {
        return DeviceClass::Mobile;
    }
    if width <= TABLET_MAX_WIDTH {
        return DeviceClass::Tablet;
    }
    DeviceClass::Desktop
}

/// Same as [`classify_device`], honouring the `mobile=true` test override.
pub fn classify_device_with_override(host: &HostInfo, force_mobile: bool) -> DeviceClass {
    if force_mobile {
        DeviceClass::Mobile
    } else {
        classify_device(host)
    }
}

#[inline]
pub fn is_secure_context(protocol: &str, hostname: &str) -> bool {
    protocol.eq_ignore_ascii_case("https:") || LOOPBACK_HOSTS.contains(&hostname)
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// `(major, minor)` from the version token at the start of `s`
/// (`15_2 like ...`, `7.0; ...`, `10; ...`).
fn version_token(s: &str) -> Option<(u32, u32)> {
    let token: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '_')
        .collect();
    let mut parts = token.split(|c: char| c == '.' || c == '_');
    let major = parts.next().and_then(leading_number)?;
    let minor = parts.next().and_then(leading_number).unwrap_or(0);
    Some((major, minor))
}

/// Major iOS version from an iPhone/iPad/iPod user agent
/// (`... iPhone OS 15_2 like Mac OS X ...`, `... CPU OS 12_0 ...`).
pub fn parse_ios_version(user_agent: &str) -> Option<(u32, u32)> {
    if !["iPhone", "iPad", "iPod"]
        .iter()
        .any(|d| user_agent.contains(d))
    {
        return None;
    }
    let idx = user_agent.find(" OS ")?;
    version_token(&user_agent[idx + " OS ".len()..])
}

/// `(major, minor)` from `... Android 7.0; ...` or `... Android 10; ...`.
pub fn parse_android_version(user_agent: &str) -> Option<(u32, u32)> {
    let idx = user_agent.find("Android ")?;
    version_token(&user_agent[idx + "Android ".len()..])
}

/// iPadOS 13+ identifies as desktop Safari; the touch points give it away.
fn ipados_desktop_version(host: &HostInfo) -> Option<u32> {
    if !host.user_agent.contains("Macintosh") || host.max_touch_points <= 1 {
        return None;
    }
    let major = host
        .user_agent
        .find("Version/")
        .and_then(|i| leading_number(&host.user_agent[i + "Version/".len()..]))
        .unwrap_or(IPADOS_DESKTOP_UA_MAJOR);
    Some(major)
}

/// Decide whether AR hand-off can work here. Fails closed: every negative
/// path carries a human-readable reason.
pub fn check_ar_support(host: &HostInfo) -> ArSupport {
    if !is_secure_context(&host.protocol, &host.hostname) {
        return ArSupport::unsupported(REASON_INSECURE);
    }

    let ios_major = parse_ios_version(&host.user_agent)
        .map(|(major, _)| major)
        .or_else(|| ipados_desktop_version(host));
    if let Some(major) = ios_major {
        if major < MIN_IOS_AR_MAJOR {
            return ArSupport::unsupported(REASON_IOS_VERSION);
        }
        if host.ar.quick_look {
            return ArSupport::supported(ArMode::QuickLook);
        }
        return ArSupport::unsupported(REASON_BROWSER);
    }

    if let Some(version) = parse_android_version(&host.user_agent) {
        if version < MIN_ANDROID_AR_VERSION {
            return ArSupport::unsupported(REASON_ANDROID_VERSION);
        }
        if host.ar.scene_viewer {
            return ArSupport::supported(ArMode::SceneViewer);
        }
        if host.ar.webxr {
            return ArSupport::supported(ArMode::WebXr);
        }
        return ArSupport::unsupported(REASON_BROWSER);
    }

    ArSupport::unsupported(REASON_DEVICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_15: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.2 Mobile/15E148 Safari/604.1";
    const IPHONE_11: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 11_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/11.0 Mobile/15E148 Safari/604.1";
    const ANDROID_10: &str = "Mozilla/5.0 (Linux; Android 10; SM-G975F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0 Mobile Safari/537.36";
    const ANDROID_6: &str = "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0 Mobile Safari/537.36";
    const DESKTOP_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
    const IPAD_DESKTOP: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.1 Safari/605.1.15";

    fn host(width: f64, ua: &str) -> HostInfo {
        HostInfo {
            viewport_width: width,
            viewport_height: 800.0,
            user_agent: ua.to_string(),
            max_touch_points: 0,
            protocol: "https:".into(),
            hostname: "shop.example.com".into(),
            ar: ArFlags::default(),
        }
    }

    #[test]
    fn narrow_viewport_is_mobile() {
        let mut h = host(400.0, DESKTOP_CHROME);
        h.protocol = "http:".into();
        assert_eq!(classify_device(&h), DeviceClass::Mobile);
        let ar = check_ar_support(&h);
        assert!(!ar.supported);
        assert_eq!(ar.reason.as_deref(), Some("AR requires HTTPS connection"));
    }

    #[test]
    fn breakpoints() {
        assert_eq!(classify_device(&host(768.0, DESKTOP_CHROME)), DeviceClass::Mobile);
        assert_eq!(classify_device(&host(769.0, DESKTOP_CHROME)), DeviceClass::Tablet);
        assert_eq!(classify_device(&host(1024.0, DESKTOP_CHROME)), DeviceClass::Tablet);
        assert_eq!(classify_device(&host(1025.0, DESKTOP_CHROME)), DeviceClass::Desktop);
    }

    #[test]
    fn mobile_check_short_circuits_width_bands() {
        assert_eq!(classify_device(&host(1920.0, IPHONE_15)), DeviceClass::Mobile);
        let mut h = host(900.0, DESKTOP_CHROME);
        h.max_touch_points = 5;
        assert_eq!(classify_device(&h), DeviceClass::Mobile);
        assert_eq!(
            classify_device_with_override(&host(1920.0, DESKTOP_CHROME), true),
            DeviceClass::Mobile
        );
    }

    #[test]
    fn parses_versions() {
        assert_eq!(parse_ios_version(IPHONE_15), Some((15, 2)));
        assert_eq!(parse_ios_version(DESKTOP_CHROME), None);
        assert_eq!(parse_android_version(ANDROID_10), Some((10, 0)));
        assert_eq!(parse_android_version(ANDROID_6), Some((6, 0)));
        assert_eq!(parse_android_version(IPHONE_15), None);
    }

    #[test]
    fn loopback_counts_as_secure() {
        assert!(is_secure_context("http:", "localhost"));
        assert!(is_secure_context("http:", "127.0.0.1"));
        assert!(!is_secure_context("http:", "192.168.1.4"));
        assert!(is_secure_context("HTTPS:", "example.com"));
    }

    #[test]
    fn ios_quick_look() {
        let mut h = host(390.0, IPHONE_15);
        h.ar.quick_look = true;
        let ar = check_ar_support(&h);
        assert!(ar.supported);
        assert_eq!(ar.mode, Some(ArMode::QuickLook));
        assert_eq!(ar.reason, None);

        let mut old = host(390.0, IPHONE_11);
        old.ar.quick_look = true;
        assert_eq!(
            check_ar_support(&old).reason.as_deref(),
            Some(REASON_IOS_VERSION)
        );
    }

    #[test]
    fn ios_without_quick_look_is_browser_limited() {
        let h = host(390.0, IPHONE_15);
        assert_eq!(check_ar_support(&h).reason.as_deref(), Some(REASON_BROWSER));
    }

    #[test]
    fn ipados_desktop_ua_is_treated_as_ios() {
        let mut h = host(1024.0, IPAD_DESKTOP);
        h.max_touch_points = 5;
        h.ar.quick_look = true;
        assert_eq!(check_ar_support(&h).mode, Some(ArMode::QuickLook));
    }

    #[test]
    fn android_modes() {
        let mut h = host(412.0, ANDROID_10);
        h.ar.webxr = true;
        assert_eq!(check_ar_support(&h).mode, Some(ArMode::WebXr));
        h.ar.scene_viewer = true;
        assert_eq!(check_ar_support(&h).mode, Some(ArMode::SceneViewer));

        let mut old = host(412.0, ANDROID_6);
        old.ar.scene_viewer = true;
        assert_eq!(
            check_ar_support(&old).reason.as_deref(),
            Some(REASON_ANDROID_VERSION)
        );
    }

    #[test]
    fn desktop_is_not_an_ar_device() {
        let mut h = host(1920.0, DESKTOP_CHROME);
        h.ar.webxr = true;
        let ar = check_ar_support(&h);
        assert!(!ar.supported);
        assert_eq!(ar.reason.as_deref(), Some(REASON_DEVICE));
    }
}
