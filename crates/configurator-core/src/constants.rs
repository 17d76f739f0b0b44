// Shared tuning constants used by the core and both front-ends.

// Device classification (CSS pixels)
pub const MOBILE_MAX_WIDTH: f64 = 768.0; // at or below: mobile layout
pub const TABLET_MAX_WIDTH: f64 = 1024.0; // above mobile, at or below: tablet

// Case-insensitive fragments that mark a mobile user agent
pub const MOBILE_UA_PATTERNS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

// Minimum OS versions for the native AR viewers
pub const MIN_IOS_AR_MAJOR: u32 = 12; // Quick Look
pub const MIN_ANDROID_AR_VERSION: (u32, u32) = (7, 0); // Scene Viewer / WebXR

// iPadOS 13+ reports a desktop Safari UA; assume this when no version is found
pub const IPADOS_DESKTOP_UA_MAJOR: u32 = 13;

// Hosts treated as a secure context even over plain http
pub const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

// Idle auto-rotation
pub const IDLE_THRESHOLD_MS: f64 = 1000.0; // inactivity before auto-rotate kicks in
pub const IDLE_CHECK_INTERVAL_MS: u32 = 1000; // cadence of the idle check

// Background texture preloading
pub const PRELOAD_DELAY_MS: u32 = 100; // pause between colors

// Model load ceiling before initialization is treated as failed
pub const MODEL_LOAD_TIMEOUT_MS: u32 = 30_000;

// Deep-link query parameter names
pub const PARAM_COLOR: &str = "color";
pub const PARAM_STRAP: &str = "strap";
pub const PARAM_ENVIRONMENT: &str = "environment";
pub const PARAM_AR: &str = "ar";
pub const PARAM_MOBILE: &str = "mobile";
