// Host-side tests for the pure formatting helpers.
// The web crate is wasm-only, so the module is included directly.

#![allow(dead_code)]
mod format {
    include!("../src/format.rs");
}

use format::*;

#[test]
fn config_path_defaults_when_attribute_is_blank() {
    assert_eq!(config_path(None), "config/product.json");
    assert_eq!(config_path(Some("  ")), "config/product.json");
    assert_eq!(config_path(Some(" data/watch.json ")), "data/watch.json");
}

#[test]
fn dom_events_are_namespaced() {
    assert_eq!(dom_event_name("colorChanged"), "configurator:colorChanged");
    assert_eq!(device_body_class("tablet"), "device-tablet");
}

#[test]
fn progress_label_counts_then_settles() {
    assert_eq!(progress_label(1, 3, 33), "Preparing finishes 1/3 (33%)");
    assert_eq!(progress_label(3, 3, 100), "All finishes ready");
    assert_eq!(progress_label(0, 0, 100), "All finishes ready");
}

#[test]
fn data_url_size_accounts_for_padding() {
    // "hello" -> aGVsbG8=
    assert_eq!(data_url_size("data:image/png;base64,aGVsbG8="), 5);
    // "hi" -> aGk=
    assert_eq!(data_url_size("data:image/png;base64,aGk="), 2);
    assert_eq!(data_url_size("data:image/png;base64,aGVs"), 3);
    assert_eq!(data_url_size("data:,"), 0);
    assert_eq!(data_url_size("not a data url"), 0);
}

#[test]
fn resource_entries_match_relative_sources() {
    let entry = "https://shop.example.com/assets/models/watch.glb?v=3";
    assert!(resource_matches(entry, "models/watch.glb"));
    assert!(resource_matches(entry, "./models/watch.glb"));
    assert!(!resource_matches(entry, "watch.gltf"));
    assert!(!resource_matches("https://cdn.example.com/mywatch.glb", "watch.glb"));
    assert!(!resource_matches(entry, ""));
}

#[test]
fn scene_viewer_needs_an_android_chrome_family_browser() {
    let chrome = "Mozilla/5.0 (Linux; Android 10; SM-G975F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0 Mobile Safari/537.36";
    let firefox = "Mozilla/5.0 (Android 10; Mobile; rv:96.0) Gecko/96.0 Firefox/96.0";
    let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_2 like Mac OS X) AppleWebKit/605.1.15";
    assert!(scene_viewer_available(chrome));
    assert!(!scene_viewer_available(firefox));
    assert!(!scene_viewer_available(iphone));
}

#[test]
fn toast_text_appends_details() {
    assert_eq!(error_toast_text("Failed to change color", None), "Failed to change color");
    assert_eq!(
        error_toast_text("Failed to change color", Some("timed out")),
        "Failed to change color: timed out"
    );
    assert_eq!(error_toast_text("AR requires HTTPS connection", Some("")), "AR requires HTTPS connection");
}
