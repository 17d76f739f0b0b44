use crate::format;
use crate::host;
use crate::viewer::ModelViewerElement;
use configurator_core::{
    check_ar_support, classify_device, ConfiguratorEvent, Context, ErrorKind,
};
use web_sys as web;

const SCREENSHOT_MIME: &str = "image/png";

/// Capture the current frame as a PNG data URL and announce it.
pub fn take_screenshot(viewer: &ModelViewerElement, ctx: &Context) -> Option<String> {
    match viewer.to_data_url(SCREENSHOT_MIME) {
        Ok(data_url) => {
            let size = format::data_url_size(&data_url);
            log::info!("[ui] screenshot captured ({} bytes)", size);
            ctx.bus.emit(ConfiguratorEvent::ScreenshotTaken {
                data_url: data_url.clone(),
                size,
                timestamp: ctx.now(),
            });
            Some(data_url)
        }
        Err(e) => {
            log::error!("[ui] screenshot failed: {}", e);
            ctx.emit_error(ErrorKind::Webgl, "Failed to take screenshot", Some(e.to_string()));
            None
        }
    }
}

/// Hand the model off to the platform AR viewer when the device supports it.
pub async fn activate_ar(viewer: &ModelViewerElement, ctx: &Context) {
    let Some(window) = web::window() else {
        return;
    };
    let info = host::probe(&window);
    let support = check_ar_support(&info);
    if !support.supported {
        let reason = support.reason.unwrap_or_default();
        log::warn!("[ar] unavailable: {}", reason);
        ctx.emit_error(ErrorKind::User, &reason, None);
        return;
    }

    match viewer.activate_ar().await {
        Ok(()) => {
            log::info!("[ar] activated via {:?}", support.mode);
            ctx.bus.emit(ConfiguratorEvent::ArActivated {
                timestamp: ctx.now(),
                device: classify_device(&info).as_str().to_string(),
            });
        }
        Err(e) => {
            log::error!("[ar] activation failed: {}", e);
            ctx.emit_error(e.kind(), "Failed to activate AR", Some(e.to_string()));
        }
    }
}
