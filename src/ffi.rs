//! C-ABI surface for hosts that load the overlay as a dynamic library
//!
//! Each thread calling into the library gets its own overlay instance. Null
//! pointers are treated as absent arguments, and failures are logged rather
//! than returned, so every export is safe to call in any order.

use crate::backend::{texture_format_from_code, WgpuBackend};
use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::frame_input::FrameInput;
use crate::lifecycle::UiLifecycleManager;
use egui_wgpu::wgpu;
use std::cell::RefCell;
use std::ffi::{c_char, CStr};
use std::sync::Arc;

thread_local! {
    static OVERLAY: RefCell<UiLifecycleManager<WgpuBackend>> = RefCell::new(UiLifecycleManager::new());
}

fn with_overlay<R>(f: impl FnOnce(&mut UiLifecycleManager<WgpuBackend>) -> R) -> R {
    OVERLAY.with(|overlay| f(&mut overlay.borrow_mut()))
}

fn report(call: &str, result: Result<(), OverlayError>) {
    match result {
        Ok(()) => {}
        Err(e @ (OverlayError::NotInitialized | OverlayError::AlreadyShutDown)) => {
            log::debug!("{}: {}", call, e)
        }
        Err(e) => log::error!("{}: {}", call, e),
    }
}

/// Create the overlay for the host's device, queue and surface format code
///
/// Format codes: 0 = Rgba8Unorm, 1 = Rgba8UnormSrgb, 2 = Bgra8Unorm,
/// 3 = Bgra8UnormSrgb. Layout persistence stays off until the host picks a
/// directory with [`chain_overlay_set_settings_directory`] or
/// [`chain_overlay_use_default_settings_directory`].
///
/// # Safety
///
/// `device` and `queue` must each be null or point to a live `Arc` for the
/// duration of the call. `Arc<wgpu::Device>` has no stable layout, so the
/// host must be built with the same compiler and the same `wgpu` version as
/// this library.
#[no_mangle]
pub unsafe extern "C" fn chain_overlay_init(
    device: *const Arc<wgpu::Device>,
    queue: *const Arc<wgpu::Queue>,
    format: u32,
) {
    let _ = env_logger::try_init();
    let device = device.as_ref();
    let queue = queue.as_ref();
    let format = texture_format_from_code(format);

    with_overlay(|overlay| report("chain_overlay_init", overlay.initialize(device, queue, format)));
}

/// Start a UI frame; a null `input` is ignored
///
/// # Safety
///
/// `input` must be null or point to a valid [`FrameInput`].
#[no_mangle]
pub unsafe extern "C" fn chain_overlay_begin_frame(input: *const FrameInput) {
    let Some(input) = input.as_ref() else {
        log::debug!("chain_overlay_begin_frame: null input ignored");
        return;
    };
    with_overlay(|overlay| report("chain_overlay_begin_frame", overlay.begin_frame(input)));
}

/// Finish the frame and record its draws into the host's render pass
///
/// # Safety
///
/// `pass` must be null or point to a render pass that stays open for the
/// duration of the call. As with [`chain_overlay_init`], the host must share
/// this library's compiler and `wgpu` version.
#[no_mangle]
pub unsafe extern "C" fn chain_overlay_render(pass: *mut wgpu::RenderPass<'static>) {
    let Some(pass) = pass.as_mut() else {
        log::debug!("chain_overlay_render: null render pass ignored");
        return;
    };
    with_overlay(|overlay| report("chain_overlay_render", overlay.render(pass)));
}

#[no_mangle]
pub extern "C" fn chain_overlay_shutdown() {
    with_overlay(|overlay| report("chain_overlay_shutdown", overlay.shutdown()));
}

#[no_mangle]
pub extern "C" fn chain_overlay_is_available() -> bool {
    with_overlay(|overlay| overlay.is_available())
}

/// Directory for the layout file, as a NUL-terminated UTF-8 path
///
/// # Safety
///
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn chain_overlay_set_settings_directory(path: *const c_char) {
    if path.is_null() {
        log::debug!("chain_overlay_set_settings_directory: null path ignored");
        return;
    }
    let dir = match CStr::from_ptr(path).to_str() {
        Ok(dir) => dir,
        Err(e) => {
            log::error!("chain_overlay_set_settings_directory: path is not UTF-8: {}", e);
            return;
        }
    };

    with_overlay(|overlay| {
        let result = overlay.set_settings_directory(dir).map(|_| ());
        report("chain_overlay_set_settings_directory", result);
    });
}

/// Persist the layout under the platform config directory
/// (`<config dir>/chain-overlay`)
#[no_mangle]
pub extern "C" fn chain_overlay_use_default_settings_directory() {
    let Some(dir) = OverlayConfig::default_settings_dir() else {
        log::warn!("chain_overlay_use_default_settings_directory: no platform config directory");
        return;
    };
    with_overlay(|overlay| {
        let result = overlay.set_settings_directory(dir).map(|_| ());
        report("chain_overlay_use_default_settings_directory", result);
    });
}

#[no_mangle]
pub extern "C" fn chain_overlay_set_visible(visible: bool) {
    with_overlay(|overlay| overlay.set_visible(visible));
}

#[no_mangle]
pub extern "C" fn chain_overlay_toggle_visible() {
    with_overlay(|overlay| overlay.toggle_visible());
}

/// Whether the host should keep pointer input away from its own controls
#[no_mangle]
pub extern "C" fn chain_overlay_wants_pointer() -> bool {
    with_overlay(|overlay| overlay.wants_pointer_capture())
}

/// Whether the host should keep keyboard input away from its own controls
#[no_mangle]
pub extern "C" fn chain_overlay_wants_keyboard() -> bool {
    with_overlay(|overlay| overlay.wants_keyboard_capture())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_null_device_leaves_overlay_unavailable() {
        unsafe {
            chain_overlay_init(ptr::null(), ptr::null(), 0);
        }
        assert!(!chain_overlay_is_available());
        assert!(!chain_overlay_wants_pointer());
        assert!(!chain_overlay_wants_keyboard());
        assert!(with_overlay(|overlay| overlay.settings_path().is_none()));
    }

    #[test]
    fn test_calls_before_init_are_ignored() {
        let input = FrameInput {
            width: 640,
            height: 480,
            ..Default::default()
        };
        let dir = c"/tmp/chain-overlay";

        unsafe {
            chain_overlay_begin_frame(ptr::null());
            chain_overlay_begin_frame(&input);
            chain_overlay_render(ptr::null_mut());
            chain_overlay_set_settings_directory(ptr::null());
            chain_overlay_set_settings_directory(dir.as_ptr());
        }
        chain_overlay_use_default_settings_directory();
        chain_overlay_toggle_visible();
        chain_overlay_set_visible(true);
        chain_overlay_shutdown();

        assert!(!chain_overlay_is_available());
        assert!(!chain_overlay_wants_pointer());
    }
}
