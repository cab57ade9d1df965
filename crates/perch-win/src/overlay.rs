use perch_platform::{Displays, OverlaySurface, Rect, Result, Screen, Vec2};
use tracing::{debug, info, warn};

use std::ffi::c_void;
use std::mem::size_of;

use windows::core::{Error, PCWSTR};
use windows::Win32::Foundation::{BOOL, COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, GetSysColorBrush, COLOR_WINDOW, HDC, HMONITOR,
    MONITORINFO,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::{post, ShellEvent};

pub const OVERLAY_WINDOW_CLASS_NAME: PCWSTR = windows::core::w!("PerchOverlayClass");

const MONITORINFOF_PRIMARY: u32 = 1;

pub(crate) fn primary_height() -> i32 {
    unsafe { GetSystemMetrics(SM_CYSCREEN) }
}

/// Native y-down point to shell y-up coordinates.
pub(crate) fn shell_point(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32, (primary_height() - y) as f32)
}

pub(crate) fn shell_rect(rect: &RECT) -> Rect {
    let height = rect.bottom - rect.top;
    Rect::new(
        rect.left as f32,
        (primary_height() - rect.bottom) as f32,
        (rect.right - rect.left) as f32,
        height as f32,
    )
}

/// Native top-left corner and size of a shell-space frame.
pub(crate) fn native_frame(frame: Rect) -> (i32, i32, i32, i32) {
    (
        frame.min_x().round() as i32,
        (primary_height() as f32 - frame.max_y()).round() as i32,
        frame.size.width.round() as i32,
        frame.size.height.round() as i32,
    )
}

unsafe fn register_overlay_window_class(hinstance: HINSTANCE) -> PCWSTR {
    let window_class = WNDCLASSW {
        style: CS_HREDRAW | CS_VREDRAW | CS_DROPSHADOW,
        lpfnWndProc: Some(handle_overlay_window_message),
        hInstance: hinstance,
        hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
        hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
        hbrBackground: GetSysColorBrush(COLOR_WINDOW),
        lpszClassName: OVERLAY_WINDOW_CLASS_NAME,
        ..Default::default()
    };
    let _atom = RegisterClassW(&window_class);
    OVERLAY_WINDOW_CLASS_NAME
}

/// Borderless layered popup hosting the overlay.
pub struct WinOverlaySurface {
    hwnd_value: isize,
}

impl WinOverlaySurface {
    pub fn new(hinstance: HINSTANCE) -> Result<Self> {
        let hwnd = unsafe {
            let class_name = register_overlay_window_class(hinstance);
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE(WS_EX_LAYERED.0 | WS_EX_TOPMOST.0 | WS_EX_TOOLWINDOW.0),
                class_name,
                windows::core::w!("Perch"),
                WS_POPUP,
                0,
                0,
                1,
                1,
                None,
                None,
                hinstance,
                None,
            )?;
            SetLayeredWindowAttributes(hwnd, COLORREF(0), 255, LWA_ALPHA)?;
            hwnd
        };
        info!("overlay window created");
        Ok(Self {
            hwnd_value: hwnd.0 as isize,
        })
    }

    pub fn hwnd_value(&self) -> isize {
        self.hwnd_value
    }

    fn hwnd(&self) -> HWND {
        HWND(self.hwnd_value as *mut c_void)
    }
}

impl OverlaySurface for WinOverlaySurface {
    fn set_frame(&mut self, frame: Rect) {
        let (x, y, width, height) = native_frame(frame);
        let flags = SWP_NOACTIVATE;
        if let Err(err) =
            unsafe { SetWindowPos(self.hwnd(), HWND_TOPMOST, x, y, width, height, flags) }
        {
            warn!("SetWindowPos failed for overlay: {err}");
        }
    }

    fn set_alpha(&mut self, alpha: f32) {
        let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        if let Err(err) =
            unsafe { SetLayeredWindowAttributes(self.hwnd(), COLORREF(0), alpha, LWA_ALPHA) }
        {
            warn!("SetLayeredWindowAttributes failed for overlay: {err}");
        }
    }

    fn order_front(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd(), SW_SHOW);
            let _ = SetForegroundWindow(self.hwnd());
        }
    }

    fn order_out(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd(), SW_HIDE);
        }
    }
}

impl Drop for WinOverlaySurface {
    fn drop(&mut self) {
        if let Err(err) = unsafe { DestroyWindow(self.hwnd()) } {
            warn!("DestroyWindow failed for overlay: {err}");
        }
    }
}

pub unsafe extern "system" fn handle_overlay_window_message(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_ACTIVATE => {
            if (wparam.0 & 0xFFFF) as u32 == WA_INACTIVE {
                post(ShellEvent::FocusLost);
            } else {
                post(ShellEvent::FocusGained);
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        // Closing only hides; the indicator owns the window.
        WM_CLOSE => {
            post(ShellEvent::FocusLost);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Display layout read from the monitor list on every query.
pub struct WinDisplays;

impl WinDisplays {
    fn enumerate_monitors() -> Result<Vec<(bool, Screen)>> {
        unsafe extern "system" fn enum_proc(
            hmonitor: HMONITOR,
            _hdc: HDC,
            _lprc: *mut RECT,
            lparam: LPARAM,
        ) -> BOOL {
            let data_ptr = lparam.0 as *mut Vec<(bool, Screen)>;
            if data_ptr.is_null() {
                return BOOL(0);
            }
            let data = &mut *data_ptr;
            let mut info = MONITORINFO {
                cbSize: size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if !GetMonitorInfoW(hmonitor, &mut info).as_bool() {
                return BOOL(1);
            }
            data.push((
                info.dwFlags & MONITORINFOF_PRIMARY != 0,
                Screen {
                    frame: shell_rect(&info.rcMonitor),
                    visible: shell_rect(&info.rcWork),
                },
            ));
            BOOL(1)
        }

        let mut monitors: Vec<(bool, Screen)> = Vec::new();
        let lparam = LPARAM(&mut monitors as *mut _ as isize);
        unsafe {
            let result = EnumDisplayMonitors(None, None, Some(enum_proc), lparam);
            if result == BOOL(0) {
                return Err(Error::from_win32().into());
            }
        }
        Ok(monitors)
    }
}

impl Displays for WinDisplays {
    fn screen_for(&self, anchor: Option<Rect>) -> Option<Screen> {
        let monitors = match Self::enumerate_monitors() {
            Ok(monitors) => monitors,
            Err(err) => {
                warn!("failed to enumerate displays: {err}");
                return None;
            }
        };
        let holding_anchor = anchor.and_then(|anchor| {
            monitors
                .iter()
                .find(|(_, screen)| screen.frame.contains(anchor.center()))
        });
        let chosen = holding_anchor
            .or_else(|| monitors.iter().find(|(primary, _)| *primary))
            .or_else(|| monitors.first())
            .map(|(_, screen)| *screen);
        debug!(?anchor, screen = ?chosen, "display lookup");
        chosen
    }
}
