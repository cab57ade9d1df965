//! Event monitors: tray presses for the local scope, a low-level mouse hook for the global one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use perch_platform::{
    EventHandler, EventKind, EventMask, EventMonitor, EventTarget, InputEvent, Modifiers,
    MonitorFactory, MonitorScope, MouseButton, Result,
};
use tracing::{debug, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::overlay::shell_point;

struct Registration {
    id: u64,
    scope: MonitorScope,
    mask: EventMask,
    handler: EventHandler,
    running: bool,
}

static REGISTRY: Lazy<Mutex<Vec<Registration>>> = Lazy::new(|| Mutex::new(Vec::new()));
static MOUSE_HOOK: Mutex<Option<isize>> = Mutex::new(None);
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Runs the running local monitors over `event`. `None` means a monitor swallowed it.
pub(crate) fn dispatch_local(event: InputEvent) -> Option<InputEvent> {
    let Ok(mut registry) = REGISTRY.lock() else {
        return Some(event);
    };
    let mut current = event;
    for registration in registry
        .iter_mut()
        .filter(|r| r.running && r.scope == MonitorScope::Local && r.mask.matches(&event))
    {
        current = (registration.handler)(current)?;
    }
    Some(current)
}

fn dispatch_global(event: InputEvent) {
    let Ok(mut registry) = REGISTRY.lock() else {
        return;
    };
    for registration in registry
        .iter_mut()
        .filter(|r| r.running && r.scope == MonitorScope::Global && r.mask.matches(&event))
    {
        let _ = (registration.handler)(event);
    }
}

pub(crate) fn current_modifiers() -> Modifiers {
    fn held(key: VIRTUAL_KEY) -> bool {
        unsafe { GetKeyState(key.0 as i32) < 0 }
    }
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, held(VK_SHIFT));
    modifiers.set(Modifiers::CONTROL, held(VK_CONTROL));
    modifiers.set(Modifiers::ALT, held(VK_MENU));
    modifiers.set(Modifiers::META, held(VK_LWIN) || held(VK_RWIN));
    modifiers
}

unsafe extern "system" fn low_level_mouse_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code == HC_ACTION as i32 {
        let kind = match wparam.0 as u32 {
            WM_LBUTTONDOWN => Some(EventKind::ButtonDown(MouseButton::Primary)),
            WM_RBUTTONDOWN => Some(EventKind::ButtonDown(MouseButton::Secondary)),
            WM_MBUTTONDOWN | WM_XBUTTONDOWN => Some(EventKind::ButtonDown(MouseButton::Other)),
            _ => None,
        };
        if let Some(kind) = kind {
            let info = &*(lparam.0 as *const MSLLHOOKSTRUCT);
            dispatch_global(InputEvent {
                kind,
                target: EventTarget::Elsewhere,
                modifiers: current_modifiers(),
                location: Some(shell_point(info.pt.x, info.pt.y)),
            });
        }
    }
    CallNextHookEx(HHOOK::default(), code, wparam, lparam)
}

fn any_global_running(registry: &[Registration]) -> bool {
    registry
        .iter()
        .any(|r| r.running && r.scope == MonitorScope::Global)
}

fn install_mouse_hook(hinstance_value: isize) -> Result<()> {
    let mut hook = MOUSE_HOOK.lock().map_err(|_| "mouse hook lock poisoned")?;
    if hook.is_some() {
        return Ok(());
    }
    let hinstance = HINSTANCE(hinstance_value as *mut core::ffi::c_void);
    let handle =
        unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(low_level_mouse_proc), hinstance, 0)? };
    *hook = Some(handle.0 as isize);
    debug!("low-level mouse hook installed");
    Ok(())
}

fn remove_mouse_hook() {
    let Ok(mut hook) = MOUSE_HOOK.lock() else {
        return;
    };
    if let Some(handle) = hook.take() {
        let handle = HHOOK(handle as *mut core::ffi::c_void);
        if let Err(err) = unsafe { UnhookWindowsHookEx(handle) } {
            warn!("UnhookWindowsHookEx failed: {err}");
        }
        debug!("low-level mouse hook removed");
    }
}

pub struct WinEventMonitor {
    id: u64,
    scope: MonitorScope,
    hinstance_value: isize,
}

impl WinEventMonitor {
    fn set_running(&mut self, running: bool) -> bool {
        let Ok(mut registry) = REGISTRY.lock() else {
            return false;
        };
        let Some(registration) = registry.iter_mut().find(|r| r.id == self.id) else {
            return false;
        };
        if registration.running == running {
            return false;
        }
        registration.running = running;
        true
    }

    fn global_still_needed() -> bool {
        REGISTRY
            .lock()
            .map(|registry| any_global_running(&registry))
            .unwrap_or(false)
    }
}

impl EventMonitor for WinEventMonitor {
    fn start(&mut self) -> Result<()> {
        if !self.set_running(true) {
            return Ok(());
        }
        if self.scope == MonitorScope::Global {
            if let Err(err) = install_mouse_hook(self.hinstance_value) {
                self.set_running(false);
                return Err(err);
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.set_running(false)
            && self.scope == MonitorScope::Global
            && !Self::global_still_needed()
        {
            remove_mouse_hook();
        }
    }

    fn is_running(&self) -> bool {
        REGISTRY
            .lock()
            .map(|registry| registry.iter().any(|r| r.id == self.id && r.running))
            .unwrap_or(false)
    }
}

impl Drop for WinEventMonitor {
    fn drop(&mut self) {
        self.stop();
        if let Ok(mut registry) = REGISTRY.lock() {
            registry.retain(|r| r.id != self.id);
        }
    }
}

pub struct WinMonitorFactory {
    hinstance_value: isize,
}

impl WinMonitorFactory {
    pub fn new(hinstance: HINSTANCE) -> Self {
        Self {
            hinstance_value: hinstance.0 as isize,
        }
    }
}

impl MonitorFactory for WinMonitorFactory {
    fn create(
        &mut self,
        scope: MonitorScope,
        mask: EventMask,
        handler: EventHandler,
    ) -> Box<dyn EventMonitor> {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut registry) = REGISTRY.lock() {
            registry.push(Registration {
                id,
                scope,
                mask,
                handler,
                running: false,
            });
        }
        Box::new(WinEventMonitor {
            id,
            scope,
            hinstance_value: self.hinstance_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    // The registry is process-wide; tests touching it take turns.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn factory() -> WinMonitorFactory {
        WinMonitorFactory::new(HINSTANCE::default())
    }

    fn registered() -> usize {
        REGISTRY.lock().map(|registry| registry.len()).unwrap_or(0)
    }

    fn counting(hits: &Arc<AtomicUsize>, swallow: bool) -> EventHandler {
        let hits = Arc::clone(hits);
        Box::new(move |event: InputEvent| {
            hits.fetch_add(1, Ordering::SeqCst);
            (!swallow).then_some(event)
        })
    }

    fn press(button: MouseButton) -> InputEvent {
        InputEvent::press(button, EventTarget::Indicator)
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let hits = Arc::new(AtomicUsize::new(0));
        let mut monitor = factory().create(
            MonitorScope::Local,
            EventMask::PRIMARY_DOWN,
            counting(&hits, false),
        );
        assert!(!monitor.is_running());

        monitor.start().unwrap();
        monitor.start().unwrap();
        assert!(monitor.is_running());
        dispatch_local(press(MouseButton::Primary));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_running());
        dispatch_local(press(MouseButton::Primary));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_a_monitor_deregisters_it() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let hits = Arc::new(AtomicUsize::new(0));
        let before = registered();
        let mut monitor = factory().create(
            MonitorScope::Local,
            EventMask::PRIMARY_DOWN,
            counting(&hits, false),
        );
        monitor.start().unwrap();
        assert_eq!(registered(), before + 1);

        drop(monitor);
        assert_eq!(registered(), before);
        dispatch_local(press(MouseButton::Primary));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_swallowing_handler_ends_dispatch() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let (first, second) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
        let mut factory = factory();
        let mut swallowing = factory.create(
            MonitorScope::Local,
            EventMask::PRIMARY_DOWN,
            counting(&first, true),
        );
        let mut observing = factory.create(
            MonitorScope::Local,
            EventMask::PRIMARY_DOWN,
            counting(&second, false),
        );
        swallowing.start().unwrap();
        observing.start().unwrap();

        assert_eq!(dispatch_local(press(MouseButton::Primary)), None);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        swallowing.stop();
        let event = press(MouseButton::Primary);
        assert_eq!(dispatch_local(event), Some(event));
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mask_filters_unwanted_buttons() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let hits = Arc::new(AtomicUsize::new(0));
        let mut monitor = factory().create(
            MonitorScope::Local,
            EventMask::PRIMARY_DOWN,
            counting(&hits, true),
        );
        monitor.start().unwrap();

        let secondary = press(MouseButton::Secondary);
        assert_eq!(dispatch_local(secondary), Some(secondary));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(dispatch_local(press(MouseButton::Primary)), None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
