//! Windows backend for Perch: tray icon, overlay window, and mouse monitors.
#![cfg(windows)]

use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use once_cell::sync::OnceCell;
use perch_core::{Backend, Indicator, PerchConfig, VisibilitySignal};
use perch_platform::{InputEvent, Result, ShellSignals, Size};
use tracing::{debug, info};
use tray_icon::menu::MenuId;
use windows::Win32::Foundation::{HINSTANCE, HWND};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;

mod hooks;
mod overlay;
mod tray;

use crate::hooks::{dispatch_local, WinMonitorFactory};
use crate::overlay::{WinDisplays, WinOverlaySurface};
use crate::tray::{create_status_item, route_menu_events, route_tray_events, MenuIds};

/// Roughly one frame at 60 Hz.
const FRAME_MS: u32 = 16;
const CONTENT_STEP: f32 = 50.0;

/// Shell notifications funnelled into the message loop.
pub(crate) enum ShellEvent {
    FocusGained,
    FocusLost,
    TrayPress(InputEvent),
    Menu(MenuId),
}

static SHELL_EVENTS: OnceCell<Sender<ShellEvent>> = OnceCell::new();

pub(crate) fn post(event: ShellEvent) {
    if let Some(sender) = SHELL_EVENTS.get() {
        let _ = sender.send(event);
    }
}

/// Windows has no full-screen menu bar to keep alive; the signals are only logged.
struct WinShellSignals;

impl ShellSignals for WinShellSignals {
    fn begin_tracking(&mut self) {
        debug!("shell: begin tracking");
    }

    fn end_tracking(&mut self) {
        debug!("shell: end tracking");
    }
}

/// Thread timer that keeps `WaitMessage` waking while animations run.
#[derive(Default)]
struct FrameTimer {
    id: Option<usize>,
}

impl FrameTimer {
    fn set_running(&mut self, running: bool) {
        match (running, self.id) {
            (true, None) => {
                let id = unsafe { SetTimer(None, 0, FRAME_MS, None) };
                self.id = (id != 0).then_some(id);
            }
            (false, Some(id)) => {
                let _ = unsafe { KillTimer(None, id) };
                self.id = None;
            }
            _ => {}
        }
    }
}

// Public app entry ----------------
/// Create the tray icon and overlay, then run the Windows message loop.
pub fn run_app(config: &PerchConfig) -> Result<()> {
    let hinstance = unsafe { HINSTANCE(GetModuleHandleW(None)?.0) };
    let (sender, events) = crossbeam_channel::unbounded();
    let _ = SHELL_EVENTS.set(sender);

    let surface = WinOverlaySurface::new(hinstance)?;
    let (status_item, menu, menu_ids) = create_status_item(config, surface.hwnd_value())?;
    info!("tray icon created; wiring event handlers");
    route_tray_events();
    route_menu_events();

    let mut indicator = Indicator::new(
        config,
        Backend {
            surface: Box::new(surface),
            status_item: Box::new(status_item),
            shell: Box::new(WinShellSignals),
            displays: Box::new(WinDisplays),
            monitors: Box::new(WinMonitorFactory::new(hinstance)),
        },
        VisibilitySignal::new(config.visible),
    );
    indicator.set_context_menu(Some(Box::new(menu)));

    let mut state = LoopState {
        indicator,
        content: config.content_size(),
        menu_ids,
        animating: false,
        last_turn: Instant::now(),
    };
    let mut timer = FrameTimer::default();
    let mut message = MSG::default();
    'main: loop {
        unsafe {
            while PeekMessageW(&mut message, HWND(std::ptr::null_mut()), 0, 0, PM_REMOVE).into() {
                if message.message == WM_QUIT {
                    break 'main;
                }
                let _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            }
        }

        settle(&events, &mut state, LoopState::handle, LoopState::pump);
        timer.set_running(state.animating);

        // Efficient wait for the next message. Tray handlers run via callbacks.
        unsafe {
            let _ = WaitMessage();
        }
    }

    // Cleanup
    timer.set_running(false);
    drop(state);
    Ok(())
}

struct LoopState {
    indicator: Indicator,
    content: Size,
    menu_ids: MenuIds,
    animating: bool,
    last_turn: Instant,
}

impl LoopState {
    fn handle(&mut self, event: ShellEvent) {
        match event {
            ShellEvent::FocusGained => self.indicator.focus_gained(),
            ShellEvent::FocusLost => self.indicator.focus_lost(),
            ShellEvent::TrayPress(press) => {
                // Nothing else in the process handles tray presses by default.
                let _ = dispatch_local(press);
            }
            ShellEvent::Menu(id) => {
                handle_menu(&id, &self.menu_ids, &mut self.indicator, &mut self.content)
            }
        }
    }

    fn pump(&mut self) {
        // Idle time must not count towards an animation that starts this turn.
        let now = Instant::now();
        let dt = if self.animating {
            (now - self.last_turn).as_secs_f32()
        } else {
            0.0
        };
        self.last_turn = now;
        self.indicator.pump(dt);
        self.animating = self.indicator.is_animating();
    }
}

/// Handles queued shell events, then pumps, until a pass leaves the channel dry.
///
/// Pumping can post more events: activation is sent synchronously while the overlay
/// is ordered front, and nothing else would wake the loop for it.
fn settle<S>(
    events: &Receiver<ShellEvent>,
    state: &mut S,
    handle: impl Fn(&mut S, ShellEvent),
    pump: impl Fn(&mut S),
) {
    loop {
        for event in events.try_iter() {
            handle(state, event);
        }
        pump(state);
        if events.is_empty() {
            break;
        }
    }
}

fn handle_menu(id: &MenuId, ids: &MenuIds, indicator: &mut Indicator, content: &mut Size) {
    if id == &ids.open {
        indicator.show();
    } else if id == &ids.grow {
        content.height += CONTENT_STEP;
        indicator.content_size_changed(*content);
    } else if id == &ids.shrink {
        content.height = (content.height - CONTENT_STEP).max(CONTENT_STEP);
        indicator.content_size_changed(*content);
    } else if id == &ids.exit {
        unsafe { PostQuitMessage(0) };
    }
}

#[inline]
pub(crate) fn box_err<E: std::error::Error + Send + Sync + 'static>(
    e: E,
) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_posted_while_pumping_are_handled_before_waiting() {
        let (sender, events) = crossbeam_channel::unbounded();
        sender.send(ShellEvent::FocusLost).unwrap();
        let mut seen: Vec<&'static str> = Vec::new();
        let mut pumps = 0;
        let mut state = (&mut seen, &mut pumps, sender);

        settle(
            &events,
            &mut state,
            |(seen, _, _), event| {
                seen.push(match event {
                    ShellEvent::FocusGained => "gained",
                    ShellEvent::FocusLost => "lost",
                    _ => "other",
                })
            },
            |(_, pumps, sender)| {
                **pumps += 1;
                if **pumps == 1 {
                    // Ordering the overlay front activates it synchronously.
                    sender.send(ShellEvent::FocusGained).unwrap();
                }
            },
        );

        assert_eq!(seen, vec!["lost", "gained"]);
        assert_eq!(pumps, 2);
        assert!(events.is_empty());
    }
}
