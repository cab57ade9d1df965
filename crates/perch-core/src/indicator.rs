//! The status indicator and the overlay it owns.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use perch_platform::{
    ContextMenu, Displays, EventKind, EventMask, EventMonitor, EventTarget, InputEvent,
    MonitorFactory, MonitorScope, MouseButton, OverlaySurface, Rect, Screen, ShellSignals, Size,
    StatusItem, Vec2,
};
use tracing::{debug, info, warn};

use crate::config::PerchConfig;
use crate::lifecycle::{LifecycleController, PanelState, Transition, Trigger};
use crate::overlay::AnchoredOverlay;
use crate::position::{resolve, Alignment, ClippingPolicy};
use crate::signal::{Subscription, VisibilitySignal};

/// What a button press on the indicator should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAction {
    Toggle,
    ContextMenu,
    PassThrough,
}

/// Decision table for presses on the indicator, evaluated top to bottom.
pub fn classify_press(event: &InputEvent, has_menu: bool) -> LocalAction {
    let modified = !event.modifiers.is_empty();
    match (event.kind, has_menu, modified) {
        (EventKind::ButtonDown(MouseButton::Primary), _, false) => LocalAction::Toggle,
        (EventKind::ButtonDown(MouseButton::Secondary), true, _) => LocalAction::ContextMenu,
        (EventKind::ButtonDown(MouseButton::Primary), true, true) => LocalAction::ContextMenu,
        _ => LocalAction::PassThrough,
    }
}

#[derive(Debug)]
enum MonitorMessage {
    Local(LocalAction, Option<Vec2>),
    Outside(InputEvent),
}

/// Platform collaborators the indicator drives.
pub struct Backend {
    pub surface: Box<dyn OverlaySurface>,
    pub status_item: Box<dyn StatusItem>,
    pub shell: Box<dyn ShellSignals>,
    pub displays: Box<dyn Displays>,
    pub monitors: Box<dyn MonitorFactory>,
}

pub struct Indicator {
    alignment: Alignment,
    clipping: ClippingPolicy,
    fade_seconds: f32,
    lifecycle: LifecycleController,
    overlay: AnchoredOverlay,
    status_item: Rc<RefCell<Box<dyn StatusItem>>>,
    shell: Box<dyn ShellSignals>,
    displays: Box<dyn Displays>,
    menu: Option<Box<dyn ContextMenu>>,
    has_menu: Arc<AtomicBool>,
    local_monitor: Box<dyn EventMonitor>,
    global_monitor: Box<dyn EventMonitor>,
    mailbox: Receiver<MonitorMessage>,
    visibility: VisibilitySignal,
    _visibility_subscription: Subscription,
    /// The overlay holds keyboard focus, as last reported by the host.
    focused: bool,
    /// Set while a transition's side effects run; triggers raised meanwhile are queued.
    transitioning: bool,
    queued: VecDeque<Trigger>,
}

impl Indicator {
    pub fn new(config: &PerchConfig, backend: Backend, visibility: VisibilitySignal) -> Self {
        let Backend {
            surface,
            status_item,
            shell,
            displays,
            mut monitors,
        } = backend;

        let (sender, mailbox) = crossbeam_channel::unbounded();
        let has_menu = Arc::new(AtomicBool::new(false));

        let local_monitor = monitors.create(
            MonitorScope::Local,
            EventMask::PRIMARY_DOWN | EventMask::SECONDARY_DOWN,
            local_handler(sender.clone(), Arc::clone(&has_menu)),
        );
        let global_monitor = monitors.create(
            MonitorScope::Global,
            EventMask::BUTTON_DOWN,
            global_handler(sender),
        );

        let status_item = Rc::new(RefCell::new(status_item));
        status_item.borrow_mut().set_title(&config.title);
        status_item.borrow_mut().set_visible(visibility.get());
        let subscribed_item = Rc::clone(&status_item);
        let subscription = visibility.subscribe(move |visible| {
            subscribed_item.borrow_mut().set_visible(visible);
        });

        let mut indicator = Self {
            alignment: config.alignment,
            clipping: config.clipping,
            fade_seconds: config.fade_seconds,
            lifecycle: LifecycleController::default(),
            overlay: AnchoredOverlay::new(surface, config.content_size(), config.resize_seconds),
            status_item,
            shell,
            displays,
            menu: None,
            has_menu,
            local_monitor,
            global_monitor,
            mailbox,
            visibility,
            _visibility_subscription: subscription,
            focused: false,
            transitioning: false,
            queued: VecDeque::new(),
        };
        if let Err(err) = indicator.local_monitor.start() {
            warn!("failed to start local click monitor: {err}");
        }
        indicator
    }

    pub fn state(&self) -> PanelState {
        self.lifecycle.state()
    }

    pub fn is_visible(&self) -> bool {
        self.state() == PanelState::Visible
    }

    /// Authoritative overlay frame.
    pub fn frame(&self) -> Rect {
        self.overlay.frame()
    }

    pub fn overlay(&self) -> &AnchoredOverlay {
        &self.overlay
    }

    pub fn visibility(&self) -> &VisibilitySignal {
        &self.visibility
    }

    /// Whether the host loop should keep pumping at frame rate.
    pub fn is_animating(&self) -> bool {
        self.overlay.is_animating()
    }

    pub fn show(&mut self) {
        self.fire(Trigger::Show);
    }

    pub fn dismiss(&mut self) {
        self.fire(Trigger::Dismiss);
    }

    pub fn toggle(&mut self) {
        self.fire(Trigger::Toggle);
    }

    pub fn focus_gained(&mut self) {
        self.focused = true;
        self.fire(Trigger::FocusGained);
    }

    pub fn focus_lost(&mut self) {
        self.focused = false;
        self.fire(Trigger::FocusLost);
    }

    /// Host content changed its intrinsic size. Applied on the next [`Self::pump`].
    pub fn content_size_changed(&mut self, size: Size) {
        self.overlay.content_size_changed(size);
    }

    pub fn set_title(&mut self, title: &str) {
        self.status_item.borrow_mut().set_title(title);
    }

    pub fn set_context_menu(&mut self, menu: Option<Box<dyn ContextMenu>>) {
        self.has_menu.store(menu.is_some(), Ordering::Relaxed);
        self.menu = menu;
    }

    /// The user removed the icon from the shell.
    pub fn status_item_removed(&mut self) {
        if self.visibility.set(false) {
            info!("indicator removed by the user");
        }
    }

    /// One loop turn: monitor messages, deferred resizes, then animations.
    pub fn pump(&mut self, dt: f32) {
        while let Ok(message) = self.mailbox.try_recv() {
            self.handle_message(message);
        }

        if self.overlay.has_pending_size() {
            let anchor = self.anchor_rect();
            let screen = self.displays.screen_for(anchor);
            self.overlay.apply_pending(screen.as_ref().map(|s| &s.visible));
        }

        if self.overlay.advance(dt).fade_finished {
            self.fire(Trigger::FadeFinished);
        }
    }

    fn handle_message(&mut self, message: MonitorMessage) {
        match message {
            MonitorMessage::Local(LocalAction::Toggle, _) => self.fire(Trigger::Toggle),
            MonitorMessage::Local(LocalAction::ContextMenu, location) => {
                self.pop_up_menu(location)
            }
            MonitorMessage::Local(LocalAction::PassThrough, _) => {}
            MonitorMessage::Outside(event) => {
                if self.state() != PanelState::Visible || self.hits_own_surfaces(&event) {
                    return;
                }
                self.fire(Trigger::OutsideClick);
            }
        }
    }

    fn hits_own_surfaces(&self, event: &InputEvent) -> bool {
        let Some(location) = event.location else {
            return false;
        };
        self.overlay.presented_frame().contains(location)
            || self.anchor_rect().is_some_and(|anchor| anchor.contains(location))
    }

    fn pop_up_menu(&mut self, location: Option<Vec2>) {
        let at = self
            .anchor_rect()
            .map(|anchor| Vec2::new(anchor.min_x(), anchor.min_y()))
            .or(location)
            .unwrap_or(Vec2::ZERO);
        if let Some(menu) = self.menu.as_mut() {
            menu.pop_up(at);
        }
    }

    fn anchor_rect(&self) -> Option<Rect> {
        self.status_item.borrow().anchor_rect()
    }

    fn fire(&mut self, trigger: Trigger) {
        if self.transitioning {
            self.queued.push_back(trigger);
            return;
        }
        self.transitioning = true;
        let mut next = Some(trigger);
        while let Some(trigger) = next {
            match self.lifecycle.fire(trigger) {
                Some(transition) => self.run(transition),
                None => debug!(?trigger, state = %self.state(), "trigger ignored"),
            }
            next = self.queued.pop_front();
        }
        self.transitioning = false;
    }

    fn run(&mut self, transition: Transition) {
        info!("overlay {} -> {}", transition.from, transition.to);
        match transition.to {
            PanelState::Appearing => {
                self.appear(transition.from);
                // Ordering front an overlay that never lost focus raises no new focus event.
                if self.focused {
                    self.fire(Trigger::FocusGained);
                }
            }
            PanelState::Visible => {
                if let Err(err) = self.global_monitor.start() {
                    warn!("failed to start outside-click monitor: {err}");
                }
                self.status_item.borrow_mut().set_highlighted(true);
            }
            PanelState::Dismissing => {
                self.global_monitor.stop();
                self.shell.end_tracking();
                self.overlay.fade_out(self.fade_seconds);
            }
            PanelState::Hidden => {
                self.overlay.order_out();
                self.focused = false;
                self.status_item.borrow_mut().set_highlighted(false);
            }
        }
    }

    fn appear(&mut self, from: PanelState) {
        if from == PanelState::Dismissing {
            self.overlay.cancel_fade();
        }
        let anchor = self.anchor_rect();
        let screen: Option<Screen> = self.displays.screen_for(anchor);
        // Apply any size reported while hidden before resolving.
        self.overlay.apply_pending(screen.as_ref().map(|s| &s.visible));
        let resolved = resolve(
            anchor,
            self.overlay.content_size(),
            self.alignment,
            self.clipping,
            screen.as_ref(),
        );
        debug!(?anchor, frame = ?resolved.frame, "overlay placement");
        self.overlay.place(resolved);
        self.overlay.order_front();
        self.shell.begin_tracking();
    }
}

impl Drop for Indicator {
    fn drop(&mut self) {
        self.global_monitor.stop();
        self.local_monitor.stop();
    }
}

fn local_handler(
    sender: Sender<MonitorMessage>,
    has_menu: Arc<AtomicBool>,
) -> perch_platform::EventHandler {
    Box::new(move |event: InputEvent| {
        if event.target != EventTarget::Indicator {
            return Some(event);
        }
        match classify_press(&event, has_menu.load(Ordering::Relaxed)) {
            LocalAction::PassThrough => Some(event),
            action => {
                let _ = sender.send(MonitorMessage::Local(action, event.location));
                None
            }
        }
    })
}

fn global_handler(sender: Sender<MonitorMessage>) -> perch_platform::EventHandler {
    Box::new(move |event: InputEvent| {
        if event.is_press() {
            let _ = sender.send(MonitorMessage::Outside(event));
        }
        Some(event)
    })
}
