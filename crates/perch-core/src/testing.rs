//! Recording fakes of the platform traits.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use perch_platform::{
    ContextMenu, Displays, EventHandler, EventMask, EventMonitor, InputEvent, MonitorFactory,
    MonitorScope, OverlaySurface, Rect, Result, Screen, ShellSignals, StatusItem, Vec2,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetFrame(Rect),
    SetAlpha(f32),
    OrderFront,
    OrderOut,
    Highlight(bool),
    Visible(bool),
    Title(String),
    Menu(Vec2),
    BeginTracking,
    EndTracking,
    MonitorStart(MonitorScope),
    MonitorStop(MonitorScope),
}

#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Call>>>);

impl Recorder {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn frames(&self) -> Vec<Rect> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::SetFrame(frame) => Some(*frame),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.0.borrow().iter().filter(|call| *call == wanted).count()
    }
}

pub struct FakeSurface(Recorder);

impl FakeSurface {
    pub fn new(recorder: &Recorder) -> Self {
        Self(recorder.clone())
    }
}

impl OverlaySurface for FakeSurface {
    fn set_frame(&mut self, frame: Rect) {
        self.0.push(Call::SetFrame(frame));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.0.push(Call::SetAlpha(alpha));
    }

    fn order_front(&mut self) {
        self.0.push(Call::OrderFront);
    }

    fn order_out(&mut self) {
        self.0.push(Call::OrderOut);
    }
}

pub struct FakeStatusItem {
    recorder: Recorder,
    anchor: Rc<Cell<Option<Rect>>>,
}

impl FakeStatusItem {
    pub fn new(recorder: &Recorder, anchor: Rc<Cell<Option<Rect>>>) -> Self {
        Self {
            recorder: recorder.clone(),
            anchor,
        }
    }
}

impl StatusItem for FakeStatusItem {
    fn anchor_rect(&self) -> Option<Rect> {
        self.anchor.get()
    }

    fn set_highlighted(&mut self, highlighted: bool) {
        self.recorder.push(Call::Highlight(highlighted));
    }

    fn set_visible(&mut self, visible: bool) {
        self.recorder.push(Call::Visible(visible));
    }

    fn set_title(&mut self, title: &str) {
        self.recorder.push(Call::Title(title.to_owned()));
    }
}

pub struct FakeMenu(pub Recorder);

impl ContextMenu for FakeMenu {
    fn pop_up(&mut self, at: Vec2) {
        self.0.push(Call::Menu(at));
    }
}

pub struct FakeShell(pub Recorder);

impl ShellSignals for FakeShell {
    fn begin_tracking(&mut self) {
        self.0.push(Call::BeginTracking);
    }

    fn end_tracking(&mut self) {
        self.0.push(Call::EndTracking);
    }
}

pub struct FakeDisplays {
    screen: Option<Screen>,
    pub queries: Rc<Cell<usize>>,
}

impl FakeDisplays {
    pub fn new(screen: Option<Screen>) -> Self {
        Self {
            screen,
            queries: Rc::default(),
        }
    }
}

impl Displays for FakeDisplays {
    fn screen_for(&self, _anchor: Option<Rect>) -> Option<Screen> {
        self.queries.set(self.queries.get() + 1);
        self.screen
    }
}

/// Handle kept by the test to drive a monitor the indicator owns.
#[derive(Clone)]
pub struct MonitorHandle {
    pub scope: MonitorScope,
    pub mask: EventMask,
    handler: Rc<RefCell<EventHandler>>,
    running: Rc<Cell<bool>>,
}

impl MonitorHandle {
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Delivers `event` the way a backend would: only while running and only if masked in.
    pub fn deliver(&self, event: InputEvent) -> Option<InputEvent> {
        if !self.running.get() || !self.mask.matches(&event) {
            return Some(event);
        }
        let mut handler = self.handler.borrow_mut();
        (&mut **handler)(event)
    }
}

struct FakeMonitor {
    handle: MonitorHandle,
    recorder: Recorder,
}

impl EventMonitor for FakeMonitor {
    fn start(&mut self) -> Result<()> {
        if !self.handle.running.replace(true) {
            self.recorder.push(Call::MonitorStart(self.handle.scope));
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.handle.running.replace(false) {
            self.recorder.push(Call::MonitorStop(self.handle.scope));
        }
    }

    fn is_running(&self) -> bool {
        self.handle.running.get()
    }
}

impl Drop for FakeMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct FakeMonitors {
    recorder: Recorder,
    pub handles: Rc<RefCell<Vec<MonitorHandle>>>,
}

impl FakeMonitors {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
            handles: Rc::default(),
        }
    }
}

impl MonitorFactory for FakeMonitors {
    fn create(
        &mut self,
        scope: MonitorScope,
        mask: EventMask,
        handler: EventHandler,
    ) -> Box<dyn EventMonitor> {
        let handle = MonitorHandle {
            scope,
            mask,
            handler: Rc::new(RefCell::new(handler)),
            running: Rc::new(Cell::new(false)),
        };
        self.handles.borrow_mut().push(handle.clone());
        Box::new(FakeMonitor {
            handle,
            recorder: self.recorder.clone(),
        })
    }
}
