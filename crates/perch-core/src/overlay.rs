//! The floating panel: content-size tracking, resize and fade animations.

use perch_platform::{OverlaySurface, Rect, Size, Vec2};
use tracing::debug;

use crate::animation::{Animation, Easing};
use crate::position::{hug_edge_x, overflows_right, Placement, Resolved};

/// Result of advancing the overlay's animations by one loop turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    pub resize_committed: bool,
    pub fade_finished: bool,
}

pub struct AnchoredOverlay {
    surface: Box<dyn OverlaySurface>,
    /// Authoritative frame. Lags behind an in-flight resize until it commits.
    frame: Rect,
    content_size: Size,
    placement: Placement,
    on_screen: bool,
    alpha: f32,
    pending_size: Option<Size>,
    resize: Option<Animation<Rect>>,
    fade: Option<Animation<f32>>,
    resize_seconds: f32,
}

impl AnchoredOverlay {
    pub fn new(surface: Box<dyn OverlaySurface>, content_size: Size, resize_seconds: f32) -> Self {
        Self {
            surface,
            frame: Rect::from_origin_size(Vec2::ZERO, content_size),
            content_size,
            placement: Placement::Below,
            on_screen: false,
            alpha: 1.0,
            pending_size: None,
            resize: None,
            fade: None,
            resize_seconds,
        }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Frame currently shown on screen, mid-animation included.
    pub fn presented_frame(&self) -> Rect {
        self.resize.map_or(self.frame, |resize| resize.value())
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_on_screen(&self) -> bool {
        self.on_screen
    }

    /// A size reported since the last [`Self::apply_pending`].
    pub fn has_pending_size(&self) -> bool {
        self.pending_size.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.resize.is_some() || self.fade.is_some() || self.pending_size.is_some()
    }

    /// First placement: jumps straight to the frame.
    pub fn place(&mut self, resolved: Resolved) {
        self.frame = resolved.frame;
        self.placement = resolved.placement;
        self.content_size = resolved.frame.size;
        self.resize = None;
        self.surface.set_frame(self.frame);
    }

    pub fn order_front(&mut self) {
        self.set_alpha(1.0);
        self.surface.order_front();
        self.on_screen = true;
    }

    /// Takes the panel off screen and restores full opacity for the next appearance.
    pub fn order_out(&mut self) {
        self.fade = None;
        if let Some(resize) = self.resize.take() {
            self.frame = resize.target();
        }
        self.surface.order_out();
        self.on_screen = false;
        self.set_alpha(1.0);
    }

    pub fn fade_out(&mut self, seconds: f32) {
        self.fade = Some(Animation::new(self.alpha, 0.0, seconds, Easing::EaseInOut));
    }

    pub fn cancel_fade(&mut self) {
        if self.fade.take().is_some() {
            self.set_alpha(1.0);
        }
    }

    /// Content reported a new intrinsic size. Work is deferred to [`Self::apply_pending`].
    pub fn content_size_changed(&mut self, size: Size) {
        let latest = self.pending_size.unwrap_or_else(|| self.settled_size());
        if latest == size {
            return;
        }
        self.pending_size = Some(size);
    }

    /// Applies the most recent size request. `visible` is the screen's visible area.
    pub fn apply_pending(&mut self, visible: Option<&Rect>) {
        let Some(size) = self.pending_size.take() else {
            return;
        };
        let settled = self.settled_frame();
        let target = resized_frame(settled, size, self.placement, visible);
        self.content_size = size;

        if !self.on_screen {
            self.frame = target;
            return;
        }
        if target == settled {
            return;
        }
        debug!(?settled, ?target, "overlay resize");
        self.resize = Some(Animation::new(
            self.presented_frame(),
            target,
            self.resize_seconds,
            Easing::EaseInOut,
        ));
    }

    pub fn advance(&mut self, dt: f32) -> Tick {
        let mut tick = Tick::default();

        if let Some(resize) = self.resize.as_mut() {
            let frame = resize.advance(dt);
            self.surface.set_frame(frame);
            if resize.is_finished() {
                self.frame = resize.target();
                self.resize = None;
                tick.resize_committed = true;
            }
        }

        if let Some(fade) = self.fade.as_mut() {
            let alpha = fade.advance(dt);
            let finished = fade.is_finished();
            self.set_alpha(alpha);
            if finished {
                self.fade = None;
                tick.fade_finished = true;
            }
        }

        tick
    }

    fn settled_frame(&self) -> Rect {
        self.resize.map_or(self.frame, |resize| resize.target())
    }

    fn settled_size(&self) -> Size {
        self.settled_frame().size
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
        self.surface.set_alpha(alpha);
    }
}

/// Frame for `size` grown out of `current`, keeping the anchor-side edge and the
/// horizontal origin in place. Growth past the visible right edge hugs that edge.
pub fn resized_frame(
    current: Rect,
    size: Size,
    placement: Placement,
    visible: Option<&Rect>,
) -> Rect {
    let height_delta = size.height - current.size.height;
    let mut origin = current.origin;
    if placement == Placement::Below {
        origin.y -= height_delta;
    }
    if let Some(visible) = visible {
        if overflows_right(origin.x, size.width, visible) {
            origin.x = hug_edge_x(size.width, visible);
        }
    }
    Rect::from_origin_size(origin, size)
}
