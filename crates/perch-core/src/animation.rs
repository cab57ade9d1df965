//! Fixed-duration tweens advanced by the host loop.
//!
//! Easing maps linear progress in `[0, 1]` onto a curve; [`Animation`] owns the
//! elapsed time and is stepped with the loop's frame delta rather than a clock.

use perch_platform::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Easing function for controlling animation curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Cubic ease-in-out: slow at both ends, fast in the middle.
    #[default]
    EaseInOut,
}

impl Easing {
    /// Input `t` is clamped to `[0.0, 1.0]`; so is the result.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => ease_in_out_cubic(t),
        }
    }
}

/// Cubic ease-in-out.
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// A value that can be linearly interpolated towards another.
pub trait Animatable: Copy {
    /// `t = 0.0` returns `self`, `t = 1.0` returns `target`.
    fn lerp(&self, target: &Self, t: f32) -> Self;
}

impl Animatable for f32 {
    #[inline]
    fn lerp(&self, target: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        self + (target - self) * t
    }
}

impl Animatable for Rect {
    #[inline]
    fn lerp(&self, target: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Rect::from_origin_size(
            self.origin.lerp(target.origin, t),
            Size::new(
                Animatable::lerp(&self.size.width, &target.size.width, t),
                Animatable::lerp(&self.size.height, &target.size.height, t),
            ),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Animation<T> {
    from: T,
    to: T,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl<T: Animatable> Animation<T> {
    /// A non-finite or negative `duration` finishes on the first step.
    pub fn new(from: T, to: T, duration: f32, easing: Easing) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            easing,
        }
    }

    /// Moves the animation forward by `dt` seconds and returns the new value.
    pub fn advance(&mut self, dt: f32) -> T {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> T {
        if self.is_finished() {
            return self.to;
        }
        let progress = self.easing.apply(self.elapsed / self.duration);
        self.from.lerp(&self.to, progress)
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
