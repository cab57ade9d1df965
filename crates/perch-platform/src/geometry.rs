//! Screen-space geometry shared by the engine and the backends.
//!
//! Coordinates are y-up: the origin sits at the bottom-left of the primary
//! display and `max_y` is the visual top of a rectangle.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Vec2, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn min_x(&self) -> f32 {
        self.origin.x
    }

    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn mid_x(&self) -> f32 {
        self.origin.x + self.size.width / 2.0
    }

    pub fn min_y(&self) -> f32 {
        self.origin.y
    }

    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size.as_vec2() / 2.0
    }

    /// Half-open containment: points on the max edges are outside.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }
}

/// One display as the shell reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    /// Full display area.
    pub frame: Rect,
    /// Area not covered by shell furniture (menu bar, taskbar, dock).
    pub visible: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_follow_origin_and_size() {
        let rect = Rect::new(800.0, 900.0, 24.0, 22.0);
        assert_eq!(rect.max_x(), 824.0);
        assert_eq!(rect.mid_x(), 812.0);
        assert_eq!(rect.max_y(), 922.0);
        assert_eq!(rect.center(), Vec2::new(812.0, 911.0));
    }

    #[test]
    fn contains_excludes_far_edges() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(rect.contains(Vec2::new(9.5, 9.5)));
        assert!(!rect.contains(Vec2::new(10.0, 5.0)));
        assert!(!rect.contains(Vec2::new(5.0, -0.1)));
    }
}
