//! Where the overlay goes relative to its indicator.

use glam::Vec2;
use perch_platform::{Rect, Screen, Size};
use serde::{Deserialize, Serialize};

/// Compensates for the overlay's decorative border so its content lines up with the icon.
pub const BORDER_INSET: f32 = 2.0;

/// How the overlay's horizontal edge relates to the anchor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Centre,
    Right,
}

impl Alignment {
    pub fn mirrored(self) -> Option<Self> {
        match self {
            Alignment::Left => Some(Alignment::Right),
            Alignment::Right => Some(Alignment::Left),
            Alignment::Centre => None,
        }
    }
}

/// How to resolve an overflow past the screen's right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClippingPolicy {
    /// Try the mirrored alignment, then fall back to `HugEdge`.
    #[default]
    ReverseAlignment,
    /// Pin the right edge to the visible screen edge minus the border inset.
    HugEdge,
}

/// Side of the anchor the overlay ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Below,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub frame: Rect,
    pub placement: Placement,
}

/// Computes the overlay frame for `desired` content hung off `anchor`.
///
/// Without an anchor the overlay is centred on `screen`, or placed at the origin when
/// there is no display information either. Without a screen no clipping is applied.
pub fn resolve(
    anchor: Option<Rect>,
    desired: Size,
    alignment: Alignment,
    clipping: ClippingPolicy,
    screen: Option<&Screen>,
) -> Resolved {
    let Some(anchor) = anchor else {
        return Resolved {
            frame: centred(desired, screen),
            placement: Placement::Below,
        };
    };

    let width = desired.width;
    let mut x = aligned_x(&anchor, width, alignment);
    let mut y = anchor.min_y() - desired.height;
    let mut placement = Placement::Below;

    if let Some(screen) = screen {
        let visible = &screen.visible;
        if overflows_right(x, width, visible) {
            x = match clipping {
                ClippingPolicy::ReverseAlignment => alignment
                    .mirrored()
                    .map(|mirror| aligned_x(&anchor, width, mirror))
                    .filter(|&mirrored_x| !overflows_right(mirrored_x, width, visible))
                    .unwrap_or_else(|| hug_edge_x(width, visible)),
                ClippingPolicy::HugEdge => hug_edge_x(width, visible),
            };
        }
        // Left edge wins when the overlay is wider than the visible area.
        if x < visible.min_x() {
            x = visible.min_x() + BORDER_INSET;
        }
        if y < visible.min_y() {
            y = anchor.max_y();
            placement = Placement::Above;
        }
    }

    Resolved {
        frame: Rect::from_origin_size(Vec2::new(x, y), desired),
        placement,
    }
}

fn centred(desired: Size, screen: Option<&Screen>) -> Rect {
    let origin = match screen {
        Some(screen) => screen.frame.center() - desired.as_vec2() / 2.0,
        None => Vec2::ZERO,
    };
    Rect::from_origin_size(origin, desired)
}

fn aligned_x(anchor: &Rect, width: f32, alignment: Alignment) -> f32 {
    match alignment {
        Alignment::Left => anchor.min_x() - BORDER_INSET,
        Alignment::Centre => anchor.mid_x() - width / 2.0,
        Alignment::Right => anchor.max_x() + BORDER_INSET - width,
    }
}

pub(crate) fn overflows_right(x: f32, width: f32, visible: &Rect) -> bool {
    x + width > visible.max_x()
}

pub(crate) fn hug_edge_x(width: f32, visible: &Rect) -> f32 {
    visible.max_x() - BORDER_INSET - width
}
