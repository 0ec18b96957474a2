//! Anchor geometry and viewport constraint
//!
//! Comments are pinned to a fractional point inside their anchor element's
//! bounding box, so the pixel position is always derived from the live rect
//! and survives element movement. Floating surfaces use
//! [`constrain_to_viewport`] to stay on-screen.

use crate::document::{Point, Rect};

/// Fractional pin point within an element's bounding box.
///
/// Both axes live in `[0,1]`; construction clamps, which tolerates clicks
/// landing slightly outside the element due to rounding or borders.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Anchor {
    pub fx: f64,
    pub fy: f64,
}

impl Anchor {
    pub fn new(fx: f64, fy: f64) -> Self {
        Self { fx: fx.clamp(0.0, 1.0), fy: fy.clamp(0.0, 1.0) }
    }
}

/// Box dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Visible viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Vertical overflow bias for [`constrain_to_viewport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreferredSide {
    /// Shift up by the overflow amount, like the horizontal axis.
    #[default]
    Auto,
    /// Flip the box above the requested position instead of clamping to the
    /// bottom edge.
    Top,
}

/// Absolute pixel position for an anchor within the given rect.
///
/// Pure function of the current layout; never cache the result across layout
/// changes.
pub fn to_absolute(rect: &Rect, anchor: Anchor) -> Point {
    Point::new(rect.left + rect.width * anchor.fx, rect.top + rect.height * anchor.fy)
}

/// Inverse of [`to_absolute`], clamped to `[0,1]` per axis.
///
/// Zero-sized axes map to fraction 0 rather than dividing by zero.
pub fn to_relative(rect: &Rect, point: Point) -> Anchor {
    let fx = if rect.width > 0.0 { (point.x - rect.left) / rect.width } else { 0.0 };
    let fy = if rect.height > 0.0 { (point.y - rect.top) / rect.height } else { 0.0 };
    Anchor::new(fx, fy)
}

/// Keep a floating box of `size` requested at `position` inside the viewport.
///
/// Per axis: overflow past the far edge shifts the box back by the overflow
/// amount; if that lands before the near padding boundary, clamp there; if
/// the box cannot fit inside the padded viewport at all, center it.
/// [`PreferredSide::Top`] flips the box above the requested position on
/// vertical overflow instead of clamping to the bottom edge.
pub fn constrain_to_viewport(
    size: Size,
    position: Point,
    viewport: Viewport,
    padding: f64,
    preferred_side: PreferredSide,
) -> Point {
    let mut x = position.x;
    if x + size.width > viewport.width - padding {
        x = viewport.width - padding - size.width;
    }
    if x < padding {
        x = if size.width + 2.0 * padding <= viewport.width {
            padding
        } else {
            (viewport.width - size.width) / 2.0
        };
    }

    let mut y = position.y;
    if y + size.height > viewport.height - padding {
        y = match preferred_side {
            PreferredSide::Top => position.y - size.height,
            PreferredSide::Auto => viewport.height - padding - size.height,
        };
    }
    if y < padding {
        y = if size.height + 2.0 * padding <= viewport.height {
            padding
        } else {
            (viewport.height - size.height) / 2.0
        };
    }

    Point::new(x, y)
}
