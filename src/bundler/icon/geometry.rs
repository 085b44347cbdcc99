//! Placement math for the app icon on the disk icon.
//!
//! The app icon is tilted into a trapezoid, squashed to fit the disk
//! artwork, and pinned slightly above the template's center. All values
//! derive from the two canvas sizes and a handful of tuned constants.

use std::fmt;

/// Horizontal inset of the top-left corner after distortion, as a fraction of width.
pub const TOP_LEFT_INSET: f64 = 0.08;
/// Horizontal position of the top-right corner after distortion, as a fraction of width.
pub const TOP_RIGHT_INSET: f64 = 0.92;
/// Template width divided by this gives the app icon's final width.
pub const WIDTH_DIVISOR: f64 = 1.58;
/// Template height divided by this gives the app icon's final height.
pub const HEIGHT_DIVISOR: f64 = 1.82;
/// Upward shift from the template's center, as a fraction of template height.
pub const VERTICAL_LIFT: f64 = 0.063;

/// Pixel size of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Construct from width and height.
    pub const fn new(width: u32, height: u32) -> Self {
        Dimensions { width, height }
    }

    /// Whether either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Source/destination coordinate pair for a perspective distortion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    /// Corner in the undistorted image
    pub from: (f64, f64),
    /// Where that corner lands
    pub to: (f64, f64),
}

/// Everything the engine needs to compose one variant.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionPlan {
    /// App icon canvas
    pub app: Dimensions,
    /// Template canvas, also the output canvas
    pub background: Dimensions,
    /// Top-left, top-right, bottom-left, bottom-right
    pub control_points: [ControlPoint; 4],
    /// Exact target size of the distorted app icon (aspect ratio not kept)
    pub resize_to: (f64, f64),
    /// Upward offset from center in pixels
    pub lift: f64,
}

/// Reason a plan cannot be built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// The app icon has zero width or height
    EmptyApp(Dimensions),
    /// The template icon has zero width or height
    EmptyBackground(Dimensions),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::EmptyApp(d) => write!(f, "app icon has zero area ({d})"),
            PlanError::EmptyBackground(d) => write!(f, "template icon has zero area ({d})"),
        }
    }
}

impl std::error::Error for PlanError {}

impl CompositionPlan {
    /// Compute the plan for an app icon of size `app` over a template of size `background`.
    pub fn new(app: Dimensions, background: Dimensions) -> Result<Self, PlanError> {
        if app.is_empty() {
            return Err(PlanError::EmptyApp(app));
        }
        if background.is_empty() {
            return Err(PlanError::EmptyBackground(background));
        }

        let aw = f64::from(app.width);
        let ah = f64::from(app.height);
        let bw = f64::from(background.width);
        let bh = f64::from(background.height);

        // Pixel coordinates are 1-based here, matching the engine's convention.
        let control_points = [
            ControlPoint {
                from: (1.0, 1.0),
                to: (aw * TOP_LEFT_INSET, 1.0),
            },
            ControlPoint {
                from: (aw, 1.0),
                to: (aw * TOP_RIGHT_INSET, 1.0),
            },
            ControlPoint {
                from: (1.0, ah),
                to: (1.0, ah),
            },
            ControlPoint {
                from: (aw, ah),
                to: (aw, ah),
            },
        ];

        Ok(CompositionPlan {
            app,
            background,
            control_points,
            resize_to: (bw / WIDTH_DIVISOR, bh / HEIGHT_DIVISOR),
            lift: bh * VERTICAL_LIFT,
        })
    }

    /// Resize target rounded to whole pixels, never below 1x1.
    pub fn resize_extent(&self) -> Dimensions {
        let (w, h) = self.resize_to;
        Dimensions::new(round_px(w), round_px(h))
    }

    /// Control points as `sx,sy dx,dy` pairs for `-distort Perspective`.
    pub fn perspective_argument(&self) -> String {
        self.control_points
            .iter()
            .map(|p| {
                format!(
                    "{},{} {},{}",
                    fmt_coord(p.from.0),
                    fmt_coord(p.from.1),
                    fmt_coord(p.to.0),
                    fmt_coord(p.to.1)
                )
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Forced resize geometry, e.g. `648x563!`.
    pub fn resize_argument(&self) -> String {
        let extent = self.resize_extent();
        format!("{}x{}!", extent.width, extent.height)
    }

    /// Offset geometry relative to centre gravity, e.g. `+0-64.512`.
    pub fn offset_argument(&self) -> String {
        format!("+0-{}", fmt_coord(self.lift))
    }
}

fn round_px(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

/// Shortest decimal form that survives a round trip, without a trailing `.0`.
fn fmt_coord(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
