//! Which drawing primitives make up one tooth on the chart.
//!
//! Coordinates are in a 40x40 tooth-local box with the centre at (20, 20).
//! Angles are in degrees, measured clockwise from the positive x axis with y pointing down.

use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::entities::dental_chart::{Design, ToothAnnotation, ToothNumber};

pub const CENTER: f64 = 20.0;
pub const OUTER_RADIUS: f64 = 18.0;
pub const INNER_RADIUS: f64 = 8.0;
pub const DOT_ORBIT: f64 = 12.5;
pub const DOT_RADIUS: f64 = 2.5;

/// Outline style of a tooth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum ToothStyle {
    /// One circle crossed by two diagonals
    Simple,
    /// Outer and inner circle joined by four diagonal segments
    DualCircle,
}

impl ToothStyle {
    pub fn for_tooth(tooth: ToothNumber) -> Self {
        if tooth.uses_dual_circle_style() {
            ToothStyle::DualCircle
        } else {
            ToothStyle::Simple
        }
    }
}

/// A single drawing instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Primitive {
    Circle { cx: f64, cy: f64, r: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Annular sector, a pie slice when `inner_radius` is 0
    Wedge {
        start_angle: f64,
        end_angle: f64,
        inner_radius: f64,
        outer_radius: f64,
    },
    Dot { cx: f64, cy: f64, r: f64 },
}

/// Ordered primitives for one tooth, drawn first to last
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ShapePlan {
    pub tooth: ToothNumber,
    pub style: ToothStyle,
    pub primitives: Vec<Primitive>,
}

fn round3(value: f64) -> f64 {
    let rounded = (value * 1000.0).round() / 1000.0;
    // Avoid -0.0 leaking into the output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn point(angle: f64, radius: f64) -> (f64, f64) {
    let radians = angle.to_radians();
    (
        round3(CENTER + radius * radians.cos()),
        round3(CENTER + radius * radians.sin()),
    )
}

fn line(from: (f64, f64), to: (f64, f64)) -> Primitive {
    Primitive::Line {
        x1: from.0,
        y1: from.1,
        x2: to.0,
        y2: to.1,
    }
}

fn circle(r: f64) -> Primitive {
    Primitive::Circle { cx: CENTER, cy: CENTER, r }
}

/// Angle of the dot drawn for a dot design
fn dot_angle(design: Design) -> Option<f64> {
    match design {
        Design::RightDot => Some(0.0),
        Design::BottomRightDot => Some(45.0),
        Design::BottomDot => Some(90.0),
        Design::BottomLeftDot => Some(135.0),
        Design::LeftDot => Some(180.0),
        Design::UpperLeftDot => Some(225.0),
        Design::TopRightDot => Some(315.0),
        _ => None,
    }
}

/// Angular span of the side filled by a diagonal design
fn side_span(design: Design) -> Option<(f64, f64)> {
    match design {
        Design::DiagonalRight => Some((-45.0, 45.0)),
        Design::DiagonalBottom => Some((45.0, 135.0)),
        Design::DiagonalLeft => Some((135.0, 225.0)),
        Design::DiagonalTop => Some((225.0, 315.0)),
        _ => None,
    }
}

fn fill(design: Design, style: ToothStyle) -> Vec<Primitive> {
    if design == Design::Filled {
        return [(0.0, 120.0), (120.0, 240.0), (240.0, 360.0)]
            .into_iter()
            .map(|(start_angle, end_angle)| Primitive::Wedge {
                start_angle,
                end_angle,
                inner_radius: 0.0,
                outer_radius: OUTER_RADIUS,
            })
            .collect();
    }

    if let Some((start_angle, end_angle)) = side_span(design) {
        let inner_radius = match style {
            ToothStyle::Simple => 0.0,
            ToothStyle::DualCircle => INNER_RADIUS,
        };
        return vec![Primitive::Wedge {
            start_angle,
            end_angle,
            inner_radius,
            outer_radius: OUTER_RADIUS,
        }];
    }

    if let Some(angle) = dot_angle(design) {
        let (cx, cy) = point(angle, DOT_ORBIT);
        return vec![Primitive::Dot { cx, cy, r: DOT_RADIUS }];
    }

    Vec::new()
}

/// Derive the primitives for one annotated tooth: the outline first, then the design fill
pub fn derive_primitives(annotation: &ToothAnnotation) -> ShapePlan {
    let style = ToothStyle::for_tooth(annotation.tooth);
    let mut primitives = vec![circle(OUTER_RADIUS)];

    match style {
        ToothStyle::Simple => {
            primitives.push(line(point(45.0, OUTER_RADIUS), point(225.0, OUTER_RADIUS)));
            primitives.push(line(point(135.0, OUTER_RADIUS), point(315.0, OUTER_RADIUS)));
        }
        ToothStyle::DualCircle => {
            for angle in [45.0, 135.0, 225.0, 315.0] {
                primitives.push(line(point(angle, INNER_RADIUS), point(angle, OUTER_RADIUS)));
            }
            primitives.push(circle(INNER_RADIUS));
        }
    }

    primitives.extend(fill(annotation.design, style));

    ShapePlan {
        tooth: annotation.tooth,
        style,
        primitives,
    }
}
