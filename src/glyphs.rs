//! Vector geometry for chart symbols.
//!
//! Each shape id maps to a function that lays the shape out inside a square
//! cell. Coordinates are y-down (screen/canvas space); arcs follow canvas
//! conventions: angles in radians, 0 pointing right, positive angles turning
//! clockwise on screen, `anticlockwise` reversing the sweep direction.
//! Unknown ids render the fallback dot.

use serde::Serialize;
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};
use std::sync::OnceLock;

pub const FALLBACK_SHAPE: &str = "dot";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[inline]
pub fn pt(x: f32, y: f32) -> Point {
    Point { x, y }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Line {
        from: Point,
        to: Point,
    },
    /// Open stroked path.
    Polyline { points: Vec<Point> },
    /// Closed path, filled or stroked.
    Polygon { points: Vec<Point>, filled: bool },
    /// Stroked circular arc.
    Arc {
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
        anticlockwise: bool,
    },
    /// Stroked ellipse outline.
    Ellipse { center: Point, rx: f32, ry: f32 },
    /// Filled circle.
    Disc { center: Point, radius: f32 },
    /// Filled axis-aligned rectangle.
    Rect {
        origin: Point,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Glyph {
    pub stroke_width: f32,
    pub primitives: Vec<Primitive>,
}

/// The square a glyph is laid out in, with a 15% inner margin.
#[derive(Debug, Clone, Copy)]
pub struct GlyphFrame {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub cx: f32,
    pub cy: f32,
    pub pad: f32,
}

impl GlyphFrame {
    pub fn new(center: Point, size: f32) -> Self {
        let size = size.max(0.0);
        Self {
            x: center.x - size / 2.0,
            y: center.y - size / 2.0,
            size,
            cx: center.x,
            cy: center.y,
            pad: size * 0.15,
        }
    }

    pub fn left(&self) -> f32 {
        self.x + self.pad
    }

    pub fn right(&self) -> f32 {
        self.x + self.size - self.pad
    }

    pub fn top(&self) -> f32 {
        self.y + self.pad
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.size - self.pad
    }

    pub fn center(&self) -> Point {
        pt(self.cx, self.cy)
    }

    /// Fraction of the cell edge.
    pub fn s(&self, fraction: f32) -> f32 {
        self.size * fraction
    }
}

pub type GlyphFn = fn(&GlyphFrame) -> Vec<Primitive>;

/// Shape id → geometry function table.
#[derive(Clone)]
pub struct GlyphRegistry {
    builders: HashMap<String, GlyphFn>,
}

impl std::fmt::Debug for GlyphRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("GlyphRegistry").field("shapes", &ids).finish()
    }
}

static BUILTIN_REGISTRY: OnceLock<GlyphRegistry> = OnceLock::new();

impl GlyphRegistry {
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for &(id, builder) in BUILTIN_GLYPHS {
            registry.register(id, builder);
        }
        registry
    }

    pub fn builtin() -> &'static Self {
        BUILTIN_REGISTRY.get_or_init(Self::with_builtins)
    }

    /// Adds or replaces a shape; returns the previous builder if any.
    pub fn register(&mut self, id: impl Into<String>, builder: GlyphFn) -> Option<GlyphFn> {
        self.builders.insert(id.into(), builder)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.builders.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub fn geometry(&self, shape_id: &str, center: Point, size: f32) -> Glyph {
        let frame = GlyphFrame::new(center, size);
        let builder = self.builders.get(shape_id).copied().unwrap_or(dot);
        Glyph {
            stroke_width: (size / 16.0).max(1.5),
            primitives: builder(&frame),
        }
    }
}

impl Default for GlyphRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Geometry from the builtin registry.
pub fn glyph_geometry(shape_id: &str, center: Point, size: f32) -> Glyph {
    GlyphRegistry::builtin().geometry(shape_id, center, size)
}

const BUILTIN_GLYPHS: &[(&str, GlyphFn)] = &[
    (FALLBACK_SHAPE, dot),
    ("digit_0", digit_0),
    ("digit_1", digit_1),
    ("digit_2", digit_2),
    ("digit_3", digit_3),
    ("digit_4", digit_4),
    ("digit_5", digit_5),
    ("digit_6", digit_6),
    ("digit_7", digit_7),
    ("digit_8", digit_8),
    ("digit_9", digit_9),
    ("letter_a", letter_a),
    ("letter_b", letter_b),
    ("letter_c", letter_c),
    ("letter_d", letter_d),
    ("letter_e", letter_e),
    ("letter_f", letter_f),
    ("letter_g", letter_g),
    ("letter_h", letter_h),
    ("letter_j", letter_j),
    ("letter_k", letter_k),
    ("letter_l", letter_l),
    ("letter_m", letter_m),
    ("letter_n", letter_n),
    ("letter_p", letter_p),
    ("letter_q", letter_q),
    ("letter_r", letter_r),
    ("letter_s", letter_s),
    ("letter_t", letter_t),
    ("letter_u", letter_u),
    ("letter_v", letter_v),
    ("letter_w", letter_w),
    ("letter_x", letter_x),
    ("letter_y", letter_y),
    ("letter_z", letter_z),
    ("heart", heart),
    ("diamond", diamond),
    ("square", square),
    ("triangle", triangle),
    ("circle", circle),
    ("pentagon", pentagon),
    ("hexagon", hexagon),
    ("octagon", octagon),
    ("decagon", decagon),
    ("semicircle", semicircle),
    ("cloud", cloud),
    ("star", star),
    ("ring", ring),
    ("arrow_up", arrow_up),
    ("arrow_down", arrow_down),
    ("arrow_left", arrow_left),
    ("arrow_right", arrow_right),
    ("checkmark", checkmark),
    ("hash", hash),
    ("percent", percent),
    ("equals", equals),
    ("bracket", bracket),
    ("parenthesis", parenthesis),
    ("quote_mark", quote_mark),
    ("spiral", spiral),
    ("zigzag", zigzag),
];

fn line(from: Point, to: Point) -> Primitive {
    Primitive::Line { from, to }
}

fn polyline(points: Vec<Point>) -> Primitive {
    Primitive::Polyline { points }
}

fn arc(center: Point, radius: f32, start: f32, end: f32, anticlockwise: bool) -> Primitive {
    Primitive::Arc {
        center,
        radius,
        start,
        end,
        anticlockwise,
    }
}

fn ellipse(center: Point, rx: f32, ry: f32) -> Primitive {
    Primitive::Ellipse { center, rx, ry }
}

fn on_circle(center: Point, radius: f32, angle: f32) -> Point {
    pt(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

fn regular_polygon(center: Point, radius: f32, sides: usize, rotation: f32) -> Vec<Point> {
    (0..sides)
        .map(|i| on_circle(center, radius, rotation + i as f32 * TAU / sides as f32))
        .collect()
}

fn cubic_points(p0: Point, p1: Point, p2: Point, p3: Point, steps: usize) -> Vec<Point> {
    (0..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            let u = 1.0 - t;
            let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            pt(
                a * p0.x + b * p1.x + c * p2.x + d * p3.x,
                a * p0.y + b * p1.y + c * p2.y + d * p3.y,
            )
        })
        .collect()
}

fn dot(f: &GlyphFrame) -> Vec<Primitive> {
    vec![Primitive::Disc {
        center: f.center(),
        radius: f.s(1.0 / 8.0),
    }]
}

// Digits share a box of quarter-height `q` so stacked loops meet at the center.

fn quarter(f: &GlyphFrame) -> f32 {
    (f.bottom() - f.top()) / 4.0
}

fn digit_0(f: &GlyphFrame) -> Vec<Primitive> {
    let (rx, ry) = (f.s(1.0 / 6.0), f.s(0.2));
    vec![
        ellipse(f.center(), rx, ry),
        line(
            pt(f.cx + rx * 0.7, f.cy - ry * 0.7),
            pt(f.cx - rx * 0.7, f.cy + ry * 0.7),
        ),
    ]
}

fn digit_1(f: &GlyphFrame) -> Vec<Primitive> {
    let foot = f.s(1.0 / 8.0);
    vec![
        polyline(vec![
            pt(f.cx - foot, f.top() + foot),
            pt(f.cx, f.top()),
            pt(f.cx, f.bottom()),
        ]),
        line(pt(f.cx - foot, f.bottom()), pt(f.cx + foot, f.bottom())),
    ]
}

fn digit_2(f: &GlyphFrame) -> Vec<Primitive> {
    let q = quarter(f);
    let hook = pt(f.cx, f.top() + q);
    let end = on_circle(hook, q, 2.25 * PI);
    vec![
        arc(hook, q, PI, 2.25 * PI, false),
        polyline(vec![end, pt(f.left(), f.bottom()), pt(f.right(), f.bottom())]),
    ]
}

fn digit_3(f: &GlyphFrame) -> Vec<Primitive> {
    let q = quarter(f);
    vec![
        arc(pt(f.cx, f.top() + q), q, -PI, FRAC_PI_2, false),
        arc(pt(f.cx, f.cy + q), q, -FRAC_PI_2, PI, false),
    ]
}

fn digit_4(f: &GlyphFrame) -> Vec<Primitive> {
    let stem = f.cx + f.s(0.1);
    let bar = f.cy + f.s(0.1);
    vec![
        polyline(vec![
            pt(stem, f.top()),
            pt(f.left(), bar),
            pt(f.right(), bar),
        ]),
        line(pt(stem, f.top()), pt(stem, f.bottom())),
    ]
}

fn digit_5(f: &GlyphFrame) -> Vec<Primitive> {
    let q = quarter(f);
    vec![
        polyline(vec![
            pt(f.right(), f.top()),
            pt(f.left(), f.top()),
            pt(f.left(), f.cy),
            pt(f.cx, f.cy),
        ]),
        arc(pt(f.cx, f.cy + q), q, -FRAC_PI_2, 0.8 * PI, false),
    ]
}

fn digit_6(f: &GlyphFrame) -> Vec<Primitive> {
    let q = quarter(f);
    let bowl = pt(f.cx, f.cy + q);
    vec![
        ellipse(bowl, q, q),
        line(pt(f.right() - f.s(0.1), f.top()), pt(f.cx - q, bowl.y)),
    ]
}

fn digit_7(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.top()),
        pt(f.right(), f.top()),
        pt(f.cx - f.s(0.1), f.bottom()),
    ])]
}

fn digit_8(f: &GlyphFrame) -> Vec<Primitive> {
    let q = quarter(f);
    vec![
        ellipse(pt(f.cx, f.top() + q), f.s(1.0 / 6.0), q),
        ellipse(pt(f.cx, f.cy + q), f.s(0.2), q),
    ]
}

fn digit_9(f: &GlyphFrame) -> Vec<Primitive> {
    let q = quarter(f);
    let loop_center = pt(f.cx, f.top() + q);
    vec![
        ellipse(loop_center, q, q),
        line(
            pt(f.cx + q, loop_center.y),
            pt(f.cx + q * 0.4, f.bottom()),
        ),
    ]
}

fn letter_a(f: &GlyphFrame) -> Vec<Primitive> {
    let bar = f.s(1.0 / 6.0);
    vec![
        polyline(vec![
            pt(f.left(), f.bottom()),
            pt(f.cx, f.top()),
            pt(f.right(), f.bottom()),
        ]),
        line(pt(f.cx - bar, f.cy), pt(f.cx + bar, f.cy)),
    ]
}

/// Vertical stem plus a right-facing bowl between `top` and `bottom`.
fn bowl(f: &GlyphFrame, top: f32, bottom: f32) -> Vec<Primitive> {
    let r = (bottom - top) / 2.0;
    let start = f.right() - r;
    vec![
        line(pt(f.left(), top), pt(start, top)),
        arc(pt(start, top + r), r, -FRAC_PI_2, FRAC_PI_2, false),
        line(pt(start, bottom), pt(f.left(), bottom)),
    ]
}

fn letter_b(f: &GlyphFrame) -> Vec<Primitive> {
    let mut primitives = vec![line(pt(f.left(), f.top()), pt(f.left(), f.bottom()))];
    primitives.extend(bowl(f, f.top(), f.cy));
    primitives.extend(bowl(f, f.cy, f.bottom()));
    primitives
}

fn letter_c(f: &GlyphFrame) -> Vec<Primitive> {
    vec![arc(f.center(), f.s(0.3), -FRAC_PI_4, FRAC_PI_4, true)]
}

fn letter_d(f: &GlyphFrame) -> Vec<Primitive> {
    let r = (f.bottom() - f.top()) / 2.0;
    vec![
        polyline(vec![
            pt(f.right() - r, f.top()),
            pt(f.left(), f.top()),
            pt(f.left(), f.bottom()),
            pt(f.right() - r, f.bottom()),
        ]),
        arc(pt(f.right() - r, f.cy), r, -FRAC_PI_2, FRAC_PI_2, false),
    ]
}

fn letter_e(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        polyline(vec![
            pt(f.right(), f.top()),
            pt(f.left(), f.top()),
            pt(f.left(), f.bottom()),
            pt(f.right(), f.bottom()),
        ]),
        line(pt(f.left(), f.cy), pt(f.right() - f.s(0.125), f.cy)),
    ]
}

fn letter_f(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        polyline(vec![
            pt(f.right(), f.top()),
            pt(f.left(), f.top()),
            pt(f.left(), f.bottom()),
        ]),
        line(pt(f.left(), f.cy), pt(f.right() - f.s(0.125), f.cy)),
    ]
}

fn letter_g(f: &GlyphFrame) -> Vec<Primitive> {
    let r = f.s(0.3);
    let center = f.center();
    vec![
        arc(center, r, -FRAC_PI_4, FRAC_PI_4, true),
        polyline(vec![
            on_circle(center, r, FRAC_PI_4),
            pt(f.cx + r, f.cy),
            pt(f.cx, f.cy),
        ]),
    ]
}

fn letter_h(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        line(pt(f.left(), f.top()), pt(f.left(), f.bottom())),
        line(pt(f.right(), f.top()), pt(f.right(), f.bottom())),
        line(pt(f.left(), f.cy), pt(f.right(), f.cy)),
    ]
}

fn letter_j(f: &GlyphFrame) -> Vec<Primitive> {
    let r = (f.right() - f.left()) / 2.0;
    let hook = pt(f.cx, f.bottom() - r);
    vec![
        line(pt(f.cx, f.top()), pt(f.right(), f.top())),
        line(pt(f.right(), f.top()), pt(f.right(), hook.y)),
        arc(hook, r, 0.0, PI, false),
    ]
}

fn letter_k(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        line(pt(f.left(), f.top()), pt(f.left(), f.bottom())),
        polyline(vec![
            pt(f.right(), f.top()),
            pt(f.left(), f.cy),
            pt(f.right(), f.bottom()),
        ]),
    ]
}

fn letter_l(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.top()),
        pt(f.left(), f.bottom()),
        pt(f.right(), f.bottom()),
    ])]
}

fn letter_m(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.bottom()),
        pt(f.left(), f.top()),
        pt(f.cx, f.cy),
        pt(f.right(), f.top()),
        pt(f.right(), f.bottom()),
    ])]
}

fn letter_n(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.bottom()),
        pt(f.left(), f.top()),
        pt(f.right(), f.bottom()),
        pt(f.right(), f.top()),
    ])]
}

fn letter_p(f: &GlyphFrame) -> Vec<Primitive> {
    let mut primitives = vec![line(pt(f.left(), f.top()), pt(f.left(), f.bottom()))];
    primitives.extend(bowl(f, f.top(), f.cy));
    primitives
}

fn letter_q(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        ellipse(f.center(), f.s(0.3), f.s(0.3)),
        line(pt(f.cx + f.s(0.1), f.cy + f.s(0.1)), pt(f.right(), f.bottom())),
    ]
}

fn letter_r(f: &GlyphFrame) -> Vec<Primitive> {
    let mut primitives = letter_p(f);
    primitives.push(line(pt(f.cx, f.cy), pt(f.right(), f.bottom())));
    primitives
}

fn letter_s(f: &GlyphFrame) -> Vec<Primitive> {
    let q = quarter(f);
    vec![
        arc(pt(f.cx, f.top() + q), q, -PI / 6.0, FRAC_PI_2, true),
        arc(pt(f.cx, f.cy + q), q, -FRAC_PI_2, 5.0 * PI / 6.0, false),
    ]
}

fn letter_t(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        line(pt(f.left(), f.top()), pt(f.right(), f.top())),
        line(pt(f.cx, f.top()), pt(f.cx, f.bottom())),
    ]
}

fn letter_u(f: &GlyphFrame) -> Vec<Primitive> {
    let r = (f.right() - f.left()) / 2.0;
    let turn = f.bottom() - r;
    vec![
        line(pt(f.left(), f.top()), pt(f.left(), turn)),
        arc(pt(f.cx, turn), r, PI, 0.0, true),
        line(pt(f.right(), turn), pt(f.right(), f.top())),
    ]
}

fn letter_v(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.top()),
        pt(f.cx, f.bottom()),
        pt(f.right(), f.top()),
    ])]
}

fn letter_w(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.top()),
        pt(f.left() + f.s(0.2), f.bottom()),
        pt(f.cx, f.top() + f.s(1.0 / 6.0)),
        pt(f.right() - f.s(0.2), f.bottom()),
        pt(f.right(), f.top()),
    ])]
}

fn letter_x(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        line(pt(f.left(), f.top()), pt(f.right(), f.bottom())),
        line(pt(f.right(), f.top()), pt(f.left(), f.bottom())),
    ]
}

fn letter_y(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        polyline(vec![
            pt(f.left(), f.top()),
            pt(f.cx, f.cy),
            pt(f.right(), f.top()),
        ]),
        line(pt(f.cx, f.cy), pt(f.cx, f.bottom())),
    ]
}

fn letter_z(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.top()),
        pt(f.right(), f.top()),
        pt(f.left(), f.bottom()),
        pt(f.right(), f.bottom()),
    ])]
}

fn heart(f: &GlyphFrame) -> Vec<Primitive> {
    let (w, h) = (f.s(1.0 / 3.0), f.s(1.0 / 3.0));
    let tip = pt(f.cx, f.cy + h / 2.0);
    let notch = pt(f.cx, f.cy - h / 2.0);
    let mut points = cubic_points(
        tip,
        pt(f.cx - w, f.cy),
        pt(f.cx - w, f.cy - h),
        notch,
        12,
    );
    points.extend(
        cubic_points(
            notch,
            pt(f.cx + w, f.cy - h),
            pt(f.cx + w, f.cy),
            tip,
            12,
        )
        .into_iter()
        .skip(1),
    );
    vec![Primitive::Polygon {
        points,
        filled: true,
    }]
}

fn diamond(f: &GlyphFrame) -> Vec<Primitive> {
    vec![Primitive::Polygon {
        points: vec![
            pt(f.cx, f.top()),
            pt(f.right(), f.cy),
            pt(f.cx, f.bottom()),
            pt(f.left(), f.cy),
        ],
        filled: true,
    }]
}

fn square(f: &GlyphFrame) -> Vec<Primitive> {
    let side = f.size / 2.5;
    vec![Primitive::Rect {
        origin: pt(f.cx - side / 2.0, f.cy - side / 2.0),
        width: side,
        height: side,
    }]
}

fn triangle(f: &GlyphFrame) -> Vec<Primitive> {
    vec![Primitive::Polygon {
        points: vec![
            pt(f.cx, f.top()),
            pt(f.right(), f.bottom()),
            pt(f.left(), f.bottom()),
        ],
        filled: true,
    }]
}

fn circle(f: &GlyphFrame) -> Vec<Primitive> {
    vec![ellipse(f.center(), f.s(0.2), f.s(0.2))]
}

fn outlined_polygon(f: &GlyphFrame, sides: usize, rotation: f32) -> Vec<Primitive> {
    vec![Primitive::Polygon {
        points: regular_polygon(f.center(), f.s(0.25), sides, rotation),
        filled: false,
    }]
}

fn pentagon(f: &GlyphFrame) -> Vec<Primitive> {
    outlined_polygon(f, 5, -FRAC_PI_2)
}

fn hexagon(f: &GlyphFrame) -> Vec<Primitive> {
    outlined_polygon(f, 6, 0.0)
}

fn octagon(f: &GlyphFrame) -> Vec<Primitive> {
    outlined_polygon(f, 8, PI / 8.0)
}

fn decagon(f: &GlyphFrame) -> Vec<Primitive> {
    outlined_polygon(f, 10, 0.0)
}

fn semicircle(f: &GlyphFrame) -> Vec<Primitive> {
    let r = f.s(0.25);
    vec![
        arc(f.center(), r, 0.0, PI, false),
        line(pt(f.cx - r, f.cy), pt(f.cx + r, f.cy)),
    ]
}

fn cloud(f: &GlyphFrame) -> Vec<Primitive> {
    let r = f.s(0.125);
    vec![
        ellipse(pt(f.cx - r, f.cy), r, r),
        ellipse(pt(f.cx + r, f.cy), r, r),
        ellipse(pt(f.cx, f.cy - r), r, r),
    ]
}

fn star(f: &GlyphFrame) -> Vec<Primitive> {
    let (outer, inner) = (f.s(0.3), f.s(0.13));
    let points = (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            on_circle(f.center(), radius, i as f32 * PI / 5.0 - FRAC_PI_2)
        })
        .collect();
    vec![Primitive::Polygon {
        points,
        filled: true,
    }]
}

fn ring(f: &GlyphFrame) -> Vec<Primitive> {
    vec![
        ellipse(f.center(), f.s(0.25), f.s(0.25)),
        ellipse(f.center(), f.s(0.125), f.s(0.125)),
    ]
}

/// Shaft from `tail` to `head` with a two-stroke arrowhead.
fn arrow(tail: Point, head: Point, barb: f32) -> Vec<Primitive> {
    let angle = (head.y - tail.y).atan2(head.x - tail.x);
    let left = on_circle(head, barb, angle + PI - FRAC_PI_4);
    let right = on_circle(head, barb, angle + PI + FRAC_PI_4);
    vec![line(tail, head), polyline(vec![left, head, right])]
}

fn arrow_up(f: &GlyphFrame) -> Vec<Primitive> {
    arrow(pt(f.cx, f.bottom()), pt(f.cx, f.top()), f.s(0.2))
}

fn arrow_down(f: &GlyphFrame) -> Vec<Primitive> {
    arrow(pt(f.cx, f.top()), pt(f.cx, f.bottom()), f.s(0.2))
}

fn arrow_left(f: &GlyphFrame) -> Vec<Primitive> {
    arrow(pt(f.right(), f.cy), pt(f.left(), f.cy), f.s(0.2))
}

fn arrow_right(f: &GlyphFrame) -> Vec<Primitive> {
    arrow(pt(f.left(), f.cy), pt(f.right(), f.cy), f.s(0.2))
}

fn checkmark(f: &GlyphFrame) -> Vec<Primitive> {
    vec![polyline(vec![
        pt(f.left(), f.cy),
        pt(f.cx - f.pad / 2.0, f.bottom()),
        pt(f.right(), f.top()),
    ])]
}

fn hash(f: &GlyphFrame) -> Vec<Primitive> {
    let offset = f.s(1.0 / 6.0);
    vec![
        line(pt(f.left(), f.cy - offset), pt(f.right(), f.cy - offset)),
        line(pt(f.left(), f.cy + offset), pt(f.right(), f.cy + offset)),
        line(pt(f.cx - offset, f.top()), pt(f.cx - offset, f.bottom())),
        line(pt(f.cx + offset, f.top()), pt(f.cx + offset, f.bottom())),
    ]
}

fn percent(f: &GlyphFrame) -> Vec<Primitive> {
    let radius = f.s(1.0 / 12.0);
    vec![
        Primitive::Disc {
            center: pt(f.x + f.s(0.25), f.y + f.s(0.25)),
            radius,
        },
        Primitive::Disc {
            center: pt(f.x + f.s(0.75), f.y + f.s(0.75)),
            radius,
        },
        line(pt(f.left(), f.bottom()), pt(f.right(), f.top())),
    ]
}

fn equals(f: &GlyphFrame) -> Vec<Primitive> {
    let offset = f.s(0.125);
    vec![
        line(pt(f.left(), f.cy - offset), pt(f.right(), f.cy - offset)),
        line(pt(f.left(), f.cy + offset), pt(f.right(), f.cy + offset)),
    ]
}

fn bracket(f: &GlyphFrame) -> Vec<Primitive> {
    let spine = f.left() + f.s(0.125);
    vec![polyline(vec![
        pt(f.cx, f.top()),
        pt(spine, f.top()),
        pt(spine, f.bottom()),
        pt(f.cx, f.bottom()),
    ])]
}

fn parenthesis(f: &GlyphFrame) -> Vec<Primitive> {
    let r = f.s(0.3);
    let shift = f.s(0.125);
    vec![
        arc(pt(f.cx + shift, f.cy), r, 0.75 * PI, 1.25 * PI, false),
        arc(pt(f.cx - shift, f.cy), r, -FRAC_PI_4, FRAC_PI_4, false),
    ]
}

fn quote_mark(f: &GlyphFrame) -> Vec<Primitive> {
    let offset = f.s(0.125);
    let tail = f.top() + f.s(0.25);
    vec![
        line(pt(f.cx - offset, f.top()), pt(f.cx - offset, tail)),
        line(pt(f.cx + offset, f.top()), pt(f.cx + offset, tail)),
    ]
}

fn spiral(f: &GlyphFrame) -> Vec<Primitive> {
    let max_radius = f.s(1.0 / 3.0);
    let points = (0..36)
        .map(|step| {
            let turn = step as f32 / 36.0;
            on_circle(f.center(), turn * max_radius, turn * TAU)
        })
        .collect();
    vec![polyline(points)]
}

fn zigzag(f: &GlyphFrame) -> Vec<Primitive> {
    let step = (f.right() - f.left()) / 4.0;
    let points = (0..=4)
        .map(|i| {
            let y = if i % 2 == 0 { f.top() } else { f.bottom() };
            pt(f.left() + i as f32 * step, y)
        })
        .collect();
    vec![polyline(points)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points_of(primitive: &Primitive) -> Vec<Point> {
        match primitive {
            Primitive::Line { from, to } => vec![*from, *to],
            Primitive::Polyline { points } | Primitive::Polygon { points, .. } => points.clone(),
            Primitive::Arc { center, radius, .. } | Primitive::Disc { center, radius } => vec![
                pt(center.x - radius, center.y - radius),
                pt(center.x + radius, center.y + radius),
            ],
            Primitive::Ellipse { center, rx, ry } => vec![
                pt(center.x - rx, center.y - ry),
                pt(center.x + rx, center.y + ry),
            ],
            Primitive::Rect {
                origin,
                width,
                height,
            } => vec![*origin, pt(origin.x + width, origin.y + height)],
        }
    }

    #[test]
    fn every_builtin_stays_inside_its_cell() {
        let registry = GlyphRegistry::builtin();
        let center = pt(50.0, 80.0);
        let size = 20.0;
        for &(id, _) in BUILTIN_GLYPHS {
            let glyph = registry.geometry(id, center, size);
            assert!(!glyph.primitives.is_empty(), "{} has no geometry", id);
            for p in glyph.primitives.iter().flat_map(points_of) {
                assert!(
                    (40.0 - 1e-3..=60.0 + 1e-3).contains(&p.x)
                        && (70.0 - 1e-3..=90.0 + 1e-3).contains(&p.y),
                    "{} leaves its cell at {:?}",
                    id,
                    p
                );
            }
        }
    }

    #[test]
    fn unknown_shape_falls_back_to_dot() {
        let glyph = glyph_geometry("no_such_shape", pt(5.0, 5.0), 10.0);
        assert_eq!(glyph, glyph_geometry(FALLBACK_SHAPE, pt(5.0, 5.0), 10.0));
        assert!(matches!(
            glyph.primitives.as_slice(),
            [Primitive::Disc { radius, .. }] if (*radius - 1.25).abs() < 1e-6
        ));
    }

    #[test]
    fn stroke_width_scales_with_size() {
        assert_eq!(glyph_geometry("hash", pt(0.0, 0.0), 8.0).stroke_width, 1.5);
        assert_eq!(glyph_geometry("hash", pt(0.0, 0.0), 64.0).stroke_width, 4.0);
    }

    #[test]
    fn registry_is_open_to_extension() {
        fn bar(f: &GlyphFrame) -> Vec<Primitive> {
            vec![line(pt(f.left(), f.cy), pt(f.right(), f.cy))]
        }

        let mut registry = GlyphRegistry::with_builtins();
        assert!(!registry.contains("bar"));
        assert!(registry.register("bar", bar).is_none());
        let glyph = registry.geometry("bar", pt(10.0, 10.0), 10.0);
        assert_eq!(
            glyph.primitives,
            vec![line(pt(6.5, 10.0), pt(13.5, 10.0))]
        );
        assert!(!GlyphRegistry::builtin().contains("bar"));
    }

    #[test]
    fn arrows_point_where_named() {
        let glyph = glyph_geometry("arrow_up", pt(0.0, 0.0), 20.0);
        match &glyph.primitives[0] {
            Primitive::Line { from, to } => assert!(to.y < from.y),
            other => panic!("expected shaft, got {:?}", other),
        }
    }

    #[test]
    fn zero_size_does_not_panic() {
        for &(id, _) in BUILTIN_GLYPHS {
            let _ = glyph_geometry(id, pt(1.0, 1.0), 0.0);
        }
    }
}
