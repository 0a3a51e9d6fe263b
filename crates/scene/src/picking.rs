//! Per-layer hit-testing index.
//!
//! Ordering contract:
//! - `pick` returns the topmost feature, i.e. the one drawn last (highest
//!   entry index) among all features under the point.

use foundation::bounds::Aabb2;
use foundation::math::{Vec2, distance_to_segment};
use formats::Geometry;

use crate::path::PathGenerator;
use crate::spatial::{Bvh, Item as BvhItem};

/// Hit slack for one feature, in screen pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickStyle {
    /// Distance from a line (or area outline) that still counts as a hit.
    pub tolerance: f64,
    /// Hit radius for point geometries.
    pub point_radius: f64,
}

impl Default for PickStyle {
    fn default() -> Self {
        Self {
            tolerance: 0.0,
            point_radius: crate::path::DEFAULT_POINT_RADIUS,
        }
    }
}

/// One feature to index: its position in the layer's draw order, its
/// geometry and its hit slack.
#[derive(Debug, Copy, Clone)]
pub struct PickEntry<'a> {
    pub index: usize,
    pub geometry: &'a Geometry,
    pub style: PickStyle,
}

/// A circular marker already placed in content space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Marker {
    pub index: usize,
    pub center: [f64; 2],
    /// Screen-pixel radius.
    pub radius: f64,
}

#[derive(Debug, Clone, Default)]
struct Shapes {
    rings: Vec<Vec<[f64; 2]>>,
    lines: Vec<Vec<[f64; 2]>>,
    points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone)]
struct Indexed {
    index: usize,
    shapes: Shapes,
    style: PickStyle,
}

/// Projected feature shapes plus a BVH over their content-space bounds.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    entries: Vec<Indexed>,
    bvh: Bvh,
    max_slack: f64,
}

impl FeatureIndex {
    pub fn build<'a, I>(features: I, path: &PathGenerator) -> Self
    where
        I: IntoIterator<Item = PickEntry<'a>>,
    {
        let mut entries = Vec::new();
        let mut items = Vec::new();
        let mut max_slack: f64 = 0.0;

        for entry in features {
            let mut shapes = Shapes::default();
            collect_shapes(entry.geometry, path, &mut shapes);
            let pts = shapes
                .rings
                .iter()
                .chain(&shapes.lines)
                .flatten()
                .chain(&shapes.points)
                .copied();
            let Some(bounds) = Aabb2::from_points(pts) else {
                continue;
            };
            max_slack = max_slack
                .max(entry.style.tolerance)
                .max(entry.style.point_radius);
            items.push(BvhItem {
                id: entries.len(),
                bounds,
            });
            entries.push(Indexed {
                index: entry.index,
                shapes,
                style: entry.style,
            });
        }

        Self {
            entries,
            bvh: Bvh::build(items),
            max_slack,
        }
    }

    /// Index over circular markers, e.g. a point layer's symbols.
    pub fn from_markers<I>(markers: I) -> Self
    where
        I: IntoIterator<Item = Marker>,
    {
        let mut entries = Vec::new();
        let mut items = Vec::new();
        let mut max_slack: f64 = 0.0;

        for m in markers {
            let placed = m.center[0].is_finite() && m.center[1].is_finite();
            if !placed || m.radius.is_nan() || m.radius <= 0.0 {
                continue;
            }
            max_slack = max_slack.max(m.radius);
            items.push(BvhItem {
                id: entries.len(),
                bounds: Aabb2::point(m.center),
            });
            entries.push(Indexed {
                index: m.index,
                shapes: Shapes {
                    points: vec![m.center],
                    ..Shapes::default()
                },
                style: PickStyle {
                    tolerance: 0.0,
                    point_radius: m.radius,
                },
            });
        }

        Self {
            entries,
            bvh: Bvh::build(items),
            max_slack,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry index of the topmost feature under `p`.
    ///
    /// `p` is in content space with the zoom transform already inverted;
    /// `zoom` is the current scale so pixel slack stays constant on screen.
    pub fn pick(&self, p: [f64; 2], zoom: f64) -> Option<usize> {
        if self.entries.is_empty() || !p[0].is_finite() || !p[1].is_finite() {
            return None;
        }
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        let query = Aabb2::point(p).expanded(self.max_slack / zoom);
        let mut candidates = self.bvh.query_aabb(&query);
        // Later entries are drawn on top.
        candidates.sort_unstable_by_key(|id| std::cmp::Reverse(self.entries[*id].index));
        candidates
            .into_iter()
            .map(|id| &self.entries[id])
            .find(|e| hits(&e.shapes, e.style, p, zoom))
            .map(|e| e.index)
    }
}

fn collect_shapes(geometry: &Geometry, path: &PathGenerator, out: &mut Shapes) {
    match geometry {
        Geometry::Point(p) => out.points.extend(path.projection().project_point(*p)),
        Geometry::MultiPoint(ps) => out
            .points
            .extend(ps.iter().filter_map(|p| path.projection().project_point(*p))),
        Geometry::LineString(line) => out.lines.push(path.project_line(line, false)),
        Geometry::MultiLineString(lines) => out
            .lines
            .extend(lines.iter().map(|l| path.project_line(l, false))),
        Geometry::Polygon(rings) => out
            .rings
            .extend(rings.iter().map(|r| path.project_line(r, true))),
        Geometry::MultiPolygon(polys) => out
            .rings
            .extend(polys.iter().flatten().map(|r| path.project_line(r, true))),
        Geometry::GeometryCollection(geoms) => {
            for g in geoms {
                collect_shapes(g, path, out);
            }
        }
    }
}

fn hits(shapes: &Shapes, style: PickStyle, p: [f64; 2], zoom: f64) -> bool {
    let tolerance = style.tolerance / zoom;
    let radius = style.point_radius / zoom;
    let pv = Vec2::from_array(p);

    if !shapes.rings.is_empty() && contains_even_odd(&shapes.rings, p) {
        return true;
    }
    if tolerance > 0.0 {
        let near_ring = shapes
            .rings
            .iter()
            .any(|r| near_polyline(r, pv, tolerance, true));
        if near_ring {
            return true;
        }
    }
    // Lines always get at least a hairline of slack.
    let line_slack = tolerance.max(0.5 / zoom);
    if shapes
        .lines
        .iter()
        .any(|l| near_polyline(l, pv, line_slack, false))
    {
        return true;
    }
    shapes
        .points
        .iter()
        .any(|c| (pv - Vec2::from_array(*c)).length() <= radius)
}

/// Even-odd containment across every ring, so holes punch through.
fn contains_even_odd(rings: &[Vec<[f64; 2]>], p: [f64; 2]) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (ring[i], ring[j]);
            if (a[1] > p[1]) != (b[1] > p[1])
                && p[0] < (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0]
            {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

fn near_polyline(pts: &[[f64; 2]], p: Vec2, tolerance: f64, closed: bool) -> bool {
    match pts {
        [] => false,
        [only] => (p - Vec2::from_array(*only)).length() <= tolerance,
        _ => {
            let open = pts
                .windows(2)
                .any(|s| distance_to_segment(p, Vec2::from_array(s[0]), Vec2::from_array(s[1])) <= tolerance);
            let closing = closed
                && pts.len() > 2
                && distance_to_segment(
                    p,
                    Vec2::from_array(pts[pts.len() - 1]),
                    Vec2::from_array(pts[0]),
                ) <= tolerance;
            open || closing
        }
    }
}
