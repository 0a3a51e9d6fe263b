//! Geometry to path conversion.
//!
//! One `PathGenerator` drives both outputs: `path` produces SVG `d` strings
//! and `draw` replays the same commands into any `PathSink` (a canvas).

use std::fmt::Write as _;
use std::rc::Rc;

use foundation::bounds::Aabb2;
use foundation::math::round_to;
use formats::{GeoPoint, Geometry};

use crate::projection::FittedProjection;

pub const DEFAULT_POINT_RADIUS: f64 = 4.5;

/// Receiver of path commands in content-space pixels.
pub trait PathSink {
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    /// A full circle, used for point geometries.
    fn circle(&mut self, x: f64, y: f64, r: f64);
}

/// Builds SVG path data with three-decimal coordinates.
#[derive(Debug, Default, Clone)]
pub struct SvgPathWriter {
    d: String,
}

fn num(v: f64) -> f64 {
    round_to(v, 3)
}

impl SvgPathWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }

    pub fn finish(self) -> String {
        self.d
    }
}

impl PathSink for SvgPathWriter {
    fn move_to(&mut self, x: f64, y: f64) {
        let _ = write!(self.d, "M{},{}", num(x), num(y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let _ = write!(self.d, "L{},{}", num(x), num(y));
    }

    fn close_path(&mut self) {
        self.d.push('Z');
    }

    fn circle(&mut self, x: f64, y: f64, r: f64) {
        let r = num(r);
        let _ = write!(
            self.d,
            "M{},{}m0,{r}a{r},{r} 0 1,1 0,{}a{r},{r} 0 1,1 0,{}z",
            num(x),
            num(y),
            num(-2.0 * r),
            num(2.0 * r),
        );
    }
}

/// Projects geometries and emits path commands for them.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    projection: Rc<FittedProjection>,
    point_radius: f64,
}

impl PathGenerator {
    pub fn new(projection: Rc<FittedProjection>) -> Self {
        Self {
            projection,
            point_radius: DEFAULT_POINT_RADIUS,
        }
    }

    pub fn with_point_radius(mut self, radius: f64) -> Self {
        self.point_radius = radius;
        self
    }

    pub fn point_radius(&self) -> f64 {
        self.point_radius
    }

    pub fn projection(&self) -> &Rc<FittedProjection> {
        &self.projection
    }

    /// SVG path data, or `None` when nothing projects.
    pub fn path(&self, geometry: &Geometry) -> Option<String> {
        let mut w = SvgPathWriter::new();
        self.draw(geometry, &mut w);
        (!w.is_empty()).then(|| w.finish())
    }

    pub fn draw<S: PathSink + ?Sized>(&self, geometry: &Geometry, sink: &mut S) {
        match geometry {
            Geometry::Point(p) => self.draw_point(*p, sink),
            Geometry::MultiPoint(ps) => ps.iter().for_each(|p| self.draw_point(*p, sink)),
            Geometry::LineString(line) => self.draw_line(line, sink, false),
            Geometry::MultiLineString(lines) => {
                lines.iter().for_each(|l| self.draw_line(l, sink, false))
            }
            Geometry::Polygon(rings) => rings.iter().for_each(|r| self.draw_line(r, sink, true)),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flatten()
                .for_each(|r| self.draw_line(r, sink, true)),
            Geometry::GeometryCollection(geoms) => geoms.iter().for_each(|g| self.draw(g, sink)),
        }
    }

    fn draw_point<S: PathSink + ?Sized>(&self, p: GeoPoint, sink: &mut S) {
        if let Some([x, y]) = self.projection.project_point(p) {
            sink.circle(x, y, self.point_radius);
        }
    }

    fn draw_line<S: PathSink + ?Sized>(&self, positions: &[GeoPoint], sink: &mut S, ring: bool) {
        let pts = self.project_line(positions, ring);
        let Some((first, rest)) = pts.split_first() else {
            return;
        };
        sink.move_to(first[0], first[1]);
        for p in rest {
            sink.line_to(p[0], p[1]);
        }
        if ring {
            sink.close_path();
        }
    }

    /// Projected vertices; a ring's repeated closing vertex is dropped.
    pub fn project_line(&self, positions: &[GeoPoint], ring: bool) -> Vec<[f64; 2]> {
        let mut pts: Vec<[f64; 2]> = positions
            .iter()
            .filter_map(|p| self.projection.project_point(*p))
            .collect();
        if ring && pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        pts
    }

    /// Content-space bounding box of the projected geometry.
    pub fn bounds(&self, geometry: &Geometry) -> Option<Aabb2> {
        let mut pts = Vec::new();
        geometry.visit_positions(&mut |p| {
            if let Some(xy) = self.projection.project_point(p) {
                pts.push(xy);
            }
        });
        Aabb2::from_points(pts)
    }

    /// Planar centroid in content space.
    ///
    /// Uses the highest-dimension parts present: area-weighted for polygons,
    /// length-weighted for lines, else the mean of the points.
    pub fn centroid(&self, geometry: &Geometry) -> Option<[f64; 2]> {
        let mut acc = CentroidAccumulator::default();
        self.accumulate(geometry, &mut acc);
        acc.result()
    }

    fn accumulate(&self, geometry: &Geometry, acc: &mut CentroidAccumulator) {
        match geometry {
            Geometry::Point(p) => self.accumulate_point(*p, acc),
            Geometry::MultiPoint(ps) => ps.iter().for_each(|p| self.accumulate_point(*p, acc)),
            Geometry::LineString(line) => acc.add_line(&self.project_line(line, false)),
            Geometry::MultiLineString(lines) => lines
                .iter()
                .for_each(|l| acc.add_line(&self.project_line(l, false))),
            Geometry::Polygon(rings) => rings
                .iter()
                .for_each(|r| acc.add_ring(&self.project_line(r, true))),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flatten()
                .for_each(|r| acc.add_ring(&self.project_line(r, true))),
            Geometry::GeometryCollection(geoms) => {
                geoms.iter().for_each(|g| self.accumulate(g, acc))
            }
        }
    }

    fn accumulate_point(&self, p: GeoPoint, acc: &mut CentroidAccumulator) {
        if let Some(xy) = self.projection.project_point(p) {
            acc.add_point(xy);
        }
    }
}

#[derive(Debug, Default)]
struct CentroidAccumulator {
    points: (f64, [f64; 2]),
    lines: (f64, [f64; 2]),
    // Signed: holes wound opposite to their shell subtract.
    areas: (f64, [f64; 2]),
}

impl CentroidAccumulator {
    fn add_point(&mut self, p: [f64; 2]) {
        self.points.0 += 1.0;
        self.points.1[0] += p[0];
        self.points.1[1] += p[1];
    }

    fn add_line(&mut self, pts: &[[f64; 2]]) {
        if pts.len() == 1 {
            self.add_point(pts[0]);
        }
        for seg in pts.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let len = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
            self.lines.0 += len;
            self.lines.1[0] += len * (a[0] + b[0]) * 0.5;
            self.lines.1[1] += len * (a[1] + b[1]) * 0.5;
        }
    }

    fn add_ring(&mut self, pts: &[[f64; 2]]) {
        if pts.len() < 3 {
            self.add_line(pts);
            return;
        }
        // Ring outline also feeds the line fallback for zero-area rings.
        let mut closed = pts.to_vec();
        closed.push(pts[0]);
        self.add_line(&closed);
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            let cross = a[0] * b[1] - b[0] * a[1];
            self.areas.0 += cross * 0.5;
            self.areas.1[0] += (a[0] + b[0]) * cross;
            self.areas.1[1] += (a[1] + b[1]) * cross;
        }
    }

    fn result(&self) -> Option<[f64; 2]> {
        let (area, sum) = self.areas;
        if area.abs() > 1e-12 {
            let f = 1.0 / (6.0 * area);
            return Some([sum[0] * f, sum[1] * f]);
        }
        let (len, sum) = self.lines;
        if len > 0.0 {
            return Some([sum[0] / len, sum[1] / len]);
        }
        let (n, sum) = self.points;
        (n > 0.0).then(|| [sum[0] / n, sum[1] / n])
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use foundation::math::Equirectangular;
    use formats::{GeoPoint, Geometry};
    use pretty_assertions::assert_eq;

    use super::{PathGenerator, PathSink, SvgPathWriter};
    use crate::projection::FittedProjection;

    /// Identity-like projection: one degree of longitude is one pixel.
    fn generator() -> PathGenerator {
        let k = 180.0 / std::f64::consts::PI;
        PathGenerator::new(Rc::new(FittedProjection::new(
            Rc::new(Equirectangular::default()),
            k,
            [0.0, 0.0],
        )))
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(x0, y0),
            GeoPoint::new(x0 + size, y0),
            GeoPoint::new(x0 + size, y0 + size),
            GeoPoint::new(x0, y0 + size),
            GeoPoint::new(x0, y0),
        ]
    }

    #[test]
    fn polygon_path_drops_closing_vertex() {
        let d = generator()
            .path(&Geometry::Polygon(vec![square(0.0, 0.0, 10.0)]))
            .expect("path");
        assert_eq!(d, "M0,0L10,0L10,-10L0,-10Z");
    }

    #[test]
    fn line_path_is_open() {
        let d = generator()
            .path(&Geometry::LineString(vec![
                GeoPoint::new(1.0, -1.0),
                GeoPoint::new(2.5, -3.0),
            ]))
            .expect("path");
        assert_eq!(d, "M1,1L2.5,3");
    }

    #[test]
    fn point_path_is_a_circle() {
        let d = generator()
            .with_point_radius(2.0)
            .path(&Geometry::Point(GeoPoint::new(5.0, -5.0)))
            .expect("path");
        assert_eq!(d, "M5,5m0,2a2,2 0 1,1 0,-4a2,2 0 1,1 0,4z");
    }

    #[test]
    fn empty_geometry_has_no_path() {
        assert_eq!(generator().path(&Geometry::MultiPoint(Vec::new())), None);
    }

    #[test]
    fn writer_rounds_to_three_decimals() {
        let mut w = SvgPathWriter::new();
        w.move_to(1.23456, -0.00001);
        w.line_to(2.0, 3.1);
        assert_eq!(w.finish(), "M1.235,0L2,3.1");
    }

    #[test]
    fn centroid_of_square_is_its_center() {
        let c = generator()
            .centroid(&Geometry::Polygon(vec![square(0.0, 0.0, 10.0)]))
            .expect("centroid");
        assert!((c[0] - 5.0).abs() < 1e-9);
        assert!((c[1] + 5.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_prefers_area_over_points() {
        let g = Geometry::GeometryCollection(vec![
            Geometry::Point(GeoPoint::new(100.0, 0.0)),
            Geometry::Polygon(vec![square(0.0, 0.0, 2.0)]),
        ]);
        let c = generator().centroid(&g).expect("centroid");
        assert!((c[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_cover_all_positions() {
        let b = generator()
            .bounds(&Geometry::MultiPoint(vec![
                GeoPoint::new(-3.0, 2.0),
                GeoPoint::new(4.0, -6.0),
            ]))
            .expect("bounds");
        for (got, want) in b.min.iter().chain(&b.max).zip([-3.0, -2.0, 4.0, 6.0]) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }
}
