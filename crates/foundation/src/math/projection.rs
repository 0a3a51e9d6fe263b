//! Raw cartographic projections.
//!
//! A raw projection maps `(lambda, phi)` in radians to unit-less planar
//! coordinates with y pointing north. Scaling, translation and the y flip
//! into screen space are applied by the fitted projection built on top.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::bounds::Aabb2;

const EPSILON: f64 = 1e-6;

/// Mercator is undefined at the poles; latitudes are clamped to this band.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.05112878;

pub trait RawProjection: std::fmt::Debug {
    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]>;

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]>;

    /// Divider polylines between the parts of a composite projection, in raw units.
    fn composition_borders(&self) -> Vec<Vec<[f64; 2]>> {
        Vec::new()
    }
}

fn wrap_lambda(lambda: f64) -> f64 {
    if (-PI..=PI).contains(&lambda) {
        lambda
    } else {
        (lambda + PI).rem_euclid(2.0 * PI) - PI
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Mercator {
    /// Degrees added to every longitude before projecting.
    pub rotate_deg: f64,
}

impl Mercator {
    pub fn new(rotate_deg: f64) -> Self {
        Self { rotate_deg }
    }
}

impl RawProjection for Mercator {
    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        if !lambda.is_finite() || !phi.is_finite() {
            return None;
        }
        let max = MERCATOR_MAX_LAT_DEG.to_radians();
        let phi = phi.clamp(-max, max);
        let lambda = wrap_lambda(lambda + self.rotate_deg.to_radians());
        Some([lambda, (FRAC_PI_4 + phi * 0.5).tan().ln()])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let lambda = wrap_lambda(x - self.rotate_deg.to_radians());
        Some([lambda, 2.0 * y.exp().atan() - FRAC_PI_2])
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Equirectangular {
    pub rotate_deg: f64,
}

impl Equirectangular {
    pub fn new(rotate_deg: f64) -> Self {
        Self { rotate_deg }
    }
}

impl RawProjection for Equirectangular {
    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        if !lambda.is_finite() || !phi.is_finite() {
            return None;
        }
        Some([wrap_lambda(lambda + self.rotate_deg.to_radians()), phi])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some([wrap_lambda(x - self.rotate_deg.to_radians()), y])
    }
}

/// Albers-style conic equal-area projection with two standard parallels.
///
/// Falls back to cylindrical equal-area when the parallels are symmetric
/// about the equator (the cone degenerates).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConicEqualArea {
    pub parallels_deg: [f64; 2],
    pub rotate_deg: f64,
    n: f64,
    c: f64,
    r0: f64,
    cos_phi0: f64,
}

impl ConicEqualArea {
    pub fn new(parallels_deg: [f64; 2], rotate_deg: f64) -> Self {
        let y0 = parallels_deg[0].to_radians();
        let y1 = parallels_deg[1].to_radians();
        let sy0 = y0.sin();
        let n = (sy0 + y1.sin()) * 0.5;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = if n.abs() < EPSILON { 0.0 } else { c.sqrt() / n };
        Self {
            parallels_deg,
            rotate_deg,
            n,
            c,
            r0,
            cos_phi0: y0.cos(),
        }
    }

    fn is_cylindrical(&self) -> bool {
        self.n.abs() < EPSILON
    }
}

impl RawProjection for ConicEqualArea {
    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        if !lambda.is_finite() || !phi.is_finite() {
            return None;
        }
        let lambda = wrap_lambda(lambda + self.rotate_deg.to_radians());
        if self.is_cylindrical() {
            return Some([lambda * self.cos_phi0, phi.sin() / self.cos_phi0]);
        }
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let a = lambda * self.n;
        Some([r * a.sin(), self.r0 - r * a.cos()])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (lambda, phi) = if self.is_cylindrical() {
            let s = (y * self.cos_phi0).clamp(-1.0, 1.0);
            (x / self.cos_phi0, s.asin())
        } else {
            let r0y = self.r0 - y;
            let mut l = x.atan2(r0y.abs()) * r0y.signum();
            if r0y * self.n < 0.0 {
                l -= PI * x.signum() * r0y.signum();
            }
            let s = (self.c - (x * x + r0y * r0y) * self.n * self.n) / (2.0 * self.n);
            (l / self.n, s.clamp(-1.0, 1.0).asin())
        };
        Some([wrap_lambda(lambda - self.rotate_deg.to_radians()), phi])
    }
}

/// A sub-projection drawn in place of the main one for a geographic region.
#[derive(Debug)]
pub struct CompositeInset {
    pub projection: Box<dyn RawProjection>,
    /// `[[west, south], [east, north]]` in degrees.
    pub region_deg: [[f64; 2]; 2],
    pub scale: f64,
    /// Raw-unit offset applied after scaling.
    pub offset: [f64; 2],
    extent: Option<Aabb2>,
}

impl CompositeInset {
    pub fn new(
        projection: Box<dyn RawProjection>,
        region_deg: [[f64; 2]; 2],
        scale: f64,
        offset: [f64; 2],
    ) -> Self {
        let mut inset = Self {
            projection,
            region_deg,
            scale,
            offset,
            extent: None,
        };
        inset.extent = Aabb2::from_points(inset.region_outline());
        inset
    }

    fn covers(&self, lon_deg: f64, lat_deg: f64) -> bool {
        let [[w, s], [e, n]] = self.region_deg;
        lon_deg >= w && lon_deg <= e && lat_deg >= s && lat_deg <= n
    }

    fn forward_placed(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        let p = self.projection.forward(lambda, phi)?;
        Some([
            p[0] * self.scale + self.offset[0],
            p[1] * self.scale + self.offset[1],
        ])
    }

    fn region_outline(&self) -> Vec<[f64; 2]> {
        const STEPS: usize = 8;
        let [[w, s], [e, n]] = self.region_deg;
        let corners = [[w, s], [e, s], [e, n], [w, n], [w, s]];
        let mut out = Vec::with_capacity(STEPS * 4 + 1);
        for pair in corners.windows(2) {
            for i in 0..STEPS {
                let t = i as f64 / STEPS as f64;
                let lon = pair[0][0] + (pair[1][0] - pair[0][0]) * t;
                let lat = pair[0][1] + (pair[1][1] - pair[0][1]) * t;
                if let Some(p) = self.forward_placed(lon.to_radians(), lat.to_radians()) {
                    out.push(p);
                }
            }
        }
        if let Some(first) = out.first().copied() {
            out.push(first);
        }
        out
    }

    /// Raw-space rectangle occupied by the inset.
    pub fn extent(&self) -> Option<Aabb2> {
        self.extent
    }
}

/// Main projection plus relocated insets, e.g. remote islands drawn in a box.
#[derive(Debug)]
pub struct Composite {
    pub main: Box<dyn RawProjection>,
    pub insets: Vec<CompositeInset>,
}

impl Composite {
    pub fn new(main: Box<dyn RawProjection>, insets: Vec<CompositeInset>) -> Self {
        Self { main, insets }
    }
}

impl RawProjection for Composite {
    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        let (lon, lat) = (lambda.to_degrees(), phi.to_degrees());
        match self.insets.iter().find(|i| i.covers(lon, lat)) {
            Some(inset) => inset.forward_placed(lambda, phi),
            None => self.main.forward(lambda, phi),
        }
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        for inset in &self.insets {
            let Some(extent) = inset.extent() else {
                continue;
            };
            if extent.contains([x, y]) {
                return inset.projection.inverse(
                    (x - inset.offset[0]) / inset.scale,
                    (y - inset.offset[1]) / inset.scale,
                );
            }
        }
        self.main.inverse(x, y)
    }

    fn composition_borders(&self) -> Vec<Vec<[f64; 2]>> {
        self.insets
            .iter()
            .filter_map(|inset| inset.extent())
            .map(|e| {
                let pad = e.width().max(e.height()) * 0.05;
                let e = e.expanded(pad);
                vec![
                    [e.min[0], e.min[1]],
                    [e.max[0], e.min[1]],
                    [e.max[0], e.max[1]],
                    [e.min[0], e.max[1]],
                    [e.min[0], e.min[1]],
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Composite, CompositeInset, ConicEqualArea, Equirectangular, Mercator, RawProjection,
    };

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn round_trip(p: &dyn RawProjection, lon_deg: f64, lat_deg: f64) {
        let xy = p
            .forward(lon_deg.to_radians(), lat_deg.to_radians())
            .expect("forward");
        let ll = p.inverse(xy[0], xy[1]).expect("inverse");
        assert_close(ll[0].to_degrees(), lon_deg, 1e-9);
        assert_close(ll[1].to_degrees(), lat_deg, 1e-9);
    }

    #[test]
    fn mercator_round_trip_and_equator() {
        let m = Mercator::default();
        let p = m.forward(0.0, 0.0).expect("forward");
        assert_close(p[0], 0.0, 1e-12);
        assert_close(p[1], 0.0, 1e-12);
        round_trip(&m, -3.2, 54.1);
        round_trip(&Mercator::new(20.0), 170.0, -33.0);
    }

    #[test]
    fn mercator_clamps_poles() {
        let m = Mercator::default();
        let p = m.forward(0.0, std::f64::consts::FRAC_PI_2).expect("forward");
        assert!(p[1].is_finite());
    }

    #[test]
    fn equirectangular_is_identity_in_radians() {
        let e = Equirectangular::default();
        assert_eq!(e.forward(0.5, -0.25), Some([0.5, -0.25]));
        round_trip(&e, 12.0, 40.0);
    }

    #[test]
    fn conic_equal_area_round_trip() {
        let c = ConicEqualArea::new([50.0, 60.0], 4.4);
        round_trip(&c, -1.5, 52.0);
        round_trip(&c, -6.0, 58.5);
        round_trip(&c, 1.7, 50.9);
    }

    #[test]
    fn conic_with_symmetric_parallels_falls_back_to_cylindrical() {
        let c = ConicEqualArea::new([-20.0, 20.0], 0.0);
        round_trip(&c, 30.0, 10.0);
    }

    #[test]
    fn composite_routes_inset_region_and_inverts() {
        let composite = Composite::new(
            Box::new(Equirectangular::default()),
            vec![CompositeInset::new(
                Box::new(Equirectangular::default()),
                [[10.0, 10.0], [20.0, 20.0]],
                0.5,
                [1.0, 0.0],
            )],
        );
        let inside = composite
            .forward(15f64.to_radians(), 15f64.to_radians())
            .expect("forward");
        assert_close(inside[0], 15f64.to_radians() * 0.5 + 1.0, 1e-12);
        round_trip(&composite, 15.0, 15.0);
        round_trip(&composite, -40.0, 5.0);
        assert_eq!(composite.composition_borders().len(), 1);
        assert_eq!(composite.composition_borders()[0].len(), 5);
    }
}
