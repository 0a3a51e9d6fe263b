//! Zoom/pan transform value.
//!
//! Semantics follow the usual "k then t" convention: a content-space point
//! `p` is displayed at `p * k + t`.

use super::precision::round_to;

/// Uniform scale + translation applied to content space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ZoomTransform {
    pub const fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.k == 1.0
    }

    /// Content -> view.
    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        [p[0] * self.k + self.x, p[1] * self.k + self.y]
    }

    /// View -> content.
    pub fn invert(&self, p: [f64; 2]) -> [f64; 2] {
        [(p[0] - self.x) / self.k, (p[1] - self.y) / self.k]
    }

    /// Appends a translation expressed in the current (pre-scale) units.
    pub fn translate(&self, tx: f64, ty: f64) -> Self {
        Self::new(self.x + self.k * tx, self.y + self.k * ty, self.k)
    }

    /// Appends a uniform scale.
    pub fn scale(&self, s: f64) -> Self {
        Self::new(self.x, self.y, self.k * s)
    }

    /// Translates by a view-space delta.
    pub fn pan_by(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.k)
    }

    /// Rescales to `k` keeping the view-space `anchor` fixed over the same content point.
    pub fn scale_to_anchor(&self, k: f64, anchor: [f64; 2]) -> Self {
        let c = self.invert(anchor);
        Self::new(anchor[0] - c[0] * k, anchor[1] - c[1] * k, k)
    }

    /// `transform` attribute value for vector output.
    pub fn to_svg(&self) -> String {
        format!(
            "translate({},{}) scale({})",
            round_to(self.x, 3),
            round_to(self.y, 3),
            round_to(self.k, 3)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ZoomTransform;

    #[test]
    fn apply_and_invert_round_trip() {
        let t = ZoomTransform::new(10.0, -4.0, 2.5);
        let p = [3.0, 7.0];
        assert_eq!(t.apply(p), [17.5, 13.5]);
        assert_eq!(t.invert(t.apply(p)), p);
    }

    #[test]
    fn translate_then_scale_composes_like_a_chain() {
        let t = ZoomTransform::identity()
            .translate(100.0, 100.0)
            .scale(2.0)
            .translate(-50.0, -50.0);
        assert_eq!(t, ZoomTransform::new(0.0, 0.0, 2.0));
        assert_eq!(t.apply([50.0, 50.0]), [100.0, 100.0]);
    }

    #[test]
    fn svg_attribute_rounds_to_three_decimals() {
        let t = ZoomTransform::new(0.1 + 0.2, -0.0001, 1.0 / 3.0);
        assert_eq!(t.to_svg(), "translate(0.3,0) scale(0.333)");
        assert_eq!(
            ZoomTransform::new(10.0, -4.5, 2.0).to_svg(),
            "translate(10,-4.5) scale(2)"
        );
    }

    #[test]
    fn scale_to_anchor_keeps_point_fixed() {
        let t = ZoomTransform::new(5.0, 5.0, 1.0);
        let anchor = [40.0, 20.0];
        let before = t.invert(anchor);
        let z = t.scale_to_anchor(4.0, anchor);
        let after = z.invert(anchor);
        assert!((before[0] - after[0]).abs() < 1e-12);
        assert!((before[1] - after[1]).abs() < 1e-12);
        assert_eq!(z.k, 4.0);
    }
}
