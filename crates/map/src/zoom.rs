//! Zoom/pan behaviour.
//!
//! The host's gesture recogniser reports pointer and wheel events; this
//! module only integrates them into a `ZoomTransform`. Scale is clamped to
//! `[min_zoom, max_zoom]`. Translation is left unbounded; `extent` only
//! limits where gestures start.

use foundation::bounds::Aabb2;
use foundation::math::ZoomTransform;
use scene::ContentSize;
use tracing::{debug, trace, warn};

use crate::config::ZoomOptions;

/// Upper bound for `fit_bounds` regardless of the zoom options.
pub const FIT_MAX_SCALE: f64 = 8.0;
/// Fraction of the viewport the fitted bounds may occupy.
pub const FIT_PADDING_FACTOR: f64 = 0.9;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WheelDeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl WheelDeltaMode {
    fn factor(self) -> f64 {
        match self {
            WheelDeltaMode::Pixel => 0.002,
            WheelDeltaMode::Line => 0.05,
            WheelDeltaMode::Page => 1.0,
        }
    }
}

/// Positions are container-relative pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GestureEvent {
    PanStart { pos: [f64; 2] },
    PanMove { pos: [f64; 2] },
    PanEnd,
    Wheel {
        pos: [f64; 2],
        delta_y: f64,
        mode: WheelDeltaMode,
    },
    /// Multiplies the scale by `factor` about `center` (pinch).
    Pinch { center: [f64; 2], factor: f64 },
    /// End of a wheel burst or pinch.
    ZoomEnd,
    DoubleClick { pos: [f64; 2] },
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum ZoomState {
    #[default]
    Idle,
    Panning {
        last: [f64; 2],
    },
    Zooming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomBehaviour {
    options: ZoomOptions,
    /// Container rectangle in which gestures are recognised.
    extent: Aabb2,
    /// Container position of the content origin (the padding offset).
    origin: [f64; 2],
    transform: ZoomTransform,
    state: ZoomState,
}

impl ZoomBehaviour {
    pub fn new(options: ZoomOptions, extent: Aabb2, origin: [f64; 2]) -> Self {
        Self {
            options,
            extent,
            origin,
            transform: ZoomTransform::identity(),
            state: ZoomState::Idle,
        }
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn state(&self) -> ZoomState {
        self.state
    }

    pub fn options(&self) -> &ZoomOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    /// New extent and origin after a resize; the transform is kept.
    pub fn set_geometry(&mut self, extent: Aabb2, origin: [f64; 2]) {
        self.extent = extent;
        self.origin = origin;
    }

    pub fn set_options(&mut self, options: ZoomOptions) {
        self.options = options;
        let k = self.clamp_scale(self.transform.k);
        if k != self.transform.k {
            self.transform = self.transform.scale_to_anchor(k, [0.0, 0.0]);
        }
    }

    /// Integrates one gesture tick and returns the resulting transform.
    pub fn apply(&mut self, event: GestureEvent) -> ZoomTransform {
        if !self.options.enabled {
            warn!(?event, "gesture ignored: zoom disabled");
            return self.transform;
        }

        match event {
            GestureEvent::PanStart { pos } => {
                if self.extent.contains(pos) {
                    self.state = ZoomState::Panning { last: pos };
                }
            }
            GestureEvent::PanMove { pos } => {
                if let ZoomState::Panning { last } = self.state {
                    self.transform = self.transform.pan_by(pos[0] - last[0], pos[1] - last[1]);
                    self.state = ZoomState::Panning { last: pos };
                }
            }
            GestureEvent::PanEnd => {
                if matches!(self.state, ZoomState::Panning { .. }) {
                    self.state = ZoomState::Idle;
                }
            }
            GestureEvent::Wheel {
                pos,
                delta_y,
                mode,
            } => {
                if self.extent.contains(pos) && delta_y.is_finite() {
                    self.state = ZoomState::Zooming;
                    let factor = (-delta_y * mode.factor()).exp2();
                    self.zoom_about(self.transform.k * factor, pos);
                }
            }
            GestureEvent::Pinch { center, factor } => {
                if self.extent.contains(center) && factor.is_finite() && factor > 0.0 {
                    self.state = ZoomState::Zooming;
                    self.zoom_about(self.transform.k * factor, center);
                }
            }
            GestureEvent::ZoomEnd => {
                if self.state == ZoomState::Zooming {
                    self.state = ZoomState::Idle;
                }
            }
            GestureEvent::DoubleClick { pos } => {
                if self.extent.contains(pos) {
                    self.zoom_about(self.transform.k * 2.0, pos);
                }
            }
        }

        trace!(
            x = self.transform.x,
            y = self.transform.y,
            k = self.transform.k,
            state = ?self.state,
            "zoom tick"
        );
        self.transform
    }

    /// Scales by `factor` about the centre of the extent.
    pub fn zoom_by(&mut self, factor: f64) -> ZoomTransform {
        if !self.options.enabled || !factor.is_finite() || factor <= 0.0 {
            return self.transform;
        }
        let center = self.extent.center();
        self.zoom_about(self.transform.k * factor, center);
        self.transform
    }

    pub fn reset(&mut self) -> ZoomTransform {
        self.transform = ZoomTransform::identity();
        self.state = ZoomState::Idle;
        self.transform
    }

    /// Replaces the transform so `bounds` fits inside `viewport`.
    ///
    /// Only the 8x cap applies, so bounds larger than the viewport may
    /// leave the scale below `min_zoom`. A no-op returning the current
    /// transform while zoom is disabled.
    pub fn fit_bounds(&mut self, bounds: [[f64; 2]; 2], viewport: ContentSize) -> ZoomTransform {
        if !self.options.enabled {
            return self.transform;
        }
        self.transform = fit_bounds(bounds, viewport);
        self.state = ZoomState::Idle;
        debug!(
            x = self.transform.x,
            y = self.transform.y,
            k = self.transform.k,
            "fit bounds"
        );
        self.transform
    }

    fn zoom_about(&mut self, k: f64, container_pos: [f64; 2]) {
        let anchor = [
            container_pos[0] - self.origin[0],
            container_pos[1] - self.origin[1],
        ];
        let k = self.clamp_scale(k);
        self.transform = self.transform.scale_to_anchor(k, anchor);
    }

    fn clamp_scale(&self, k: f64) -> f64 {
        // f64::clamp panics on NaN or inverted bounds.
        k.max(self.options.min_zoom).min(self.options.max_zoom)
    }
}

/// Transform centring `bounds` (content space) in `viewport` and scaling it
/// to 90% of the limiting dimension, capped at 8x.
///
/// Pure: independent of any previous transform.
pub fn fit_bounds(bounds: [[f64; 2]; 2], viewport: ContentSize) -> ZoomTransform {
    let [[x0, y0], [x1, y1]] = bounds;
    let ratio = ((x1 - x0).abs() / viewport.width).max((y1 - y0).abs() / viewport.height);
    let k = (FIT_PADDING_FACTOR / ratio).min(FIT_MAX_SCALE);
    if !k.is_finite() || k <= 0.0 {
        return ZoomTransform::identity();
    }
    centered(bounds, viewport, k)
}

fn centered(bounds: [[f64; 2]; 2], viewport: ContentSize, k: f64) -> ZoomTransform {
    let [[x0, y0], [x1, y1]] = bounds;
    ZoomTransform::identity()
        .translate(viewport.width / 2.0, viewport.height / 2.0)
        .scale(k)
        .translate(-(x0 + x1) / 2.0, -(y0 + y1) / 2.0)
}

#[cfg(test)]
mod tests {
    use foundation::bounds::Aabb2;
    use foundation::math::ZoomTransform;
    use scene::ContentSize;

    use super::{GestureEvent, WheelDeltaMode, ZoomBehaviour, ZoomState, fit_bounds};
    use crate::config::ZoomOptions;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn behaviour() -> ZoomBehaviour {
        ZoomBehaviour::new(
            ZoomOptions {
                enabled: true,
                ..ZoomOptions::default()
            },
            Aabb2::new([0.0, 0.0], [200.0, 200.0]),
            [0.0, 0.0],
        )
    }

    #[test]
    fn fit_bounds_centres_and_scales() {
        let t = fit_bounds([[0.0, 0.0], [100.0, 100.0]], ContentSize::new(200.0, 200.0));
        assert_close(t.k, 1.8, 1e-12);
        assert_close(t.x, 10.0, 1e-9);
        assert_close(t.y, 10.0, 1e-9);
        let c = t.apply([50.0, 50.0]);
        assert_close(c[0], 100.0, 1e-9);
        assert_close(c[1], 100.0, 1e-9);
    }

    #[test]
    fn fit_bounds_caps_scale_at_eight() {
        let t = fit_bounds([[10.0, 10.0], [11.0, 11.0]], ContentSize::new(200.0, 200.0));
        assert_close(t.k, 8.0, 1e-12);
        let c = t.apply([10.5, 10.5]);
        assert_close(c[0], 100.0, 1e-9);
    }

    #[test]
    fn fit_bounds_is_noop_when_disabled() {
        let mut zoom = ZoomBehaviour::new(
            ZoomOptions::default(),
            Aabb2::new([0.0, 0.0], [200.0, 200.0]),
            [0.0, 0.0],
        );
        let t = zoom.fit_bounds([[0.0, 0.0], [100.0, 100.0]], ContentSize::new(200.0, 200.0));
        assert_eq!(t, ZoomTransform::identity());
        let t = zoom.apply(GestureEvent::DoubleClick { pos: [10.0, 10.0] });
        assert_eq!(t, ZoomTransform::identity());
    }

    #[test]
    fn pan_integrates_deltas() {
        let mut zoom = behaviour();
        zoom.apply(GestureEvent::PanStart { pos: [10.0, 10.0] });
        zoom.apply(GestureEvent::PanMove { pos: [15.0, 12.0] });
        let t = zoom.apply(GestureEvent::PanMove { pos: [25.0, 2.0] });
        assert_eq!(t, ZoomTransform::new(15.0, -8.0, 1.0));
        zoom.apply(GestureEvent::PanEnd);
        assert_eq!(zoom.state(), ZoomState::Idle);
        // Moves without an active pan are ignored.
        let t = zoom.apply(GestureEvent::PanMove { pos: [100.0, 100.0] });
        assert_eq!(t, ZoomTransform::new(15.0, -8.0, 1.0));
    }

    #[test]
    fn pan_is_not_clamped() {
        let mut zoom = behaviour();
        zoom.apply(GestureEvent::PanStart { pos: [100.0, 100.0] });
        let t = zoom.apply(GestureEvent::PanMove { pos: [-5000.0, 100.0] });
        assert_eq!(t.x, -5100.0);
    }

    #[test]
    fn gestures_outside_extent_do_not_start() {
        let mut zoom = behaviour();
        zoom.apply(GestureEvent::PanStart { pos: [300.0, 10.0] });
        assert_eq!(zoom.state(), ZoomState::Idle);
        let t = zoom.apply(GestureEvent::Wheel {
            pos: [-1.0, 10.0],
            delta_y: -500.0,
            mode: WheelDeltaMode::Pixel,
        });
        assert_eq!(t, ZoomTransform::identity());
    }

    #[test]
    fn wheel_zooms_about_pointer_and_clamps() {
        let mut zoom = behaviour();
        // -500 px * 0.002 = one doubling.
        let t = zoom.apply(GestureEvent::Wheel {
            pos: [50.0, 50.0],
            delta_y: -500.0,
            mode: WheelDeltaMode::Pixel,
        });
        assert_close(t.k, 2.0, 1e-12);
        let p = t.invert([50.0, 50.0]);
        assert_close(p[0], 50.0, 1e-9);
        assert_eq!(zoom.state(), ZoomState::Zooming);

        for _ in 0..10 {
            zoom.apply(GestureEvent::Wheel {
                pos: [50.0, 50.0],
                delta_y: -3.0,
                mode: WheelDeltaMode::Page,
            });
        }
        assert_close(zoom.transform().k, 8.0, 1e-12);

        let t = zoom.apply(GestureEvent::Wheel {
            pos: [50.0, 50.0],
            delta_y: 100.0,
            mode: WheelDeltaMode::Line,
        });
        assert_close(t.k, 1.0, 1e-12);
        zoom.apply(GestureEvent::ZoomEnd);
        assert_eq!(zoom.state(), ZoomState::Idle);
    }

    #[test]
    fn double_click_doubles_and_reset_restores_identity() {
        let mut zoom = behaviour();
        let t = zoom.apply(GestureEvent::DoubleClick { pos: [100.0, 100.0] });
        assert_close(t.k, 2.0, 1e-12);
        assert_eq!(t.apply([100.0, 100.0]), [100.0, 100.0]);
        let t = zoom.zoom_by(1.5);
        assert_close(t.k, 3.0, 1e-12);
        assert_eq!(zoom.reset(), ZoomTransform::identity());
    }

    #[test]
    fn last_write_wins() {
        let mut zoom = behaviour();
        zoom.apply(GestureEvent::DoubleClick { pos: [0.0, 0.0] });
        let fitted = zoom.fit_bounds([[0.0, 0.0], [100.0, 100.0]], ContentSize::new(200.0, 200.0));
        assert_eq!(zoom.transform(), fitted);
        let panned = zoom.apply(GestureEvent::Pinch {
            center: [100.0, 100.0],
            factor: 0.5,
        });
        assert_close(panned.k, 1.0, 1e-12);
    }

    #[test]
    fn fit_bounds_shrinks_below_min_zoom() {
        let mut zoom = behaviour();
        let viewport = ContentSize::new(200.0, 200.0);
        let t = zoom.fit_bounds([[0.0, 0.0], [1000.0, 1000.0]], viewport);
        assert_eq!(t, fit_bounds([[0.0, 0.0], [1000.0, 1000.0]], viewport));
        assert_close(t.k, 0.18, 1e-12);

        // Both corners land inside the viewport, the centre in the middle.
        let c = t.apply([500.0, 500.0]);
        assert_close(c[0], 100.0, 1e-9);
        assert_close(c[1], 100.0, 1e-9);
        let far = t.apply([1000.0, 1000.0]);
        assert!(far[0] <= 200.0 && far[1] <= 200.0, "{far:?}");
        let near = t.apply([0.0, 0.0]);
        assert!(near[0] >= 0.0 && near[1] >= 0.0, "{near:?}");
    }
}
