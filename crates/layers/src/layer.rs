use std::cell::RefCell;
use std::rc::Rc;

use foundation::math::ZoomTransform;
use formats::{Feature, SvgNode};
use scene::{ContentSize, FeatureIndex, FittedProjection, PathGenerator};

use crate::canvas::Canvas2d;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// How every layer of a map produces output. Chosen once per context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Vector,
    Canvas,
}

/// Optional behaviour a layer opts into. Read once at registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LayerCapabilities {
    pub hit_test: bool,
}

impl LayerCapabilities {
    pub const NONE: Self = Self { hit_test: false };
    pub const HIT_TEST: Self = Self { hit_test: true };
}

/// Read-only view of the map handed to layers on every pass.
#[derive(Debug, Clone)]
pub struct LayerContext {
    /// Bumped whenever the projection is refitted; keys per-layer caches.
    pub generation: u64,
    pub path: PathGenerator,
    pub transform: ZoomTransform,
    pub mode: RenderMode,
    pub pixel_ratio: f64,
    pub content_size: ContentSize,
    pub selected_feature: Option<Feature>,
}

impl LayerContext {
    pub fn projection(&self) -> &Rc<FittedProjection> {
        self.path.projection()
    }

    pub fn zoom_scale(&self) -> f64 {
        self.transform.k
    }

    /// Divides a screen-pixel length by the zoom scale.
    pub fn unzoomed(&self, px: f64) -> f64 {
        if self.transform.k > 0.0 {
            px / self.transform.k
        } else {
            px
        }
    }
}

/// A renderable map layer.
///
/// `p` passed to `find_feature_at_point` is in content space with padding
/// removed but the zoom transform still applied.
pub trait MapLayer {
    fn id(&self) -> LayerId;

    fn z_index(&self) -> i32;

    fn capabilities(&self) -> LayerCapabilities {
        LayerCapabilities::NONE
    }

    fn render_vector(&self, ctx: &LayerContext) -> Vec<SvgNode>;

    fn draw(&self, canvas: &mut dyn Canvas2d, ctx: &LayerContext);

    fn find_feature_at_point(&self, _p: [f64; 2], _ctx: &LayerContext) -> Option<Feature> {
        None
    }
}

/// Hit-test index memoised on the context generation.
#[derive(Debug, Default)]
pub(crate) struct IndexCache {
    slot: RefCell<Option<(u64, Rc<FeatureIndex>)>>,
}

impl IndexCache {
    pub(crate) fn get_or_build(
        &self,
        generation: u64,
        build: impl FnOnce() -> FeatureIndex,
    ) -> Rc<FeatureIndex> {
        if let Some((g, index)) = self.slot.borrow().as_ref()
            && *g == generation
        {
            return index.clone();
        }
        let index = Rc::new(build());
        *self.slot.borrow_mut() = Some((generation, index.clone()));
        index
    }
}

/// Looks up the feature under `p` through a layer's cached index.
pub(crate) fn pick_feature<'a>(
    features: &'a [Feature],
    index: &FeatureIndex,
    p: [f64; 2],
    ctx: &LayerContext,
) -> Option<&'a Feature> {
    let q = ctx.transform.invert(p);
    index
        .pick(q, ctx.zoom_scale())
        .and_then(|i| features.get(i))
}
