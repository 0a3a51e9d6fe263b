use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use foundation::math::ZoomTransform;
use formats::Feature;
use layers::{LayerContext, LayerRegistry, MapLayer, RenderMode};
use scene::{ContentSize, FittedProjection, PathGenerator, fit};
use tracing::debug;

use crate::config::{MapConfiguration, MapOptions, Padding};
use crate::error::MapError;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Description of the element the map renders into.
#[derive(Debug, Clone, PartialEq)]
pub struct MapContainer {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
    pub mode: RenderMode,
}

impl MapContainer {
    /// Backing-store size of a canvas container, in device pixels.
    pub fn canvas_size(&self) -> [u32; 2] {
        [
            (self.width * self.pixel_ratio).round().max(0.0) as u32,
            (self.height * self.pixel_ratio).round().max(0.0) as u32,
        ]
    }
}

/// Everything layers and external callers need for one map instance.
///
/// Built from the configuration and options; rebuilt, never patched, when
/// size, padding, configuration or selection change. Only the zoom
/// transform is updated in place.
#[derive(Debug, Clone)]
pub struct MapContext {
    pub id: String,
    pub config: Rc<MapConfiguration>,
    pub size: [f64; 2],
    pub content_size: ContentSize,
    pub padding: Padding,
    /// Container rectangle in which gestures are recognised.
    pub extent: [[f64; 2]; 2],
    view: LayerContext,
    registry: Rc<RefCell<LayerRegistry>>,
}

impl MapContext {
    pub fn build(
        config: Rc<MapConfiguration>,
        options: &MapOptions,
        transform: ZoomTransform,
        registry: Rc<RefCell<LayerRegistry>>,
    ) -> Result<Self, MapError> {
        options.validate()?;
        let content_size = options.content_size();
        let projection = fit(config.projection.clone(), content_size, &config.bounds)?;
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        debug!(
            id = %options.id,
            width = options.width,
            height = options.height,
            content_width = content_size.width,
            content_height = content_size.height,
            scale = projection.scale(),
            translate_x = projection.translate()[0],
            translate_y = projection.translate()[1],
            generation,
            "map context built"
        );

        let mode = if config.draw_to_canvas {
            RenderMode::Canvas
        } else {
            RenderMode::Vector
        };
        let view = LayerContext {
            generation,
            path: PathGenerator::new(Rc::new(projection)),
            transform,
            mode,
            pixel_ratio: options.pixel_ratio,
            content_size,
            selected_feature: options.selected_feature.clone(),
        };

        Ok(Self {
            id: options.id.clone(),
            config,
            size: [options.width, options.height],
            content_size,
            padding: options.padding,
            extent: [[0.0, 0.0], [options.width, options.height]],
            view,
            registry,
        })
    }

    pub fn projection(&self) -> &Rc<FittedProjection> {
        self.view.projection()
    }

    pub fn path(&self) -> &PathGenerator {
        &self.view.path
    }

    pub fn mode(&self) -> RenderMode {
        self.view.mode
    }

    pub fn transform(&self) -> ZoomTransform {
        self.view.transform
    }

    pub fn get_zoom_scale(&self) -> f64 {
        self.view.transform.k
    }

    pub fn selected_feature(&self) -> Option<&Feature> {
        self.view.selected_feature.as_ref()
    }

    /// The view handed to layers on every pass.
    pub fn layer_context(&self) -> &LayerContext {
        &self.view
    }

    pub(crate) fn set_transform(&mut self, transform: ZoomTransform) {
        self.view.transform = transform;
    }

    pub fn register_layer(&self, layer: &Rc<dyn MapLayer>) -> bool {
        self.registry.borrow_mut().register(layer)
    }

    pub fn unregister_layer(&self, layer: &Rc<dyn MapLayer>) -> bool {
        self.registry.borrow_mut().unregister(layer)
    }

    /// Layers bottom first.
    pub fn draw_order(&self) -> Vec<Rc<dyn MapLayer>> {
        self.registry.borrow().draw_order()
    }

    /// Feature under a container-relative point, probing layers top first.
    pub fn find_feature_at_point(&self, x: f64, y: f64) -> Option<Feature> {
        let adjusted = [x - self.padding.left, y - self.padding.top];
        // Release the registry before calling into layers.
        let layers = self.registry.borrow().hit_test_layers();
        layers
            .iter()
            .find_map(|layer| layer.find_feature_at_point(adjusted, &self.view))
    }

    /// `[south_west, north_east]` corners of the visible area as
    /// `[lon, lat]`, after undoing the zoom transform.
    pub fn visible_bounds(&self) -> Option<[[f64; 2]; 2]> {
        let t = self.view.transform;
        let projection = self.projection();
        let sw = projection.invert(t.invert([0.0, self.content_size.height]))?;
        let ne = projection.invert(t.invert([self.content_size.width, 0.0]))?;
        Some([sw, ne])
    }
}
