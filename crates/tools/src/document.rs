//! JSON map documents: configuration, options and a stack of layers.
//!
//! ```json
//! {
//!   "config": { "preset": "england" },
//!   "options": { "id": "demo", "width": 600, "height": 800 },
//!   "layers": [
//!     { "kind": "polygon", "source": "regions.geojson", "style": { "fill": "#ddd" } },
//!     { "kind": "point", "source": "towns.geojson", "z_index": 2, "radius": 3 }
//!   ]
//! }
//! ```
//!
//! A string `source` is a GeoJSON file path relative to the document; an
//! object is inline GeoJSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use formats::{Feature, GeoJson, GeoJsonError};
use layers::{
    DynamicProp, FeatureStyle, LineLayer, MapLayer, PointLayer, PolygonLayer, PrerenderedLayer,
    RecordingCanvas,
};
use map::{Map, MapConfigFile, MapError, MapOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug)]
pub enum DocumentError {
    Io { path: PathBuf, reason: String },
    Json(String),
    Layer { index: usize, source: GeoJsonError },
    Selection(GeoJsonError),
    Map(MapError),
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::Io { path, reason } => write!(f, "read {}: {reason}", path.display()),
            DocumentError::Json(reason) => write!(f, "json: {reason}"),
            DocumentError::Layer { index, source } => write!(f, "layer {index}: {source}"),
            DocumentError::Selection(e) => write!(f, "selected feature: {e}"),
            DocumentError::Map(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Layer { source, .. } => Some(source),
            DocumentError::Selection(e) => Some(e),
            DocumentError::Map(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MapError> for DocumentError {
    fn from(e: MapError) -> Self {
        DocumentError::Map(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureSource {
    Path(PathBuf),
    Inline(Value),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSpec {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub class: Option<String>,
    /// Feature property copied into each element's class; wins over `class`.
    pub class_property: Option<String>,
    /// Feature property copied into each element's id.
    pub id_property: Option<String>,
}

impl StyleSpec {
    pub fn to_style(&self) -> FeatureStyle {
        let mut style = FeatureStyle::default();
        if let Some(fill) = &self.fill {
            style = style.with_fill(fill.as_str());
        }
        if let Some(stroke) = &self.stroke {
            style = style.with_stroke(stroke.as_str());
        }
        if let Some(width) = self.stroke_width {
            style = style.with_stroke_width(width);
        }
        if let Some(key) = &self.class_property {
            style = style.with_class(property_text(key));
        } else if let Some(class) = &self.class {
            style = style.with_class(class.as_str());
        }
        if let Some(key) = &self.id_property {
            style = style.with_id(property_text(key));
        }
        style
    }
}

fn property_text(key: &str) -> DynamicProp<String> {
    let key = key.to_string();
    DynamicProp::func(move |feature, _| match feature.property(&key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    Polygon {
        source: FeatureSource,
        #[serde(default)]
        z_index: i32,
        #[serde(default)]
        style: StyleSpec,
        hit_test: Option<bool>,
    },
    Line {
        source: FeatureSource,
        #[serde(default)]
        z_index: i32,
        #[serde(default)]
        style: StyleSpec,
        hit_test: Option<bool>,
    },
    Point {
        source: FeatureSource,
        #[serde(default)]
        z_index: i32,
        #[serde(default)]
        style: StyleSpec,
        hit_test: Option<bool>,
        radius: Option<f64>,
    },
    Prerendered {
        src: String,
        #[serde(default)]
        z_index: i32,
        class: Option<String>,
    },
}

impl LayerSpec {
    fn build(&self, index: usize, base_dir: &Path) -> Result<Rc<dyn MapLayer>, DocumentError> {
        let id = index as u64 + 1;
        let layer: Rc<dyn MapLayer> = match self {
            LayerSpec::Polygon {
                source,
                z_index,
                style,
                hit_test,
            } => {
                let mut layer = PolygonLayer::new(id, load_features(source, base_dir, index)?)
                    .with_z_index(*z_index)
                    .with_style(style.to_style());
                if let Some(enabled) = *hit_test {
                    layer = layer.with_hit_test(enabled);
                }
                Rc::new(layer)
            }
            LayerSpec::Line {
                source,
                z_index,
                style,
                hit_test,
            } => {
                let mut layer = LineLayer::new(id, load_features(source, base_dir, index)?)
                    .with_z_index(*z_index)
                    .with_style(style.to_style());
                if let Some(enabled) = *hit_test {
                    layer = layer.with_hit_test(enabled);
                }
                Rc::new(layer)
            }
            LayerSpec::Point {
                source,
                z_index,
                style,
                hit_test,
                radius,
            } => {
                let mut layer = PointLayer::new(id, load_features(source, base_dir, index)?)
                    .with_z_index(*z_index)
                    .with_style(style.to_style());
                if let Some(radius) = *radius {
                    layer = layer.with_radius(radius);
                }
                if let Some(enabled) = *hit_test {
                    layer = layer.with_hit_test(enabled);
                }
                Rc::new(layer)
            }
            LayerSpec::Prerendered {
                src,
                z_index,
                class,
            } => {
                let mut layer = PrerenderedLayer::new(id, src.as_str()).with_z_index(*z_index);
                if let Some(class) = class {
                    layer = layer.with_class(class.as_str());
                }
                Rc::new(layer)
            }
        };
        Ok(layer)
    }
}

fn load_features(
    source: &FeatureSource,
    base_dir: &Path,
    index: usize,
) -> Result<Vec<Feature>, DocumentError> {
    let parsed = match source {
        FeatureSource::Path(rel) => {
            let path = base_dir.join(rel);
            let payload = fs::read_to_string(&path).map_err(|e| DocumentError::Io {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            GeoJson::from_geojson_str(&payload)
        }
        FeatureSource::Inline(value) => GeoJson::from_geojson_value(value),
    };
    parsed
        .map(GeoJson::into_features)
        .map_err(|source| DocumentError::Layer { index, source })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDocument {
    pub config: MapConfigFile,
    pub options: MapOptions,
    pub layers: Vec<LayerSpec>,
    /// GeoJSON feature carried into the context as the selection.
    pub selected_feature: Option<Value>,
}

impl MapDocument {
    pub fn from_json_str(payload: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(payload).map_err(|e| DocumentError::Json(e.to_string()))
    }

    /// Reads a document; relative layer sources resolve against its directory.
    pub fn load(path: &Path) -> Result<LoadedMap, DocumentError> {
        let payload = fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&payload)?.build(base_dir)
    }

    pub fn build(&self, base_dir: &Path) -> Result<LoadedMap, DocumentError> {
        let config = self
            .config
            .clone()
            .into_configuration()
            .map_err(MapError::from)?;
        let mut map = Map::new(config, self.options.clone())?;

        if let Some(value) = &self.selected_feature {
            let feature = Feature::from_geojson_value(value).map_err(DocumentError::Selection)?;
            map.set_selected_feature(Some(feature))?;
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        for (index, spec) in self.layers.iter().enumerate() {
            let layer = spec.build(index, base_dir)?;
            map.register_layer(&layer);
            layers.push(layer);
        }
        debug!(
            id = %map.options().id,
            layers = layers.len(),
            "map document loaded"
        );

        Ok(LoadedMap { map, layers })
    }
}

/// A built map plus the layers registered on it.
pub struct LoadedMap {
    pub map: Map,
    /// The registry only holds weak references; these keep the layers alive.
    pub layers: Vec<Rc<dyn MapLayer>>,
}

impl LoadedMap {
    pub fn svg_markup(&self) -> String {
        self.map.render_svg().to_markup()
    }

    /// Canvas pass recorded as a JSON array of draw commands.
    pub fn display_list(&self) -> Result<String, DocumentError> {
        let mut canvas = RecordingCanvas::new();
        self.map.draw_canvas(&mut canvas);
        serde_json::to_string_pretty(canvas.commands())
            .map_err(|e| DocumentError::Json(e.to_string()))
    }

    /// The topmost feature under container point `(x, y)`, as GeoJSON.
    pub fn pick(&self, x: f64, y: f64) -> Option<Value> {
        self.map
            .find_feature_at_point(x, y)
            .map(|feature| feature.to_geojson_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// 120x120 container, 10px padding, one degree per ten content pixels.
    fn document(layers: Value) -> MapDocument {
        let doc = serde_json::json!({
            "config": {
                "projection": { "type": "equirectangular" },
                "bounds": [[0.0, 0.0], [10.0, 10.0]]
            },
            "options": {
                "id": "doc-map",
                "width": 120.0,
                "height": 120.0,
                "padding": { "top": 10.0, "right": 10.0, "bottom": 10.0, "left": 10.0 }
            },
            "layers": layers
        });
        MapDocument::from_json_str(&doc.to_string()).expect("document")
    }

    fn halves() -> Value {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "west", "kind": "land"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[5,0],[5,10],[0,10],[0,0]]]}},
                {"type": "Feature", "properties": {"name": "east", "kind": "sea"},
                 "geometry": {"type": "Polygon", "coordinates": [[[5,0],[10,0],[10,10],[5,10],[5,0]]]}}
            ]
        })
    }

    fn picked_name(loaded: &LoadedMap, x: f64, y: f64) -> Option<String> {
        let feature = loaded.pick(x, y)?;
        feature["properties"]["name"].as_str().map(str::to_string)
    }

    #[test]
    fn inline_layers_are_registered_and_pickable() {
        let doc = document(serde_json::json!([
            { "kind": "polygon", "source": halves(), "style": { "fill": "#eee" } }
        ]));
        let loaded = doc.build(Path::new(".")).expect("build");
        assert_eq!(loaded.map.layer_count(), 1);
        assert_eq!(picked_name(&loaded, 30.0, 60.0).as_deref(), Some("west"));
        assert_eq!(picked_name(&loaded, 90.0, 60.0).as_deref(), Some("east"));
        assert_eq!(loaded.pick(2.0, 2.0), None);
    }

    #[test]
    fn property_driven_class_and_id() {
        let doc = document(serde_json::json!([
            {
                "kind": "polygon",
                "source": halves(),
                "style": { "class": "ignored", "class_property": "kind", "id_property": "name" }
            }
        ]));
        let markup = doc.build(Path::new(".")).expect("build").svg_markup();
        assert!(markup.starts_with("<svg id=\"doc-map\""), "{markup}");
        assert!(markup.contains("id=\"west\""));
        assert!(markup.contains("class=\"land\""));
        assert!(markup.contains("class=\"sea\""));
        assert!(!markup.contains("ignored"));
    }

    #[test]
    fn line_layers_need_hit_test_opt_in() {
        let line = serde_json::json!({
            "type": "Feature", "properties": {"name": "equator"},
            "geometry": {"type": "LineString", "coordinates": [[0,5],[10,5]]}
        });
        let plain = document(serde_json::json!([{ "kind": "line", "source": line.clone() }]));
        let loaded = plain.build(Path::new(".")).expect("build");
        assert_eq!(loaded.pick(60.0, 60.0), None);

        let probed = document(serde_json::json!([
            { "kind": "line", "source": line, "hit_test": true }
        ]));
        let loaded = probed.build(Path::new(".")).expect("build");
        assert_eq!(picked_name(&loaded, 60.0, 61.0).as_deref(), Some("equator"));
    }

    #[test]
    fn display_list_records_canvas_pass() {
        let mut doc = document(serde_json::json!([
            { "kind": "prerendered", "src": "relief.png", "class": "relief" },
            { "kind": "point", "source": halves(), "z_index": 1, "radius": 2.0 }
        ]));
        doc.config.draw_to_canvas = Some(true);
        let loaded = doc.build(Path::new(".")).expect("build");
        let list: Value =
            serde_json::from_str(&loaded.display_list().expect("list")).expect("json");
        let ops: Vec<&str> = list
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|c| c["op"].as_str())
            .collect();
        assert_eq!(ops.first(), Some(&"save"));
        assert_eq!(ops.last(), Some(&"restore"));
        let image = ops.iter().position(|op| *op == "draw_image").expect("image");
        let arc = ops.iter().position(|op| *op == "arc").expect("marker");
        assert!(image < arc, "background draws below markers");
    }

    #[test]
    fn selected_feature_is_carried_into_context() {
        let mut doc = document(serde_json::json!([]));
        doc.selected_feature = Some(serde_json::json!({
            "type": "Feature", "id": "s1", "properties": {},
            "geometry": {"type": "Point", "coordinates": [1, 1]}
        }));
        let loaded = doc.build(Path::new(".")).expect("build");
        let selected = loaded.map.context().selected_feature().expect("selected");
        assert_eq!(selected.id.as_deref(), Some("s1"));
    }

    #[test]
    fn file_sources_resolve_against_the_document() {
        let dir = std::env::temp_dir().join(format!("mapkit-doc-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join("halves.geojson"), halves().to_string()).expect("geojson");
        let doc = document(serde_json::json!([
            { "kind": "polygon", "source": "halves.geojson" }
        ]));
        fs::write(
            dir.join("map.json"),
            serde_json::to_string(&doc).expect("serialize"),
        )
        .expect("doc");

        let loaded = MapDocument::load(&dir.join("map.json")).expect("load");
        assert_eq!(picked_name(&loaded, 90.0, 60.0).as_deref(), Some("east"));

        let missing = document(serde_json::json!([
            { "kind": "polygon", "source": "nope.geojson" }
        ]));
        let err = missing.build(&dir).err().expect("missing file");
        assert!(matches!(err, DocumentError::Io { .. }), "{err}");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn errors_name_their_cause() {
        let doc = document(serde_json::json!([
            { "kind": "polygon", "source": halves() },
            { "kind": "polygon", "source": { "type": "Nonsense" } }
        ]));
        let err = doc.build(Path::new(".")).err().expect("bad layer");
        assert!(matches!(err, DocumentError::Layer { index: 1, .. }), "{err}");

        let mut doc = document(serde_json::json!([]));
        doc.config.projection = None;
        let err = doc.build(Path::new(".")).err().expect("no projection");
        assert_eq!(err.to_string(), "map configuration has no projection");

        assert!(matches!(
            MapDocument::from_json_str("{\"layers\": [{\"kind\": \"hexagon\"}]}"),
            Err(DocumentError::Json(_))
        ));
    }
}
