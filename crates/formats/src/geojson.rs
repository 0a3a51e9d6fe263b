use serde_json::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
    Polygon(Vec<Vec<GeoPoint>>),
    MultiPolygon(Vec<Vec<Vec<GeoPoint>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Calls `f` for every position of the geometry, in document order.
    pub fn visit_positions(&self, f: &mut dyn FnMut(GeoPoint)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().for_each(|p| f(*p)),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().for_each(|p| f(*p))
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(|p| f(*p)),
            Geometry::GeometryCollection(geoms) => {
                for g in geoms {
                    g.visit_positions(f);
                }
            }
        }
    }
}

/// A single geographic entity with its properties.
///
/// `geometry` is `None` for GeoJSON features with a `null` geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            properties: Map::new(),
            geometry: Some(geometry),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        parse_feature(value).map_err(|reason| GeoJsonError::InvalidFeature { index: 0, reason })
    }

    pub fn to_geojson_value(&self) -> Value {
        let mut fobj = Map::new();
        fobj.insert("type".to_string(), Value::String("Feature".to_string()));
        if let Some(id) = &self.id {
            fobj.insert("id".to_string(), Value::String(id.clone()));
        }
        fobj.insert(
            "properties".to_string(),
            Value::Object(self.properties.clone()),
        );
        fobj.insert(
            "geometry".to_string(),
            self.geometry
                .as_ref()
                .map(geometry_to_geojson_value)
                .unwrap_or(Value::Null),
        );
        Value::Object(fobj)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Semantic round-trip exporter: emits a GeoJSON FeatureCollection.
    /// (Property ordering may differ from the original input.)
    pub fn to_geojson_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );
        let features = self.features.iter().map(Feature::to_geojson_value).collect();
        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }
}

/// Any top-level GeoJSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoJson {
    Geometry(Geometry),
    Feature(Feature),
    FeatureCollection(FeatureCollection),
}

impl GeoJson {
    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| GeoJsonError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value.as_object().ok_or(GeoJsonError::NotGeoJson)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeoJsonError::NotGeoJson)?;

        match ty {
            "FeatureCollection" => {
                let features_val = obj
                    .get("features")
                    .and_then(|v| v.as_array())
                    .ok_or(GeoJsonError::NotGeoJson)?;
                let mut features = Vec::with_capacity(features_val.len());
                for (index, feat_val) in features_val.iter().enumerate() {
                    let feature = parse_feature(feat_val)
                        .map_err(|reason| GeoJsonError::InvalidFeature { index, reason })?;
                    features.push(feature);
                }
                Ok(GeoJson::FeatureCollection(FeatureCollection { features }))
            }
            "Feature" => Feature::from_geojson_value(value).map(GeoJson::Feature),
            _ => parse_geometry(value)
                .map(GeoJson::Geometry)
                .map_err(GeoJsonError::InvalidGeometry),
        }
    }

    /// Flattens into a feature list; a bare geometry becomes one property-less feature.
    pub fn into_features(self) -> Vec<Feature> {
        match self {
            GeoJson::Geometry(g) => vec![Feature::new(g)],
            GeoJson::Feature(f) => vec![f],
            GeoJson::FeatureCollection(fc) => fc.features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoJsonError {
    NotGeoJson,
    InvalidFeature { index: usize, reason: String },
    InvalidGeometry(String),
    Json(String),
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::NotGeoJson => write!(f, "expected a GeoJSON object with a type"),
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
            GeoJsonError::InvalidGeometry(reason) => write!(f, "invalid geometry: {reason}"),
            GeoJsonError::Json(reason) => write!(f, "JSON parse error: {reason}"),
        }
    }
}

impl std::error::Error for GeoJsonError {}

fn parse_feature(feat_val: &Value) -> Result<Feature, String> {
    let feat_obj = feat_val
        .as_object()
        .ok_or("feature must be an object".to_string())?;

    let feat_type = feat_obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("feature missing type".to_string())?;
    if feat_type != "Feature" {
        return Err(format!("unexpected feature type: {feat_type}"));
    }

    let id = match feat_obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = feat_obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let geometry = match feat_obj.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(parse_geometry(g)?),
    };

    Ok(Feature {
        id,
        properties,
        geometry,
    })
}

fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    let mut obj = Map::new();
    let (ty, coords) = match geom {
        Geometry::Point(p) => ("Point", point_coords(p)),
        Geometry::MultiPoint(ps) => ("MultiPoint", points_coords(ps)),
        Geometry::LineString(ps) => ("LineString", points_coords(ps)),
        Geometry::MultiLineString(lines) => (
            "MultiLineString",
            Value::Array(lines.iter().map(|l| points_coords(l)).collect()),
        ),
        Geometry::Polygon(rings) => (
            "Polygon",
            Value::Array(rings.iter().map(|r| points_coords(r)).collect()),
        ),
        Geometry::MultiPolygon(polys) => {
            let coords = polys
                .iter()
                .map(|poly| Value::Array(poly.iter().map(|r| points_coords(r)).collect()))
                .collect();
            ("MultiPolygon", Value::Array(coords))
        }
        Geometry::GeometryCollection(geoms) => {
            obj.insert(
                "type".to_string(),
                Value::String("GeometryCollection".to_string()),
            );
            obj.insert(
                "geometries".to_string(),
                Value::Array(geoms.iter().map(geometry_to_geojson_value).collect()),
            );
            return Value::Object(obj);
        }
    };
    obj.insert("type".to_string(), Value::String(ty.to_string()));
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn point_coords(p: &GeoPoint) -> Value {
    Value::Array(vec![Value::from(p.lon_deg), Value::from(p.lat_deg)])
}

fn points_coords(ps: &[GeoPoint]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    if ty == "GeometryCollection" {
        let geoms = obj
            .get("geometries")
            .and_then(|v| v.as_array())
            .ok_or("GeometryCollection missing geometries".to_string())?;
        let mut out = Vec::with_capacity(geoms.len());
        for g in geoms {
            out.push(parse_geometry(g)?);
        }
        return Ok(Geometry::GeometryCollection(out));
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(Geometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_lines(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_lines(coords)?)),
        "MultiPolygon" => Ok(Geometry::MultiPolygon(parse_multi_polygon(coords)?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("Point coordinates must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_point(item)?);
    }
    Ok(out)
}

fn parse_lines(coords: &Value) -> Result<Vec<Vec<GeoPoint>>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array of rings or lines".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for line in arr {
        out.push(parse_points(line)?);
    }
    Ok(out)
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Vec<GeoPoint>>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    let mut out = Vec::with_capacity(polys.len());
    for poly in polys {
        out.push(parse_lines(poly)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{GeoJson, GeoJsonError, GeoPoint, Geometry};
    use pretty_assertions::assert_eq;

    const CENTROIDS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"id": "1"},
             "geometry": {"type": "Point", "coordinates": [-1.2701895366, 54.6761414291]}},
            {"type": "Feature", "id": 7, "properties": {"id": "2"},
             "geometry": {"type": "Point", "coordinates": [-0.2689911523, 51.6801735409]}},
            {"type": "Feature", "properties": null, "geometry": null}
        ]
    }"#;

    #[test]
    fn parses_feature_collection_with_null_geometry() {
        let features = GeoJson::from_geojson_str(CENTROIDS)
            .expect("parse")
            .into_features();
        assert_eq!(features.len(), 3);
        assert_eq!(
            features[0].geometry,
            Some(Geometry::Point(GeoPoint::new(-1.2701895366, 54.6761414291)))
        );
        assert_eq!(features[1].id.as_deref(), Some("7"));
        assert_eq!(features[1].property("id").and_then(|v| v.as_str()), Some("2"));
        assert!(features[2].geometry.is_none());
        assert!(features[2].properties.is_empty());
    }

    #[test]
    fn bare_geometry_becomes_single_feature() {
        let payload = r#"{"type": "MultiLineString", "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]]}"#;
        let features = GeoJson::from_geojson_str(payload)
            .expect("parse")
            .into_features();
        assert_eq!(features.len(), 1);
        assert!(matches!(
            features[0].geometry,
            Some(Geometry::MultiLineString(ref lines)) if lines.len() == 2
        ));
    }

    #[test]
    fn reports_bad_feature_index() {
        let payload = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [0, 0]}},
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [0]}}
        ]}"#;
        let err = GeoJson::from_geojson_str(payload).expect_err("must fail");
        assert!(matches!(err, GeoJsonError::InvalidFeature { index: 1, .. }));
    }

    #[test]
    fn feature_value_export_keeps_geometry_shape() {
        let feature = GeoJson::from_geojson_str(CENTROIDS)
            .expect("parse")
            .into_features()
            .remove(0);
        let value = feature.to_geojson_value();
        assert_eq!(value["geometry"]["type"], "Point");
        assert_eq!(value["properties"]["id"], "1");
    }
}
