//! Per-feature style properties.

use std::fmt;
use std::rc::Rc;

use formats::{Feature, SvgElement};

/// A style value that is either fixed or computed from `(feature, index)`.
///
/// A function returning `None` leaves the property unset for that feature.
pub enum DynamicProp<T> {
    Constant(T),
    Func(Rc<dyn Fn(&Feature, usize) -> Option<T>>),
}

impl<T: Clone> DynamicProp<T> {
    pub fn func(f: impl Fn(&Feature, usize) -> Option<T> + 'static) -> Self {
        DynamicProp::Func(Rc::new(f))
    }

    pub fn resolve(&self, feature: &Feature, index: usize) -> Option<T> {
        match self {
            DynamicProp::Constant(v) => Some(v.clone()),
            DynamicProp::Func(f) => f(feature, index),
        }
    }
}

impl<T> From<T> for DynamicProp<T> {
    fn from(v: T) -> Self {
        DynamicProp::Constant(v)
    }
}

impl From<&str> for DynamicProp<String> {
    fn from(v: &str) -> Self {
        DynamicProp::Constant(v.to_string())
    }
}

impl<T: Clone> Clone for DynamicProp<T> {
    fn clone(&self) -> Self {
        match self {
            DynamicProp::Constant(v) => DynamicProp::Constant(v.clone()),
            DynamicProp::Func(f) => DynamicProp::Func(f.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicProp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicProp::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            DynamicProp::Func(_) => f.write_str("Func(..)"),
        }
    }
}

fn resolve_opt<T: Clone>(prop: &Option<DynamicProp<T>>, feature: &Feature, index: usize) -> Option<T> {
    prop.as_ref().and_then(|p| p.resolve(feature, index))
}

/// Paint and markup properties shared by the vector layers.
#[derive(Debug, Clone)]
pub struct FeatureStyle {
    pub fill: Option<DynamicProp<String>>,
    pub stroke: Option<DynamicProp<String>>,
    pub stroke_width: Option<DynamicProp<f64>>,
    /// CSS class of the emitted element.
    pub class: Option<DynamicProp<String>>,
    /// Element id of the emitted element.
    pub id: Option<DynamicProp<String>>,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: Some(DynamicProp::Constant(1.0)),
            class: None,
            id: None,
        }
    }
}

impl FeatureStyle {
    pub fn with_fill(mut self, fill: impl Into<DynamicProp<String>>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_stroke(mut self, stroke: impl Into<DynamicProp<String>>) -> Self {
        self.stroke = Some(stroke.into());
        self
    }

    pub fn with_stroke_width(mut self, width: impl Into<DynamicProp<f64>>) -> Self {
        self.stroke_width = Some(width.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<DynamicProp<String>>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<DynamicProp<String>>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn resolve(&self, feature: &Feature, index: usize) -> ResolvedStyle {
        ResolvedStyle {
            fill: resolve_opt(&self.fill, feature, index),
            stroke: resolve_opt(&self.stroke, feature, index),
            stroke_width: resolve_opt(&self.stroke_width, feature, index),
            class: resolve_opt(&self.class, feature, index),
            id: resolve_opt(&self.id, feature, index),
        }
    }
}

/// `FeatureStyle` evaluated for one feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub class: Option<String>,
    pub id: Option<String>,
}

impl ResolvedStyle {
    /// Writes id, class, stroke and the zoom-compensated stroke width.
    pub fn apply_to(&self, el: SvgElement, zoom: f64) -> SvgElement {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        el.attr_opt("id", self.id.as_deref())
            .attr_opt("class", self.class.as_deref())
            .attr_opt("stroke", self.stroke.as_deref())
            .attr_opt(
                "stroke-width",
                self.stroke_width.map(|w| format_number(w / zoom)).as_deref(),
            )
    }
}

/// Number formatting for markup attributes: at most three decimals.
pub fn format_number(v: f64) -> String {
    foundation::math::round_to(v, 3).to_string()
}

#[cfg(test)]
mod tests {
    use formats::{Feature, GeoPoint, Geometry, SvgElement};
    use pretty_assertions::assert_eq;

    use super::{DynamicProp, FeatureStyle, format_number};

    fn feature() -> Feature {
        Feature::new(Geometry::Point(GeoPoint::new(0.0, 0.0))).with_property("party", "green")
    }

    #[test]
    fn constant_and_function_props_resolve() {
        let f = feature();
        assert_eq!(DynamicProp::from(3.0).resolve(&f, 7), Some(3.0));

        let by_party = DynamicProp::func(|f: &Feature, _| {
            f.property("party")
                .and_then(|v| v.as_str())
                .map(|p| format!("fill-{p}"))
        });
        assert_eq!(by_party.resolve(&f, 0).as_deref(), Some("fill-green"));

        let odd_only = DynamicProp::func(|_: &Feature, i| (i % 2 == 1).then_some(i));
        assert_eq!(odd_only.resolve(&f, 2), None);
        assert_eq!(odd_only.resolve(&f, 3), Some(3));
    }

    #[test]
    fn resolved_style_writes_scaled_stroke_width() {
        let style = FeatureStyle::default()
            .with_stroke("#333")
            .with_stroke_width(1.5)
            .with_class("region");
        let resolved = style.resolve(&feature(), 0);
        let el = resolved.apply_to(SvgElement::new("path"), 2.0);
        assert_eq!(el.get_attr("stroke-width"), Some("0.75"));
        assert_eq!(el.get_attr("class"), Some("region"));
        assert_eq!(el.get_attr("id"), None);
    }

    #[test]
    fn numbers_format_without_trailing_zeros() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.33333), "0.333");
        assert_eq!(format_number(-0.0001), "0");
    }
}
