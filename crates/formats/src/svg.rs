//! Minimal SVG element tree used for vector output.

use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum SvgNode {
    Element(SvgElement),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SvgElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<SvgNode>,
}

impl SvgElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute, replacing any previous value for the same name.
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Sets the attribute only when `value` is present.
    pub fn attr_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(name, v),
            None => self,
        }
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(mut self, node: impl Into<SvgNode>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn push(&mut self, node: impl Into<SvgNode>) {
        self.children.push(node.into());
    }

    pub fn extend<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = SvgNode>,
    {
        self.children.extend(nodes);
    }

    /// Depth-first iterator over this element and every descendant element.
    pub fn descendants(&self) -> Vec<&SvgElement> {
        let mut out = vec![self];
        for child in &self.children {
            if let SvgNode::Element(e) = child {
                out.extend(e.descendants());
            }
        }
        out
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {k}=\"{}\"", escape_attr(v));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                SvgNode::Element(e) => e.write_markup(out),
                SvgNode::Comment(c) => {
                    let _ = write!(out, "<!--{}-->", c.replace("--", "- -"));
                }
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

impl From<SvgElement> for SvgNode {
    fn from(e: SvgElement) -> Self {
        SvgNode::Element(e)
    }
}

fn escape_attr(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for ch in v.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{SvgElement, SvgNode};
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_nested_markup_with_escaping() {
        let svg = SvgElement::new("svg")
            .attr("id", "map")
            .child(
                SvgElement::new("g")
                    .attr("class", "a&b")
                    .child(SvgElement::new("path").attr("d", "M0,0L1,1")),
            )
            .child(SvgNode::Comment("Line layer".to_string()));
        assert_eq!(
            svg.to_markup(),
            r#"<svg id="map"><g class="a&amp;b"><path d="M0,0L1,1"/></g><!--Line layer--></svg>"#
        );
    }

    #[test]
    fn attr_replaces_existing_and_attr_opt_skips_none() {
        let e = SvgElement::new("circle")
            .attr("r", 2)
            .attr("r", 5)
            .attr_opt("fill", None::<String>);
        assert_eq!(e.get_attr("r"), Some("5"));
        assert_eq!(e.get_attr("fill"), None);
        assert_eq!(e.attrs.len(), 1);
    }
}
