//! XML round-trip metadata attached to model nodes.
//!
//! Nodes decoded from XML carry an [`XmlFidelity`] recording how the source
//! element was spelled: the namespace prefix on its name, the namespace
//! declarations written on it, the order of its attributes, comments that
//! directly preceded it and whether its text was a CDATA section. None of
//! this is semantic content. Equality ignores it, JSON never sees it and the
//! XML encoder falls back to its defaults wherever it is absent.
//!
//! Elements without a model node of their own (text leaves such as
//! `DocumentTitle`, containers such as `ProductStatuses`) are recorded in an
//! [`XmlLayout`] keyed by element path instead.

use std::collections::BTreeMap;
use std::fmt;

/// A `xmlns` / `xmlns:prefix` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// `None` for the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn new(prefix: Option<&str>, uri: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        }
    }

    /// The attribute key this declaration is written with.
    pub fn attribute_key(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        }
    }
}

/// What the XML decoder observed about one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNodeMeta {
    pub prefix: Option<String>,
    pub namespace_decls: Vec<NamespaceDecl>,
    /// Attribute keys in source order. Namespace declarations appear under
    /// their `xmlns` key, ordinary attributes under their local name and
    /// namespaced attributes under their qualified name.
    pub attribute_order: Vec<String>,
    /// Namespaced attributes the model has no field for, e.g.
    /// `xsi:schemaLocation`, as (qualified name, value).
    pub extra_attributes: Vec<(String, String)>,
    pub leading_comments: Vec<String>,
    /// Comments between the last child and the closing tag.
    pub trailing_comments: Vec<String>,
    pub cdata_text: bool,
}

impl XmlNodeMeta {
    /// Orders `declared` attributes for output.
    ///
    /// Keys seen at decode time come first, in their recorded order. Keys
    /// that were not recorded follow in declared order, so a node edited
    /// after decoding still emits every attribute exactly once.
    pub fn order_attributes<'a>(&self, declared: Vec<(String, &'a str)>) -> Vec<(String, &'a str)> {
        let mut remaining = declared;
        let mut ordered = Vec::with_capacity(remaining.len());
        for key in &self.attribute_order {
            if let Some(pos) = remaining.iter().position(|(k, _)| k == key) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.extend(remaining);
        ordered
    }
}

/// Optional per-node XML metadata.
#[derive(Clone, Default)]
pub struct XmlFidelity(Option<Box<XmlNodeMeta>>);

impl XmlFidelity {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_meta(meta: XmlNodeMeta) -> Self {
        Self(Some(Box::new(meta)))
    }

    pub fn get(&self) -> Option<&XmlNodeMeta> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

// Fidelity never takes part in model equality.
impl PartialEq for XmlFidelity {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// Element spellings keyed by path, e.g.
/// `cvrfdoc/DocumentTracking[0]/Status[0]`. The root is keyed by its local
/// name and every other segment is `Name[n]`, counting same-named siblings.
#[derive(Clone, Default)]
pub struct XmlLayout(BTreeMap<String, XmlNodeMeta>);

impl XmlLayout {
    pub fn insert(&mut self, path: String, meta: XmlNodeMeta) {
        self.0.insert(path, meta);
    }

    pub fn get(&self, path: &str) -> Option<&XmlNodeMeta> {
        self.0.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for XmlLayout {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for XmlLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XmlLayout({} elements)", self.0.len())
    }
}

impl fmt::Debug for XmlFidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(meta) => f.debug_tuple("XmlFidelity").field(meta).finish(),
            None => f.write_str("XmlFidelity(None)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs<'a>(pairs: &[(&str, &'a str)]) -> Vec<(String, &'a str)> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_empty_order_keeps_declared_order() {
        let meta = XmlNodeMeta::default();
        let ordered = meta.order_attributes(attrs(&[("Type", "a"), ("Ordinal", "1")]));
        assert_eq!(ordered, attrs(&[("Type", "a"), ("Ordinal", "1")]));
    }

    #[test]
    fn test_recorded_order_is_replayed() {
        let meta = XmlNodeMeta {
            attribute_order: vec![
                "Ordinal".into(),
                "xmlns".into(),
                "xsi:schemaLocation".into(),
                "Type".into(),
            ],
            ..Default::default()
        };
        let ordered = meta.order_attributes(attrs(&[
            ("xmlns", "urn:x"),
            ("Type", "General"),
            ("Ordinal", "1"),
            ("Title", "new"),
            ("xsi:schemaLocation", "a b"),
        ]));
        assert_eq!(
            ordered,
            attrs(&[
                ("Ordinal", "1"),
                ("xmlns", "urn:x"),
                ("xsi:schemaLocation", "a b"),
                ("Type", "General"),
                ("Title", "new"),
            ])
        );
    }

    #[test]
    fn test_layout_lookup_ignores_equality() {
        let mut layout = XmlLayout::default();
        layout.insert(
            "cvrfdoc/DocumentTitle[0]".into(),
            XmlNodeMeta {
                cdata_text: true,
                ..Default::default()
            },
        );
        assert!(layout.get("cvrfdoc/DocumentTitle[0]").is_some_and(|m| m.cdata_text));
        assert!(layout.get("cvrfdoc/DocumentTitle[1]").is_none());
        assert_eq!(layout, XmlLayout::default());
    }

    #[test]
    fn test_fidelity_is_ignored_by_equality() {
        let a = XmlFidelity::none();
        let b = XmlFidelity::from_meta(XmlNodeMeta {
            prefix: Some("vuln".into()),
            ..Default::default()
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_namespace_decl_key() {
        assert_eq!(NamespaceDecl::new(None, "urn:a").attribute_key(), "xmlns");
        assert_eq!(
            NamespaceDecl::new(Some("prod"), "urn:a").attribute_key(),
            "xmlns:prod"
        );
    }
}
