//! The catalog of products a report talks about.

use crate::fidelity::XmlFidelity;
use crate::model::vocabulary::{BranchType, RelationType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductTree {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub full_product_names: Vec<FullProductName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_groups: Vec<ProductGroup>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

/// One level of the vendor/product hierarchy.
///
/// A branch holds either nested branches or a single leaf product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "type")]
    pub branch_type: BranchType,

    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<FullProductName>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullProductName {
    pub product_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,

    pub name: String,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

/// A product obtained by combining two others, e.g. "A installed on B".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub product_reference: String,

    pub relation_type: RelationType,

    pub relates_to_product_reference: String,

    pub full_product_names: Vec<FullProductName>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub group_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub product_ids: Vec<String>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

impl FullProductName {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Branch {
    pub fn new(branch_type: BranchType, name: impl Into<String>) -> Self {
        Self {
            branch_type,
            name: name.into(),
            branches: Vec::new(),
            product: None,
            xml: XmlFidelity::none(),
        }
    }

    fn collect_products<'a>(&'a self, out: &mut Vec<&'a FullProductName>) {
        if let Some(product) = &self.product {
            out.push(product);
        }
        for child in &self.branches {
            child.collect_products(out);
        }
    }
}

impl ProductTree {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
            && self.full_product_names.is_empty()
            && self.relationships.is_empty()
            && self.product_groups.is_empty()
    }

    /// Every full product name in the tree: branch leaves depth-first, then
    /// top-level entries, then the products defined by relationships.
    pub fn products(&self) -> Vec<&FullProductName> {
        let mut out = Vec::new();
        for branch in &self.branches {
            branch.collect_products(&mut out);
        }
        out.extend(self.full_product_names.iter());
        for relationship in &self.relationships {
            out.extend(relationship.full_product_names.iter());
        }
        out
    }

    pub fn find_product(&self, product_id: &str) -> Option<&FullProductName> {
        self.products().into_iter().find(|p| p.product_id == product_id)
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.find_product(product_id).is_some()
    }

    pub fn contains_group(&self, group_id: &str) -> bool {
        self.product_groups.iter().any(|g| g.group_id == group_id)
    }
}
