//! Writes the report model as CVRF 1.2 XML.
//!
//! Elements follow the schema's sequence order. Each element's recorded
//! spelling comes from its model node's [`XmlFidelity`] or, for leaves and
//! containers, from the report's [`XmlLayout`] entry at the same path. Its
//! prefix, namespace declarations, attributes and their order, comments and
//! CDATA choice are replayed. Without a recording the root declares the CVRF
//! namespace as default plus `prod` and `vuln`, and every other element
//! reuses those bindings.

use super::{CVRF_NS, PROD_NS, VULN_NS, default_prefix};
use crate::errors::ConverterError;
use crate::fidelity::{NamespaceDecl, XmlFidelity, XmlLayout};
use crate::model::*;
use log::info;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::HashMap;

/// Serializes `report` into a complete XML document.
///
/// The model is checked before anything is produced, so a failure never
/// yields partial output.
pub fn encode_report(report: &Report) -> Result<Vec<u8>, ConverterError> {
    report.check_encodable()?;
    report.validate()?;

    if report.has_translations() {
        info!("Dropping translations: CVRF output keeps only the default language");
    }

    let mut encoder = Encoder::new(&report.xml_layout);
    encoder.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    encoder.report(report)?;

    let mut bytes = encoder.writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

struct Scope {
    path: String,
    qname: String,
    prefix: Option<String>,
    decls: Vec<NamespaceDecl>,
    /// Children written so far, by local name.
    children: HashMap<String, usize>,
    trailing_comments: Vec<String>,
    cdata: bool,
}

struct Encoder<'r> {
    writer: Writer<Vec<u8>>,
    scopes: Vec<Scope>,
    layout: &'r XmlLayout,
}

type Attrs<'a> = Vec<(String, &'a str)>;

fn attr<'a>(key: &str, value: &'a str) -> (String, &'a str) {
    (key.to_string(), value)
}

fn root_decls() -> Vec<NamespaceDecl> {
    vec![
        NamespaceDecl::new(None, CVRF_NS),
        NamespaceDecl::new(Some("prod"), PROD_NS),
        NamespaceDecl::new(Some("vuln"), VULN_NS),
    ]
}

/// One decimal place when that is exact, e.g. `7.5` or `10.0`.
fn format_score(score: f64) -> String {
    let short = format!("{:.1}", score);
    if short.parse::<f64>().ok() == Some(score) {
        short
    } else {
        score.to_string()
    }
}

impl<'r> Encoder<'r> {
    fn new(layout: &'r XmlLayout) -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
            scopes: Vec::new(),
            layout,
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), ConverterError> {
        self.writer
            .write_event(event)
            .map_err(|e| ConverterError::Encode(format!("Failed to write XML: {}", e)))
    }

    // --- namespace handling ---

    /// URI bound to `prefix` at the point where `pending` would be declared.
    fn lookup<'s>(&'s self, pending: &'s [NamespaceDecl], prefix: Option<&str>) -> Option<&'s str> {
        pending
            .iter()
            .chain(self.scopes.iter().rev().flat_map(|s| s.decls.iter()))
            .find(|d| d.prefix.as_deref() == prefix)
            .map(|d| d.uri.as_str())
    }

    /// Picks a prefix already bound to `namespace`, preferring the recorded
    /// one, then the parent's, then the default namespace.
    fn bound_prefix(
        &self,
        namespace: &str,
        recorded: Option<Option<&str>>,
        pending: &[NamespaceDecl],
    ) -> Option<Option<String>> {
        let mut candidates: Vec<Option<&str>> = Vec::new();
        if let Some(prefix) = recorded {
            candidates.push(prefix);
        }
        if let Some(parent) = self.scopes.last() {
            candidates.push(parent.prefix.as_deref());
        }
        candidates.push(None);
        candidates.extend(
            pending
                .iter()
                .chain(self.scopes.iter().rev().flat_map(|s| s.decls.iter()))
                .filter(|d| d.uri == namespace)
                .map(|d| d.prefix.as_deref()),
        );

        candidates
            .into_iter()
            .find(|candidate| self.lookup(pending, *candidate) == Some(namespace))
            .map(|prefix| prefix.map(str::to_string))
    }

    /// Layout key of the next child called `name`.
    fn child_path(&mut self, name: &str) -> String {
        match self.scopes.last_mut() {
            Some(parent) => {
                let index = parent.children.entry(name.to_string()).or_insert(0);
                let path = format!("{}/{}[{}]", parent.path, name, index);
                *index += 1;
                path
            }
            None => name.to_string(),
        }
    }

    fn start(
        &mut self,
        namespace: &str,
        name: &str,
        attrs: Attrs<'_>,
        fidelity: &XmlFidelity,
        empty: bool,
    ) -> Result<(), ConverterError> {
        let path = self.child_path(name);
        let layout = self.layout;
        let meta = fidelity.get().or_else(|| layout.get(&path));
        if let Some(meta) = meta {
            for comment in &meta.leading_comments {
                self.emit(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
            }
        }

        let mut decls = match meta {
            Some(meta) => meta.namespace_decls.clone(),
            None if self.scopes.is_empty() => root_decls(),
            None => Vec::new(),
        };
        let recorded = meta.map(|m| m.prefix.as_deref());
        let prefix = match self.bound_prefix(namespace, recorded, &decls) {
            Some(prefix) => prefix,
            None => {
                let prefix = default_prefix(namespace).to_string();
                decls.push(NamespaceDecl::new(Some(&prefix), namespace));
                Some(prefix)
            }
        };
        let qname = match &prefix {
            Some(prefix) => format!("{}:{}", prefix, name),
            None => name.to_string(),
        };

        let mut declared: Attrs<'_> = decls
            .iter()
            .map(|d| (d.attribute_key(), d.uri.as_str()))
            .collect();
        declared.extend(attrs);
        if let Some(meta) = meta {
            declared.extend(
                meta.extra_attributes
                    .iter()
                    .map(|(key, value)| (key.clone(), value.as_str())),
            );
        }
        let ordered = match meta {
            Some(meta) => meta.order_attributes(declared),
            None => declared,
        };

        let mut start = BytesStart::new(qname.as_str());
        for (key, value) in ordered {
            start.push_attribute((key.as_str(), value));
        }

        let trailing_comments = meta.map(|m| m.trailing_comments.clone()).unwrap_or_default();
        if empty && trailing_comments.is_empty() {
            return self.emit(Event::Empty(start));
        }
        self.emit(Event::Start(start))?;
        self.scopes.push(Scope {
            path,
            qname,
            prefix,
            decls,
            children: HashMap::new(),
            trailing_comments,
            cdata: meta.is_some_and(|m| m.cdata_text),
        });
        if empty {
            return self.close();
        }
        Ok(())
    }

    fn open(
        &mut self,
        namespace: &str,
        name: &str,
        attrs: Attrs<'_>,
        fidelity: &XmlFidelity,
    ) -> Result<(), ConverterError> {
        self.start(namespace, name, attrs, fidelity, false)
    }

    fn close(&mut self) -> Result<(), ConverterError> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| ConverterError::Encode("unbalanced element stack".to_string()))?;
        for comment in &scope.trailing_comments {
            self.emit(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
        }
        self.emit(Event::End(BytesEnd::new(scope.qname.as_str())))
    }

    /// An element holding only `text`.
    fn text_element(
        &mut self,
        namespace: &str,
        name: &str,
        attrs: Attrs<'_>,
        text: &str,
        fidelity: &XmlFidelity,
    ) -> Result<(), ConverterError> {
        if text.is_empty() {
            return self.start(namespace, name, attrs, fidelity, true);
        }
        self.open(namespace, name, attrs, fidelity)?;
        let cdata = self.scopes.last().is_some_and(|s| s.cdata) && !text.contains("]]>");
        if cdata {
            self.emit(Event::CData(BytesCData::new(text)))?;
        } else {
            self.emit(Event::Text(BytesText::new(text)))?;
        }
        self.close()
    }

    fn leaf(&mut self, namespace: &str, name: &str, text: &str) -> Result<(), ConverterError> {
        self.text_element(namespace, name, Vec::new(), text, &XmlFidelity::none())
    }

    fn optional_leaf(
        &mut self,
        namespace: &str,
        name: &str,
        text: Option<&str>,
    ) -> Result<(), ConverterError> {
        match text {
            Some(text) => self.leaf(namespace, name, text),
            None => Ok(()),
        }
    }

    fn leaves(&mut self, namespace: &str, name: &str, texts: &[String]) -> Result<(), ConverterError> {
        for text in texts {
            self.leaf(namespace, name, text)?;
        }
        Ok(())
    }

    /// Wraps `items` in a `name` element; writes nothing when empty.
    fn container<T>(
        &mut self,
        namespace: &str,
        name: &str,
        items: &[T],
        mut each: impl FnMut(&mut Self, usize, &T) -> Result<(), ConverterError>,
    ) -> Result<(), ConverterError> {
        if items.is_empty() {
            return Ok(());
        }
        self.open(namespace, name, Vec::new(), &XmlFidelity::none())?;
        for (i, item) in items.iter().enumerate() {
            each(self, i, item)?;
        }
        self.close()
    }

    // --- document ---

    fn report(&mut self, report: &Report) -> Result<(), ConverterError> {
        let doc = &report.document;
        self.open(CVRF_NS, "cvrfdoc", Vec::new(), &report.xml)?;

        self.leaf(CVRF_NS, "DocumentTitle", &doc.title)?;
        self.leaf(CVRF_NS, "DocumentType", &doc.doc_type)?;
        self.publisher(&doc.publisher)?;
        self.tracking(&doc.tracking)?;
        self.container(CVRF_NS, "DocumentNotes", &doc.notes, |enc, i, note| {
            enc.note(CVRF_NS, i, note)
        })?;
        self.optional_leaf(CVRF_NS, "DocumentDistribution", doc.distribution.as_deref())?;
        if let Some(severity) = &doc.aggregate_severity {
            let mut attrs = Vec::new();
            if let Some(namespace) = &severity.namespace {
                attrs.push(attr("Namespace", namespace));
            }
            self.text_element(CVRF_NS, "AggregateSeverity", attrs, &severity.text, &severity.xml)?;
        }
        self.references(CVRF_NS, "DocumentReferences", &doc.references)?;
        self.acknowledgments(CVRF_NS, &report.acknowledgments)?;

        let tree = &report.product_tree;
        if !tree.is_empty() || tree.xml.is_present() {
            self.product_tree(tree)?;
        }
        for (i, vuln) in report.vulnerabilities.iter().enumerate() {
            self.vulnerability(i, vuln)?;
        }

        self.close()
    }

    fn publisher(&mut self, publisher: &Publisher) -> Result<(), ConverterError> {
        let mut attrs = vec![attr("Type", publisher.publisher_type.as_xml())];
        if let Some(vendor_id) = &publisher.vendor_id {
            attrs.push(attr("VendorID", vendor_id));
        }
        let empty = publisher.contact_details.is_none() && publisher.issuing_authority.is_none();
        self.start(CVRF_NS, "DocumentPublisher", attrs, &publisher.xml, empty)?;
        if empty {
            return Ok(());
        }
        self.optional_leaf(CVRF_NS, "ContactDetails", publisher.contact_details.as_deref())?;
        self.optional_leaf(CVRF_NS, "IssuingAuthority", publisher.issuing_authority.as_deref())?;
        self.close()
    }

    fn tracking(&mut self, tracking: &Tracking) -> Result<(), ConverterError> {
        self.open(CVRF_NS, "DocumentTracking", Vec::new(), &XmlFidelity::none())?;

        self.open(CVRF_NS, "Identification", Vec::new(), &XmlFidelity::none())?;
        self.leaf(CVRF_NS, "ID", &tracking.id)?;
        self.leaves(CVRF_NS, "Alias", &tracking.aliases)?;
        self.close()?;

        self.leaf(CVRF_NS, "Status", tracking.status.as_xml())?;
        self.leaf(CVRF_NS, "Version", &tracking.version)?;
        self.container(CVRF_NS, "RevisionHistory", &tracking.revision_history, |enc, _, rev| {
            enc.open(CVRF_NS, "Revision", Vec::new(), &XmlFidelity::none())?;
            enc.leaf(CVRF_NS, "Number", &rev.number)?;
            enc.leaf(CVRF_NS, "Date", rev.date.as_str())?;
            enc.leaf(CVRF_NS, "Description", &rev.description)?;
            enc.close()
        })?;
        self.leaf(CVRF_NS, "InitialReleaseDate", tracking.initial_release_date.as_str())?;
        self.leaf(CVRF_NS, "CurrentReleaseDate", tracking.current_release_date.as_str())?;
        if let Some(generator) = &tracking.generator {
            self.open(CVRF_NS, "Generator", Vec::new(), &XmlFidelity::none())?;
            self.optional_leaf(CVRF_NS, "Engine", generator.engine.as_deref())?;
            self.optional_leaf(CVRF_NS, "Date", generator.date.as_ref().map(Timestamp::as_str))?;
            self.close()?;
        }

        self.close()
    }

    fn note(&mut self, namespace: &str, index: usize, note: &Note) -> Result<(), ConverterError> {
        let ordinal = note.ordinal.unwrap_or(index as u32 + 1).to_string();
        let mut attrs = Vec::new();
        if let Some(title) = &note.title {
            attrs.push(attr("Title", title));
        }
        if let Some(audience) = &note.audience {
            attrs.push(attr("Audience", audience));
        }
        attrs.push(attr("Type", note.category.as_xml()));
        attrs.push(attr("Ordinal", &ordinal));
        self.text_element(namespace, "Note", attrs, &note.text, &note.xml)
    }

    fn references(
        &mut self,
        namespace: &str,
        name: &str,
        references: &[Reference],
    ) -> Result<(), ConverterError> {
        self.container(namespace, name, references, |enc, _, reference| {
            let mut attrs = Vec::new();
            if let Some(category) = reference.category {
                attrs.push(attr("Type", category.as_xml()));
            }
            enc.open(namespace, "Reference", attrs, &reference.xml)?;
            enc.leaf(namespace, "URL", &reference.url)?;
            enc.leaf(namespace, "Description", &reference.description)?;
            enc.close()
        })
    }

    fn acknowledgments(
        &mut self,
        namespace: &str,
        acknowledgments: &[Acknowledgment],
    ) -> Result<(), ConverterError> {
        self.container(namespace, "Acknowledgments", acknowledgments, |enc, _, ack| {
            enc.open(namespace, "Acknowledgment", Vec::new(), &XmlFidelity::none())?;
            enc.leaves(namespace, "Name", &ack.names)?;
            enc.leaves(namespace, "Organization", &ack.organizations)?;
            enc.optional_leaf(namespace, "Description", ack.description.as_deref())?;
            enc.leaves(namespace, "URL", &ack.urls)?;
            enc.close()
        })
    }

    // --- product tree ---

    fn product_tree(&mut self, tree: &ProductTree) -> Result<(), ConverterError> {
        self.open(PROD_NS, "ProductTree", Vec::new(), &tree.xml)?;
        for branch in &tree.branches {
            self.branch(branch)?;
        }
        for product in &tree.full_product_names {
            self.full_product_name(product)?;
        }
        for relationship in &tree.relationships {
            self.open(
                PROD_NS,
                "Relationship",
                vec![
                    attr("ProductReference", &relationship.product_reference),
                    attr("RelationType", relationship.relation_type.as_xml()),
                    attr(
                        "RelatesToProductReference",
                        &relationship.relates_to_product_reference,
                    ),
                ],
                &relationship.xml,
            )?;
            for product in &relationship.full_product_names {
                self.full_product_name(product)?;
            }
            self.close()?;
        }
        self.container(PROD_NS, "ProductGroups", &tree.product_groups, |enc, _, group| {
            enc.open(PROD_NS, "Group", vec![attr("GroupID", &group.group_id)], &group.xml)?;
            enc.optional_leaf(PROD_NS, "Description", group.description.as_deref())?;
            enc.leaves(PROD_NS, "ProductID", &group.product_ids)?;
            enc.close()
        })?;
        self.close()
    }

    fn branch(&mut self, branch: &Branch) -> Result<(), ConverterError> {
        let attrs = vec![
            attr("Type", branch.branch_type.as_xml()),
            attr("Name", &branch.name),
        ];
        let empty = branch.branches.is_empty() && branch.product.is_none();
        self.start(PROD_NS, "Branch", attrs, &branch.xml, empty)?;
        if empty {
            return Ok(());
        }
        for child in &branch.branches {
            self.branch(child)?;
        }
        if let Some(product) = &branch.product {
            self.full_product_name(product)?;
        }
        self.close()
    }

    fn full_product_name(&mut self, product: &FullProductName) -> Result<(), ConverterError> {
        let mut attrs = vec![attr("ProductID", &product.product_id)];
        if let Some(cpe) = &product.cpe {
            attrs.push(attr("CPE", cpe));
        }
        self.text_element(PROD_NS, "FullProductName", attrs, &product.name, &product.xml)
    }

    // --- vulnerabilities ---

    fn vulnerability(&mut self, index: usize, vuln: &Vulnerability) -> Result<(), ConverterError> {
        let ordinal = vuln.ordinal.unwrap_or(index as u32 + 1).to_string();
        self.open(
            VULN_NS,
            "Vulnerability",
            vec![attr("Ordinal", &ordinal)],
            &vuln.xml,
        )?;

        self.optional_leaf(VULN_NS, "Title", vuln.title.as_deref())?;
        if let Some(id) = &vuln.id {
            self.text_element(
                VULN_NS,
                "ID",
                vec![attr("SystemName", &id.system_name)],
                &id.text,
                &id.xml,
            )?;
        }
        self.container(VULN_NS, "Notes", &vuln.notes, |enc, i, note| {
            enc.note(VULN_NS, i, note)
        })?;
        self.optional_leaf(
            VULN_NS,
            "DiscoveryDate",
            vuln.discovery_date.as_ref().map(Timestamp::as_str),
        )?;
        self.optional_leaf(
            VULN_NS,
            "ReleaseDate",
            vuln.release_date.as_ref().map(Timestamp::as_str),
        )?;
        self.container(VULN_NS, "Involvements", &vuln.involvements, |enc, _, inv| {
            let attrs = vec![
                attr("Party", inv.party.as_xml()),
                attr("Status", inv.status.as_xml()),
            ];
            match &inv.description {
                Some(description) => {
                    enc.open(VULN_NS, "Involvement", attrs, &inv.xml)?;
                    enc.leaf(VULN_NS, "Description", description)?;
                    enc.close()
                }
                None => enc.start(VULN_NS, "Involvement", attrs, &inv.xml, true),
            }
        })?;
        self.optional_leaf(VULN_NS, "CVE", vuln.cve.as_deref())?;
        for cwe in &vuln.cwe {
            self.text_element(VULN_NS, "CWE", vec![attr("ID", &cwe.id)], &cwe.text, &cwe.xml)?;
        }
        self.container(VULN_NS, "ProductStatuses", &vuln.product_statuses, |enc, _, status| {
            enc.open(
                VULN_NS,
                "Status",
                vec![attr("Type", status.status.as_xml())],
                &status.xml,
            )?;
            enc.leaves(VULN_NS, "ProductID", &status.product_ids)?;
            enc.close()
        })?;
        self.container(VULN_NS, "Threats", &vuln.threats, |enc, _, threat| {
            let mut attrs = vec![attr("Type", threat.threat_type.as_xml())];
            if let Some(date) = &threat.date {
                attrs.push(attr("Date", date.as_str()));
            }
            enc.open(VULN_NS, "Threat", attrs, &threat.xml)?;
            enc.leaf(VULN_NS, "Description", &threat.description)?;
            enc.leaves(VULN_NS, "ProductID", &threat.product_ids)?;
            enc.leaves(VULN_NS, "GroupID", &threat.group_ids)?;
            enc.close()
        })?;
        self.container(VULN_NS, "CVSSScoreSets", &vuln.scores, |enc, _, set| {
            enc.score_set(set)
        })?;
        self.container(VULN_NS, "Remediations", &vuln.remediations, |enc, _, rem| {
            let mut attrs = vec![attr("Type", rem.remediation_type.as_xml())];
            if let Some(date) = &rem.date {
                attrs.push(attr("Date", date.as_str()));
            }
            enc.open(VULN_NS, "Remediation", attrs, &rem.xml)?;
            enc.leaf(VULN_NS, "Description", &rem.description)?;
            enc.leaves(VULN_NS, "Entitlement", &rem.entitlements)?;
            enc.optional_leaf(VULN_NS, "URL", rem.url.as_deref())?;
            enc.leaves(VULN_NS, "ProductID", &rem.product_ids)?;
            enc.leaves(VULN_NS, "GroupID", &rem.group_ids)?;
            enc.close()
        })?;
        self.references(VULN_NS, "References", &vuln.references)?;
        self.acknowledgments(VULN_NS, &vuln.acknowledgments)?;

        self.close()
    }

    fn score_set(&mut self, set: &ScoreSet) -> Result<(), ConverterError> {
        let suffix = set.version.as_xml();
        self.open(VULN_NS, &format!("ScoreSet{}", suffix), Vec::new(), &set.xml)?;
        self.leaf(VULN_NS, &format!("BaseScore{}", suffix), &format_score(set.base_score))?;
        if let Some(score) = set.temporal_score {
            self.leaf(VULN_NS, &format!("TemporalScore{}", suffix), &format_score(score))?;
        }
        if let Some(score) = set.environmental_score {
            self.leaf(VULN_NS, &format!("EnvironmentalScore{}", suffix), &format_score(score))?;
        }
        self.optional_leaf(VULN_NS, &format!("Vector{}", suffix), set.vector.as_deref())?;
        self.leaves(VULN_NS, "ProductID", &set.product_ids)?;
        self.close()
    }
}
