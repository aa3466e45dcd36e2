//! Maps a CVRF element tree onto the report model.
//!
//! Elements are matched by (namespace URI, local name). Locations in errors
//! are element paths such as `cvrfdoc/DocumentTracking/Identification`.

use super::tree::Element;
use super::{CVRF_NS, PROD_NS, VULN_NS};
use crate::errors::ConverterError;
use crate::fidelity::XmlLayout;
use crate::model::*;
use log::debug;
use std::collections::HashMap;

/// Builds a [`Report`] from the root of a parsed CVRF document.
pub fn report_from_tree(root: &Element) -> Result<Report, ConverterError> {
    if !root.is(CVRF_NS, "cvrfdoc") {
        return Err(ConverterError::parse(
            root.qualified_name(),
            format!("expected root element cvrfdoc in namespace {}", CVRF_NS),
        ));
    }
    let decoder = Decoder {
        default_lang: root.lang.clone(),
    };
    let mut report = decoder.report(root)?;
    record_layout(root, root.local_name.clone(), &mut report.xml_layout);
    Ok(report)
}

/// Records the spelling of `el` and its CVRF descendants under their
/// element paths.
///
/// Language variants with a same-named sibling are left out: the encoder
/// writes one element per group, so only unambiguous elements get a key.
fn record_layout(el: &Element, path: String, layout: &mut XmlLayout) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for child in el.elements() {
        if !is_cvrf(child) {
            continue;
        }
        let name = child.local_name.as_str();
        let is_variant = child.lang.is_some()
            && el
                .elements()
                .filter(|other| other.namespace == child.namespace && other.local_name == name)
                .nth(1)
                .is_some();
        if is_variant {
            continue;
        }
        let index = counts.entry(name).or_insert(0);
        let child_path = format!("{}/{}[{}]", path, name, index);
        *index += 1;
        record_layout(child, child_path, layout);
    }
    layout.insert(path, el.meta());
}

struct Decoder {
    /// `xml:lang` of the root element; preferred when variants compete.
    default_lang: Option<String>,
}

impl Decoder {
    fn report(&self, root: &Element) -> Result<Report, ConverterError> {
        let path = "cvrfdoc";
        skip_foreign(root, path);

        let publisher = self.required(root, CVRF_NS, "DocumentPublisher", path)?;
        let tracking = self.required(root, CVRF_NS, "DocumentTracking", path)?;

        let document = DocumentMeta {
            title: self.required_text(root, CVRF_NS, "DocumentTitle", path)?,
            title_translations: Translations::new(),
            doc_type: self.required_text(root, CVRF_NS, "DocumentType", path)?,
            publisher: self.publisher(publisher, &format!("{}/DocumentPublisher", path))?,
            tracking: self.tracking(tracking, &format!("{}/DocumentTracking", path))?,
            notes: self.notes(root, CVRF_NS, "DocumentNotes", path)?,
            distribution: self.optional_text(root, CVRF_NS, "DocumentDistribution"),
            distribution_translations: Translations::new(),
            aggregate_severity: self
                .single(root, CVRF_NS, "AggregateSeverity")
                .map(|el| AggregateSeverity {
                    namespace: el.attribute("Namespace").map(str::to_string),
                    text: trimmed(el),
                    xml: el.fidelity(),
                }),
            references: self.references(root, CVRF_NS, "DocumentReferences", path)?,
        };

        let product_tree = match self.single(root, PROD_NS, "ProductTree") {
            Some(el) => self.product_tree(el, &format!("{}/ProductTree", path))?,
            None => ProductTree::default(),
        };

        let vulnerabilities = self.collect(root, VULN_NS, None, "Vulnerability", path, |el, p| {
            self.vulnerability(el, p)
        })?;

        let acknowledgments = self.acknowledgments(root, CVRF_NS, path)?;

        debug!(
            "Decoded CVRF document {} with {} vulnerabilities",
            document.tracking.id,
            vulnerabilities.len()
        );

        Ok(Report {
            document,
            product_tree,
            vulnerabilities,
            acknowledgments,
            xml: root.fidelity(),
            xml_layout: XmlLayout::default(),
        })
    }

    // --- document ---

    fn publisher(&self, el: &Element, path: &str) -> Result<Publisher, ConverterError> {
        Ok(Publisher {
            publisher_type: attr_vocab(el, "Type", PartyType::from_xml, path)?,
            vendor_id: el.attribute("VendorID").map(str::to_string),
            contact_details: self.optional_text(el, CVRF_NS, "ContactDetails"),
            issuing_authority: self.optional_text(el, CVRF_NS, "IssuingAuthority"),
            xml: el.fidelity(),
        })
    }

    fn tracking(&self, el: &Element, path: &str) -> Result<Tracking, ConverterError> {
        let identification = self.required(el, CVRF_NS, "Identification", path)?;
        let ident_path = format!("{}/Identification", path);

        let status = self.required_text(el, CVRF_NS, "Status", path)?;
        let status = vocab(
            &status,
            DocumentStatus::from_xml,
            &format!("{}/Status", path),
        )?;

        let revision_history = self.collect(
            el,
            CVRF_NS,
            Some("RevisionHistory"),
            "Revision",
            path,
            |rev, p| {
                Ok(Revision {
                    number: self.required_text(rev, CVRF_NS, "Number", p)?,
                    date: Timestamp::new(self.required_text(rev, CVRF_NS, "Date", p)?),
                    description: self.required_text(rev, CVRF_NS, "Description", p)?,
                })
            },
        )?;
        if revision_history.is_empty() {
            return Err(ConverterError::parse(
                format!("{}/RevisionHistory", path),
                "revision history must contain at least one Revision",
            ));
        }

        Ok(Tracking {
            id: self.required_text(identification, CVRF_NS, "ID", &ident_path)?,
            aliases: texts(identification, CVRF_NS, "Alias"),
            status,
            version: self.required_text(el, CVRF_NS, "Version", path)?,
            revision_history,
            initial_release_date: Timestamp::new(self.required_text(
                el,
                CVRF_NS,
                "InitialReleaseDate",
                path,
            )?),
            current_release_date: Timestamp::new(self.required_text(
                el,
                CVRF_NS,
                "CurrentReleaseDate",
                path,
            )?),
            generator: self.single(el, CVRF_NS, "Generator").map(|g| Generator {
                engine: self.optional_text(g, CVRF_NS, "Engine"),
                date: self.optional_text(g, CVRF_NS, "Date").map(Timestamp::new),
            }),
        })
    }

    fn notes(
        &self,
        parent: &Element,
        ns: &str,
        container: &str,
        path: &str,
    ) -> Result<Vec<Note>, ConverterError> {
        let Some(holder) = self.single(parent, ns, container) else {
            return Ok(Vec::new());
        };
        let base = format!("{}/{}", path, container);
        let candidates: Vec<&Element> = holder.children_named(ns, "Note").collect();
        self.drop_language_variants(candidates)
            .into_iter()
            .enumerate()
            .map(|(i, el)| self.note(el, &format!("{}/Note[{}]", base, i)))
            .collect()
    }

    fn note(&self, el: &Element, path: &str) -> Result<Note, ConverterError> {
        Ok(Note {
            category: attr_vocab(el, "Type", NoteType::from_xml, path)?,
            title: el.attribute("Title").map(str::to_string),
            title_translations: Translations::new(),
            audience: el.attribute("Audience").map(str::to_string),
            ordinal: el
                .attribute("Ordinal")
                .map(|v| parse_ordinal(v, path))
                .transpose()?,
            text: trimmed(el),
            translations: Translations::new(),
            xml: el.fidelity(),
        })
    }

    fn references(
        &self,
        parent: &Element,
        ns: &str,
        container: &str,
        path: &str,
    ) -> Result<Vec<Reference>, ConverterError> {
        self.collect(parent, ns, Some(container), "Reference", path, |el, p| {
            Ok(Reference {
                category: el
                    .attribute("Type")
                    .map(|v| vocab(v, ReferenceType::from_xml, &format!("{}@Type", p)))
                    .transpose()?,
                url: self.required_text(el, ns, "URL", p)?,
                description: self.required_text(el, ns, "Description", p)?,
                xml: el.fidelity(),
            })
        })
    }

    fn acknowledgments(
        &self,
        parent: &Element,
        ns: &str,
        path: &str,
    ) -> Result<Vec<Acknowledgment>, ConverterError> {
        self.collect(
            parent,
            ns,
            Some("Acknowledgments"),
            "Acknowledgment",
            path,
            |el, _| {
                Ok(Acknowledgment {
                    names: texts(el, ns, "Name"),
                    organizations: texts(el, ns, "Organization"),
                    description: self.optional_text(el, ns, "Description"),
                    urls: texts(el, ns, "URL"),
                })
            },
        )
    }

    // --- product tree ---

    fn product_tree(&self, el: &Element, path: &str) -> Result<ProductTree, ConverterError> {
        Ok(ProductTree {
            branches: self.collect(el, PROD_NS, None, "Branch", path, |b, p| self.branch(b, p))?,
            full_product_names: self.collect(el, PROD_NS, None, "FullProductName", path, |fp, p| {
                full_product_name(fp, p)
            })?,
            relationships: self.collect(el, PROD_NS, None, "Relationship", path, |rel, p| {
                Ok(Relationship {
                    product_reference: required_attr(rel, "ProductReference", p)?,
                    relation_type: attr_vocab(rel, "RelationType", RelationType::from_xml, p)?,
                    relates_to_product_reference: required_attr(
                        rel,
                        "RelatesToProductReference",
                        p,
                    )?,
                    full_product_names: self.collect(
                        rel,
                        PROD_NS,
                        None,
                        "FullProductName",
                        p,
                        |fp, fp_path| full_product_name(fp, fp_path),
                    )?,
                    xml: rel.fidelity(),
                })
            })?,
            product_groups: self.collect(
                el,
                PROD_NS,
                Some("ProductGroups"),
                "Group",
                path,
                |group, p| {
                    Ok(ProductGroup {
                        group_id: required_attr(group, "GroupID", p)?,
                        description: self.optional_text(group, PROD_NS, "Description"),
                        product_ids: texts(group, PROD_NS, "ProductID"),
                        xml: group.fidelity(),
                    })
                },
            )?,
            xml: el.fidelity(),
        })
    }

    fn branch(&self, el: &Element, path: &str) -> Result<Branch, ConverterError> {
        Ok(Branch {
            branch_type: attr_vocab(el, "Type", BranchType::from_xml, path)?,
            name: required_attr(el, "Name", path)?,
            branches: self.collect(el, PROD_NS, None, "Branch", path, |b, p| self.branch(b, p))?,
            product: self
                .single(el, PROD_NS, "FullProductName")
                .map(|fp| full_product_name(fp, &format!("{}/FullProductName", path)))
                .transpose()?,
            xml: el.fidelity(),
        })
    }

    // --- vulnerabilities ---

    fn vulnerability(&self, el: &Element, path: &str) -> Result<Vulnerability, ConverterError> {
        skip_foreign(el, path);

        let id = match self.single(el, VULN_NS, "ID") {
            Some(id) => Some(VulnerabilityId {
                system_name: required_attr(id, "SystemName", &format!("{}/ID", path))?,
                text: trimmed(id),
                xml: id.fidelity(),
            }),
            None => None,
        };

        Ok(Vulnerability {
            ordinal: el
                .attribute("Ordinal")
                .map(|v| parse_ordinal(v, path))
                .transpose()?,
            title: self.optional_text(el, VULN_NS, "Title"),
            title_translations: Translations::new(),
            id,
            notes: self.notes(el, VULN_NS, "Notes", path)?,
            discovery_date: self
                .optional_text(el, VULN_NS, "DiscoveryDate")
                .map(Timestamp::new),
            release_date: self
                .optional_text(el, VULN_NS, "ReleaseDate")
                .map(Timestamp::new),
            involvements: self.collect(
                el,
                VULN_NS,
                Some("Involvements"),
                "Involvement",
                path,
                |inv, p| {
                    Ok(Involvement {
                        party: attr_vocab(inv, "Party", PartyType::from_xml, p)?,
                        status: attr_vocab(inv, "Status", InvolvementStatus::from_xml, p)?,
                        description: self.optional_text(inv, VULN_NS, "Description"),
                        xml: inv.fidelity(),
                    })
                },
            )?,
            cve: self.optional_text(el, VULN_NS, "CVE"),
            cwe: self.collect(el, VULN_NS, None, "CWE", path, |cwe, p| {
                Ok(Cwe {
                    id: required_attr(cwe, "ID", p)?,
                    text: trimmed(cwe),
                    xml: cwe.fidelity(),
                })
            })?,
            product_statuses: self.collect(
                el,
                VULN_NS,
                Some("ProductStatuses"),
                "Status",
                path,
                |status, p| {
                    Ok(ProductStatus {
                        status: attr_vocab(status, "Type", ProductStatusType::from_xml, p)?,
                        product_ids: texts(status, VULN_NS, "ProductID"),
                        xml: status.fidelity(),
                    })
                },
            )?,
            threats: self.collect(el, VULN_NS, Some("Threats"), "Threat", path, |threat, p| {
                Ok(Threat {
                    threat_type: attr_vocab(threat, "Type", ThreatType::from_xml, p)?,
                    date: threat.attribute("Date").map(Timestamp::new),
                    description: self.required_text(threat, VULN_NS, "Description", p)?,
                    product_ids: texts(threat, VULN_NS, "ProductID"),
                    group_ids: texts(threat, VULN_NS, "GroupID"),
                    xml: threat.fidelity(),
                })
            })?,
            scores: self.score_sets(el, path)?,
            remediations: self.collect(
                el,
                VULN_NS,
                Some("Remediations"),
                "Remediation",
                path,
                |rem, p| {
                    Ok(Remediation {
                        remediation_type: attr_vocab(rem, "Type", RemediationType::from_xml, p)?,
                        date: rem.attribute("Date").map(Timestamp::new),
                        description: self.required_text(rem, VULN_NS, "Description", p)?,
                        entitlements: texts(rem, VULN_NS, "Entitlement"),
                        url: self.optional_text(rem, VULN_NS, "URL"),
                        product_ids: texts(rem, VULN_NS, "ProductID"),
                        group_ids: texts(rem, VULN_NS, "GroupID"),
                        xml: rem.fidelity(),
                    })
                },
            )?,
            references: self.references(el, VULN_NS, "References", path)?,
            acknowledgments: self.acknowledgments(el, VULN_NS, path)?,
            xml: el.fidelity(),
        })
    }

    /// V2 and V3 sets share one container and keep their relative order.
    fn score_sets(&self, el: &Element, path: &str) -> Result<Vec<ScoreSet>, ConverterError> {
        let Some(holder) = self.single(el, VULN_NS, "CVSSScoreSets") else {
            return Ok(Vec::new());
        };
        let base = format!("{}/CVSSScoreSets", path);

        let mut sets = Vec::new();
        for (i, set) in holder.elements().enumerate() {
            let version = set
                .local_name
                .strip_prefix("ScoreSet")
                .filter(|_| set.namespace.as_deref() == Some(VULN_NS))
                .and_then(CvssVersion::from_xml);
            let Some(version) = version else {
                debug!("Skipping <{}> in {}", set.qualified_name(), base);
                continue;
            };
            let suffix = version.as_xml();
            let p = format!("{}/ScoreSet{}[{}]", base, suffix, i);

            let score = |name: &str| -> Result<Option<f64>, ConverterError> {
                let element = format!("{}{}", name, suffix);
                self.optional_text(set, VULN_NS, &element)
                    .map(|v| parse_score(&v, &format!("{}/{}", p, element)))
                    .transpose()
            };

            let base_score = score("BaseScore")?.ok_or_else(|| {
                ConverterError::parse(&p, format!("missing required element BaseScore{}", suffix))
            })?;

            sets.push(ScoreSet {
                version,
                base_score,
                temporal_score: score("TemporalScore")?,
                environmental_score: score("EnvironmentalScore")?,
                vector: self.optional_text(set, VULN_NS, &format!("Vector{}", suffix)),
                product_ids: texts(set, VULN_NS, "ProductID"),
                xml: set.fidelity(),
            });
        }
        Ok(sets)
    }

    // --- element lookup ---

    /// The one child named `name`, choosing the default-language variant
    /// when several `xml:lang` siblings compete.
    fn single<'a>(&self, parent: &'a Element, ns: &str, name: &str) -> Option<&'a Element> {
        let candidates: Vec<&'a Element> = parent.children_named(ns, name).collect();
        match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => Some(self.default_variant(&candidates)),
        }
    }

    fn default_variant<'a>(&self, candidates: &[&'a Element]) -> &'a Element {
        let chosen = candidates
            .iter()
            .copied()
            .find(|e| e.lang.is_none())
            .or_else(|| {
                self.default_lang.as_deref().and_then(|lang| {
                    candidates
                        .iter()
                        .copied()
                        .find(|e| e.lang.as_deref() == Some(lang))
                })
            })
            .unwrap_or(candidates[0]);
        debug!(
            "Keeping one of {} <{}> variants (xml:lang={:?})",
            candidates.len(),
            chosen.local_name,
            chosen.lang
        );
        chosen
    }

    /// Collapses notes that share an ordinal and differ only by `xml:lang`.
    fn drop_language_variants<'a>(&self, elements: Vec<&'a Element>) -> Vec<&'a Element> {
        let mut kept: Vec<&'a Element> = Vec::new();
        for el in elements {
            let ordinal = el.attribute("Ordinal");
            let twin = kept.iter().position(|other| {
                ordinal.is_some()
                    && other.attribute("Ordinal") == ordinal
                    && (other.lang.is_some() || el.lang.is_some())
            });
            match twin {
                Some(pos) => kept[pos] = self.default_variant(&[kept[pos], el]),
                None => kept.push(el),
            }
        }
        kept
    }

    fn required<'a>(
        &self,
        parent: &'a Element,
        ns: &str,
        name: &str,
        path: &str,
    ) -> Result<&'a Element, ConverterError> {
        self.single(parent, ns, name).ok_or_else(|| {
            ConverterError::parse(path, format!("missing required element {}", name))
        })
    }

    fn optional_text(&self, parent: &Element, ns: &str, name: &str) -> Option<String> {
        self.single(parent, ns, name).map(trimmed)
    }

    fn required_text(
        &self,
        parent: &Element,
        ns: &str,
        name: &str,
        path: &str,
    ) -> Result<String, ConverterError> {
        let text = trimmed(self.required(parent, ns, name, path)?);
        if text.is_empty() {
            return Err(ConverterError::parse(
                format!("{}/{}", path, name),
                "required element is empty",
            ));
        }
        Ok(text)
    }

    /// Decodes every `item` child of `parent`, or of its `container` child.
    fn collect<'a, T>(
        &self,
        parent: &'a Element,
        ns: &str,
        container: Option<&str>,
        item: &str,
        path: &str,
        mut decode_item: impl FnMut(&'a Element, &str) -> Result<T, ConverterError>,
    ) -> Result<Vec<T>, ConverterError> {
        let (holder, base) = match container {
            Some(name) => match self.single(parent, ns, name) {
                Some(el) => (el, format!("{}/{}", path, name)),
                None => return Ok(Vec::new()),
            },
            None => (parent, path.to_string()),
        };
        holder
            .children_named(ns, item)
            .enumerate()
            .map(|(i, el)| decode_item(el, &format!("{}/{}[{}]", base, item, i)))
            .collect()
    }
}

fn full_product_name(el: &Element, path: &str) -> Result<FullProductName, ConverterError> {
    Ok(FullProductName {
        product_id: required_attr(el, "ProductID", path)?,
        cpe: el.attribute("CPE").map(str::to_string),
        name: trimmed(el),
        xml: el.fidelity(),
    })
}

fn trimmed(el: &Element) -> String {
    el.text().trim().to_string()
}

/// Repeated text children, e.g. every `ProductID`.
fn texts(parent: &Element, ns: &str, name: &str) -> Vec<String> {
    parent
        .children_named(ns, name)
        .map(trimmed)
        .filter(|t| !t.is_empty())
        .collect()
}

fn required_attr(el: &Element, name: &str, path: &str) -> Result<String, ConverterError> {
    el.attribute(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConverterError::parse(path, format!("missing required attribute {}", name)))
}

fn vocab<T>(value: &str, parse: fn(&str) -> Option<T>, path: &str) -> Result<T, ConverterError> {
    parse(value).ok_or_else(|| ConverterError::parse(path, format!("unknown value '{}'", value)))
}

fn attr_vocab<T>(
    el: &Element,
    name: &str,
    parse: fn(&str) -> Option<T>,
    path: &str,
) -> Result<T, ConverterError> {
    let value = required_attr(el, name, path)?;
    vocab(&value, parse, &format!("{}@{}", path, name))
}

fn parse_ordinal(value: &str, path: &str) -> Result<u32, ConverterError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConverterError::parse(format!("{}@Ordinal", path), format!("ordinal '{}' is not a positive integer", value)))
}

fn parse_score(value: &str, path: &str) -> Result<f64, ConverterError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConverterError::parse(path, format!("score '{}' is not a number", value)))
}

fn is_cvrf(el: &Element) -> bool {
    matches!(
        el.namespace.as_deref(),
        Some(CVRF_NS) | Some(PROD_NS) | Some(VULN_NS)
    )
}

/// Logs children in namespaces this decoder does not read.
fn skip_foreign(el: &Element, path: &str) {
    for child in el.elements() {
        if !is_cvrf(child) {
            debug!("Skipping foreign element <{}> in {}", child.qualified_name(), path);
        }
    }
}
