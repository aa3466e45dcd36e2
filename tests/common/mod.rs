//! Shared report fixtures for the integration tests.

#![allow(dead_code)]

/// A CVRF document laid out exactly the way the XML encoder writes it.
pub const RICH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cvrfdoc xmlns="http://www.icasi.org/CVRF/schema/cvrf/1.2" xmlns:prod="http://www.icasi.org/CVRF/schema/prod/1.2" xmlns:vuln="http://www.icasi.org/CVRF/schema/vuln/1.2">
  <DocumentTitle>Example Advisory for Widget</DocumentTitle>
  <DocumentType>Security Advisory</DocumentType>
  <DocumentPublisher Type="Vendor" VendorID="EXV">
    <ContactDetails>security@example.com</ContactDetails>
    <IssuingAuthority>Example PSIRT</IssuingAuthority>
  </DocumentPublisher>
  <DocumentTracking>
    <Identification>
      <ID>EX-2021-001</ID>
      <Alias>EXA-1</Alias>
    </Identification>
    <Status>Final</Status>
    <Version>2</Version>
    <RevisionHistory>
      <Revision>
        <Number>1</Number>
        <Date>2021-01-01T00:00:00Z</Date>
        <Description>Initial release</Description>
      </Revision>
      <Revision>
        <Number>2</Number>
        <Date>2021-02-01T00:00:00Z</Date>
        <Description>Added fix information</Description>
      </Revision>
    </RevisionHistory>
    <InitialReleaseDate>2021-01-01T00:00:00Z</InitialReleaseDate>
    <CurrentReleaseDate>2021-02-01T00:00:00Z</CurrentReleaseDate>
    <Generator>
      <Engine>Example Generator 1.0</Engine>
      <Date>2021-02-01T00:00:00Z</Date>
    </Generator>
  </DocumentTracking>
  <DocumentNotes>
    <Note Title="Summary" Type="Summary" Ordinal="1">A flaw in Widget allows remote code execution.</Note>
    <Note Title="Legal" Audience="All" Type="Legal Disclaimer" Ordinal="2">Provided as is.</Note>
  </DocumentNotes>
  <DocumentDistribution>Public</DocumentDistribution>
  <AggregateSeverity Namespace="https://example.com/severity">Important</AggregateSeverity>
  <DocumentReferences>
    <Reference Type="Self">
      <URL>https://example.com/advisories/EX-2021-001</URL>
      <Description>Advisory</Description>
    </Reference>
  </DocumentReferences>
  <Acknowledgments>
    <Acknowledgment>
      <Name>Jane Researcher</Name>
      <Organization>Example Labs</Organization>
    </Acknowledgment>
  </Acknowledgments>
  <prod:ProductTree>
    <prod:Branch Type="Vendor" Name="Example">
      <prod:Branch Type="Product Name" Name="Widget">
        <prod:Branch Type="Product Version" Name="1.0">
          <prod:FullProductName ProductID="CSAFPID-1" CPE="cpe:/a:example:widget:1.0">Widget 1.0</prod:FullProductName>
        </prod:Branch>
        <prod:Branch Type="Product Version" Name="1.1">
          <prod:FullProductName ProductID="CSAFPID-2">Widget 1.1</prod:FullProductName>
        </prod:Branch>
      </prod:Branch>
    </prod:Branch>
    <prod:Relationship ProductReference="CSAFPID-1" RelationType="Installed On" RelatesToProductReference="CSAFPID-2">
      <prod:FullProductName ProductID="CSAFPID-3">Widget 1.0 on Widget 1.1</prod:FullProductName>
    </prod:Relationship>
    <prod:ProductGroups>
      <prod:Group GroupID="CSAFGID-1">
        <prod:Description>All Widget releases</prod:Description>
        <prod:ProductID>CSAFPID-1</prod:ProductID>
        <prod:ProductID>CSAFPID-2</prod:ProductID>
      </prod:Group>
    </prod:ProductGroups>
  </prod:ProductTree>
  <vuln:Vulnerability Ordinal="1">
    <vuln:Title>Remote code execution in Widget</vuln:Title>
    <vuln:ID SystemName="Example Bug Tracker">BUG-42</vuln:ID>
    <vuln:Notes>
      <vuln:Note Type="Description" Ordinal="1">Crafted input leads to code execution.</vuln:Note>
    </vuln:Notes>
    <vuln:DiscoveryDate>2020-12-01T00:00:00Z</vuln:DiscoveryDate>
    <vuln:ReleaseDate>2021-01-01T00:00:00Z</vuln:ReleaseDate>
    <vuln:Involvements>
      <vuln:Involvement Party="Vendor" Status="Completed"/>
    </vuln:Involvements>
    <vuln:CVE>CVE-2021-0001</vuln:CVE>
    <vuln:CWE ID="CWE-94">Improper Control of Generation of Code</vuln:CWE>
    <vuln:ProductStatuses>
      <vuln:Status Type="Known Affected">
        <vuln:ProductID>CSAFPID-1</vuln:ProductID>
      </vuln:Status>
      <vuln:Status Type="Fixed">
        <vuln:ProductID>CSAFPID-2</vuln:ProductID>
      </vuln:Status>
    </vuln:ProductStatuses>
    <vuln:Threats>
      <vuln:Threat Type="Impact">
        <vuln:Description>Remote code execution</vuln:Description>
        <vuln:GroupID>CSAFGID-1</vuln:GroupID>
      </vuln:Threat>
    </vuln:Threats>
    <vuln:CVSSScoreSets>
      <vuln:ScoreSetV3>
        <vuln:BaseScoreV3>9.8</vuln:BaseScoreV3>
        <vuln:VectorV3>CVSS:3.0/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H</vuln:VectorV3>
        <vuln:ProductID>CSAFPID-1</vuln:ProductID>
      </vuln:ScoreSetV3>
      <vuln:ScoreSetV2>
        <vuln:BaseScoreV2>10.0</vuln:BaseScoreV2>
        <vuln:VectorV2>AV:N/AC:L/Au:N/C:C/I:C/A:C</vuln:VectorV2>
        <vuln:ProductID>CSAFPID-1</vuln:ProductID>
      </vuln:ScoreSetV2>
    </vuln:CVSSScoreSets>
    <vuln:Remediations>
      <vuln:Remediation Type="Vendor Fix" Date="2021-02-01T00:00:00Z">
        <vuln:Description>Upgrade to Widget 1.1</vuln:Description>
        <vuln:URL>https://example.com/widget/1.1</vuln:URL>
        <vuln:ProductID>CSAFPID-1</vuln:ProductID>
      </vuln:Remediation>
    </vuln:Remediations>
    <vuln:References>
      <vuln:Reference Type="External">
        <vuln:URL>https://cve.example.org/CVE-2021-0001</vuln:URL>
        <vuln:Description>CVE entry</vuln:Description>
      </vuln:Reference>
    </vuln:References>
  </vuln:Vulnerability>
</cvrfdoc>
"#;

/// Smallest useful XML report: one product, one vulnerability pointing at
/// `product_ref`.
pub fn minimal_xml(product_ref: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cvrfdoc xmlns="http://www.icasi.org/CVRF/schema/cvrf/1.2" xmlns:prod="http://www.icasi.org/CVRF/schema/prod/1.2" xmlns:vuln="http://www.icasi.org/CVRF/schema/vuln/1.2">
  <DocumentTitle>Minimal</DocumentTitle>
  <DocumentType>Security Advisory</DocumentType>
  <DocumentPublisher Type="Vendor"/>
  <DocumentTracking>
    <Identification><ID>MIN-1</ID></Identification>
    <Status>Final</Status>
    <Version>1</Version>
    <RevisionHistory>
      <Revision><Number>1</Number><Date>2021-01-01T00:00:00Z</Date><Description>Initial</Description></Revision>
    </RevisionHistory>
    <InitialReleaseDate>2021-01-01T00:00:00Z</InitialReleaseDate>
    <CurrentReleaseDate>2021-01-01T00:00:00Z</CurrentReleaseDate>
  </DocumentTracking>
  <prod:ProductTree>
    <prod:Branch Type="Vendor" Name="Example">
      <prod:FullProductName ProductID="CSAFPID-1">Widget 1.0</prod:FullProductName>
    </prod:Branch>
  </prod:ProductTree>
  <vuln:Vulnerability Ordinal="1">
    <vuln:CVE>CVE-2021-0001</vuln:CVE>
    <vuln:ProductStatuses>
      <vuln:Status Type="Known Affected"><vuln:ProductID>{product_ref}</vuln:ProductID></vuln:Status>
    </vuln:ProductStatuses>
    <vuln:CVSSScoreSets>
      <vuln:ScoreSetV3>
        <vuln:BaseScoreV3>7.5</vuln:BaseScoreV3>
        <vuln:ProductID>{product_ref}</vuln:ProductID>
      </vuln:ScoreSetV3>
    </vuln:CVSSScoreSets>
  </vuln:Vulnerability>
</cvrfdoc>
"#
    )
}

/// JSON rendition of [`minimal_xml`].
pub fn minimal_json(product_ref: &str) -> String {
    serde_json::json!({
        "document": {
            "title": "Minimal",
            "type": "Security Advisory",
            "publisher": { "type": "vendor" },
            "tracking": {
                "id": "MIN-1",
                "status": "final",
                "version": "1",
                "revision_history": [
                    { "number": "1", "date": "2021-01-01T00:00:00Z", "description": "Initial" }
                ],
                "initial_release_date": "2021-01-01T00:00:00Z",
                "current_release_date": "2021-01-01T00:00:00Z"
            }
        },
        "product_tree": {
            "branches": [
                {
                    "type": "vendor",
                    "name": "Example",
                    "product": { "product_id": "CSAFPID-1", "name": "Widget 1.0" }
                }
            ]
        },
        "vulnerabilities": [
            {
                "ordinal": 1,
                "cve": "CVE-2021-0001",
                "product_status": [
                    { "type": "known_affected", "product_ids": [product_ref] }
                ],
                "scores": [
                    { "version": "v3", "base_score": 7.5, "product_ids": [product_ref] }
                ]
            }
        ]
    })
    .to_string()
}

/// [`minimal_json`] plus translated titles and notes.
pub fn translated_json() -> String {
    let mut value: serde_json::Value =
        serde_json::from_str(&minimal_json("CSAFPID-1")).expect("fixture is valid JSON");
    value["document"]["title_translations"] = serde_json::json!({ "de": "Minimal (de)", "fr": "Minimal (fr)" });
    value["document"]["notes"] = serde_json::json!([
        {
            "type": "summary",
            "ordinal": 1,
            "text": "Summary",
            "translations": { "de": "Zusammenfassung" }
        }
    ]);
    value["vulnerabilities"][0]["title"] = serde_json::json!("Flaw");
    value["vulnerabilities"][0]["title_translations"] = serde_json::json!({ "de": "Fehler" });
    value.to_string()
}
