//! Enumerated vocabularies shared by both formats.
//!
//! Every value has two spellings: the CVRF one used in XML (`Known Affected`)
//! and the snake_case one used in JSON (`known_affected`).

use serde::{Deserialize, Serialize};

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($xml:literal, $json:literal), )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $json)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// CVRF spelling.
            pub fn as_xml(&self) -> &'static str {
                match self {
                    $( $name::$variant => $xml, )+
                }
            }

            /// JSON spelling.
            pub fn as_json(&self) -> &'static str {
                match self {
                    $( $name::$variant => $json, )+
                }
            }

            pub fn from_xml(value: &str) -> Option<Self> {
                match value.trim() {
                    $( $xml => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_json())
            }
        }
    };
}

vocabulary! {
    /// Tracking status of the whole document.
    DocumentStatus {
        Draft => ("Draft", "draft"),
        Interim => ("Interim", "interim"),
        Final => ("Final", "final"),
    }
}

vocabulary! {
    /// Role of a publisher or of a party involved in handling a vulnerability.
    PartyType {
        Vendor => ("Vendor", "vendor"),
        Discoverer => ("Discoverer", "discoverer"),
        Coordinator => ("Coordinator", "coordinator"),
        User => ("User", "user"),
        Other => ("Other", "other"),
    }
}

vocabulary! {
    NoteType {
        General => ("General", "general"),
        Details => ("Details", "details"),
        Description => ("Description", "description"),
        Summary => ("Summary", "summary"),
        Faq => ("FAQ", "faq"),
        LegalDisclaimer => ("Legal Disclaimer", "legal_disclaimer"),
        Other => ("Other", "other"),
    }
}

vocabulary! {
    ReferenceType {
        External => ("External", "external"),
        /// The reference points at the document itself.
        SelfReference => ("Self", "self"),
    }
}

vocabulary! {
    BranchType {
        Vendor => ("Vendor", "vendor"),
        ProductFamily => ("Product Family", "product_family"),
        ProductName => ("Product Name", "product_name"),
        ProductVersion => ("Product Version", "product_version"),
        PatchLevel => ("Patch Level", "patch_level"),
        ServicePack => ("Service Pack", "service_pack"),
        Architecture => ("Architecture", "architecture"),
        Language => ("Language", "language"),
        Legacy => ("Legacy", "legacy"),
        Specification => ("Specification", "specification"),
        HostName => ("Host Name", "host_name"),
        Realm => ("Realm", "realm"),
        Resource => ("Resource", "resource"),
    }
}

vocabulary! {
    RelationType {
        DefaultComponentOf => ("Default Component Of", "default_component_of"),
        OptionalComponentOf => ("Optional Component Of", "optional_component_of"),
        ExternalComponentOf => ("External Component Of", "external_component_of"),
        InstalledOn => ("Installed On", "installed_on"),
        InstalledWith => ("Installed With", "installed_with"),
    }
}

vocabulary! {
    /// Status bucket a set of products falls into for one vulnerability.
    ProductStatusType {
        FirstAffected => ("First Affected", "first_affected"),
        KnownAffected => ("Known Affected", "known_affected"),
        KnownNotAffected => ("Known Not Affected", "known_not_affected"),
        FirstFixed => ("First Fixed", "first_fixed"),
        Fixed => ("Fixed", "fixed"),
        Recommended => ("Recommended", "recommended"),
        LastAffected => ("Last Affected", "last_affected"),
    }
}

vocabulary! {
    ThreatType {
        Impact => ("Impact", "impact"),
        ExploitStatus => ("Exploit Status", "exploit_status"),
        TargetSet => ("Target Set", "target_set"),
    }
}

vocabulary! {
    RemediationType {
        Workaround => ("Workaround", "workaround"),
        Mitigation => ("Mitigation", "mitigation"),
        VendorFix => ("Vendor Fix", "vendor_fix"),
        NoneAvailable => ("None Available", "none_available"),
        WillNotFix => ("Will Not Fix", "will_not_fix"),
    }
}

vocabulary! {
    InvolvementStatus {
        Open => ("Open", "open"),
        Disputed => ("Disputed", "disputed"),
        InProgress => ("In Progress", "in_progress"),
        Completed => ("Completed", "completed"),
        ContactAttempted => ("Contact Attempted", "contact_attempted"),
        NotContacted => ("Not Contacted", "not_contacted"),
    }
}

vocabulary! {
    /// CVSS major version of a score set. The XML spelling is the suffix of
    /// the score-set element names (`ScoreSetV2`, `BaseScoreV2`).
    CvssVersion {
        V2 => ("V2", "v2"),
        V3 => ("V3", "v3"),
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl Default for PartyType {
    fn default() -> Self {
        Self::Vendor
    }
}

impl Default for NoteType {
    fn default() -> Self {
        Self::General
    }
}
