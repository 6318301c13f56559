//! STRIDE threat entities produced by the threat analysis

use serde::{Deserialize, Serialize};

use super::{null_to_default, one_or_many};

/// Threat severity, ordered Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Most severe first, the order used in reports
    pub const DESCENDING: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Parse a severity label in either English or Portuguese
    ///
    /// Models asked for `Critical|High|Medium|Low` regularly answer with
    /// `Crítica|Alta|Média|Baixa`, so both vocabularies map to the same level.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "critical" | "crítica" | "critica" => Some(Severity::Critical),
            "high" | "alta" => Some(Severity::High),
            "medium" | "média" | "media" => Some(Severity::Medium),
            "low" | "baixa" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::High => "🟠",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::High => write!(f, "High"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Low => write!(f, "Low"),
        }
    }
}

/// STRIDE threat categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrideCategory {
    /// Impersonating a component or its users
    Spoofing,
    /// Modifying data in transit or at rest
    Tampering,
    /// Acting without an audit trail
    Repudiation,
    /// Exposing sensitive data
    InformationDisclosure,
    /// Making a component unavailable
    DenialOfService,
    /// Gaining permissions beyond those granted
    ElevationOfPrivilege,
}

impl StrideCategory {
    pub const ALL: [StrideCategory; 6] = [
        StrideCategory::Spoofing,
        StrideCategory::Tampering,
        StrideCategory::Repudiation,
        StrideCategory::InformationDisclosure,
        StrideCategory::DenialOfService,
        StrideCategory::ElevationOfPrivilege,
    ];

    /// Parse a category label, ignoring case, spacing and punctuation
    ///
    /// Accepts the full name ("Information Disclosure", "denial_of_service")
    /// or the single STRIDE letter.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "spoofing" | "s" => Some(StrideCategory::Spoofing),
            "tampering" | "t" => Some(StrideCategory::Tampering),
            "repudiation" | "r" => Some(StrideCategory::Repudiation),
            "informationdisclosure" | "i" => Some(StrideCategory::InformationDisclosure),
            "denialofservice" | "dos" | "d" => Some(StrideCategory::DenialOfService),
            "elevationofprivilege" | "e" => Some(StrideCategory::ElevationOfPrivilege),
            _ => None,
        }
    }

    /// The question the analysis asks of each component for this category
    pub fn question(&self) -> &'static str {
        match self {
            StrideCategory::Spoofing => {
                "Can an attacker impersonate this component or its users?"
            }
            StrideCategory::Tampering => "Can data in transit or at rest be modified?",
            StrideCategory::Repudiation => {
                "Can actions be performed without proper logging or auditing?"
            }
            StrideCategory::InformationDisclosure => "Can sensitive data be exposed?",
            StrideCategory::DenialOfService => "Can the component be made unavailable?",
            StrideCategory::ElevationOfPrivilege => {
                "Can an attacker gain unauthorized access or permissions?"
            }
        }
    }
}

impl std::fmt::Display for StrideCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrideCategory::Spoofing => write!(f, "Spoofing"),
            StrideCategory::Tampering => write!(f, "Tampering"),
            StrideCategory::Repudiation => write!(f, "Repudiation"),
            StrideCategory::InformationDisclosure => write!(f, "Information Disclosure"),
            StrideCategory::DenialOfService => write!(f, "Denial of Service"),
            StrideCategory::ElevationOfPrivilege => write!(f, "Elevation of Privilege"),
        }
    }
}

/// One threat against one component
///
/// Category and severity keep the model's raw labels; use
/// [`Threat::stride_category`] and [`Threat::severity_level`] to classify them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threat {
    #[serde(default, deserialize_with = "null_to_default")]
    pub category: String,

    #[serde(rename = "threat", default, deserialize_with = "null_to_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_to_default")]
    pub severity: String,

    #[serde(default, deserialize_with = "one_or_many")]
    pub vulnerabilities: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub countermeasures: Vec<String>,
}

impl Threat {
    pub fn new(
        category: StrideCategory,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            category: category.to_string(),
            description: description.into(),
            severity: severity.to_string(),
            vulnerabilities: Vec::new(),
            countermeasures: Vec::new(),
        }
    }

    pub fn with_vulnerability(mut self, vulnerability: impl Into<String>) -> Self {
        self.vulnerabilities.push(vulnerability.into());
        self
    }

    pub fn with_countermeasure(mut self, countermeasure: impl Into<String>) -> Self {
        self.countermeasures.push(countermeasure.into());
        self
    }

    pub fn stride_category(&self) -> Option<StrideCategory> {
        StrideCategory::from_label(&self.category)
    }

    pub fn severity_level(&self) -> Option<Severity> {
        Severity::from_label(&self.severity)
    }
}

/// Threats found for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentThreatEntry {
    #[serde(default, deserialize_with = "null_to_default")]
    pub component_name: String,

    #[serde(default, deserialize_with = "null_to_default")]
    pub component_type: String,

    #[serde(default, deserialize_with = "null_to_default")]
    pub threats: Vec<Threat>,
}

impl ComponentThreatEntry {
    pub fn new(component_name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            component_type: component_type.into(),
            threats: Vec::new(),
        }
    }

    pub fn with_threat(mut self, threat: Threat) -> Self {
        self.threats.push(threat);
        self
    }
}

/// Result of the STRIDE analysis over all components
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatReport {
    #[serde(default, deserialize_with = "null_to_default")]
    pub stride_analysis: Vec<ComponentThreatEntry>,

    #[serde(default, deserialize_with = "null_to_default")]
    pub overall_risk_level: String,

    #[serde(default, deserialize_with = "null_to_default")]
    pub executive_summary: String,
}

impl ThreatReport {
    /// Every threat across all components, in report order
    pub fn threats(&self) -> impl Iterator<Item = &Threat> {
        self.stride_analysis.iter().flat_map(|entry| entry.threats.iter())
    }

    pub fn threat_count(&self) -> usize {
        self.threats().count()
    }

    pub fn overall_severity(&self) -> Option<Severity> {
        Severity::from_label(&self.overall_risk_level)
    }
}
