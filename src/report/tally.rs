//! Threat counts by severity and STRIDE category

use std::collections::HashMap;

use crate::entities::{Severity, StrideCategory, ThreatReport};

/// Counts behind the risk summary matrix
///
/// Severity labels from both vocabularies land in the same bucket, and a
/// threat with no severity at all counts as Low. Threats whose severity or
/// category matches no known label are counted in `unrated` /
/// `uncategorized` only, never in a listed bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreatTally {
    by_severity: HashMap<Severity, usize>,
    by_category: HashMap<StrideCategory, usize>,
    pub unrated: usize,
    pub uncategorized: usize,
}

impl ThreatTally {
    pub fn from_report(report: &ThreatReport) -> Self {
        let mut tally = ThreatTally::default();

        for entry in &report.stride_analysis {
            for threat in &entry.threats {
                let severity = if threat.severity.trim().is_empty() {
                    Some(Severity::Low)
                } else {
                    threat.severity_level()
                };
                match severity {
                    Some(severity) => *tally.by_severity.entry(severity).or_insert(0) += 1,
                    None => {
                        tracing::warn!(
                            component = %entry.component_name,
                            severity = %threat.severity,
                            "Threat severity is not a known label, leaving it out of severity counts"
                        );
                        tally.unrated += 1;
                    }
                }

                match threat.stride_category() {
                    Some(category) => *tally.by_category.entry(category).or_insert(0) += 1,
                    None => {
                        tracing::warn!(
                            component = %entry.component_name,
                            category = %threat.category,
                            "Threat category is not a STRIDE category, leaving it out of category counts"
                        );
                        tally.uncategorized += 1;
                    }
                }
            }
        }

        tally
    }

    pub fn severity(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn category(&self, category: StrideCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}
