//! STRIDE threat analysis over extracted components

use crate::entities::{ArchitectureDocument, ThreatReport};
use crate::llm::{ChatModel, ChatRequest, ContentPart, Exchange, Prompts};

use super::{parse_reply, AnalysisError};

/// Ask the model for a STRIDE breakdown of every component in `architecture`
pub fn analyze_threats(
    model: &dyn ChatModel,
    prompts: &Prompts,
    architecture: &ArchitectureDocument,
) -> Result<ThreatReport, AnalysisError> {
    let request = ChatRequest::new(Exchange::ThreatAnalysis)
        .with_part(ContentPart::text(prompts.stride_analysis(architecture)?));

    let reply = model.complete(&request)?;
    let report: ThreatReport = parse_reply(&reply, Exchange::ThreatAnalysis)?;

    let unanalyzed: Vec<&str> = architecture
        .components
        .iter()
        .filter(|c| {
            !report
                .stride_analysis
                .iter()
                .any(|entry| entry.component_name == c.name)
        })
        .map(|c| c.name.as_str())
        .collect();
    if !unanalyzed.is_empty() {
        tracing::debug!(components = ?unanalyzed, "Model returned no STRIDE entry for some components");
    }

    tracing::debug!(
        entries = report.stride_analysis.len(),
        threats = report.threat_count(),
        overall_risk = %report.overall_risk_level,
        "Completed STRIDE analysis"
    );

    Ok(report)
}
