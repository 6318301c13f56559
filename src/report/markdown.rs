//! Markdown rendering of the threat model

use chrono::NaiveDateTime;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use super::tally::ThreatTally;
use crate::entities::{ArchitectureDocument, Severity, StrideCategory, Threat, ThreatReport};

/// Badge for a severity label outside both vocabularies
const NEUTRAL_BADGE: &str = "⚪";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the full report
///
/// Output depends only on the arguments, so identical inputs render
/// byte-identical text.
pub fn render_report(
    architecture: &ArchitectureDocument,
    threats: &ThreatReport,
    source: &Path,
    generated_at: NaiveDateTime,
) -> String {
    let mut output = String::new();

    render_header(&mut output, threats, source, generated_at);
    render_summaries(&mut output, architecture, threats);
    render_components(&mut output, architecture);
    render_data_flows(&mut output, architecture);
    render_stride_analysis(&mut output, threats);
    render_risk_matrix(&mut output, &ThreatTally::from_report(threats));
    render_footer(&mut output);

    output
}

fn render_header(output: &mut String, threats: &ThreatReport, source: &Path, generated_at: NaiveDateTime) {
    output.push_str("# 🛡️ STRIDE Threat Modeling Report\n\n");
    output.push_str(&format!(
        "**Generated:** {}  \n",
        generated_at.format(TIMESTAMP_FORMAT)
    ));
    output.push_str(&format!("**Source Diagram:** `{}`  \n", source.display()));
    output.push_str(&format!(
        "**Overall Risk Level:** {} **{}**\n\n",
        severity_badge(&threats.overall_risk_level),
        or_na(&threats.overall_risk_level)
    ));
    output.push_str("---\n\n");
}

fn render_summaries(output: &mut String, architecture: &ArchitectureDocument, threats: &ThreatReport) {
    output.push_str("## 📋 Executive Summary\n\n");
    output.push_str(or_na(&threats.executive_summary));
    output.push_str("\n\n");

    output.push_str("## 🏗️ Architecture Overview\n\n");
    output.push_str(or_na(&architecture.architecture_summary));
    output.push_str("\n\n");
}

fn render_components(output: &mut String, architecture: &ArchitectureDocument) {
    output.push_str("## 🧩 Identified Components\n\n");

    if architecture.components.is_empty() {
        output.push_str("_No components identified._\n\n");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["#", "Component", "Type", "Provider", "Description"]);
    for (i, component) in architecture.components.iter().enumerate() {
        builder.push_record([
            (i + 1).to_string(),
            format!("**{}**", cell(or_na(&component.name))),
            cell(or_na(component.kind.label())),
            cell(or_na(&component.provider)),
            cell(or_na(&component.description)),
        ]);
    }
    push_table(output, builder);
}

fn render_data_flows(output: &mut String, architecture: &ArchitectureDocument) {
    output.push_str("## 🔄 Data Flow\n\n");

    let mut any = false;
    for component in architecture.connected_components() {
        any = true;
        output.push_str(&format!("### {}\n", or_na(&inline(&component.name))));
        for connection in &component.connections {
            output.push_str(&format!(
                "- → **{}**: {}\n",
                or_placeholder(&inline(&connection.target), "?"),
                or_placeholder(&inline(&connection.data_flow), "?")
            ));
        }
        output.push('\n');
    }

    if !any {
        output.push_str("_No data flows declared._\n\n");
    }
}

fn render_stride_analysis(output: &mut String, threats: &ThreatReport) {
    output.push_str("---\n\n");
    output.push_str("## 🔍 STRIDE Threat Analysis\n\n");

    if threats.stride_analysis.is_empty() {
        output.push_str("_No components were analyzed._\n\n");
    }

    for entry in &threats.stride_analysis {
        output.push_str(&format!(
            "### 🔹 {} ({})\n\n",
            or_placeholder(&inline(&entry.component_name), "Unknown"),
            or_placeholder(&inline(&entry.component_type), "Unknown")
        ));

        if entry.threats.is_empty() {
            output.push_str("_No significant threats identified._\n\n");
            continue;
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Category",
            "Threat",
            "Severity",
            "Vulnerabilities",
            "Countermeasures",
        ]);
        for threat in &entry.threats {
            builder.push_record(threat_row(threat));
        }
        push_table(output, builder);
    }
}

fn threat_row(threat: &Threat) -> [String; 5] {
    [
        format!("**{}**", cell(or_na(&threat.category))),
        cell(or_na(&threat.description)),
        format!(
            "{} {}",
            severity_badge(&threat.severity),
            cell(or_na(&threat.severity))
        ),
        cell(&threat.vulnerabilities.join("; ")),
        cell(&threat.countermeasures.join("; ")),
    ]
}

fn render_risk_matrix(output: &mut String, tally: &ThreatTally) {
    output.push_str("---\n\n");
    output.push_str("## 📊 Risk Summary Matrix\n\n");

    output.push_str("### By Severity\n\n");
    let mut builder = Builder::default();
    builder.push_record(["Severity", "Count"]);
    for severity in Severity::DESCENDING {
        builder.push_record([
            format!("{} {}", severity.emoji(), severity),
            tally.severity(severity).to_string(),
        ]);
    }
    push_table(output, builder);
    if tally.unrated > 0 {
        output.push_str(&format!(
            "_{} threat(s) with an unrecognized severity are not counted above._\n\n",
            tally.unrated
        ));
    }

    output.push_str("### By STRIDE Category\n\n");
    let mut builder = Builder::default();
    builder.push_record(["Category", "Count"]);
    for category in StrideCategory::ALL {
        builder.push_record([category.to_string(), tally.category(category).to_string()]);
    }
    push_table(output, builder);
    if tally.uncategorized > 0 {
        output.push_str(&format!(
            "_{} threat(s) outside the STRIDE categories are not counted above._\n\n",
            tally.uncategorized
        ));
    }
}

fn render_footer(output: &mut String) {
    output.push_str("---\n\n");
    output.push_str(
        "*This report was generated automatically using AI-assisted architecture analysis \
         and STRIDE threat modeling. Findings should be reviewed and validated by a \
         qualified security professional.*\n",
    );
}

fn push_table(output: &mut String, builder: Builder) {
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push_str("\n\n");
}

/// Badge for a raw severity label, neutral when unrecognized
pub fn severity_badge(label: &str) -> &'static str {
    Severity::from_label(label).map_or(NEUTRAL_BADGE, |s| s.emoji())
}

/// Make model text safe inside a Markdown table cell
fn cell(text: &str) -> String {
    text.trim()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Collapse model text onto one line for headings and list items
fn inline(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn or_na(text: &str) -> &str {
    or_placeholder(text, "N/A")
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text
    }
}
