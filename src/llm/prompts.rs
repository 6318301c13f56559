//! Prompt generation from embedded templates

use miette::Diagnostic;
use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;

use crate::entities::{ArchitectureDocument, ComponentKind, Severity, StrideCategory, GENERIC_PROVIDER};

#[derive(Embed)]
#[folder = "templates/prompts/"]
struct EmbeddedPrompts;

const COMPONENT_EXTRACTION: &str = "component_extraction.tera";
const STRIDE_ANALYSIS: &str = "stride_analysis.tera";

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("Prompt template not found: {0}")]
    #[diagnostic(code(stride::prompt::not_found))]
    NotFound(String),

    #[error("Prompt rendering error: {0}")]
    #[diagnostic(code(stride::prompt::render))]
    RenderError(String),
}

#[derive(Serialize)]
struct CategoryContext {
    letter: char,
    name: String,
    question: &'static str,
}

/// Renders the two prompts sent to the model
pub struct Prompts {
    tera: Tera,
}

impl Prompts {
    /// Create a prompt generator with the embedded templates
    pub fn new() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        for file in EmbeddedPrompts::iter() {
            let filename = file.as_ref();
            let content = EmbeddedPrompts::get(filename)
                .ok_or_else(|| PromptError::NotFound(filename.to_string()))?;
            let template_str = std::str::from_utf8(&content.data)
                .map_err(|e| PromptError::RenderError(format!("{filename}: {e}")))?;
            tera.add_raw_template(filename, template_str)
                .map_err(|e| PromptError::RenderError(e.to_string()))?;
        }

        for required in [COMPONENT_EXTRACTION, STRIDE_ANALYSIS] {
            if !tera.get_template_names().any(|n| n == required) {
                return Err(PromptError::NotFound(required.to_string()));
            }
        }

        Ok(Self { tera })
    }

    /// Instruction text for reading components off the diagram
    pub fn component_extraction(&self) -> Result<String, PromptError> {
        let kinds: Vec<&str> = ComponentKind::CATALOG.iter().map(ComponentKind::label).collect();

        let mut context = tera::Context::new();
        context.insert("component_kinds", &kinds);
        context.insert("generic_provider", GENERIC_PROVIDER);

        self.render(COMPONENT_EXTRACTION, &context)
    }

    /// Instruction text for the STRIDE analysis of extracted components
    pub fn stride_analysis(&self, architecture: &ArchitectureDocument) -> Result<String, PromptError> {
        let components_json = serde_json::to_string_pretty(&architecture.components)
            .map_err(|e| PromptError::RenderError(e.to_string()))?;
        let summary = if architecture.architecture_summary.trim().is_empty() {
            "N/A"
        } else {
            architecture.architecture_summary.as_str()
        };

        let categories: Vec<CategoryContext> = StrideCategory::ALL
            .iter()
            .map(|c| {
                let name = c.to_string();
                CategoryContext {
                    letter: name.chars().next().unwrap_or('?'),
                    name,
                    question: c.question(),
                }
            })
            .collect();
        let category_names: Vec<String> = StrideCategory::ALL.iter().map(ToString::to_string).collect();
        let severities: Vec<String> = Severity::DESCENDING.iter().map(ToString::to_string).collect();

        let mut context = tera::Context::new();
        context.insert("components_json", &components_json);
        context.insert("architecture_summary", summary);
        context.insert("categories", &categories);
        context.insert("category_names", &category_names);
        context.insert("severities", &severities);

        self.render(STRIDE_ANALYSIS, &context)
    }

    fn render(&self, name: &str, context: &tera::Context) -> Result<String, PromptError> {
        self.tera
            .render(name, context)
            .map_err(|e| PromptError::RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Component;

    fn sample_architecture() -> ArchitectureDocument {
        ArchitectureDocument {
            components: vec![
                Component::new("Web App", ComponentKind::WebServer)
                    .with_provider("AWS EC2")
                    .with_connection("Orders DB", "SQL queries <orders>"),
                Component::new("Orders DB", ComponentKind::Database),
            ],
            architecture_summary: "A web app backed by a database.".to_string(),
        }
    }

    #[test]
    fn test_extraction_prompt_lists_kinds() {
        let prompts = Prompts::new().unwrap();
        let prompt = prompts.component_extraction().unwrap();

        assert!(prompt.contains("API Gateway, Load Balancer"));
        assert!(prompt.contains("CI/CD, Other"));
        assert!(prompt.contains("\"architecture_summary\""));
        assert!(prompt.contains("otherwise \"Generic\""));
    }

    #[test]
    fn test_stride_prompt_embeds_components() {
        let prompts = Prompts::new().unwrap();
        let prompt = prompts.stride_analysis(&sample_architecture()).unwrap();

        assert!(prompt.contains("\"name\": \"Web App\""));
        assert!(prompt.contains("\"type\": \"Web Server\""));
        // no HTML escaping of model context
        assert!(prompt.contains("SQL queries <orders>"));
        assert!(prompt.contains("A web app backed by a database."));
    }

    #[test]
    fn test_stride_prompt_lists_categories_and_severities() {
        let prompts = Prompts::new().unwrap();
        let prompt = prompts.stride_analysis(&sample_architecture()).unwrap();

        assert!(prompt.contains("**S - Spoofing**"));
        assert!(prompt.contains("**E - Elevation of Privilege**"));
        assert!(prompt.contains("Critical|High|Medium|Low"));
        assert!(prompt.contains(
            "Spoofing|Tampering|Repudiation|Information Disclosure|Denial of Service|Elevation of Privilege"
        ));
    }

    #[test]
    fn test_stride_prompt_without_summary() {
        let prompts = Prompts::new().unwrap();
        let prompt = prompts.stride_analysis(&ArchitectureDocument::default()).unwrap();

        assert!(prompt.contains("## Components\n[]"));
        assert!(prompt.contains("## Architecture Summary\nN/A"));
    }
}
