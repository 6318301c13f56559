//! Component extraction from a diagram image

use crate::core::image::DiagramImage;
use crate::entities::ArchitectureDocument;
use crate::llm::{ChatModel, ChatRequest, ContentPart, Exchange, Prompts};

use super::{parse_reply, AnalysisError};

/// Ask the model to enumerate the components and connections in `image`
pub fn extract_components(
    model: &dyn ChatModel,
    prompts: &Prompts,
    image: &DiagramImage,
) -> Result<ArchitectureDocument, AnalysisError> {
    let request = ChatRequest::new(Exchange::ComponentExtraction)
        .with_part(ContentPart::text(prompts.component_extraction()?))
        .with_part(ContentPart::image(image.data_url()));

    let reply = model.complete(&request)?;
    let document: ArchitectureDocument = parse_reply(&reply, Exchange::ComponentExtraction)?;

    let unlisted = document
        .components
        .iter()
        .filter(|c| !c.kind.is_listed())
        .count();
    tracing::debug!(
        components = document.components.len(),
        connections = document.connection_count(),
        unlisted_kinds = unlisted,
        "Extracted architecture components"
    );

    Ok(document)
}
