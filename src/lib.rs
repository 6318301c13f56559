//! STRIDE threat modeling from architecture diagrams
//!
//! A vision-capable language model reads an architecture diagram and lists
//! its components and data flows; a second exchange runs a STRIDE analysis
//! over that inventory; the result is rendered as a Markdown report.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod entities;
pub mod llm;
pub mod report;
