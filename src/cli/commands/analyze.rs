//! Full threat modeling run: diagram in, Markdown report out

use chrono::Local;
use console::style;

use crate::analysis::{analyze_threats, extract_components};
use crate::cli::Cli;
use crate::core::config::{Config, Settings};
use crate::core::error::Result;
use crate::core::image::DiagramImage;
use crate::llm::{ChatModel, OpenAiClient, Prompts};
use crate::report::{render_report, write_report};

const STEPS: usize = 3;

pub fn run(cli: Cli) -> Result<()> {
    // A local .env may supply the credential; a missing file is fine
    dotenvy::dotenv().ok();

    let image = DiagramImage::load(&cli.image)?;

    let config = Config::load()?.with_overrides(cli.config_overrides());
    let settings = Settings::from_env(config)?;
    tracing::debug!(?settings, "Resolved settings");

    let prompts = Prompts::new()?;
    let client = OpenAiClient::new(&settings)?;

    let summary = execute(&client, &prompts, &image, &cli)?;

    println!(
        "{} Report written to {}",
        style("✓").green(),
        style(cli.output.display()).cyan()
    );
    if !cli.quiet {
        println!("  Components:   {}", style(summary.components).cyan());
        println!("  Threats:      {}", style(summary.threats).cyan());
        println!("  Overall risk: {}", style(summary.overall_risk).yellow());
    }

    Ok(())
}

/// Counts shown after a successful run
#[derive(Debug)]
struct RunSummary {
    components: usize,
    threats: usize,
    overall_risk: String,
}

fn execute(model: &dyn ChatModel, prompts: &Prompts, image: &DiagramImage, cli: &Cli) -> Result<RunSummary> {
    progress(cli, 1, &format!("Extracting components from {}", image.path.display()));
    let architecture = extract_components(model, prompts, image)?;
    if !cli.quiet {
        println!(
            "      found {} component(s), {} connection(s)",
            architecture.components.len(),
            architecture.connection_count()
        );
    }

    progress(cli, 2, "Running STRIDE threat analysis");
    let threats = analyze_threats(model, prompts, &architecture)?;

    progress(cli, 3, "Generating report");
    let content = render_report(&architecture, &threats, &cli.image, Local::now().naive_local());
    write_report(&cli.output, &content)?;

    let overall_risk = match threats.overall_severity() {
        Some(severity) => format!("{} {}", severity.emoji(), severity),
        None if threats.overall_risk_level.trim().is_empty() => "N/A".to_string(),
        None => threats.overall_risk_level.clone(),
    };

    Ok(RunSummary {
        components: architecture.components.len(),
        threats: threats.threat_count(),
        overall_risk,
    })
}

fn progress(cli: &Cli, step: usize, message: &str) {
    if !cli.quiet {
        println!("{} {}", style(format!("[{step}/{STEPS}]")).dim(), message);
    }
}
