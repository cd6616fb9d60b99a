use std::sync::Arc;

use safespace::agent::{Agent, AgentDeps};
use safespace::cli::run_repl;
use safespace::config::SafeSpaceConfig;
use safespace::llm::create_provider;
use safespace::locator::TherapistLocator;
use safespace::specialist::MentalHealthSpecialist;
use safespace::telephony::EmergencyDialer;
use safespace::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = SafeSpaceConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export OPENAI_API_KEY=sk-...  (or ANTHROPIC_API_KEY=...)");
        std::process::exit(1);
    });

    eprintln!("🧠 SafeSpace v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Agent model: {}", config.llm.model);
    eprintln!(
        "   Specialist: {}",
        config
            .specialist
            .base_url
            .as_deref()
            .map(|url| format!("{} ({})", config.specialist.model, url))
            .unwrap_or_else(|| "disabled".to_string())
    );
    eprintln!("   Geocoder: {}", config.geocoder.base_url);
    eprintln!(
        "   Emergency calls: {}",
        if config.telephony.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    eprintln!("   Type a message and press Enter. /quit to exit.\n");

    let llm = create_provider(&config.llm)?;

    // ── Tools ────────────────────────────────────────────────────────────
    let tools = Arc::new(ToolRegistry::new());
    tools.register_safespace_tools(
        Arc::new(MentalHealthSpecialist::from_config(&config.specialist)),
        Arc::new(TherapistLocator::from_config(&config.geocoder)),
        Arc::new(EmergencyDialer::from_config(config.telephony.as_ref())),
    );
    tracing::debug!("Tools: {} registered", tools.count());

    // ── Agent ───────────────────────────────────────────────────────────
    let agent = Agent::new(config.agent, AgentDeps { llm, tools });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = run_repl(&agent, stdin, tokio::io::stdout()) => result?,
        _ = tokio::signal::ctrl_c() => eprintln!(),
    }

    eprintln!("Take care of yourself. Goodbye.");
    Ok(())
}
