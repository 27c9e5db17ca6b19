use factfind_agent::{
    config::{FactFinderSettings, GeminiConfig},
    conversation::FactFinder,
    demo::run_chat_loop,
    llm::GeminiClient,
};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Logs go to stderr so they stay out of the chat transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let gemini_config = GeminiConfig::from_env()?;
    let settings = FactFinderSettings::from_env()?;

    let client = GeminiClient::new(gemini_config)?;
    info!(
        model = %client.config().model,
        endpoint = %client.config().endpoint(),
        "Gemini client ready"
    );

    let finder = FactFinder::new(client).with_settings(settings);
    info!(
        dob_fallback_today = finder.settings().dob_fallback_today,
        "Fact-find agent starting"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let state = run_chat_loop(&finder, stdin, &mut stdout).await?;

    info!(finished = state.finished, messages = state.messages.len(), "Conversation ended");

    Ok(())
}
