use std::sync::Arc;

use crate::commands::CommandResult;
use cursus_agent::{
    AgentRuntime, LlmIntentAnalyzer, LlmResponseSynthesizer, OllamaClient, Storage,
};
use cursus_core::config::{AppConfig, LoadOptions};
use cursus_db::{connect_with_settings, migrations};

/// Drives one message through the full pipeline against the configured
/// database and prints the response envelope.
pub fn run(message: &str, code_permanent: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    crate::init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let client = Arc::new(
            OllamaClient::new(config.nlu.clone())
                .map_err(|error| ("nlu_client", error.to_string(), 6u8))?,
        );
        let analyzer = Arc::new(LlmIntentAnalyzer::new(client.clone(), &config.nlu));
        let synthesizer = config
            .nlu
            .synthesize_responses
            .then(|| {
                Arc::new(LlmResponseSynthesizer::new(client, &config.nlu))
                    as Arc<dyn cursus_agent::ResponseSynthesizer>
            });

        let agent = AgentRuntime::new(
            analyzer,
            synthesizer,
            Storage::sql(pool.clone()),
            config.registration.clone(),
        );

        let envelope = agent.process(message, code_permanent).await;
        pool.close().await;

        serde_json::to_string_pretty(&envelope)
            .map(|output| (envelope.success, output))
            .map_err(|error| ("serialization", error.to_string(), 7u8))
    });

    match result {
        Ok((true, output)) => CommandResult { exit_code: 0, output },
        Ok((false, output)) => CommandResult { exit_code: 1, output },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}
