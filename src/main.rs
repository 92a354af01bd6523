use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use colloquy::{
    default_toolkit, serve, Agent, AnthropicClient, AppConfig, ChatService, ColloquyError,
};

#[tokio::main]
async fn main() -> colloquy::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "colloquy.toml".to_string());
    let config = AppConfig::load(&config_path)?;

    let model = Arc::new(AnthropicClient::from_config(&config.model)?);
    let agent = Agent::new(model)
        .with_system_prompt(&config.agent.system_prompt)
        .with_tools(default_toolkit())
        .with_max_iterations(config.agent.max_iterations);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| ColloquyError::Config(format!("invalid listen address: {err}")))?;

    serve(ChatService::new(agent), addr).await
}
