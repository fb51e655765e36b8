use std::sync::Arc;

use straymatch::config::AppConfig;
use straymatch::context::{ChannelNavigator, SessionContext, UserId};
use straymatch::llm::create_provider;
use straymatch::store::{LibSqlStore, RecordStore};
use straymatch::terminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("🐾 StrayMatch v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.completion.model);
    eprintln!("   Database: {}", config.db_path.display());

    let llm = create_provider(&config.completion)?;

    let store: Arc<dyn RecordStore> = Arc::new(
        LibSqlStore::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );

    let user = config.user_id.clone().map(UserId::new);
    match &user {
        Some(id) => eprintln!("   User: {id}"),
        None => eprintln!("   No user set (STRAYMATCH_USER_ID); chats are not saved and forms cannot be submitted."),
    }
    eprintln!("   Type a message and press Enter. /help for commands, /quit to exit.\n");

    let (navigator, navigation) = ChannelNavigator::new();
    let ctx = SessionContext::new(user, store, Arc::new(navigator));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    terminal::run(stdin, ctx, llm, config.chat.clone(), navigation).await?;

    tracing::info!("Goodbye");
    Ok(())
}
