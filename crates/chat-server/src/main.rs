use axum::http::{header, HeaderName, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{error, info, warn};

use chat_api::{build_router, AppState};
use chat_core::cache::{InMemorySessionCache, SessionCache};
use chat_core::services::{ChatOrchestrator, ModelRegistry, OrchestratorConfig};
use chat_infrastructure::{
    create_pool, run_migrations, LocalModelBackend, PgConversationStore, PgModelCatalog,
    RedisSessionCache,
};
use chat_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize telemetry
    chat_shared::telemetry::init_telemetry();

    info!("Chat Server starting...");

    // Load configuration (also reads .env)
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Connect to Database
    let pool = create_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Database connection established.");
    run_migrations(&pool).await?;

    let store = Arc::new(PgConversationStore::new(pool.clone()));
    let catalog = Arc::new(PgModelCatalog::new(pool));

    // Session cache
    let cache: Arc<dyn SessionCache> = if config.redis.enabled {
        Arc::new(RedisSessionCache::connect(&config.redis.url, config.session.key_prefix.clone()).await?)
    } else {
        warn!("Redis disabled, using in-process session cache");
        let memory = Arc::new(InMemorySessionCache::new());
        spawn_session_sweeper(memory.clone(), config.session.ttl());
        memory
    };

    // Model runtime
    let backend = Arc::new(LocalModelBackend::new(
        config.llm.base_url.clone(),
        config.llm.timeout(),
    )?);
    info!("Local model runtime at {}", config.llm.base_url);

    let registry = Arc::new(ModelRegistry::new(catalog, store.clone(), backend));
    let orchestrator = Arc::new(ChatOrchestrator::new(
        registry,
        store,
        cache,
        OrchestratorConfig {
            session_ttl: config.session.ttl(),
            default_timeout: config.llm.timeout(),
        },
    ));

    // Build router
    let app = build_router(AppState::new(orchestrator))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().include_headers(false)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-username")]),
        );

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop expired in-process sessions.
fn spawn_session_sweeper(cache: Arc<InMemorySessionCache>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.cleanup_expired();
            if removed > 0 {
                let stats = cache.stats();
                info!(
                    "Swept {} expired sessions ({} live, {} cached turns)",
                    removed, stats.live_entries, stats.cached_turns
                );
            }
        }
    });
}
