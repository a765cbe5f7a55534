use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use protheus_sql_agent::{
    agents::{AnalystAgent, LlmSqlAgent},
    cache::{AnswerCache, MemoryAnswerCache, RedisAnswerCache},
    config::Config,
    db::{load_table_columns, render_table_info, PgQueryExecutor},
    embeddings::{schema_chunks, Embedder, HashingEmbedder, OpenAIEmbedder, SchemaIndex},
    llm::{LLMProviderConfig, LLM},
    middleware::apply_cors,
    routes::create_router,
    AppState, Orchestrator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "protheus_sql_agent=debug,tower_http=debug,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    // Connect to database
    let pool = protheus_sql_agent::db::create_pool(&config.database).await?;

    // Answer cache
    let cache: Arc<dyn AnswerCache> = if config.redis.enabled {
        Arc::new(RedisAnswerCache::connect(&config.redis.url).await?)
    } else {
        info!("Redis disabled, using in-process answer cache");
        Arc::new(MemoryAnswerCache::new())
    };

    // Schema index
    let embedder: Arc<dyn Embedder> = if config.llm.has_api_key() {
        Arc::new(OpenAIEmbedder::with_base_url(
            &config.llm.api_key,
            &config.llm.base_url,
            &config.llm.embedding_model,
        ))
    } else {
        warn!("OPENAI_API_KEY not set, using hashing embedder for schema search");
        Arc::new(HashingEmbedder::default())
    };
    let index = SchemaIndex::build(embedder, schema_chunks(&config.database.include_tables)).await?;

    // Agents
    let llm = Arc::new(LLM::new(LLMProviderConfig {
        name: "openai".to_string(),
        api_key: config.llm.api_key.clone(),
        base_url: config.llm.base_url.clone(),
    })?);
    let columns = load_table_columns(&pool, &config.database.include_tables).await?;
    let sql_agent = LlmSqlAgent::new(llm.clone(), &config.llm.model, config.llm.temperature)
        .with_table_info(render_table_info(&columns));
    let analyst = AnalystAgent::new(llm, &config.llm.model, config.llm.temperature);

    let orchestrator = Orchestrator::new(
        cache,
        Arc::new(index),
        Arc::new(sql_agent),
        Arc::new(PgQueryExecutor::new(pool.clone(), config.sql.read_only)),
        Arc::new(analyst),
    )
    .with_read_only(config.sql.read_only);

    // Create shared state
    let state = AppState { orchestrator: Arc::new(orchestrator) };

    // Create router
    let app = apply_cors(create_router(state), &config.server.cors_allowed_origins);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Closing database pool");
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
