use std::sync::Arc;
use std::time::Duration;

use ridgeline_authz::{AuthorizationEngine, GrantStore, InMemoryGrantStore, PresetRegistry};
use ridgeline_infra::{ExpirySweeper, PostgresGrantStore, SweeperConfig};

#[tokio::main]
async fn main() {
    ridgeline_observability::init();

    let store: Arc<dyn GrantStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(8)
                .connect(&url)
                .await
                .expect("failed to connect to postgres");
            let store = PostgresGrantStore::new(pool);
            store
                .ensure_schema()
                .await
                .expect("failed to apply grants schema");
            Arc::new(store)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory grant store (dev only)");
            InMemoryGrantStore::arc()
        }
    };

    let sweep_interval = std::env::var("RIDGELINE_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);
    let sweeper = ExpirySweeper::spawn(
        store.clone(),
        SweeperConfig::default().with_interval(Duration::from_secs(sweep_interval)),
    );

    let engine = AuthorizationEngine::new(PresetRegistry::default_presets(), store);
    let app = ridgeline_api::app::build_app(engine);

    let addr = std::env::var("RIDGELINE_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();

    sweeper.shutdown();
}
