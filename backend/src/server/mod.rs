//! Server construction and wiring.
//!
//! Adapters are chosen from configuration: a Diesel-backed rule store when
//! `DATABASE_URL` is set (falling back to the seeded in-memory fixture
//! otherwise), and a Redis shared cache when `REDIS_URL` is set. A Redis
//! connection failure is logged and downgraded to the no-op cache; the
//! service stays correct without it.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use backend::Trace;
use backend::config::AppConfig;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::domain::ports::{
    FareRuleStore, FixtureFareRuleStore, NoopSharedFareCache, SharedFareCache,
};
use backend::domain::{FareResolutionService, LocalFareCache, ZoneSetCache};
use backend::inbound::http::fares::calculate_fares;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::rules::{list_fare_rules, upsert_fare_rule};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::zones::add_zone;
use backend::outbound::cache::{RedisCacheConfig, RedisFareCache};
use backend::outbound::persistence::{DbPool, DieselFareRuleStore, PoolConfig, migrate_schema};

fn chrono_duration(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

/// Pick the shared cache implementation, downgrading to the no-op cache when
/// Redis is not configured or unreachable.
async fn shared_cache(config: &AppConfig) -> Arc<dyn SharedFareCache> {
    let Some(url) = &config.redis_url else {
        info!("no REDIS_URL set; running without a shared cache");
        return Arc::new(NoopSharedFareCache);
    };

    let cache_config = RedisCacheConfig::new(url.clone())
        .with_ttl(config.shared_cache_ttl)
        .with_ttl_jitter(config.shared_cache_ttl_jitter)
        .with_op_timeout(config.shared_cache_op_timeout);
    match RedisFareCache::connect(cache_config).await {
        Ok(cache) => {
            info!("shared fare cache connected");
            Arc::new(cache)
        }
        Err(error) => {
            warn!(%error, "redis unavailable; running without a shared cache");
            Arc::new(NoopSharedFareCache)
        }
    }
}

/// Assemble the resolution facade over a concrete store, warm the caches,
/// and expose it through the handler state.
async fn facade_state<S>(
    store: Arc<S>,
    config: &AppConfig,
    shared: Arc<dyn SharedFareCache>,
) -> HttpState
where
    S: FareRuleStore + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let facade = Arc::new(FareResolutionService::new(
        store,
        LocalFareCache::new(
            chrono_duration(config.local_cache_ttl),
            config.local_cache_capacity,
            Arc::clone(&clock),
        ),
        shared,
        ZoneSetCache::new(chrono_duration(config.zone_set_ttl), clock),
        config.missing_rule_policy,
    ));

    if let Err(error) = facade.warm_caches().await {
        warn!(%error, "cache warm-up failed; caches fill lazily");
    }
    HttpState::from_facade(facade)
}

async fn build_http_state(config: &AppConfig) -> std::io::Result<HttpState> {
    let shared = shared_cache(config).await;
    match &config.database_url {
        Some(url) => {
            migrate_schema(url).await.map_err(std::io::Error::other)?;
            let pool = DbPool::new(PoolConfig::new(url.clone()))
                .await
                .map_err(std::io::Error::other)?;
            let store = DieselFareRuleStore::new(pool);
            store
                .ensure_seeded()
                .await
                .map_err(std::io::Error::other)?;
            Ok(facade_state(Arc::new(store), config, shared).await)
        }
        None => {
            info!("no DATABASE_URL set; using the in-memory fixture store");
            Ok(facade_state(Arc::new(FixtureFareRuleStore::seeded()), config, shared).await)
        }
    }
}

/// Bind and run the HTTP server until shutdown.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let http_state = web::Data::new(build_http_state(&config).await?);
    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .service(calculate_fares)
            .service(list_fare_rules)
            .service(upsert_fare_rule)
            .service(add_zone);

        let app = App::new()
            .app_data(http_state.clone())
            .app_data(server_health_state.clone())
            .wrap(Trace)
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app = app.service(
            SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );

        app
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    info!(addr = %config.bind_addr, "fare service listening");
    server.run().await
}
