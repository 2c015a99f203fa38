use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vacancy_explorer::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    routes,
    services::{
        ingestion_service::IngestionPipeline,
        scheduler_service::start_ingestion_scheduler,
        sources::{HeadHunterSource, SuperJobSource, VacancySource},
        vacancy_store::{PgVacancyStore, VacancyRepository},
    },
    AppState,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    run_migrations(&pool).await?;

    let store: Arc<dyn VacancyRepository> = Arc::new(PgVacancyStore::new(pool));
    let sources: Vec<Arc<dyn VacancySource>> = vec![
        Arc::new(HeadHunterSource::new(config.hh_area, config.request_timeout())?),
        Arc::new(SuperJobSource::new(
            config.superjob_max_pages,
            config.request_timeout(),
            config.proxy_list.clone(),
        )?),
    ];
    let pipeline = Arc::new(IngestionPipeline::new(
        sources,
        store.clone(),
        config.currency_rates.clone(),
    ));

    let _scheduler = start_ingestion_scheduler(
        pipeline.clone(),
        config.default_search_query.clone(),
        config.scheduler_interval(),
    )
    .await?;

    let app_state = AppState::new(store, pipeline, config.default_search_query.as_str());
    let app = routes::router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
