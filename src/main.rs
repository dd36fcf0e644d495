mod app;
mod assignments;
mod config;
mod courses;
mod error;
mod middleware;
mod repo;
mod state;
mod students;
mod validate;

use tracing_subscriber::EnvFilter;

use crate::state::AppState;

const DEFAULT_FILTER: &str = "academy=debug,axum=info,tower_http=info";

/// Plain text logs unless `LOG_FORMAT=json`; `RUST_LOG` overrides the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.with_target(false).json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    let router = app::build_app(state.clone());
    let served = app::serve(router, &state.config).await;

    state.close().await;
    tracing::info!("store closed");
    served
}
