// bedside - statement impact scoring service
// Startup: load config, load or train the model, evaluate the held-out set
// if configured, then serve. Startup failures abort before the listener
// binds; the model is immutable once serving begins.

use anyhow::Context;
use bedside::app_state::{AppState, ModelSource};
use bedside::config_loader::load_config;
use bedside::model::LinearModel;
use bedside::trainer::{evaluate, train};
use bedside::web::build_analysis_router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let config = load_config().context("failed to load config")?;

    let model_path = Path::new(&config.model_path).to_path_buf();
    let (model, model_source) = if model_path.is_file() {
        let model = LinearModel::load(&model_path)
            .with_context(|| format!("failed to load model from {}", config.model_path))?;
        info!("loaded model from {}", config.model_path);
        (model, ModelSource::Loaded)
    } else {
        info!(
            "no model at {}, training from {}",
            config.model_path, config.train_data
        );
        let model = train(Path::new(&config.train_data), &config.training)
            .context("initial training failed")?;
        model
            .save(&model_path)
            .with_context(|| format!("failed to persist model to {}", config.model_path))?;
        model
            .write_manifest(&model_path)
            .context("failed to write model manifest")?;
        info!("trained and persisted model to {}", config.model_path);
        (model, ModelSource::Trained)
    };

    if let Some(eval_data) = &config.eval_data {
        let report = evaluate(&model, Path::new(eval_data)).context("evaluation failed")?;
        info!(
            "held-out evaluation of {}: {}",
            eval_data,
            serde_json::to_string(&report)?
        );
    }

    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr()))?;

    let app = build_analysis_router(Arc::new(AppState::new(model, model_source, config)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
