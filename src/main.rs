use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use imgdrop::application::ports::storage_port::StoragePort;
use imgdrop::bootstrap::app_context::{AppContext, AppServices};
use imgdrop::bootstrap::config::Config;
use imgdrop::infrastructure::storage::FsStoragePort;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        imgdrop::presentation::http::uploads::upload_form,
        imgdrop::presentation::http::uploads::upload_file,
        imgdrop::presentation::http::uploads::file_upload_status,
        imgdrop::presentation::http::uploads::file_upload,
        imgdrop::presentation::http::uploads::recognition_upload,
        imgdrop::presentation::http::uploads::recognition_not_found,
        imgdrop::presentation::http::health::health,
    ),
    components(schemas(
        imgdrop::presentation::http::uploads::FileMultipart,
        imgdrop::presentation::http::uploads::ImageMultipart,
        imgdrop::presentation::http::error::ErrorBody,
        imgdrop::presentation::http::health::HealthResp,
    )),
    tags(
        (name = "Uploads", description = "File uploads into the storage root"),
        (name = "Health", description = "System health checks")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "imgdrop=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting imgdrop");

    let storage = Arc::new(FsStoragePort::new(&cfg.storage_root)?);
    info!(root = %storage.root().display(), "storage_root_ready");

    let services = AppServices::new(storage);
    let ctx = AppContext::new(cfg.clone(), services);

    let cors = build_cors(&cfg);

    let app = imgdrop::presentation::http::router(ctx)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    let addr = SocketAddr::new(cfg.api_host, cfg.api_port);
    info!(%addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP API stopped");
    Ok(())
}

fn build_cors(cfg: &Config) -> CorsLayer {
    let methods = [
        http::Method::GET,
        http::Method::POST,
        http::Method::OPTIONS,
    ];
    let origin = match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(v)) => AllowOrigin::exact(v),
        Some(Err(_)) | None if !cfg.is_production => AllowOrigin::mirror_request(),
        // Production without a usable origin (rejected at config load): deny all.
        _ => AllowOrigin::exact(HeaderValue::from_static("http://invalid")),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers([http::header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
