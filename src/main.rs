use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use padaelo::openapi::ApiDoc;
use padaelo::repo::inmem::InMemRepo;
use padaelo::storage::{BlobStore, InMemBlobStore};
use padaelo::{configure_routes, seed, AppConfig, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds to reduce manual setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = AppConfig::from_env();
    info!("Bootstrapping padaelo dashboard service");
    info!(
        font_dir = %cfg.fonts.dir.display(),
        font_family = %cfg.fonts.family,
        upload_limit = cfg.upload_limit,
        "configuration loaded"
    );

    let repo = if cfg.seed_demo {
        let reports = seed::demo_reports();
        info!(reports = reports.len(), "seeding demonstration reports");
        InMemRepo::with_reports(reports)
    } else {
        InMemRepo::new()
    };
    let blob_store = InMemBlobStore::new();

    let state = AppState {
        repo: Arc::new(repo),
        blob_store: Arc::new(blob_store.clone()),
        fonts: cfg.fonts.clone(),
        upload_limit: cfg.upload_limit,
    };
    let openapi = ApiDoc::openapi();
    let frontend_url = cfg.frontend_url.clone();

    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // during local dev allow React/Vite default ports
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .expose_headers(["content-disposition"])
                .max_age(3600);
            if let Some(front) = frontend_url.as_deref() {
                c = c.allowed_origin(front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind((cfg.host.as_str(), cfg.port))?;

    info!("Listening on http://{}:{}", cfg.host, cfg.port);
    server.run().await?;

    // session over: uploaded bytes do not outlive the process state
    blob_store.release_all().await?;
    Ok(())
}
