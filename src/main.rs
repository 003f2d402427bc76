//! Fabric Studio server entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, error::InternalError, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use fabric_studio_lib::api;
use fabric_studio_lib::config::Config;
use fabric_studio_lib::db::DbPool;
use fabric_studio_lib::error::AppError;
use fabric_studio_lib::middleware::RequestLogger;
use fabric_studio_lib::services::{
    AiGateway, ModelSettings, Pipeline, RandomPicker, SpeechStudio, Storage,
};

/// Largest accepted JSON body. Requests carry URLs, never image bytes.
const JSON_BODY_LIMIT: usize = 256 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, S3 credentials and FSTUDIO_JWT_SECRET must be set");
            error!("  - In production, FSTUDIO_AI_API_KEY and FSTUDIO_AUDIO_API_KEY must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Fabric Studio Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }
    info!("Database migrations complete");

    let storage = match Storage::new(&config.storage).await {
        Ok(storage) => storage,
        Err(e) => {
            error!(error = %e, "Failed to initialize object storage");
            std::process::exit(1);
        }
    };

    let gateway = match AiGateway::new(&config.ai) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!(error = %e, "Failed to initialize generative gateway client");
            std::process::exit(1);
        }
    };

    let audio = match SpeechStudio::new(&config.audio) {
        Ok(audio) => audio,
        Err(e) => {
            error!(error = %e, "Failed to initialize audio client");
            std::process::exit(1);
        }
    };

    let pipeline = Pipeline {
        repo: Arc::new(pool.clone()),
        model: Arc::new(gateway),
        audio: Arc::new(audio),
        objects: Arc::new(storage),
        picker: Arc::new(RandomPicker),
        models: ModelSettings::from(&config.ai),
        max_samples: config.max_samples_per_job,
    };
    info!(
        image_model = %pipeline.models.image_model,
        caption_model = %pipeline.models.caption_model,
        vision_model = %pipeline.models.vision_model,
        max_samples = pipeline.max_samples,
        "Generation pipeline ready"
    );

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let pipeline = web::Data::new(pipeline);
    let pool = web::Data::new(pool);
    let auth_settings = web::Data::new(config.auth.clone());

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    let server = HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allowed_origin("http://localhost:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let json_config = web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(|err, _req| {
                let message = err.to_string();
                InternalError::from_response(
                    err,
                    actix_web::ResponseError::error_response(&AppError::InvalidInput(message)),
                )
                .into()
            });

        App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(pipeline.clone())
            .app_data(pool.clone())
            .app_data(auth_settings.clone())
            .app_data(json_config)
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_content_routes)
                    .configure(api::configure_multi_fabric_routes)
                    .configure(api::configure_reel_routes),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", api::ApiDoc::openapi()),
            )
    });

    server.workers(worker_count).bind(&bind_address)?.run().await
}
