mod errors;
pub mod handlers;
pub mod pages;

use std::path::{Path, PathBuf};

use actix_web::{middleware, web, App, HttpServer};

use crate::{
    config::Config, intake::IntakeValidator, pipeline::TransformPipeline, providers,
};

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub intake: IntakeValidator,
    /// `Err` holds the reason `/generate` cannot run; the rest of the service stays up.
    pub pipeline: std::result::Result<TransformPipeline, String>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let pipeline = match providers::from_config(config) {
            Ok(transformer) => Ok(TransformPipeline::new(transformer)),
            Err(e) => {
                log::error!("❌ Transformations are disabled: {}", e);
                Err(e.to_string())
            }
        };

        Self {
            intake: IntakeValidator::from_config(config),
            pipeline,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/generate", web::post().to(handlers::generate))
        .route("/health", web::get().to(handlers::health));
}

/// Routes plus the static directory. An `index.html` in that directory takes over `/`
/// from the built-in form; other files are served after the named routes.
pub fn configure_with_static(cfg: &mut web::ServiceConfig, static_dir: Option<&Path>) {
    if let Some(index) = static_index(static_dir) {
        cfg.route(
            "/",
            web::get().to(move || {
                let index = index.clone();
                async move { actix_files::NamedFile::open_async(index).await }
            }),
        );
    }
    configure(cfg);
    if let Some(dir) = static_dir {
        cfg.service(actix_files::Files::new("/", dir));
    }
}

fn static_index(static_dir: Option<&Path>) -> Option<PathBuf> {
    static_dir
        .map(|dir| dir.join("index.html"))
        .filter(|index| index.is_file())
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_config(&config));
    state.intake.ensure_upload_dir().await?;

    let static_dir = config.static_dir.clone().filter(|dir| dir.is_dir());
    if let Some(dir) = &static_dir {
        log::info!("📁 Serving static files from {}", dir.display());
    }

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Ts"))
            .configure(|cfg| configure_with_static(cfg, static_dir.as_deref()))
    })
    .bind(config.bind_address())?
    .run()
    .await
}
