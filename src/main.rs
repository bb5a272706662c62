use std::{net::SocketAddr, sync::Arc};

use chimebot::{
    audio::{OpusEncoderFactory, SymphoniaDecoder},
    common::{
        banner::{BuildInfo, log_banner},
        logger,
        types::AnyResult,
    },
    configs::Config,
    scheduler::{Collaborators, PlaybackScheduler},
    server::AppState,
    sounds::SoundLibrary,
    transport,
    voice::UdpTransport,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    logger::init(&config.logging);
    log_banner(&BuildInfo::default());

    let library = SoundLibrary::new(&config.sounds);
    if !library.root().is_dir() {
        warn!("Sound directory {} does not exist yet", library.root().display());
    }
    info!("Serving sounds from {}", library.root().display());

    let voice = Arc::new(UdpTransport::new(&config.voice));
    let scheduler = Arc::new(PlaybackScheduler::new(
        Collaborators {
            lookup: Arc::new(library),
            decoder: Arc::new(SymphoniaDecoder::new()),
            encoders: Arc::new(OpusEncoderFactory::new(config.encoder.clone())),
            transport: voice.clone(),
        },
        config.bot.user_id,
    ));

    let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = Arc::new(AppState {
        config,
        scheduler: scheduler.clone(),
    });

    let app = transport::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    info!("chimebot listening on {}", address);
    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    voice.shutdown();
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
