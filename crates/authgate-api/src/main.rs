//! 인증 게이트 API 서버.
//!
//! 설정을 로드하고 검증한 뒤 Axum 서버를 시작합니다.
//! 필수 비밀 키가 없으면 요청을 받기 전에 종료합니다.

use std::net::SocketAddr;

use tracing::{error, info, warn};

use authgate_api::{create_router, AppState};
use authgate_core::{init_logging, AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 설정 로드 실패 시 로깅 초기화 전이므로 stderr로 출력
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(LogConfig::for_env(config.env)) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let addr = match config.server.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "Invalid listen address"
            );
            std::process::exit(1);
        }
    };

    let state = AppState::new(config);
    info!(
        env = %state.env(),
        access_ttl_secs = state.codec.access_ttl().num_seconds(),
        refresh_ttl_secs = state.codec.refresh_ttl().num_seconds(),
        rate_limit = state.rate_limit.limiter().config().max_requests,
        "Application state initialized"
    );

    let _cleanup = state.rate_limit.spawn_cleanup();

    let app = create_router(&state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    // 요청 제한이 클라이언트 IP를 쓰므로 연결 정보 포함
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
