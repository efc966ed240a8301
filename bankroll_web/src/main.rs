use std::error::Error;

use axum_server::tls_rustls::RustlsConfig;
use bankroll::BankrollConfig;
use bankroll_web::{app, AppState};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() {
    match BankrollConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            if let Err(error) = serve(&config).await {
                error!("アプリケーションエラー: {}", error);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("アプリケーションエラー: {}", error)
        }
    }
}

async fn serve(config: &BankrollConfig) -> Result<(), Box<dyn Error>> {
    let addr = config.server.addr()?;
    let app = app(AppState::default());
    match &config.server.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!("Server running on https://{}", addr);
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("Server running on http://{}", addr);
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
