use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use market_signals::routers::create_routes;
use market_signals::{
    load_config, AnalysisPipeline, AppState, CoinGeckoProvider, GoogleNewsProvider, LexiconScorer,
    PipelineSettings, Watchlist, YahooChartProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_signals=info,warn"));

    // keep the guard alive so buffered file logs are flushed on exit
    let (file_layer, _log_guard) = match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "market_signals.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true))
        .with(file_layer)
        .init();

    let market = YahooChartProvider::new(&config.providers)?;
    let news = if config.news.enabled {
        Some(GoogleNewsProvider::new(&config.providers, &config.news)?)
    } else {
        None
    };
    let spot = CoinGeckoProvider::new(&config.providers, &config.spot)?;

    let pipeline = AnalysisPipeline::new(
        market,
        news,
        Arc::new(LexiconScorer::new()?),
        PipelineSettings::from(&config),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        spot: Arc::new(spot),
        watchlist: Watchlist::new(&config.watchlist),
    };

    let app = create_routes(state);
    let address = config.server.bind_address.parse()?;
    tracing::info!("Server listening on http://{}", address);
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
