use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub providers: ProviderSettings,
    pub news: NewsSettings,
    pub indicators: IndicatorSettings,
    pub forecast: ForecastSettings,
    pub spot: SpotSettings,
    /// Tickers offered to the caller on startup.
    pub watchlist: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
            providers: ProviderSettings::default(),
            news: NewsSettings::default(),
            indicators: IndicatorSettings::default(),
            forecast: ForecastSettings::default(),
            spot: SpotSettings::default(),
            watchlist: ["BTC-USD", "ETH-USD", "SOL-USD", "AAPL", "MSFT"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for the daily-rolling JSON log; console only when unset.
    pub directory: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub yahoo_chart_url: String,
    pub coingecko_api_url: String,
    pub google_news_rss_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            yahoo_chart_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            coingecko_api_url: "https://api.coingecko.com/api/v3".to_string(),
            google_news_rss_url: "https://news.google.com/rss/search".to_string(),
            request_timeout_secs: 10,
            user_agent: concat!("market_signals/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub enabled: bool,
    pub max_articles: usize,
    /// Days between a headline and the price row it is joined to.
    pub lag_days: i64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        NewsSettings {
            enabled: true,
            max_articles: 50,
            lag_days: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub ema_short: usize,
    pub ema_long: usize,
    pub sma: Option<usize>,
    pub rsi: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    pub macd: Option<MacdSettings>,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            ema_short: 20,
            ema_long: 50,
            sma: Some(20),
            rsi: 14,
            bollinger_period: 20,
            bollinger_k: 2.0,
            macd: Some(MacdSettings::default()),
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl IndicatorSettings {
    /// Rows consumed before every enabled indicator is defined.
    pub fn largest_window(&self) -> usize {
        let macd = self.macd.as_ref().map_or(0, MacdSettings::window);
        [
            self.ema_short,
            self.ema_long,
            self.sma.unwrap_or(0),
            self.rsi,
            self.bollinger_period,
            macd,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ema_short == 0 || self.ema_long == 0 || self.rsi == 0 || self.bollinger_period == 0 {
            return Err(anyhow::anyhow!("indicator windows must be positive"));
        }
        if self.sma == Some(0) {
            return Err(anyhow::anyhow!("sma window must be positive"));
        }
        if self.ema_short >= self.ema_long {
            return Err(anyhow::anyhow!("ema_short must be smaller than ema_long"));
        }
        if !(self.bollinger_k > 0.0 && self.bollinger_k.is_finite()) {
            return Err(anyhow::anyhow!("bollinger_k must be a positive number"));
        }
        if !(0.0..=100.0).contains(&self.oversold)
            || !(0.0..=100.0).contains(&self.overbought)
            || self.oversold >= self.overbought
        {
            return Err(anyhow::anyhow!("RSI thresholds must satisfy 0 <= oversold < overbought <= 100"));
        }
        if let Some(macd) = &self.macd {
            if macd.fast == 0 || macd.signal == 0 || macd.fast >= macd.slow {
                return Err(anyhow::anyhow!("MACD requires 0 < fast < slow and a positive signal window"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MacdSettings {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdSettings {
    fn default() -> Self {
        MacdSettings {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdSettings {
    /// The signal line is defined once `slow + signal - 1` closes are seen.
    pub fn window(&self) -> usize {
        self.slow + self.signal.saturating_sub(1)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastModelKind {
    LinearTrend,
    Arima { p: usize, d: usize },
    SeasonalAdditive { period: usize },
}

/// Plausibility band applied to raw forecasts. There is no single agreed
/// bound, so the choice is left to whoever deploys the service.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipPolicy {
    /// Raw model output.
    None,
    /// Keep predictions within `last_close * (1 ± pct / 100)`.
    Percent { pct: f64 },
    /// Keep predictions within `last_close ± sigmas * stddev` of the trailing
    /// `window` closes.
    Volatility { sigmas: f64, window: usize },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub model: ForecastModelKind,
    pub clip: ClipPolicy,
    pub max_horizon: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        ForecastSettings {
            model: ForecastModelKind::Arima { p: 5, d: 1 },
            clip: ClipPolicy::None,
            max_horizon: 365,
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_horizon == 0 {
            return Err(anyhow::anyhow!("max_horizon must be positive"));
        }
        match &self.model {
            ForecastModelKind::Arima { p, d } if *p == 0 || *d > 2 => {
                return Err(anyhow::anyhow!("ARIMA order requires p >= 1 and d <= 2"));
            }
            ForecastModelKind::SeasonalAdditive { period } if *period < 2 => {
                return Err(anyhow::anyhow!("seasonal period must be at least 2"));
            }
            _ => {}
        }
        match &self.clip {
            ClipPolicy::Percent { pct } if !(*pct > 0.0 && pct.is_finite()) => {
                Err(anyhow::anyhow!("clip pct must be a positive number"))
            }
            ClipPolicy::Volatility { sigmas, window }
                if !(*sigmas > 0.0 && sigmas.is_finite()) || *window < 2 =>
            {
                Err(anyhow::anyhow!("volatility clip needs sigmas > 0 and window >= 2"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CoinMapping {
    pub ticker: String,
    pub coin_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpotSettings {
    pub currency: String,
    pub coins: Vec<CoinMapping>,
}

impl Default for SpotSettings {
    fn default() -> Self {
        let coins = [
            ("BTC-USD", "bitcoin"),
            ("ETH-USD", "ethereum"),
            ("BNB-USD", "binancecoin"),
            ("ADA-USD", "cardano"),
            ("SOL-USD", "solana"),
            ("XRP-USD", "ripple"),
            ("DOGE-USD", "dogecoin"),
            ("AVAX-USD", "avalanche-2"),
            ("MATIC-USD", "matic-network"),
            ("GALA-USD", "gala"),
        ]
        .iter()
        .map(|(ticker, coin_id)| CoinMapping {
            ticker: ticker.to_string(),
            coin_id: coin_id.to_string(),
        })
        .collect();

        SpotSettings {
            currency: "usd".to_string(),
            coins,
        }
    }
}

impl SpotSettings {
    pub fn coin_id(&self, ticker: &str) -> Option<&str> {
        let ticker = ticker.trim();
        self.coins
            .iter()
            .find(|c| c.ticker.eq_ignore_ascii_case(ticker))
            .map(|c| c.coin_id.as_str())
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()?;
        self.forecast.validate()?;

        if self.news.max_articles == 0 || self.news.max_articles > 1000 {
            return Err(anyhow::anyhow!("news.max_articles must be between 1 and 1000"));
        }
        if self.news.lag_days < 0 || self.news.lag_days > 30 {
            return Err(anyhow::anyhow!("news.lag_days must be between 0 and 30"));
        }
        if self.providers.request_timeout_secs == 0 || self.providers.request_timeout_secs > 120 {
            return Err(anyhow::anyhow!("providers.request_timeout_secs must be between 1 and 120"));
        }
        if self.spot.currency.trim().is_empty() {
            return Err(anyhow::anyhow!("spot.currency cannot be empty"));
        }

        Ok(())
    }
}

pub fn load_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("MARKET_SIGNALS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("watchlist"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;

    Ok(config)
}
