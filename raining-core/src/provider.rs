use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tracing::{error, info, warn};

use crate::{
    Config, Report,
    clock::SystemClock,
    error::RetrievalFailed,
    forecast::Forecast,
    provider::darksky::DarkSkyClient,
    quota::{Admission, QuotaTracker},
};

pub mod darksky;

/// The upstream forecast service.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    /// Request the forecast for one coordinate pair.
    ///
    /// `Ok(None)` means the service answered without a payload.
    async fn forecast(&self, latitude: f64, longitude: f64) -> anyhow::Result<Option<Forecast>>;
}

/// Anything that can produce a rain report for a location.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Report, RetrievalFailed>;
}

/// Quota-gated retrieval of one forecast, normalized into a [`Report`].
///
/// Coordinates are passed through as given; validating them is the caller's
/// job. The [`QuotaTracker`] is shared so several retrievers (or a restartable
/// one) can draw from the same daily budget.
#[derive(Debug)]
pub struct ForecastRetriever<S> {
    source: S,
    quota: Arc<QuotaTracker>,
}

impl<S: ForecastSource> ForecastRetriever<S> {
    pub fn new(source: S, quota: Arc<QuotaTracker>) -> Self {
        Self { source, quota }
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }
}

#[async_trait]
impl<S: ForecastSource> WeatherProvider for ForecastRetriever<S> {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Report, RetrievalFailed> {
        info!(latitude, longitude, "retrieving forecast");

        if let Admission::Denied { call, limit } = self.quota.try_consume() {
            let err = RetrievalFailed::quota_exceeded(latitude, longitude, call, limit);
            warn!(latitude, longitude, "{}", err.reason());
            return Err(err);
        }

        let forecast = match self.source.forecast(latitude, longitude).await {
            Ok(Some(forecast)) => forecast,
            Ok(None) => return Err(upstream_failure(latitude, longitude, "Forecast is empty".into())),
            Err(e) => return Err(upstream_failure(latitude, longitude, format!("{e:#}"))),
        };

        Ok(Report::from_forecast(latitude, longitude, &forecast))
    }
}

fn upstream_failure(latitude: f64, longitude: f64, reason: String) -> RetrievalFailed {
    error!(latitude, longitude, "{reason}");
    RetrievalFailed::upstream(latitude, longitude, reason)
}

/// Construct a Dark Sky backed retriever from config, counting days on the
/// system clock.
pub fn retriever_from_config(config: &Config) -> anyhow::Result<ForecastRetriever<DarkSkyClient>> {
    let api_key = config.require_api_key()?;
    let quota = Arc::new(QuotaTracker::new(
        config.daily_call_limit,
        Arc::new(SystemClock),
    ));
    let client = DarkSkyClient::new(api_key.to_owned(), config.api_url());

    Ok(ForecastRetriever::new(client, quota))
}
