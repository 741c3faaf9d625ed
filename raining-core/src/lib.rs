//! Core library for the `raining` CLI.
//!
//! This crate defines:
//! - A daily quota on calls to the upstream forecast service
//! - Retrieval of one forecast and its normalization into a rain report
//! - A short-lived report cache and configuration handling
//!
//! It is used by `raining-cli`, but can also sit behind an HTTP service.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod quota;

pub use cache::ReportCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{FailureKind, RetrievalFailed};
pub use forecast::Forecast;
pub use model::{Precipitation, Report};
pub use provider::{ForecastRetriever, ForecastSource, WeatherProvider, retriever_from_config};
pub use quota::{Admission, QuotaTracker};
