//! Upstream forecast payload and its mapping onto a [`Report`].
//!
//! Only the handful of fields the report needs are modelled, and every one of
//! them is optional. Defaults are applied here, once, so nothing downstream of
//! [`Report::from_forecast`] has to reason about absence.

use serde::Deserialize;

use crate::model::{Precipitation, Report, UNKNOWN_VALUE};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub currently: Option<Currently>,
    #[serde(default)]
    pub daily: Option<Daily>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currently {
    #[serde(default)]
    pub precip_probability: Option<f64>,
    #[serde(default)]
    pub precip_intensity: Option<f64>,
    #[serde(default)]
    pub precip_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Daily {
    #[serde(default)]
    pub data: Vec<DailyDataPoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyDataPoint {
    #[serde(default)]
    pub precip_probability: Option<f64>,
    #[serde(default)]
    pub precip_type: Option<String>,
}

struct CurrentConditions {
    precipitation: Precipitation,
    probability: f64,
    intensity: f64,
}

impl CurrentConditions {
    const UNKNOWN: Self = Self {
        precipitation: Precipitation::Unknown,
        probability: UNKNOWN_VALUE,
        intensity: UNKNOWN_VALUE,
    };

    fn from_currently(currently: Option<&Currently>) -> Self {
        let Some(currently) = currently else {
            return Self::UNKNOWN;
        };
        let Some(probability) = currently.precip_probability else {
            return Self::UNKNOWN;
        };

        if probability == 0.0 {
            return Self {
                precipitation: Precipitation::None,
                probability,
                intensity: 0.0,
            };
        }

        Self {
            precipitation: classify(currently.precip_type.as_deref()),
            probability,
            intensity: currently.precip_intensity.unwrap_or(UNKNOWN_VALUE),
        }
    }
}

struct TodayOutlook {
    chance: f64,
    precipitation: Precipitation,
}

impl TodayOutlook {
    const UNKNOWN: Self = Self {
        chance: UNKNOWN_VALUE,
        precipitation: Precipitation::Unknown,
    };

    fn from_daily(daily: Option<&Daily>) -> Self {
        // The first data point is today.
        let Some(today) = daily.and_then(|d| d.data.first()) else {
            return Self::UNKNOWN;
        };
        let Some(chance) = today.precip_probability else {
            return Self::UNKNOWN;
        };

        if chance == 0.0 {
            return Self {
                chance,
                precipitation: Precipitation::None,
            };
        }

        Self {
            chance,
            precipitation: classify(today.precip_type.as_deref()),
        }
    }
}

fn classify(precip_type: Option<&str>) -> Precipitation {
    Precipitation::classify(precip_type.unwrap_or_default())
}

impl Report {
    /// Build a fully populated report from a (possibly sparse) forecast.
    ///
    /// Coordinates are echoed back untouched.
    pub fn from_forecast(latitude: f64, longitude: f64, forecast: &Forecast) -> Self {
        let current = CurrentConditions::from_currently(forecast.currently.as_ref());
        let today = TodayOutlook::from_daily(forecast.daily.as_ref());

        Self {
            latitude,
            longitude,
            current_precipitation_type: current.precipitation,
            current_probability: current.probability,
            current_intensity: current.intensity,
            today_chance_of_precipitation: today.chance,
            today_precipitation_type: today.precipitation,
        }
    }
}
