use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker for probabilities and intensities the upstream did not report.
pub const UNKNOWN_VALUE: f64 = -1.0;

/// Kind of precipitation, as far as the rain report is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Precipitation {
    None,
    #[default]
    Unknown,
    Rain,
    Sleet,
    Snow,
}

impl Precipitation {
    /// Map an upstream `precipType` string onto a kind.
    ///
    /// Matching is case-sensitive; anything unrecognised is `Unknown`.
    pub fn classify(precip_type: &str) -> Self {
        match precip_type {
            "rain" => Precipitation::Rain,
            "sleet" => Precipitation::Sleet,
            "snow" => Precipitation::Snow,
            _ => Precipitation::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Precipitation::None => "none",
            Precipitation::Unknown => "unknown",
            Precipitation::Rain => "rain",
            Precipitation::Sleet => "sleet",
            Precipitation::Snow => "snow",
        }
    }
}

impl fmt::Display for Precipitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized answer to "is it raining, and will it rain today?" for one
/// location. Every field is always populated: values the upstream left out are
/// [`Precipitation::Unknown`] or [`UNKNOWN_VALUE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub latitude: f64,
    pub longitude: f64,
    pub current_precipitation_type: Precipitation,
    pub current_probability: f64,
    pub current_intensity: f64,
    pub today_chance_of_precipitation: f64,
    pub today_precipitation_type: Precipitation,
}

impl Report {
    /// A report for the given coordinates where nothing is known.
    pub fn unknown(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            current_precipitation_type: Precipitation::Unknown,
            current_probability: UNKNOWN_VALUE,
            current_intensity: UNKNOWN_VALUE,
            today_chance_of_precipitation: UNKNOWN_VALUE,
            today_precipitation_type: Precipitation::Unknown,
        }
    }

    pub fn is_raining(&self) -> bool {
        self.current_precipitation_type == Precipitation::Rain
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "latitude: {}", self.latitude)?;
        writeln!(f, "longitude: {}", self.longitude)?;
        writeln!(f, "currentPrecipitationType: {}", self.current_precipitation_type)?;
        writeln!(f, "currentProbability: {}", self.current_probability)?;
        writeln!(f, "currentIntensity: {}", self.current_intensity)?;
        writeln!(f, "todayChanceOfPrecipitation: {}", self.today_chance_of_precipitation)?;
        write!(f, "todayPrecipitationType: {}", self.today_precipitation_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_kinds() {
        assert_eq!(Precipitation::classify("rain"), Precipitation::Rain);
        assert_eq!(Precipitation::classify("sleet"), Precipitation::Sleet);
        assert_eq!(Precipitation::classify("snow"), Precipitation::Snow);
    }

    #[test]
    fn classify_is_case_sensitive_and_closed() {
        for input in ["", "RAIN", "Rain", " rain", "hail", "none", "unknown"] {
            assert_eq!(
                Precipitation::classify(input),
                Precipitation::Unknown,
                "input {input:?}"
            );
        }
    }

    #[test]
    fn identical_reports_are_equal() {
        assert_eq!(Report::unknown(1.0, 2.0), Report::unknown(1.0, 2.0));
    }

    #[test]
    fn reports_differing_in_one_field_are_not_equal() {
        let a = Report::unknown(0.0, 0.0);

        let mut b = a;
        b.latitude = 13.37;
        assert_ne!(a, b);

        let mut c = a;
        c.today_precipitation_type = Precipitation::Snow;
        assert_ne!(a, c);
    }

    #[test]
    fn display_lists_every_field() {
        let mut report = Report::unknown(13.37, -42.5);
        report.current_precipitation_type = Precipitation::Sleet;

        let text = report.to_string();
        assert!(text.contains("latitude: 13.37"));
        assert!(text.contains("longitude: -42.5"));
        assert!(text.contains("currentPrecipitationType: sleet"));
        assert!(text.contains("currentProbability: -1"));
        assert!(text.contains("todayPrecipitationType: unknown"));
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn json_uses_camel_case_and_lowercase_kinds() {
        let mut report = Report::unknown(1.5, 2.5);
        report.current_precipitation_type = Precipitation::None;

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["latitude"], 1.5);
        assert_eq!(json["currentPrecipitationType"], "none");
        assert_eq!(json["todayChanceOfPrecipitation"], -1.0);
        assert_eq!(json["todayPrecipitationType"], "unknown");
    }

    #[test]
    fn is_raining_only_for_current_rain() {
        let mut report = Report::unknown(0.0, 0.0);
        assert!(!report.is_raining());

        report.today_precipitation_type = Precipitation::Rain;
        assert!(!report.is_raining());

        report.current_precipitation_type = Precipitation::Rain;
        assert!(report.is_raining());
    }
}
