use anyhow::{Result, bail};

/// Check the coordinates are on the globe and round them to three decimals,
/// which is roughly 100 m and keeps cache keys from fragmenting.
pub fn prepare(latitude: f64, longitude: f64) -> Result<(f64, f64)> {
    validate(latitude, longitude)?;
    Ok((round3(latitude), round3(longitude)))
}

fn validate(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        bail!("Coordinates need to be in range: -90 <= latitude <= 90, -180 <= longitude <= 180.");
    }
    Ok(())
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
