use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse a `"lat,lon"` pair as typed on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        let (lat, lon) = s.split_once(',')?;
        let latitude = lat.trim().parse::<f64>().ok()?;
        let longitude = lon.trim().parse::<f64>().ok()?;

        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(Self::new(latitude, longitude))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_pairs() {
        let c = Coordinate::parse("13.7563, 100.5018").unwrap();
        assert_eq!(c, Coordinate::new(13.7563, 100.5018));

        let neg = Coordinate::parse("-33.8688,151.2093").unwrap();
        assert_eq!(neg.latitude, -33.8688);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Coordinate::parse("13.7563").is_none());
        assert!(Coordinate::parse("north,east").is_none());
        assert!(Coordinate::parse("NaN,1.0").is_none());
    }
}
