//! Maidenhead grid locators.
//!
//! Only the 4-character square (`FN20`) and 6-character subsquare
//! (`FN20EI`) precisions are carried. Validity is purely structural:
//! letters in positions 0–1 (and 4–5), digits in positions 2–3.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Structural validity check for a locator string.
///
/// True iff the length is exactly 4 or 6, characters 0–1 are ASCII letters,
/// characters 2–3 are ASCII digits and, for length 6, characters 4–5 are
/// ASCII letters. Never errors; anything else is simply `false`.
pub fn is_valid(locator: &str) -> bool {
    let b = locator.as_bytes();
    if b.len() != 4 && b.len() != 6 {
        return false;
    }
    let pair_ok = b[0].is_ascii_alphabetic() && b[1].is_ascii_alphabetic();
    let square_ok = b[2].is_ascii_digit() && b[3].is_ascii_digit();
    let sub_ok = b.len() == 4 || (b[4].is_ascii_alphabetic() && b[5].is_ascii_alphabetic());
    pair_ok && square_ok && sub_ok
}

/// A structurally valid, uppercase grid locator of length 4 or 6.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridLocator(String);

impl GridLocator {
    /// Trim and uppercase `raw`, then validate. Malformed input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if is_valid(&normalized) {
            Some(Self(normalized))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 4 or 6.
    pub fn precision(&self) -> usize {
        self.0.len()
    }

    /// Center of the cell this locator names.
    pub fn center(&self) -> Coordinates {
        let b = self.0.as_bytes();
        let mut lon = f64::from(b[0] - b'A') * 20.0 + f64::from(b[2] - b'0') * 2.0 - 180.0;
        let mut lat = f64::from(b[1] - b'A') * 10.0 + f64::from(b[3] - b'0') - 90.0;

        if b.len() == 6 {
            lon += f64::from(b[4] - b'A') * (2.0 / 24.0) + 1.0 / 24.0;
            lat += f64::from(b[5] - b'A') * (1.0 / 24.0) + 1.0 / 48.0;
        } else {
            lon += 1.0;
            lat += 0.5;
        }

        Coordinates { lat, lon }
    }

    /// 6-character locator of the subsquare containing `coords`.
    pub fn from_coordinates(coords: Coordinates) -> Option<Self> {
        if !coords.is_valid() {
            return None;
        }

        // Keep the poles and antimeridian inside the last cell.
        let lon = (coords.lon + 180.0).min(359.999_999);
        let lat = (coords.lat + 90.0).min(179.999_999);

        let field_lon = (lon / 20.0).floor() as u8;
        let field_lat = (lat / 10.0).floor() as u8;
        let square_lon = ((lon % 20.0) / 2.0).floor() as u8;
        let square_lat = (lat % 10.0).floor() as u8;
        let sub_lon = ((lon % 2.0) * 12.0).floor() as u8;
        let sub_lat = ((lat % 1.0) * 24.0).floor() as u8;

        let s: String = [
            (b'A' + field_lon) as char,
            (b'A' + field_lat) as char,
            (b'0' + square_lon) as char,
            (b'0' + square_lat) as char,
            (b'A' + sub_lon) as char,
            (b'A' + sub_lat) as char,
        ]
        .iter()
        .collect();

        Self::parse(&s)
    }
}

impl fmt::Display for GridLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GridLocator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid grid locator: {value:?}"))
    }
}

impl From<GridLocator> for String {
    fn from(value: GridLocator) -> Self {
        value.0
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and within ±90 / ±180.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine distance in kilometres.
    pub fn great_circle_km(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_shapes() {
        for loc in ["FN20", "EM99XO", "fn20ei", "AA00", "RR99XX"] {
            assert!(is_valid(loc), "{loc} should be valid");
        }
    }

    #[test]
    fn invalid_shapes() {
        for loc in ["", "F", "FN2", "FN20E", "FN20EIX", "123456", "1N20", "FN2A", "FN20E1", "FN20 I", "FÑ20"] {
            assert!(!is_valid(loc), "{loc} should be invalid");
        }
    }

    #[test]
    fn parse_normalizes_case() {
        let loc = GridLocator::parse(" fm18gp ").unwrap();
        assert_eq!(loc.as_str(), "FM18GP");
        assert_eq!(loc.precision(), 6);
        assert!(GridLocator::parse("123456").is_none());
    }

    #[test]
    fn center_of_square() {
        let c = GridLocator::parse("FN20").unwrap().center();
        assert!((c.lon - -75.0).abs() < 1e-9);
        assert!((c.lat - 40.5).abs() < 1e-9);
    }

    #[test]
    fn from_coordinates_new_york() {
        let loc = GridLocator::from_coordinates(Coordinates::new(40.7128, -74.0060)).unwrap();
        assert_eq!(loc.as_str(), "FN20XR");

        let back = loc.center();
        assert!((back.lat - 40.7128).abs() < 0.05);
        assert!((back.lon - -74.0060).abs() < 0.05);
    }

    #[test]
    fn from_coordinates_rejects_nan() {
        assert!(GridLocator::from_coordinates(Coordinates::new(f64::NAN, 10.0)).is_none());
        assert!(GridLocator::from_coordinates(Coordinates::new(95.0, 10.0)).is_none());
    }

    #[test]
    fn from_coordinates_pole_stays_in_range() {
        let loc = GridLocator::from_coordinates(Coordinates::new(90.0, 180.0)).unwrap();
        assert_eq!(loc.as_str(), "RR99XX");
    }

    #[test]
    fn great_circle_distance() {
        // Lansing KS to Philadelphia, roughly 1700 km.
        let a = Coordinates::new(39.25, -94.90);
        let b = Coordinates::new(39.95, -75.17);
        let d = a.great_circle_km(&b);
        assert!((1650.0..1750.0).contains(&d), "got {d}");
        assert_eq!(a.great_circle_km(&a), 0.0);
    }

    #[test]
    fn try_from_rejects_invalid() {
        assert!(GridLocator::try_from("EM29FX".to_string()).is_ok());
        let err = GridLocator::try_from("123456".to_string()).unwrap_err();
        assert!(err.contains("123456"));
    }
}
