//! Polyline representation for route geometries.
//!
//! Driving services return geometry in the compact encoded-polyline format.
//! Decoding happens here, at the boundary; the rest of the crate only sees
//! coordinate sequences.

use serde::{Deserialize, Serialize};

use crate::error::PolylineError;
use crate::order::Coordinate;

/// Precision used by OSRM and OpenRouteService for encoded geometry.
pub const DEFAULT_PRECISION: u32 = 5;

/// A route geometry as decoded (latitude, longitude) points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Straight segments between the given coordinates.
    pub fn from_coordinates(coords: &[Coordinate]) -> Self {
        Self {
            points: coords.iter().map(|c| (c.lat, c.lng)).collect(),
        }
    }

    /// Decodes an encoded polyline string with the given precision.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, PolylineError> {
        let factor = 10f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut index = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;
        let mut points = Vec::new();

        while index < bytes.len() {
            lat = accumulate(lat, bytes, &mut index)?;
            lng = accumulate(lng, bytes, &mut index)?;
            points.push((lat as f64 / factor, lng as f64 / factor));
        }

        Ok(Self { points })
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Add the next delta to a running coordinate, rejecting overflow.
fn accumulate(value: i64, bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let position = *index;
    let delta = next_delta(bytes, index)?;
    value
        .checked_add(delta)
        .ok_or(PolylineError::Overflow { position })
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let position = *index;
        let byte = *bytes.get(position).ok_or(PolylineError::Truncated { position })?;
        if !(63..127).contains(&byte) {
            return Err(PolylineError::InvalidCharacter { position });
        }
        let chunk = i64::from(byte - 63);
        *index += 1;
        if shift > 60 {
            return Err(PolylineError::Overflow { position });
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[(f64, f64)], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.0 - e.0).abs() < 1e-9 && (a.1 - e.1).abs() < 1e-9, "{:?} != {:?}", a, e);
        }
    }

    #[test]
    fn test_decode_reference_string() {
        let polyline = Polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@", DEFAULT_PRECISION)
            .expect("valid polyline");
        assert_close(
            polyline.points(),
            &[(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)],
        );
    }

    #[test]
    fn test_decode_empty() {
        let polyline = Polyline::decode("", DEFAULT_PRECISION).expect("empty is valid");
        assert!(polyline.is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        // Latitude present, longitude missing
        let err = Polyline::decode("_p~iF", DEFAULT_PRECISION).unwrap_err();
        assert_eq!(err, PolylineError::Truncated { position: 5 });
    }

    #[test]
    fn test_decode_coordinate_overflow() {
        // Each point adds 2^62 - 1 to the latitude; the third one overflows.
        let err = Polyline::decode("}~~~~~~~~~~~F?}~~~~~~~~~~~F?}~~~~~~~~~~~F?", DEFAULT_PRECISION).unwrap_err();
        assert_eq!(err, PolylineError::Overflow { position: 28 });
    }

    #[test]
    fn test_decode_invalid_character() {
        let err = Polyline::decode("_p~iF ps|U", DEFAULT_PRECISION).unwrap_err();
        assert_eq!(err, PolylineError::InvalidCharacter { position: 5 });
    }

    #[test]
    fn test_from_coordinates() {
        let coords = [Coordinate::new(48.1, 11.5), Coordinate::new(48.2, 11.6)];
        let polyline = Polyline::from_coordinates(&coords);
        assert_eq!(polyline.points(), &[(48.1, 11.5), (48.2, 11.6)]);
    }

    #[test]
    fn test_into_points() {
        let points = vec![(38.5, -120.2), (40.7, -120.95)];
        let polyline = Polyline::new(points.clone());
        assert_eq!(polyline.into_points(), points);
    }
}
