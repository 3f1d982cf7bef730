//! Coordinate extraction from lookup-service response bodies.
//!
//! The cell search service answers with an HTML fragment rather than a
//! structured payload, so extraction is coupled to its markup. Strategies sit
//! behind [`CoordinateExtractor`] so a format change only touches this module.

use std::sync::LazyLock;

use regex::Regex;

/// A coordinate pair, verbatim as printed by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

/// Strategy for pulling a coordinate pair out of a response body.
pub trait CoordinateExtractor: Send + Sync {
    /// Returns `None` when the body carries no usable coordinates.
    fn extract(&self, body: &str) -> Option<Coordinates>;

    /// Human-readable strategy name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Anchor-text extractor
// ---------------------------------------------------------------------------

/// Text between `Lat=` and the following ` Lon`.
static LAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Lat=(.*?) Lon").expect("latitude regex"));

/// Text between `Lon=` and the closing `</a><br/>` of the result link.
static LON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Lon=(.*?)</a><br/>").expect("longitude regex"));

/// Reads coordinates from the `Lat=<v> Lon=<v></a><br/>` link text.
///
/// Latitude and longitude are matched independently; when the service lists
/// several towers only the first match of each is used. Captured text that is
/// not a decimal number is treated as no match, since it ends up verbatim in
/// the generated map script.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorTextExtractor;

impl CoordinateExtractor for AnchorTextExtractor {
    fn extract(&self, body: &str) -> Option<Coordinates> {
        let latitude = first_capture(&LAT_RE, body)?;
        let longitude = first_capture(&LON_RE, body)?;
        Some(Coordinates {
            latitude,
            longitude,
        })
    }

    fn name(&self) -> &str {
        "anchor-text"
    }
}

fn first_capture(re: &Regex, body: &str) -> Option<String> {
    let caps = re.captures(body)?;
    let value = caps.get(1)?.as_str().trim();
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/lookup/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn extracts_coordinates_from_result_link() {
        let coords = AnchorTextExtractor
            .extract(&load_fixture("found.html"))
            .expect("coordinates");
        assert_eq!(coords.latitude, "35.70");
        assert_eq!(coords.longitude, "51.40");
    }

    #[test]
    fn no_result_link_means_no_coordinates() {
        assert!(AnchorTextExtractor.extract(&load_fixture("not_found.html")).is_none());
        assert!(AnchorTextExtractor.extract("").is_none());
    }

    #[test]
    fn latitude_without_longitude_is_not_a_match() {
        assert!(AnchorTextExtractor.extract(&load_fixture("latitude_only.html")).is_none());
    }

    #[test]
    fn only_first_result_is_used() {
        let coords = AnchorTextExtractor
            .extract(&load_fixture("multiple.html"))
            .expect("coordinates");
        assert_eq!(coords.latitude, "35.6892");
        assert_eq!(coords.longitude, "51.3890");
    }

    #[test]
    fn first_result_on_a_single_line() {
        let body = concat!(
            r#"<a href="x">Lat=35.6892 Lon=51.3890</a><br/>"#,
            r#"<a href="y">Lat=35.7000 Lon=51.4200</a><br/>"#,
        );
        let coords = AnchorTextExtractor.extract(body).expect("coordinates");
        assert_eq!(coords.latitude, "35.6892");
        assert_eq!(coords.longitude, "51.3890");
    }

    #[test]
    fn empty_or_non_numeric_values_are_rejected() {
        assert!(AnchorTextExtractor.extract("Lat= Lon=</a><br/>").is_none());
        assert!(
            AnchorTextExtractor
                .extract("Lat=35.7');alert(1);// Lon=51.4</a><br/>")
                .is_none()
        );
    }
}
