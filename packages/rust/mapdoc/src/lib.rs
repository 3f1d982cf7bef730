//! Map page generation.
//!
//! Builds a standalone HTML page that loads the Neshan Leaflet SDK, centers a
//! map on Iran, and drops one numbered marker per resolved tower.

use std::path::Path;

use tracing::{debug, info, instrument};

use towermap_shared::{MapSettings, Result, TowerMapError};

/// Statement prefix every marker line starts with (used to count markers back).
const MARKER_CONSTRUCTOR: &str = "new L.marker(";

const CLOSING: &str = "</script>\n</body>\n</html>\n";

/// Accumulates marker statements into a map page.
///
/// Marker ids start at 1 and increase by one per [`add_marker`](Self::add_marker)
/// call; they are never reused within a document. [`finalize`](Self::finalize)
/// consumes the builder, so a document can only be closed once.
#[derive(Debug, Clone)]
pub struct MapDocument {
    html: String,
    markers: usize,
}

impl MapDocument {
    /// Start a document with the page preamble and map initialization block.
    pub fn new(settings: &MapSettings) -> Self {
        Self {
            html: preamble(settings),
            markers: 0,
        }
    }

    /// Append a marker with a pop-up and return its id.
    ///
    /// `latitude` and `longitude` are emitted verbatim into the script, so they
    /// must be numeric text. `info` may contain HTML and is escaped as a
    /// JavaScript string literal.
    pub fn add_marker(&mut self, latitude: &str, longitude: &str, info: &str) -> usize {
        self.markers += 1;
        let id = self.markers;

        self.html.push_str(&format!(
            "    var marker{id} = {MARKER_CONSTRUCTOR}[{latitude},{longitude}]).addTo(myMap);\n\
             \x20   marker{id}.bindPopup({}).openPopup();\n",
            js_string(info)
        ));

        debug!(id, latitude, longitude, "marker added");
        id
    }

    /// Number of markers added so far (also the id of the latest marker).
    pub fn marker_count(&self) -> usize {
        self.markers
    }

    /// Close the script, body and html elements and return the page text.
    pub fn finalize(mut self) -> String {
        self.html.push_str(CLOSING);
        self.html
    }
}

/// Write the page to `path`, replacing any previous content.
#[instrument(skip(text), fields(path = %path.display(), bytes = text.len()))]
pub fn write_document(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TowerMapError::io(parent, e))?;
    }

    std::fs::write(path, text).map_err(|e| TowerMapError::io(path, e))?;
    info!("map document written");
    Ok(())
}

/// Count the marker statements in a finished page.
pub fn count_markers(text: &str) -> usize {
    text.matches(MARKER_CONSTRUCTOR).count()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn preamble(s: &MapSettings) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>map</title>
    <meta name="viewport" content="width=device-width, initial-scale=1, shrink-to-fit=no">
    <link href="{stylesheet}" rel="stylesheet" type="text/css">
    <script src="{script}" type="text/javascript"></script>
</head>
<body>
<div id="map" style="width: {width}px; height: {height}px; background: #eee; border: 2px solid #aaa;"></div>
<script type="text/javascript">
    var myMap = new L.Map('map', {{
        key: {key},
        maptype: {maptype},
        poi: {poi},
        traffic: {traffic},
        center: [{lat},{lon}],
        zoom: {zoom}
    }});
"#,
        stylesheet = escape_attr(&s.stylesheet_url),
        script = escape_attr(&s.script_url),
        width = s.width_px,
        height = s.height_px,
        key = js_string(&s.api_key),
        maptype = js_string(&s.maptype),
        poi = s.poi,
        traffic = s.traffic,
        lat = s.center[0],
        lon = s.center[1],
        zoom = s.zoom,
    )
}

/// Encode `s` as a JavaScript string literal that is safe inside `<script>`.
fn js_string(s: &str) -> String {
    // A JSON string is a valid JS string literal; `</` must not close the script element.
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace("</", "<\\/")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MapSettings {
        MapSettings {
            api_key: "web.test-key".into(),
            ..MapSettings::default()
        }
    }

    #[test]
    fn empty_document_has_preamble_and_closing_only() {
        let html = MapDocument::new(&settings()).finalize();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<link href="https://static.neshan.org/sdk/leaflet/1.4.0/leaflet.css""#));
        assert!(html.contains("key: \"web.test-key\","));
        assert!(html.contains("maptype: \"dreamy\","));
        assert!(html.contains("poi: true,"));
        assert!(html.contains("traffic: false,"));
        assert!(html.contains("center: [32.4971364,54.0498515],"));
        assert!(html.contains("zoom: 5.75"));
        assert!(html.contains("width: 1340px; height: 700px;"));
        assert!(html.ends_with("</script>\n</body>\n</html>\n"));
        assert_eq!(count_markers(&html), 0);
    }

    #[test]
    fn marker_ids_increase_from_one() {
        let mut doc = MapDocument::new(&settings());
        assert_eq!(doc.add_marker("35.70", "51.40", "first"), 1);
        assert_eq!(doc.add_marker("29.61", "52.53", "second"), 2);
        assert_eq!(doc.add_marker("38.08", "46.29", "third"), 3);
        assert_eq!(doc.marker_count(), 3);

        let html = doc.finalize();
        assert_eq!(count_markers(&html), 3);
        assert!(html.contains("var marker1 = new L.marker([35.70,51.40]).addTo(myMap);"));
        assert!(html.contains("marker2.bindPopup(\"second\").openPopup();"));
        assert!(html.contains("var marker3 = new L.marker([38.08,46.29])"));
        assert!(!html.contains("marker4"));

        // Markers sit inside the map script block: after it opens, before it closes.
        let last_marker = html.find("marker3.bindPopup").unwrap();
        let map_init = html.find("var myMap = new L.Map(").unwrap();
        assert!(map_init < html.find("var marker1").unwrap());
        assert!(last_marker < html.rfind("</script>").unwrap());
    }

    #[test]
    fn popup_text_is_escaped() {
        let mut doc = MapDocument::new(&settings());
        doc.add_marker("1", "2", "MCC:432<br>it's \"quoted\"</script>");
        let html = doc.finalize();

        assert!(html.contains(r#"bindPopup("MCC:432<br>it's \"quoted\"<\/script>")"#));
        // Only the real closing tag remains.
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn same_markers_render_identically() {
        let render = || {
            let mut doc = MapDocument::new(&settings());
            doc.add_marker("35.70", "51.40", "MCC:432<br>MNC:11");
            doc.finalize()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn write_replaces_previous_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mymap.html");

        let mut doc = MapDocument::new(&settings());
        doc.add_marker("35.70", "51.40", "a");
        doc.add_marker("29.61", "52.53", "b");
        write_document(&path, &doc.finalize()).expect("first write");

        let short = MapDocument::new(&settings()).finalize();
        write_document(&path, &short).expect("second write");

        let on_disk = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(on_disk, short);
        assert_eq!(count_markers(&on_disk), 0);
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("maps").join("mymap.html");
        write_document(&path, "x").expect("write");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    }
}
