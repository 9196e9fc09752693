//! Streaming GeoJSON output for the burn polygons.
//!
//! A month can have tens of thousands of burned pixels, so features are written to the file as
//! they are produced instead of building the whole collection in memory first. The framing of the
//! document is written by hand, each feature is a `geojson::Feature` serialized with `serde_json`.

use crate::{polygon::BurnPolygon, raster::Crs, FireSeasonResult};
use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// The GeoJSON feature for a polygon, with `burn_date` and `yymm` as its properties.
pub fn to_feature(poly: &BurnPolygon) -> Feature {
    let ring: Vec<Vec<f64>> = poly.ring.iter().map(|&(x, y)| vec![x, y]).collect();

    let mut properties = JsonObject::new();
    properties.insert("burn_date".to_string(), JsonValue::from(poly.burn_date));
    properties.insert("yymm".to_string(), JsonValue::from(poly.yymm.as_str()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub trait FeatureWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Set when the first feature has been written, so the next one is preceded by a comma.
    fn wrote_feature(&mut self) -> &mut bool;

    /// Write the opening of a feature collection.
    fn start_document(&mut self, crs: Option<Crs>) -> FireSeasonResult<()> {
        write!(self.output(), r#"{{"type":"FeatureCollection","#)?;

        if let Some(crs) = crs {
            write!(
                self.output(),
                r#""crs":{{"type":"name","properties":{{"name":"{}"}}}},"#,
                crs
            )?;
        }

        writeln!(self.output(), r#""features":["#)?;
        Ok(())
    }

    /// Close the feature collection and flush it.
    fn finish_document(&mut self) -> FireSeasonResult<()> {
        self.output().write_all(b"\n]}\n")?;
        self.output().flush()?;
        Ok(())
    }

    /// Add a polygon to the collection.
    fn write_polygon(&mut self, poly: &BurnPolygon) -> FireSeasonResult<()> {
        if *self.wrote_feature() {
            self.output().write_all(b",\n")?;
        }
        *self.wrote_feature() = true;

        serde_json::to_writer(self.output(), &to_feature(poly))?;
        Ok(())
    }
}

/**
 * A GeoJSON file holding one layer of polygons.
 *
 * Call [GeoJsonFile::finish] to close the document and find out whether it was written. A file
 * that is dropped without finishing is still closed, but any error doing so is lost.
 */
pub struct GeoJsonFile {
    out: BufWriter<File>,
    wrote_feature: bool,
    finished: bool,
}

impl GeoJsonFile {
    /// Create the file (and its directory) and write the header.
    pub fn new<P: AsRef<Path>>(pth: P, crs: Option<Crs>) -> FireSeasonResult<Self> {
        let p = pth.as_ref();
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let f = File::create(p)?;
        let mut new = GeoJsonFile {
            out: BufWriter::new(f),
            wrote_feature: false,
            finished: false,
        };
        new.start_document(crs)?;
        Ok(new)
    }

    /// Close the document and flush it to disk.
    pub fn finish(mut self) -> FireSeasonResult<()> {
        self.finished = true;
        self.finish_document()
    }
}

impl FeatureWriter for GeoJsonFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn wrote_feature(&mut self) -> &mut bool {
        &mut self.wrote_feature
    }
}

impl Drop for GeoJsonFile {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.finish_document();
        }
    }
}

/// Write all of `polygons` as a single layer at `path`. An empty slice gives an empty collection.
pub fn write_layer<P: AsRef<Path>>(
    path: P,
    crs: Option<Crs>,
    polygons: &[BurnPolygon],
) -> FireSeasonResult<()> {
    let mut layer = GeoJsonFile::new(path, crs)?;
    for poly in polygons {
        layer.write_polygon(poly)?;
    }

    layer.finish()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::Value;

    struct MemoryLayer {
        buf: Vec<u8>,
        wrote_feature: bool,
    }

    impl FeatureWriter for MemoryLayer {
        fn output(&mut self) -> &mut dyn Write {
            &mut self.buf
        }

        fn wrote_feature(&mut self) -> &mut bool {
            &mut self.wrote_feature
        }
    }

    fn square(burn_date: i32, x: f64) -> BurnPolygon {
        BurnPolygon {
            ring: [
                (x, 0.0),
                (x + 1.0, 0.0),
                (x + 1.0, 1.0),
                (x, 1.0),
                (x, 0.0),
            ],
            burn_date,
            yymm: "2005_Aug".to_owned(),
        }
    }

    fn render(crs: Option<Crs>, polygons: &[BurnPolygon]) -> Value {
        let mut layer = MemoryLayer {
            buf: vec![],
            wrote_feature: false,
        };
        layer.start_document(crs).unwrap();
        for poly in polygons {
            layer.write_polygon(poly).unwrap();
        }
        layer.finish_document().unwrap();

        serde_json::from_slice(&layer.buf).unwrap()
    }

    #[test]
    fn test_feature_collection() {
        let doc = render(Some(Crs::projected(20790)), &[square(213, 0.0), square(220, 1.0)]);

        assert_eq!(doc["type"], "FeatureCollection");
        assert_eq!(doc["crs"]["properties"]["name"], "EPSG:20790");

        let features = doc["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["properties"]["burn_date"], 220);
        assert_eq!(features[1]["properties"]["yymm"], "2005_Aug");
        assert_eq!(features[0]["geometry"]["type"], "Polygon");

        let ring = features[0]["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[2][0], 1.0);
    }

    #[test]
    fn test_empty_layer_is_valid() {
        let doc = render(None, &[]);
        assert!(doc.get("crs").is_none());
        assert!(doc["features"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_layer_file() {
        let dir = std::env::temp_dir().join(format!("fireseason-vector-{}", std::process::id()));
        let path = dir.join("2005").join("2005_Aug.geojson");

        write_layer(&path, None, &[square(213, 0.0)]).unwrap();

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_write_layer_reports_full_disk() {
        assert!(write_layer("/dev/full", None, &[square(213, 0.0)]).is_err());
    }
}
