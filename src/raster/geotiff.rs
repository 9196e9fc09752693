//! Reading and writing single band GeoTIFF files with the `tiff` crate.
//!
//! Only the parts of GeoTIFF this crate needs are supported: the affine transform (pixel scale
//! plus tie point, or a full transformation matrix) and the EPSG code of the coordinate system
//! from the GeoKey directory.

use super::{Crs, GeoTransform, RasterGrid, NO_DATA};
use crate::{error::FireSeasonError, FireSeasonResult};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, Write},
    path::Path,
};
use tiff::{
    decoder::{Decoder, DecodingResult},
    encoder::{colortype::Gray32Float, TiffEncoder},
    tags::Tag,
};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/**
 * Read the first band of a GeoTIFF.
 *
 * Any failure, from a missing file to missing georeferencing, is reported as a
 * `RasterOpenFailure` naming the file.
 */
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> FireSeasonResult<RasterGrid> {
    let path = path.as_ref();

    let open_failure = |reason: String| -> Box<dyn std::error::Error> {
        FireSeasonError::RasterOpenFailure {
            path: path.to_path_buf(),
            reason,
        }
        .into()
    };

    let f = File::open(path).map_err(|err| open_failure(err.to_string()))?;
    decode(BufReader::new(f)).map_err(|err| open_failure(err.to_string()))
}

fn decode<R: Read + Seek>(reader: R) -> FireSeasonResult<RasterGrid> {
    let mut decoder = Decoder::new(reader)?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let transform = read_transform(&mut decoder)?;
    let crs = read_crs(&mut decoder);

    let data: Vec<i32> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(i32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(i32::from).collect(),
        DecodingResult::U32(buf) => buf
            .into_iter()
            .map(|v| i32::try_from(v).unwrap_or(NO_DATA))
            .collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(i32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(i32::from).collect(),
        DecodingResult::I32(buf) => buf,
        DecodingResult::F32(buf) => buf.into_iter().map(|v| float_to_code(v as f64)).collect(),
        DecodingResult::F64(buf) => buf.into_iter().map(float_to_code).collect(),
        _ => return Err("unsupported sample format".into()),
    };

    RasterGrid::new(width, height, data, transform, crs)
}

fn float_to_code(v: f64) -> i32 {
    if v.is_finite() {
        v.round() as i32
    } else {
        NO_DATA
    }
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> FireSeasonResult<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(geo_tag(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(geo_tag(MODEL_TIEPOINT)).ok();

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    if let Ok(m) = decoder.get_tag_f64_vec(geo_tag(MODEL_TRANSFORMATION)) {
        if m.len() >= 16 {
            // Row major 4x4 matrix.
            return Ok(GeoTransform {
                a: m[0],
                b: m[1],
                c: m[3],
                d: m[4],
                e: m[5],
                f: m[7],
            });
        }
    }

    Err("no georeferencing tags".into())
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<Crs> {
    let keys = decoder.get_tag_u16_vec(geo_tag(GEO_KEY_DIRECTORY)).ok()?;

    // Header: [version, revision, minor revision, number of keys], then 4 shorts per key:
    // [key id, tiff tag location, count, value]
    let num_keys = *keys.get(3)? as usize;
    keys.chunks_exact(4)
        .skip(1)
        .take(num_keys)
        .find_map(|key| match (key[0], key[1], key[3]) {
            (PROJECTED_CS_TYPE_KEY, 0, code) if code > 0 => Some(Crs::projected(code)),
            (GEOGRAPHIC_TYPE_KEY, 0, code) if code > 0 => Some(Crs::geographic(code)),
            _ => None,
        })
}

/**
 * Write a raster as a single band GeoTIFF.
 *
 * Samples are stored as 32-bit floats, which hold every burn date code exactly.
 */
pub fn write_geotiff<P: AsRef<Path>>(raster: &RasterGrid, path: P) -> FireSeasonResult<()> {
    let f = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(f);
    encode(raster, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn encode<W: Write + Seek>(raster: &RasterGrid, writer: W) -> FireSeasonResult<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image =
        encoder.new_image::<Gray32Float>(raster.width() as u32, raster.height() as u32)?;

    let t = raster.transform();
    if t.is_rectilinear() {
        let scale = vec![t.a, -t.e, 0.0];
        image
            .encoder()
            .write_tag(geo_tag(MODEL_PIXEL_SCALE), scale.as_slice())?;

        let tiepoint = vec![0.0, 0.0, 0.0, t.c, t.f, 0.0];
        image
            .encoder()
            .write_tag(geo_tag(MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        #[rustfmt::skip]
        let matrix = vec![
            t.a, t.b, 0.0, t.c,
            t.d, t.e, 0.0, t.f,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        image
            .encoder()
            .write_tag(geo_tag(MODEL_TRANSFORMATION), matrix.as_slice())?;
    }

    let geokeys = geo_key_directory(raster.crs());
    image
        .encoder()
        .write_tag(geo_tag(GEO_KEY_DIRECTORY), geokeys.as_slice())?;

    let data: Vec<f32> = raster.data().iter().map(|&v| v as f32).collect();
    image.write_data(&data)?;

    Ok(())
}

fn geo_key_directory(crs: Option<Crs>) -> Vec<u16> {
    let mut keys: Vec<[u16; 4]> = vec![];

    match crs {
        Some(crs) if crs.is_geographic() => {
            keys.push([GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            keys.push([GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            keys.push([GEOGRAPHIC_TYPE_KEY, 0, 1, crs.epsg()]);
        }
        Some(crs) => {
            keys.push([GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_PROJECTED]);
            keys.push([GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            keys.push([PROJECTED_CS_TYPE_KEY, 0, 1, crs.epsg()]);
        }
        None => {
            keys.push([GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_PROJECTED]);
            keys.push([GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
        }
    }

    let mut directory = vec![1, 1, 0, keys.len() as u16];
    directory.extend(keys.into_iter().flatten());
    directory
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_geotiff_preserves_georeferencing() {
        let data = vec![-2, -1, 0, 1, 5, 366];
        let transform = GeoTransform::new(-12000.0, 310000.0, 463.3, -463.3);
        let raster = RasterGrid::new(3, 2, data, transform, Some(Crs::projected(20790))).unwrap();

        let mut buf = Cursor::new(Vec::new());
        encode(&raster, &mut buf).unwrap();

        buf.set_position(0);
        let decoded = decode(buf).unwrap();

        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_geo_key_directory_layout() {
        let keys = geo_key_directory(Some(Crs::geographic(4326)));
        assert_eq!(keys.len(), 16);
        assert_eq!(&keys[0..4], &[1, 1, 0, 3]);
        assert_eq!(&keys[12..16], &[GEOGRAPHIC_TYPE_KEY, 0, 1, 4326]);
    }

    #[test]
    fn test_missing_file_is_open_failure() {
        let err = read_geotiff("/no/such/dir/2001_Jan.tiff").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::RasterOpenFailure { .. })
        ));
    }
}
