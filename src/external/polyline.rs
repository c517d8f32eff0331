use geo_types::{Coord, LineString};

use crate::error::{invalid_input_error, Error};

const PRECISION: f64 = 1e5;

/// Decodes an encoded polyline (precision 5) into a line of `(lng, lat)` coordinates.
pub fn decode(encoded: &str) -> Result<LineString<f64>, Error> {
    let bytes = encoded.as_bytes();
    let mut coords = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, next_value(bytes, &mut index)?)?;
        lng = accumulate(lng, next_value(bytes, &mut index)?)?;

        coords.push(Coord {
            x: lng as f64 / PRECISION,
            y: lat as f64 / PRECISION,
        });
    }

    Ok(LineString::new(coords))
}

fn accumulate(total: i64, delta: i64) -> Result<i64, Error> {
    total
        .checked_add(delta)
        .ok_or_else(|| invalid_input_error("malformed polyline"))
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, Error> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or_else(|| invalid_input_error("truncated polyline"))?;
        *index += 1;

        if !(63..=126).contains(&byte) || shift > 60 {
            return Err(invalid_input_error("malformed polyline"));
        }

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    if result & 1 == 1 {
        Ok(!(result >> 1))
    } else {
        Ok(result >> 1)
    }
}
