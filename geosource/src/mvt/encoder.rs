use std::collections::HashMap;

use prost::Message;
use serde_json::Value as JsonValue;

use crate::errors::{GeoError, GeoResult};
use crate::feature::{Properties, TileFeature, TileGeometry, TilePoint};

use super::vector_tile::tile::{self, GeomType};
use super::vector_tile::Tile;

const MOVE_TO: u32 = 1;
const LINE_TO: u32 = 2;
const CLOSE_PATH: u32 = 7;

/// Largest repeat count a command integer can carry.
const MAX_COMMAND_COUNT: usize = (1 << 29) - 1;

/// Name of the single layer written when none is configured.
pub const DEFAULT_LAYER_NAME: &str = "_geojsonTileLayer";

/// Writes tile features as a single-layer version 2 vector tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEncoder {
    layer_name: String,
}

impl Default for TileEncoder {
    fn default() -> Self {
        TileEncoder::new(DEFAULT_LAYER_NAME)
    }
}

impl TileEncoder {
    pub fn new(layer_name: impl Into<String>) -> Self {
        Self {
            layer_name: layer_name.into(),
        }
    }

    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// Encodes `features` into protobuf bytes.
    pub fn encode(&self, features: &[TileFeature], extent: u32) -> GeoResult<Vec<u8>> {
        let tile = self.build_tile(features, extent)?;
        let mut buf = Vec::with_capacity(tile.encoded_len());
        tile.encode(&mut buf)?;
        Ok(buf)
    }

    /// Builds the tile message without serializing it.
    pub fn build_tile(&self, features: &[TileFeature], extent: u32) -> GeoResult<Tile> {
        let mut layer = LayerBuilder::new(&self.layer_name, extent);
        for feature in features {
            layer.add_feature(feature)?;
        }
        Ok(Tile {
            layers: vec![layer.finish()],
        })
    }
}

/// Checks whether a feature leaves at least one drawable part in the
/// command stream.
///
/// Features failing this check are rejected by [`TileEncoder::encode`].
/// Geometries that cannot be encoded at all count as drawable, so their
/// error surfaces from the encoder.
pub fn is_drawable(feature: &TileFeature) -> bool {
    if feature.geometry.is_empty() {
        return false;
    }
    encode_geometry(&feature.geometry).map_or(true, |(_, commands)| !commands.is_empty())
}

/// Hashable form of a property value, for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    String(String),
    Bool(bool),
    Uint(u64),
    Sint(i64),
    Double(u64),
}

impl ValueKey {
    fn from_json(value: &JsonValue) -> Option<ValueKey> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(ValueKey::Bool(*b)),
            JsonValue::String(s) => Some(ValueKey::String(s.clone())),
            JsonValue::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(ValueKey::Uint(u))
                } else if let Some(i) = n.as_i64() {
                    Some(ValueKey::Sint(i))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    Some(integral_key(f).unwrap_or(ValueKey::Double(f.to_bits())))
                }
            }
            // nested values travel as JSON text
            JsonValue::Array(_) | JsonValue::Object(_) => Some(ValueKey::String(value.to_string())),
        }
    }

    fn to_value(&self) -> tile::Value {
        let mut value = tile::Value::default();
        match self {
            ValueKey::String(s) => value.string_value = Some(s.clone()),
            ValueKey::Bool(b) => value.bool_value = Some(*b),
            ValueKey::Uint(u) => value.uint_value = Some(*u),
            ValueKey::Sint(i) => value.sint_value = Some(*i),
            ValueKey::Double(bits) => value.double_value = Some(f64::from_bits(*bits)),
        }
        value
    }
}

/// Whole floats are written as integers.
fn integral_key(f: f64) -> Option<ValueKey> {
    if !f.is_finite() || f.fract() != 0.0 || f.abs() >= 9.0e15 {
        return None;
    }
    if f >= 0.0 {
        Some(ValueKey::Uint(f as u64))
    } else {
        Some(ValueKey::Sint(f as i64))
    }
}

struct LayerBuilder {
    layer: tile::Layer,
    keys: HashMap<String, u32>,
    values: HashMap<ValueKey, u32>,
}

impl LayerBuilder {
    fn new(name: &str, extent: u32) -> Self {
        Self {
            layer: tile::Layer {
                version: 2,
                name: name.to_string(),
                features: Vec::new(),
                keys: Vec::new(),
                values: Vec::new(),
                extent: Some(extent),
            },
            keys: HashMap::new(),
            values: HashMap::new(),
        }
    }

    fn add_feature(&mut self, feature: &TileFeature) -> GeoResult<()> {
        if feature.geometry.is_empty() {
            return Err(GeoError::EncodingFailed(format!(
                "Feature {:?} has an empty geometry",
                feature.id
            )));
        }

        let (geom_type, geometry) = encode_geometry(&feature.geometry)?;
        if geometry.is_empty() {
            return Err(GeoError::EncodingFailed(format!(
                "Feature {:?} has no drawable part",
                feature.id
            )));
        }

        let tags = self.tags(&feature.properties);
        let mut encoded = tile::Feature {
            id: feature.id,
            tags,
            r#type: None,
            geometry,
        };
        encoded.set_type(geom_type);
        self.layer.features.push(encoded);
        Ok(())
    }

    fn tags(&mut self, properties: &Properties) -> Vec<u32> {
        let mut tags = Vec::with_capacity(properties.len() * 2);
        for (key, value) in properties {
            let Some(value_key) = ValueKey::from_json(value) else {
                continue;
            };

            let key_index = match self.keys.get(key) {
                Some(index) => *index,
                None => {
                    let index = self.layer.keys.len() as u32;
                    self.layer.keys.push(key.clone());
                    self.keys.insert(key.clone(), index);
                    index
                }
            };
            let value_index = match self.values.get(&value_key) {
                Some(index) => *index,
                None => {
                    let index = self.layer.values.len() as u32;
                    self.layer.values.push(value_key.to_value());
                    self.values.insert(value_key, index);
                    index
                }
            };
            tags.push(key_index);
            tags.push(value_index);
        }
        tags
    }

    fn finish(self) -> tile::Layer {
        self.layer
    }
}

fn command(id: u32, count: usize) -> GeoResult<u32> {
    if count > MAX_COMMAND_COUNT {
        return Err(GeoError::EncodingFailed(format!(
            "Command repeats {} times, more than a command can hold",
            count
        )));
    }
    Ok((id & 0x7) | ((count as u32) << 3))
}

fn zigzag(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Cursor of the command stream; coordinates are written as deltas.
struct Cursor {
    x: i32,
    y: i32,
    out: Vec<u32>,
}

impl Cursor {
    fn push_point(&mut self, point: &TilePoint) -> GeoResult<()> {
        let dx = point.x.checked_sub(self.x);
        let dy = point.y.checked_sub(self.y);
        let (Some(dx), Some(dy)) = (dx, dy) else {
            return Err(GeoError::EncodingFailed(format!(
                "Coordinate ({}, {}) is out of range",
                point.x, point.y
            )));
        };
        self.out.push(zigzag(dx));
        self.out.push(zigzag(dy));
        self.x = point.x;
        self.y = point.y;
        Ok(())
    }
}

/// Encodes a geometry into a command stream.
///
/// Line parts with fewer than 2 points and rings with fewer than 3 distinct
/// points cannot be drawn and are left out.
fn encode_geometry(geometry: &TileGeometry) -> GeoResult<(GeomType, Vec<u32>)> {
    let mut cursor = Cursor {
        x: 0,
        y: 0,
        out: Vec::new(),
    };

    let geom_type = match geometry {
        TileGeometry::Point(points) => {
            cursor.out.push(command(MOVE_TO, points.len())?);
            for point in points {
                cursor.push_point(point)?;
            }
            GeomType::Point
        }
        TileGeometry::LineString(parts) => {
            for part in parts.iter().filter(|part| part.len() >= 2) {
                cursor.out.push(command(MOVE_TO, 1)?);
                cursor.push_point(&part[0])?;
                cursor.out.push(command(LINE_TO, part.len() - 1)?);
                for point in &part[1..] {
                    cursor.push_point(point)?;
                }
            }
            GeomType::Linestring
        }
        TileGeometry::Polygon(rings) => {
            for ring in rings {
                // the closing point is implied by ClosePath
                let open = match ring.split_last() {
                    Some((last, rest)) if rest.first() == Some(last) => rest,
                    _ => ring.as_slice(),
                };
                if open.len() < 3 {
                    continue;
                }
                cursor.out.push(command(MOVE_TO, 1)?);
                cursor.push_point(&open[0])?;
                cursor.out.push(command(LINE_TO, open.len() - 1)?);
                for point in &open[1..] {
                    cursor.push_point(point)?;
                }
                cursor.out.push(command(CLOSE_PATH, 1)?);
            }
            GeomType::Polygon
        }
    };

    Ok((geom_type, cursor.out))
}

/// Decodes a command stream back into parts of absolute points.
///
/// Each MoveTo starts a new part. Closed rings get their first point
/// repeated at the end.
pub fn decode_geometry(commands: &[u32]) -> GeoResult<Vec<Vec<TilePoint>>> {
    let mut parts: Vec<Vec<TilePoint>> = Vec::new();
    let (mut x, mut y) = (0i32, 0i32);
    let mut i = 0;

    let unzigzag = |n: u32| ((n >> 1) as i32) ^ -((n & 1) as i32);
    let truncated = || GeoError::InvalidInput("Truncated geometry command stream".to_string());

    while i < commands.len() {
        let id = commands[i] & 0x7;
        let count = (commands[i] >> 3) as usize;
        i += 1;
        match id {
            MOVE_TO | LINE_TO => {
                for _ in 0..count {
                    let (Some(dx), Some(dy)) = (commands.get(i), commands.get(i + 1)) else {
                        return Err(truncated());
                    };
                    x = x.wrapping_add(unzigzag(*dx));
                    y = y.wrapping_add(unzigzag(*dy));
                    i += 2;
                    if id == MOVE_TO && (parts.is_empty() || count == 1) {
                        parts.push(Vec::new());
                    }
                    match parts.last_mut() {
                        Some(part) => part.push(TilePoint::new(x, y)),
                        None => return Err(truncated()),
                    }
                }
            }
            CLOSE_PATH => {
                if let Some(part) = parts.last_mut() {
                    if let Some(first) = part.first().copied() {
                        part.push(first);
                    }
                }
            }
            other => {
                return Err(GeoError::InvalidInput(format!("Unknown geometry command {}", other)));
            }
        }
    }
    Ok(parts)
}

/// Reads the properties of a decoded feature back as JSON.
pub fn decode_properties(layer: &tile::Layer, feature: &tile::Feature) -> Properties {
    let mut properties = Properties::new();
    for pair in feature.tags.chunks_exact(2) {
        let (Some(key), Some(value)) = (
            layer.keys.get(pair[0] as usize),
            layer.values.get(pair[1] as usize),
        ) else {
            continue;
        };
        let json = if let Some(s) = &value.string_value {
            JsonValue::from(s.clone())
        } else if let Some(b) = value.bool_value {
            JsonValue::from(b)
        } else if let Some(u) = value.uint_value {
            JsonValue::from(u)
        } else if let Some(i) = value.sint_value.or(value.int_value) {
            JsonValue::from(i)
        } else if let Some(d) = value.double_value {
            JsonValue::from(d)
        } else if let Some(f) = value.float_value {
            JsonValue::from(f as f64)
        } else {
            continue;
        };
        properties.insert(key.clone(), json);
    }
    properties
}

/// Parses vector tile bytes.
pub fn decode(bytes: &[u8]) -> GeoResult<Tile> {
    Ok(Tile::decode(bytes)?)
}
