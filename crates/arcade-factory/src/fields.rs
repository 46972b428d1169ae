//! Typed field reads from component blocks
//!
//! Every reader returns `Ok(None)` for a missing field (or one set to `()`),
//! `Ok(Some(..))` for a well-typed value, and a field error otherwise. Error
//! messages name the field as `Kind.field`.

use crate::definition::ComponentBlock;
use arcade_core::{ArcadeError, GridVec, Result, Tint};
use rhai::{Dynamic, Map};

impl ComponentBlock {
    /// Field value, treating `()` as absent
    pub fn get(&self, name: &str) -> Option<&Dynamic> {
        self.fields().get(name).filter(|v| !v.is_unit())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True when the field is present and explicitly set to `()`
    pub fn is_null(&self, name: &str) -> bool {
        self.fields().get(name).map_or(false, |v| v.is_unit())
    }

    /// `Kind.field`, for error messages
    pub fn field_path(&self, name: &str) -> String {
        format!("{}.{}", self.kind(), name)
    }

    pub fn read_int(&self, name: &str) -> Result<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v
                .as_int()
                .map(Some)
                .map_err(|_| invalid_type(&self.field_path(name), "integer", v)),
        }
    }

    /// Integer field that must fit an `i32`
    pub fn read_i32(&self, name: &str) -> Result<Option<i32>> {
        match self.read_int(name)? {
            None => Ok(None),
            Some(n) => int_to_i32(&self.field_path(name), n).map(Some),
        }
    }

    /// Float field; integers are accepted where floats are expected
    pub fn read_f32(&self, name: &str) -> Result<Option<f32>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => as_number(v)
                .map(|n| Some(n as f32))
                .ok_or_else(|| invalid_type(&self.field_path(name), "number", v)),
        }
    }

    pub fn read_string(&self, name: &str) -> Result<Option<String>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v
                .clone()
                .into_immutable_string()
                .map(|s| Some(s.to_string()))
                .map_err(|_| invalid_type(&self.field_path(name), "string", v)),
        }
    }

    pub fn read_table(&self, name: &str) -> Result<Option<Map>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v
                .clone()
                .try_cast::<Map>()
                .map(Some)
                .ok_or_else(|| invalid_type(&self.field_path(name), "table", v)),
        }
    }

    /// Grid vector as `[x, y]` or `#{ x, y }` (a missing axis is 0)
    pub fn read_grid(&self, name: &str) -> Result<Option<GridVec>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => decode_grid(&self.field_path(name), v).map(Some),
        }
    }

    /// Tint as `[r, g, b]`, `#{ r, g, b }` (a missing channel is 1.0) or `0xRRGGBB`
    pub fn read_tint(&self, name: &str) -> Result<Option<Tint>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => decode_tint(&self.field_path(name), v).map(Some),
        }
    }
}

pub(crate) fn decode_grid(field: &str, value: &Dynamic) -> Result<GridVec> {
    if let Some(items) = value.clone().try_cast::<rhai::Array>() {
        if items.len() != 2 {
            return Err(ArcadeError::InvalidFieldType {
                field: field.to_string(),
                expected: "[x, y]".to_string(),
                got: format!("array of {} elements", items.len()),
            });
        }
        let x = axis(&format!("{}[0]", field), &items[0])?;
        let y = axis(&format!("{}[1]", field), &items[1])?;
        return Ok(GridVec::new(x, y));
    }

    if let Some(map) = value.clone().try_cast::<Map>() {
        let read = |key: &str| -> Result<i32> {
            match map.get(key).filter(|v| !v.is_unit()) {
                Some(v) => axis(&format!("{}.{}", field, key), v),
                None => Ok(0),
            }
        };
        return Ok(GridVec::new(read("x")?, read("y")?));
    }

    Err(invalid_type(field, "grid vector", value))
}

fn axis(field: &str, value: &Dynamic) -> Result<i32> {
    let n = value
        .as_int()
        .map_err(|_| invalid_type(field, "integer", value))?;
    int_to_i32(field, n)
}

pub(crate) fn decode_tint(field: &str, value: &Dynamic) -> Result<Tint> {
    if let Ok(hex) = value.as_int() {
        return if (0..=0xFF_FFFF).contains(&hex) {
            Ok(Tint::from_hex(hex as u32))
        } else {
            Err(ArcadeError::ValueOutOfRange {
                field: field.to_string(),
                min: 0.0,
                max: f64::from(0xFF_FFFF),
                value: hex as f64,
            })
        };
    }

    if let Some(items) = value.clone().try_cast::<rhai::Array>() {
        if items.len() != 3 {
            return Err(ArcadeError::InvalidFieldType {
                field: field.to_string(),
                expected: "[r, g, b]".to_string(),
                got: format!("array of {} elements", items.len()),
            });
        }
        let mut channels = [1.0f32; 3];
        for (i, item) in items.iter().enumerate() {
            channels[i] = as_number(item)
                .ok_or_else(|| invalid_type(&format!("{}[{}]", field, i), "number", item))?
                as f32;
        }
        return Ok(Tint::new(channels[0], channels[1], channels[2]));
    }

    if let Some(map) = value.clone().try_cast::<Map>() {
        let read = |key: &str| -> Result<f32> {
            match map.get(key).filter(|v| !v.is_unit()) {
                Some(v) => as_number(v)
                    .map(|n| n as f32)
                    .ok_or_else(|| invalid_type(&format!("{}.{}", field, key), "number", v)),
                None => Ok(1.0),
            }
        };
        return Ok(Tint::new(read("r")?, read("g")?, read("b")?));
    }

    Err(invalid_type(field, "tint", value))
}

/// Numeric value of an integer or float
pub(crate) fn as_number(value: &Dynamic) -> Option<f64> {
    value
        .as_float()
        .ok()
        .or_else(|| value.as_int().ok().map(|i| i as f64))
}

pub(crate) fn int_to_i32(field: &str, n: i64) -> Result<i32> {
    i32::try_from(n).map_err(|_| ArcadeError::ValueOutOfRange {
        field: field.to_string(),
        min: f64::from(i32::MIN),
        max: f64::from(i32::MAX),
        value: n as f64,
    })
}

pub(crate) fn invalid_type(field: &str, expected: &str, value: &Dynamic) -> ArcadeError {
    ArcadeError::InvalidFieldType {
        field: field.to_string(),
        expected: expected.to_string(),
        got: value_type_name(value).to_string(),
    }
}

pub(crate) fn value_type_name(value: &Dynamic) -> &'static str {
    if value.is_unit() {
        "()"
    } else if value.is_bool() {
        "bool"
    } else if value.is_int() {
        "integer"
    } else if value.is_float() {
        "float"
    } else if value.is_string() {
        "string"
    } else if value.is_array() {
        "array"
    } else if value.is_map() {
        "table"
    } else if value.is_fnptr() {
        "function"
    } else {
        "value"
    }
}
