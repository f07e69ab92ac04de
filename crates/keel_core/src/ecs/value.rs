// value.rs - Typed field values parsed from prefab JSON
//
// Prefab data is untyped JSON. Every value is classified by shape before it
// reaches a component, and components only ever see a `FieldValue`.

use crate::math::{quat_from_vec4, Quat, Vec2, Vec3, Vec4};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Field that receives a component-level scalar, vector or list.
pub const PRIMARY_FIELD: &str = "value";

/// A parsed field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    StrList(Vec<String>),
}

/// Errors produced while setting component fields.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{field}' has an unrecognized value shape: {value}")]
    UnrecognizedShape { field: String, value: String },

    #[error("field '{field}' is invalid: {reason}")]
    Invalid { field: String, reason: String },
}

impl FieldError {
    pub fn unknown(field: &str) -> Self {
        Self::UnknownField {
            field: field.to_string(),
        }
    }
}

/// Per-field write access used by the component registry.
///
/// ```ignore
/// impl Reflect for Health {
///     fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
///         match field {
///             "base" | PRIMARY_FIELD => self.base = value.to_f32(field)?,
///             _ => return Err(FieldError::unknown(field)),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Reflect {
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError>;
}

const VECTOR_LAYOUTS: [&[&str]; 5] = [
    &["x", "y"],
    &["x", "y", "z"],
    &["x", "y", "z", "w"],
    &["r", "g", "b"],
    &["r", "g", "b", "a"],
];

/// Whether `map` is a 2/3/4-component numeric object (`x,y[,z[,w]]` or `r,g,b[,a]`).
pub fn is_vector(map: &Map<String, Value>) -> bool {
    vector_layout(map).is_some()
}

fn vector_layout(map: &Map<String, Value>) -> Option<&'static [&'static str]> {
    VECTOR_LAYOUTS.into_iter().find(|layout| {
        layout.len() == map.len()
            && layout
                .iter()
                .all(|key| map.get(*key).is_some_and(Value::is_number))
    })
}

impl FieldValue {
    /// Classify a JSON value by shape.
    pub fn from_json(field: &str, value: &Value) -> Result<Self, FieldError> {
        let parsed = match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(|f| Self::Float(f as f32)),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::StrList),
            Value::Object(map) => vector_layout(map).map(|layout| {
                let c: Vec<f32> = layout
                    .iter()
                    .map(|key| map[*key].as_f64().unwrap_or_default() as f32)
                    .collect();
                match c.len() {
                    2 => Self::Vec2(Vec2::new(c[0], c[1])),
                    3 => Self::Vec3(Vec3::new(c[0], c[1], c[2])),
                    _ => Self::Vec4(Vec4::new(c[0], c[1], c[2], c[3])),
                }
            }),
            Value::Null => None,
        };
        parsed.ok_or_else(|| FieldError::UnrecognizedShape {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::StrList(_) => "string list",
        }
    }

    fn mismatch(&self, field: &str, expected: &'static str) -> FieldError {
        FieldError::TypeMismatch {
            field: field.to_string(),
            expected,
            found: self.kind(),
        }
    }

    /// Floats accept integer input.
    pub fn to_f32(&self, field: &str) -> Result<f32, FieldError> {
        match *self {
            Self::Float(f) => Ok(f),
            Self::Int(i) => Ok(i as f32),
            _ => Err(self.mismatch(field, "float")),
        }
    }

    pub fn to_i64(&self, field: &str) -> Result<i64, FieldError> {
        match *self {
            Self::Int(i) => Ok(i),
            _ => Err(self.mismatch(field, "int")),
        }
    }

    pub fn to_bool(&self, field: &str) -> Result<bool, FieldError> {
        match *self {
            Self::Bool(b) => Ok(b),
            _ => Err(self.mismatch(field, "bool")),
        }
    }

    pub fn into_string(self, field: &str) -> Result<String, FieldError> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.mismatch(field, "string")),
        }
    }

    pub fn into_string_list(self, field: &str) -> Result<Vec<String>, FieldError> {
        match self {
            Self::StrList(list) => Ok(list),
            other => Err(other.mismatch(field, "string list")),
        }
    }

    pub fn to_vec2(&self, field: &str) -> Result<Vec2, FieldError> {
        match *self {
            Self::Vec2(v) => Ok(v),
            _ => Err(self.mismatch(field, "vec2")),
        }
    }

    pub fn to_vec3(&self, field: &str) -> Result<Vec3, FieldError> {
        match *self {
            Self::Vec3(v) => Ok(v),
            _ => Err(self.mismatch(field, "vec3")),
        }
    }

    /// A vec3 widens to a vec4 with `w = 1` (opaque colors).
    pub fn to_vec4(&self, field: &str) -> Result<Vec4, FieldError> {
        match *self {
            Self::Vec4(v) => Ok(v),
            Self::Vec3(v) => Ok(v.extend(1.0)),
            _ => Err(self.mismatch(field, "vec4")),
        }
    }

    /// Quaternions are authored as `x,y,z,w` objects and normalised.
    pub fn to_quat(&self, field: &str) -> Result<Quat, FieldError> {
        match *self {
            Self::Vec4(v) => Ok(quat_from_vec4(v)),
            _ => Err(self.mismatch(field, "quaternion")),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Vec2(v) => write!(f, "{v}"),
            Self::Vec3(v) => write!(f, "{v}"),
            Self::Vec4(v) => write!(f, "{v}"),
            Self::StrList(list) => write!(f, "[{}]", list.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(FieldValue::from_json("f", &json!(10)).unwrap(), FieldValue::Int(10));
        assert_eq!(FieldValue::from_json("f", &json!(0.5)).unwrap(), FieldValue::Float(0.5));
        assert_eq!(FieldValue::from_json("f", &json!(true)).unwrap(), FieldValue::Bool(true));
        assert_eq!(
            FieldValue::from_json("f", &json!("ortho")).unwrap(),
            FieldValue::Str("ortho".into())
        );
    }

    #[test]
    fn test_vector_shapes() {
        assert_eq!(
            FieldValue::from_json("p", &json!({"x": 1, "y": 2.5})).unwrap(),
            FieldValue::Vec2(Vec2::new(1.0, 2.5))
        );
        assert_eq!(
            FieldValue::from_json("p", &json!({"z": 3, "x": 1, "y": 2})).unwrap(),
            FieldValue::Vec3(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(
            FieldValue::from_json("c", &json!({"r": 1, "g": 0, "b": 0, "a": 0.5})).unwrap(),
            FieldValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 0.5))
        );
    }

    #[test]
    fn test_unrecognized_shapes() {
        for bad in [
            json!({"x": 1}),
            json!({"x": 1, "y": "2"}),
            json!({"x": 1, "y": 2, "q": 3}),
            json!([1, 2]),
            json!(null),
        ] {
            assert!(matches!(
                FieldValue::from_json("f", &bad),
                Err(FieldError::UnrecognizedShape { .. })
            ));
        }
    }

    #[test]
    fn test_string_list() {
        let value = FieldValue::from_json("textures", &json!(["a", "b"])).unwrap();
        assert_eq!(
            value.into_string_list("textures").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(FieldValue::Int(3).to_f32("f").unwrap(), 3.0);
        assert_eq!(
            FieldValue::Vec3(Vec3::ONE).to_vec4("c").unwrap(),
            Vec4::ONE
        );
        let err = FieldValue::Bool(true).to_f32("speed").unwrap_err();
        assert!(matches!(
            err,
            FieldError::TypeMismatch { expected: "float", found: "bool", .. }
        ));
        assert_eq!(
            FieldValue::Vec4(Vec4::new(0.0, 0.0, 0.0, 1.0)).to_quat("r").unwrap(),
            Quat::IDENTITY
        );
    }
}
