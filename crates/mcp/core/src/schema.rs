//! Input schemas declared as data, plus argument extraction helpers.
//!
//! A tool's schema is a flat list of named parameters. The wire rendering is
//! the standard JSON Schema object shape every MCP client expects. Handlers
//! pull arguments out of the raw JSON blob with the helpers in [`args`]; a
//! failed extraction is a validation error and never reaches the upstream.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// JSON types a parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

/// One named parameter of a tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub description: String,
}

/// The full input schema of a tool.
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    params: Vec<ParamSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn param(
        mut self,
        name: impl Into<String>,
        ty: ParamType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            ty,
            required,
            description: description.into(),
        });
        self
    }

    #[must_use]
    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.param(name, ParamType::String, description, required)
    }

    #[must_use]
    pub fn number(self, name: &str, description: &str, required: bool) -> Self {
        self.param(name, ParamType::Number, description, required)
    }

    #[must_use]
    pub fn boolean(self, name: &str, description: &str, required: bool) -> Self {
        self.param(name, ParamType::Boolean, description, required)
    }

    #[must_use]
    pub fn array(self, name: &str, description: &str, required: bool) -> Self {
        self.param(name, ParamType::Array, description, required)
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Render as a JSON Schema object: `{"type":"object","properties":...}`.
    ///
    /// Property and required-list ordering is alphabetical (serde_json map
    /// ordering), so two renderings of the same schema are byte-identical.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required: Vec<String> = Vec::new();
        for p in &self.params {
            let mut prop = Map::new();
            prop.insert("type".to_string(), Value::String(p.ty.as_str().to_string()));
            prop.insert(
                "description".to_string(),
                Value::String(p.description.clone()),
            );
            properties.insert(p.name.clone(), Value::Object(prop));
            if p.required {
                required.push(p.name.clone());
            }
        }
        required.sort();

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert(
                "required".to_string(),
                Value::Array(required.into_iter().map(Value::String).collect()),
            );
        }
        Value::Object(schema)
    }
}

/// Argument extraction failures. These map to validation-error tool results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing required parameter: {0}")]
    Missing(String),

    #[error("parameter {name} has the wrong type: expected {expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("parameter {0} overflows a 64-bit integer")]
    Overflow(String),
}

/// Helpers for pulling typed values out of the raw argument blob.
pub mod args {
    use super::ParamError;
    use serde_json::Value;

    fn lookup<'a>(args: &'a Value, name: &str) -> Option<&'a Value> {
        match args.get(name) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    pub fn required_string(args: &Value, name: &str) -> Result<String, ParamError> {
        match optional_string(args, name)? {
            Some(v) => Ok(v),
            None => Err(ParamError::Missing(name.to_string())),
        }
    }

    pub fn optional_string(args: &Value, name: &str) -> Result<Option<String>, ParamError> {
        match lookup(args, name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ParamError::WrongType {
                name: name.to_string(),
                expected: "string",
            }),
        }
    }

    /// Extract a required numeric id. JSON numbers that are not exact 64-bit
    /// integers (fractions, or magnitudes past `i64`) are rejected rather
    /// than silently truncated.
    pub fn required_int(args: &Value, name: &str) -> Result<i64, ParamError> {
        match optional_int(args, name)? {
            Some(v) => Ok(v),
            None => Err(ParamError::Missing(name.to_string())),
        }
    }

    pub fn optional_int(args: &Value, name: &str) -> Result<Option<i64>, ParamError> {
        match lookup(args, name) {
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(v) => Ok(Some(v)),
                None => Err(ParamError::Overflow(name.to_string())),
            },
            Some(_) => Err(ParamError::WrongType {
                name: name.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn required_u64(args: &Value, name: &str) -> Result<u64, ParamError> {
        let v = required_int(args, name)?;
        u64::try_from(v).map_err(|_| ParamError::Overflow(name.to_string()))
    }

    pub fn optional_bool(args: &Value, name: &str) -> Result<Option<bool>, ParamError> {
        match lookup(args, name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(ParamError::WrongType {
                name: name.to_string(),
                expected: "boolean",
            }),
        }
    }

    pub fn optional_string_list(args: &Value, name: &str) -> Result<Vec<String>, ParamError> {
        match lookup(args, name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(ParamError::WrongType {
                        name: name.to_string(),
                        expected: "array of strings",
                    }),
                })
                .collect(),
            Some(_) => Err(ParamError::WrongType {
                name: name.to_string(),
                expected: "array of strings",
            }),
        }
    }
}
