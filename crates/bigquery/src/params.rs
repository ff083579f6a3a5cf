//! Named, typed query parameters.
//!
//! Every caller-influenced value reaches BigQuery as a bound parameter
//! (`@name` in the SQL text), never spliced into the query string.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Value of a single named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParameterValue {
    Int64(i64),
    String(String),
    StringArray(Vec<String>),
}

impl ParameterValue {
    /// BigQuery type name used in `parameterType.type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Int64(_) => "INT64",
            ParameterValue::String(_) => "STRING",
            ParameterValue::StringArray(_) => "ARRAY",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParameterValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            ParameterValue::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        ParameterValue::Int64(v)
    }
}

impl From<u32> for ParameterValue {
    fn from(v: u32) -> Self {
        ParameterValue::Int64(i64::from(v))
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::String(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        ParameterValue::String(v)
    }
}

impl From<Vec<String>> for ParameterValue {
    fn from(v: Vec<String>) -> Self {
        ParameterValue::StringArray(v)
    }
}

/// A named parameter bound to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: ParameterValue,
}

impl QueryParameter {
    /// Encode as a `QueryParameter` object of the BigQuery REST API.
    ///
    /// INT64 values travel as decimal strings, like every int64 in the API.
    pub fn to_rest(&self) -> Value {
        let mut parameter_type = json!({ "type": self.value.type_name() });
        let parameter_value = match &self.value {
            ParameterValue::Int64(v) => json!({ "value": v.to_string() }),
            ParameterValue::String(v) => json!({ "value": v }),
            ParameterValue::StringArray(items) => {
                parameter_type["arrayType"] = json!({ "type": "STRING" });
                json!({
                    "arrayValues": items.iter().map(|v| json!({ "value": v })).collect::<Vec<_>>()
                })
            }
        };
        json!({
            "name": self.name,
            "parameterType": parameter_type,
            "parameterValue": parameter_value,
        })
    }
}

/// SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseQuery {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<QueryParameter>,
}

impl WarehouseQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind `value` to `@name`. Rebinding a name replaces the earlier value.
    pub fn bind(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        let value = value.into();
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.params.push(QueryParameter {
                name: name.to_string(),
                value,
            }),
        }
        self
    }

    /// Look up a bound parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParameterValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn to_rest_parameters(&self) -> Vec<Value> {
        self.params.iter().map(QueryParameter::to_rest).collect()
    }
}
