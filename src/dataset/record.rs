use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Keys that belong to the record itself and never show up as attributes.
pub const RESERVED_KEYS: [&str; 3] = ["embedding", "text", "id"];

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Converts a JSON scalar. `null`, arrays and objects carry no usable value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Bool(flag) => Some(Self::Text(flag.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The value as a finite number, parsing text when needed.
    pub fn as_finite_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => value.is_finite().then_some(*value),
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
            }
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingRecord {
    pub id: usize,
    pub embedding: Vec<f32>,
    pub text: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl EmbeddingRecord {
    pub fn new(id: usize, embedding: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            id,
            embedding,
            text: text.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_become_attributes() {
        assert_eq!(
            AttributeValue::from_json(&json!(2.5)),
            Some(AttributeValue::Number(2.5))
        );
        assert_eq!(
            AttributeValue::from_json(&json!("en")),
            Some(AttributeValue::Text("en".to_owned()))
        );
        assert_eq!(
            AttributeValue::from_json(&json!(true)),
            Some(AttributeValue::Text("true".to_owned()))
        );
        assert_eq!(AttributeValue::from_json(&json!(null)), None);
        assert_eq!(AttributeValue::from_json(&json!([1, 2])), None);
    }

    #[test]
    fn numeric_text_parses_but_blank_does_not() {
        assert_eq!(
            AttributeValue::Text(" 4.5 ".to_owned()).as_finite_number(),
            Some(4.5)
        );
        assert_eq!(AttributeValue::Text(String::new()).as_finite_number(), None);
        assert_eq!(AttributeValue::Text("inf".to_owned()).as_finite_number(), None);
        assert_eq!(AttributeValue::Text("abc".to_owned()).as_finite_number(), None);
        assert_eq!(AttributeValue::Number(f64::NAN).as_finite_number(), None);
    }

    #[test]
    fn whole_numbers_display_without_fraction() {
        assert_eq!(AttributeValue::Number(3.0).to_string(), "3");
        assert_eq!(AttributeValue::Number(0.25).to_string(), "0.25");
    }
}
