//! Attribute values and the reference expression parser.
//!
//! A component dimension is either a literal number or a reference to another
//! component's dimension inside the same block, written `component.attribute`.
//! Nothing else is accepted: there is no arithmetic and no cross-block lookup.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, alphanumeric1, multispace0};
use nom::combinator::{all_consuming, recognize};
use nom::multi::many0_count;
use nom::sequence::{delimited, pair, separated_pair};
use nom::{IResult, Parser};
use serde::Serialize;
use std::fmt;

/// Address of one dimension inside a block: `(component, attribute)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AttributeKey {
    pub component: String,
    pub attribute: String,
}

impl AttributeKey {
    pub fn new(component: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.attribute)
    }
}

/// A single geometric attribute as authored
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A finite number
    Literal(f64),
    /// Copy the value of another component's attribute in the same block
    Reference(AttributeKey),
}

impl AttributeValue {
    pub fn reference(component: impl Into<String>, attribute: impl Into<String>) -> Self {
        AttributeValue::Reference(AttributeKey::new(component, attribute))
    }

    /// Parse a textual attribute.
    ///
    /// Returns `Ok(None)` for the empty "no value" sentinel.
    pub fn parse_str(raw: &str) -> Result<Option<Self>, ExpressionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Ok(value) = trimmed.parse::<f64>() {
            return if value.is_finite() {
                Ok(Some(AttributeValue::Literal(value)))
            } else {
                Err(ExpressionError::new(raw, "value is not finite"))
            };
        }

        match reference(raw) {
            Ok((_, (component, attribute))) => {
                Ok(Some(AttributeValue::reference(component, attribute)))
            }
            Err(_) => Err(ExpressionError::new(
                raw,
                "expected a number or a `component.attribute` reference",
            )),
        }
    }

    /// Parse a raw value taken from the configuration tree.
    pub fn parse_value(raw: &toml::Value) -> Result<Option<Self>, ExpressionError> {
        match raw {
            toml::Value::Integer(i) => Ok(Some(AttributeValue::Literal(*i as f64))),
            toml::Value::Float(f) if f.is_finite() => Ok(Some(AttributeValue::Literal(*f))),
            toml::Value::Float(f) => Err(ExpressionError::new(f.to_string(), "value is not finite")),
            toml::Value::String(s) => Self::parse_str(s),
            other => Err(ExpressionError::new(
                other.to_string(),
                format!("unsupported {} value", other.type_str()),
            )),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Literal(v) => write!(f, "{}", v),
            AttributeValue::Reference(key) => write!(f, "{}", key),
        }
    }
}

/// Error type for attribute parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionError {
    pub raw: String,
    pub message: String,
}

impl ExpressionError {
    fn new(raw: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid attribute expression {:?}: {}", self.raw, self.message)
    }
}

impl std::error::Error for ExpressionError {}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn reference(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(delimited(
        multispace0,
        separated_pair(identifier, tag("."), identifier),
        multispace0,
    ))
    .parse(input)
}
