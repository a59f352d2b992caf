//! Template evaluation
//!
//! Evaluation walks the syntax tree against a BSON document. Field lookups
//! never consult a schema: a key that is absent yields [`Value::Missing`],
//! which prints as [`NO_VALUE`](crate::NO_VALUE).

use crate::parser::{Command, Node, Operand, Pipeline};
use crate::NO_VALUE;
use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use moredis_core::{TemplateError, TemplateResult};
use std::fmt::Write as _;

/// An intermediate value produced while evaluating a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value<'a> {
    /// A field lookup found no such key.
    Missing,
    /// The whole context (`.`).
    Root(&'a Document),
    /// A value borrowed from the context.
    Ref(&'a Bson),
    /// A literal or a function result.
    Owned(Bson),
}

impl<'a> Value<'a> {
    pub(crate) fn as_bson(&self) -> Option<&Bson> {
        match self {
            Value::Ref(b) => Some(*b),
            Value::Owned(b) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self.as_bson() {
            Some(Bson::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub(crate) fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Root(doc) => Some(*doc),
            _ => match self.as_bson() {
                Some(Bson::Document(doc)) => Some(doc),
                _ => None,
            },
        }
    }
}

/// Evaluates compiled nodes against one context document.
pub(crate) struct Evaluator<'a> {
    context: &'a Document,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(context: &'a Document) -> Self {
        Self { context }
    }

    pub(crate) fn run(&self, nodes: &[Node], out: &mut String) -> TemplateResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = self.eval_pipeline(pipeline)?;
                    write_value(out, &value);
                }
            }
        }
        Ok(())
    }

    fn eval_pipeline(&self, pipeline: &Pipeline) -> TemplateResult<Value<'a>> {
        let mut result = None;
        for command in &pipeline.commands {
            result = Some(self.eval_command(command, result.take())?);
        }
        Ok(result.unwrap_or(Value::Missing))
    }

    fn eval_command(&self, command: &Command, piped: Option<Value<'a>>) -> TemplateResult<Value<'a>> {
        match command {
            Command::Value(operand) => self.eval_operand(operand),
            Command::Call { function, args } => {
                let mut values = args
                    .iter()
                    .map(|arg| self.eval_operand(arg))
                    .collect::<TemplateResult<Vec<_>>>()?;
                values.extend(piped);
                Ok(Value::Owned(Bson::String(function.call(&values))))
            }
        }
    }

    fn eval_operand(&self, operand: &Operand) -> TemplateResult<Value<'a>> {
        match operand {
            Operand::Dot => Ok(Value::Root(self.context)),
            Operand::Field(path) => self.eval_field(path),
            Operand::Literal(literal) => Ok(Value::Owned(literal.clone())),
            Operand::Nil => Ok(Value::Owned(Bson::Null)),
            Operand::Pipeline(pipeline) => self.eval_pipeline(pipeline),
        }
    }

    /// Resolve `.a.b.c`. A missing key anywhere along the path is `Missing`;
    /// stepping into a null or a scalar is an execution error.
    fn eval_field(&self, path: &[String]) -> TemplateResult<Value<'a>> {
        let mut current = Value::Root(self.context);

        for (ix, name) in path.iter().enumerate() {
            current = match current {
                Value::Missing => return Ok(Value::Missing),
                Value::Root(doc) | Value::Ref(Bson::Document(doc)) => {
                    doc.get(name).map(Value::Ref).unwrap_or(Value::Missing)
                }
                Value::Ref(Bson::Null) => {
                    return Err(execution_error(format!(
                        "nil pointer evaluating .{}",
                        path[..=ix].join(".")
                    )));
                }
                other => {
                    let kind = other
                        .as_bson()
                        .map(|b| format!("{:?}", b.element_type()))
                        .unwrap_or_else(|| "value".to_string());
                    return Err(execution_error(format!(
                        "can't evaluate field {} in type {}",
                        name, kind
                    )));
                }
            };
        }

        Ok(current)
    }
}

fn execution_error(message: String) -> TemplateError {
    TemplateError::Execution { message }
}

/// Print a value the way an action renders it.
pub(crate) fn write_value(out: &mut String, value: &Value<'_>) {
    match value {
        Value::Missing => out.push_str(NO_VALUE),
        Value::Root(doc) => write_document(out, doc),
        Value::Ref(b) => write_bson(out, b),
        Value::Owned(b) => write_bson(out, b),
    }
}

pub(crate) fn format_value(value: &Value<'_>) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_bson(out: &mut String, value: &Bson) {
    match value {
        Bson::String(s) => out.push_str(s),
        Bson::Int32(n) => {
            let _ = write!(out, "{}", n);
        }
        Bson::Int64(n) => {
            let _ = write!(out, "{}", n);
        }
        Bson::Double(n) => out.push_str(&format_float(*n)),
        Bson::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Bson::Null | Bson::Undefined => out.push_str("<nil>"),
        Bson::ObjectId(oid) => {
            let _ = write!(out, "ObjectIdHex(\"{}\")", oid.to_hex());
        }
        Bson::DateTime(dt) => out.push_str(&format_datetime(dt)),
        Bson::Document(doc) => write_document(out, doc),
        Bson::Array(items) => {
            out.push('[');
            for (ix, item) in items.iter().enumerate() {
                if ix > 0 {
                    out.push(' ');
                }
                write_bson(out, item);
            }
            out.push(']');
        }
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}

/// Documents print as `map[k:v ...]` with keys sorted.
fn write_document(out: &mut String, doc: &Document) {
    let mut entries: Vec<(&String, &Bson)> = doc.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push_str("map[");
    for (ix, (key, value)) in entries.into_iter().enumerate() {
        if ix > 0 {
            out.push(' ');
        }
        out.push_str(key);
        out.push(':');
        write_bson(out, value);
    }
    out.push(']');
}

/// Shortest representation in `%g` style: exponent form when the decimal
/// exponent is below -4 or at least 6, with a two-digit minimum exponent.
fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let scientific = format!("{:e}", n);
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return scientific;
    };
    let exp: i32 = match exp.parse() {
        Ok(exp) => exp,
        Err(_) => return scientific,
    };

    if (-4..6).contains(&exp) {
        return format!("{}", n);
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

/// `2006-01-02 15:04:05.999 +0000 UTC`: trailing zeros of the fraction are
/// dropped, and the fraction is omitted entirely when it is zero.
fn format_datetime(dt: &bson::DateTime) -> String {
    let utc: DateTime<Utc> = dt.to_chrono();
    let mut formatted = utc.format("%Y-%m-%d %H:%M:%S").to_string();
    let millis = dt.timestamp_millis().rem_euclid(1000);
    if millis != 0 {
        let fraction = format!("{:03}", millis);
        formatted.push('.');
        formatted.push_str(fraction.trim_end_matches('0'));
    }
    formatted.push_str(" +0000 UTC");
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    #[test]
    fn test_format_scalars() {
        assert_eq!(format_value(&Value::Owned(Bson::Int32(7))), "7");
        assert_eq!(format_value(&Value::Owned(Bson::Int64(-3))), "-3");
        assert_eq!(format_value(&Value::Owned(Bson::Double(1.5))), "1.5");
        assert_eq!(format_value(&Value::Owned(Bson::Double(3.0))), "3");
        assert_eq!(format_value(&Value::Owned(Bson::Boolean(true))), "true");
        assert_eq!(format_value(&Value::Owned(Bson::Null)), "<nil>");
        assert_eq!(format_value(&Value::Missing), "<no value>");
    }

    #[test]
    fn test_format_float_exponents() {
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(1_000_000.0), "1e+06");
        assert_eq!(format_float(1_500_000.0), "1.5e+06");
        assert_eq!(format_float(123_456_789.0), "1.23456789e+08");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(-2.5e-7), "-2.5e-07");
        assert_eq!(format_float(1e100), "1e+100");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(f64::INFINITY), "+Inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_format_float_decimal_range() {
        assert_eq!(format_float(999_999.0), "999999");
        assert_eq!(format_float(123_456.78), "123456.78");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(-42.25), "-42.25");
    }

    #[test]
    fn test_format_datetime() {
        let epoch = bson::DateTime::from_millis(0);
        assert_eq!(
            format_value(&Value::Owned(Bson::DateTime(epoch))),
            "1970-01-01 00:00:00 +0000 UTC"
        );

        let with_millis = bson::DateTime::from_millis(1_600_000_000_120);
        assert_eq!(format_datetime(&with_millis), "2020-09-13 12:26:40.12 +0000 UTC");
    }

    #[test]
    fn test_format_mixed_record() {
        let oid = ObjectId::parse_str("ffffffffffffffffffffffff").unwrap();
        let record = doc! {
            "big": 1_000_000.0,
            "price": 1_500_000.0,
            "tiny": 0.00001,
            "id": oid,
            "at": bson::DateTime::from_millis(0),
        };
        assert_eq!(
            format_value(&Value::Root(&record)),
            "map[at:1970-01-01 00:00:00 +0000 UTC big:1e+06 id:ObjectIdHex(\"ffffffffffffffffffffffff\") price:1.5e+06 tiny:1e-05]"
        );
    }

    #[test]
    fn test_format_object_id_raw() {
        let oid = ObjectId::parse_str("ffffffffffffffffffffffff").unwrap();
        assert_eq!(
            format_value(&Value::Owned(Bson::ObjectId(oid))),
            "ObjectIdHex(\"ffffffffffffffffffffffff\")"
        );
    }

    #[test]
    fn test_format_nested() {
        let value = Bson::Document(doc! { "b": 2, "a": ["x", "y"] });
        assert_eq!(format_value(&Value::Owned(value)), "map[a:[x y] b:2]");
    }

    #[test]
    fn test_field_lookup() {
        let context = doc! { "user": { "name": "Ada", "tags": null }, "n": 1 };
        let evaluator = Evaluator::new(&context);

        let name = evaluator
            .eval_field(&["user".to_string(), "name".to_string()])
            .unwrap();
        assert_eq!(name.as_str(), Some("Ada"));

        let missing = evaluator
            .eval_field(&["nope".to_string(), "deeper".to_string()])
            .unwrap();
        assert_eq!(missing, Value::Missing);

        let err = evaluator
            .eval_field(&["n".to_string(), "x".to_string()])
            .unwrap_err();
        assert!(matches!(err, TemplateError::Execution { .. }));

        let err = evaluator
            .eval_field(&["user".to_string(), "tags".to_string(), "x".to_string()])
            .unwrap_err();
        assert_eq!(
            err,
            TemplateError::Execution {
                message: "nil pointer evaluating .user.tags.x".to_string()
            }
        );
    }
}
