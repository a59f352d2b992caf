//! Built-in template functions

use crate::exec::{format_value, Value};
use bson::Bson;

/// Functions callable from a mapping template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Lowercase a string. Non-strings become the empty string.
    ToLower,
    /// Print any value; ObjectIds print as their bare hex.
    ToString,
    /// Collect the keys of a document whose values are true.
    ToSet,
}

impl Function {
    pub const ALL: [Function; 3] = [Function::ToLower, Function::ToString, Function::ToSet];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::ToLower => "toLower",
            Function::ToString => "toString",
            Function::ToSet => "toSet",
        }
    }

    /// Number of arguments, including one received through a pipe.
    pub fn arity(self) -> usize {
        1
    }

    pub(crate) fn call(self, args: &[Value<'_>]) -> String {
        let missing = Value::Missing;
        let arg = args.first().unwrap_or(&missing);
        match self {
            Function::ToLower => to_lower(arg),
            Function::ToString => to_string(arg),
            Function::ToSet => to_set(arg),
        }
    }
}

fn to_lower(value: &Value<'_>) -> String {
    value.as_str().map(str::to_lowercase).unwrap_or_default()
}

fn to_string(value: &Value<'_>) -> String {
    match value {
        Value::Missing => "<nil>".to_string(),
        _ => match value.as_bson() {
            Some(Bson::ObjectId(oid)) => oid.to_hex(),
            _ => format_value(value),
        },
    }
}

/// `{"b": true, "a": "1", "c": false}` becomes `[a,b]`. Any value that is not
/// boolean-like rejects the whole set, as does a non-document argument.
fn to_set(value: &Value<'_>) -> String {
    let Some(doc) = value.as_document() else {
        return String::new();
    };

    let mut members = Vec::new();
    for (key, flag) in doc {
        let included = match flag {
            Bson::Boolean(b) => *b,
            Bson::String(s) => match parse_bool(s) {
                Some(b) => b,
                None => return String::new(),
            },
            _ => return String::new(),
        };
        if included {
            members.push(key.as_str());
        }
    }
    members.sort_unstable();

    format!("[{}]", members.join(","))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
