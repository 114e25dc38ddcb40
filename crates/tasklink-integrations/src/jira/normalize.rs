//! Alias-tolerant extraction of issue fields.
//!
//! Jira payloads are not consistent about key names across API versions and
//! proxies, so every logical field is looked up through an ordered alias list.

use serde_json::Value;
use tasklink_core::types::NormalizedIssue;

/// Where in the raw issue a logical field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Top level of the issue object.
    Issue,
    /// The issue's `fields` object.
    Fields,
    /// The `fields.assignee` object.
    Assignee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Key,
    Summary,
    Status,
    Assignee,
    Created,
    Updated,
    Description,
}

/// Logical field → scope → ordered source aliases. First truthy alias wins.
pub const FIELD_ALIASES: &[(Field, Scope, &[&str])] = &[
    (Field::Key, Scope::Issue, &["key"]),
    (Field::Summary, Scope::Fields, &["summary"]),
    (Field::Status, Scope::Fields, &["status", "state"]),
    (Field::Assignee, Scope::Assignee, &["displayName", "display_Name"]),
    (Field::Created, Scope::Fields, &["created"]),
    (Field::Updated, Scope::Fields, &["updated"]),
    (Field::Description, Scope::Fields, &["description", "desc"]),
];

/// Value of the first alias present in `obj` with a truthy value.
pub fn first_present<'a>(obj: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| obj.get(alias))
        .find(|v| is_truthy(v))
}

/// null, false, 0, "", [] and {} count as absent.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn scope_of<'a>(issue: &'a Value, scope: Scope) -> &'a Value {
    match scope {
        Scope::Issue => issue,
        Scope::Fields => &issue["fields"],
        Scope::Assignee => &issue["fields"]["assignee"],
    }
}

/// Raw value for a logical field, or None.
pub fn lookup(issue: &Value, field: Field) -> Option<&Value> {
    let (_, scope, aliases) = FIELD_ALIASES.iter().find(|(f, _, _)| *f == field)?;
    first_present(scope_of(issue, *scope), aliases)
}

fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Status objects carry a `name`; some payloads send the bare string.
fn status_name(v: &Value) -> Option<String> {
    match v {
        Value::Object(_) => v.get("name").and_then(Value::as_str).map(str::to_string),
        other => Some(text(other)),
    }
}

pub fn normalize(issue: &Value) -> NormalizedIssue {
    NormalizedIssue {
        key: lookup(issue, Field::Key).map(text),
        summary: lookup(issue, Field::Summary).map(text),
        status: lookup(issue, Field::Status).and_then(status_name),
        assignee: lookup(issue, Field::Assignee).map(text),
        created: lookup(issue, Field::Created).map(text),
        updated: lookup(issue, Field::Updated).map(text),
        description: lookup(issue, Field::Description).cloned(),
    }
}

pub fn normalize_all(issues: &[Value]) -> Vec<NormalizedIssue> {
    issues.iter().map(normalize).collect()
}
