use crate::CoreError;
use kyml_schema::Document;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::error::Error as _;
use tracing::debug;

const ACTION_OPEN: &str = "{{";
const ACTION_CLOSE: &str = "}}";

/// Variables available to templates in manifest string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Add the environment variable `name` under its own name. Unset
    /// variables are empty strings.
    pub fn insert_env(&mut self, name: &str) {
        let value = env::var(name).unwrap_or_default();
        self.insert(name, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn to_tera(&self) -> tera::Context {
        let mut ctx = tera::Context::new();
        for (key, value) in &self.values {
            ctx.insert(key.as_str(), value);
        }
        ctx
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

/// Parse a `key=value` assignment. The value may itself contain `=`.
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got '{input}'")),
    }
}

/// Render every string value in `docs` as a template.
///
/// Keys and non-string scalars are left alone. Referencing a variable that is
/// not in `ctx` is an error naming the field, e.g.
/// `spec.template.spec.containers[0].image`.
pub fn render_documents(docs: &mut [Document], ctx: &TemplateContext) -> Result<(), CoreError> {
    let tera_ctx = ctx.to_tera();
    for doc in docs {
        for (key, value) in doc.as_object_mut().iter_mut() {
            render_value(value, key, &tera_ctx)?;
        }
    }
    Ok(())
}

fn render_value(value: &mut Value, field: &str, ctx: &tera::Context) -> Result<(), CoreError> {
    match value {
        Value::String(text) => {
            if text.contains(ACTION_OPEN) {
                *text = render_str(text, field, ctx)?;
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                render_value(item, &format!("{field}[{index}]"), ctx)?;
            }
        }
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                render_value(item, &format!("{field}.{key}"), ctx)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

/// Render each `{{ ... }}` action on its own and keep the text between
/// actions verbatim, so `{#`, `{%` and `${#ARGS[@]}` in scripts never reach
/// the template parser. An unclosed action is handed over as is and fails.
fn render_str(text: &str, field: &str, ctx: &tera::Context) -> Result<String, CoreError> {
    debug!("rendering {field}");
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(ACTION_OPEN) {
        out.push_str(&rest[..start]);
        let action = &rest[start..];
        let len = action
            .find(ACTION_CLOSE)
            .map_or(action.len(), |end| end + ACTION_CLOSE.len());
        let rendered =
            tera::Tera::one_off(&action[..len], ctx, false).map_err(|e| CoreError::Template {
                field: field.to_owned(),
                message: error_chain(&e),
            })?;
        out.push_str(&rendered);
        rest = &action[len..];
    }
    out.push_str(rest);
    Ok(out)
}

// Tera reports the useful detail (which variable, which token) in the source
// chain rather than the top-level message.
fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
