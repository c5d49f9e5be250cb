use crate::document::Document;
use crate::SchemaError;
use serde::Deserialize;
use std::io::Read;

const DOCUMENT_MARKER: &str = "---\n";

/// Parse a stream of `---` separated YAML documents.
///
/// Empty documents (nothing between two markers) are skipped. Every other
/// document must be a mapping.
pub fn decode_str(input: &str) -> Result<Vec<Document>, SchemaError> {
    let mut documents = Vec::new();
    for (index, de) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let value = serde_yaml::Value::deserialize(de)?;
        match value {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Mapping(mapping) => {
                documents.push(Document::new(json_object(mapping, index)?));
            }
            other => {
                return Err(SchemaError::NotAnObject {
                    index,
                    found: yaml_type_name(&other),
                })
            }
        }
    }
    Ok(documents)
}

fn json_object(
    mapping: serde_yaml::Mapping,
    index: usize,
) -> Result<serde_json::Map<String, serde_json::Value>, SchemaError> {
    let mut object = serde_json::Map::with_capacity(mapping.len());
    for (key, value) in mapping {
        object.insert(json_key(key, index)?, json_value(value, index)?);
    }
    Ok(object)
}

/// Scalar keys become strings (`8080: http` is keyed by `"8080"`); sequence
/// and mapping keys have no string form.
fn json_key(key: serde_yaml::Value, index: usize) -> Result<String, SchemaError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_owned()),
        serde_yaml::Value::Tagged(tagged) => json_key(tagged.value, index),
        other @ (serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_)) => {
            Err(SchemaError::UnsupportedKey {
                index,
                found: yaml_type_name(&other),
            })
        }
    }
}

fn json_value(value: serde_yaml::Value, index: usize) -> Result<serde_json::Value, SchemaError> {
    Ok(match value {
        serde_yaml::Value::Null => serde_json::Value::Null,
        serde_yaml::Value::Bool(b) => serde_json::Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else {
                // NaN and infinities have no JSON number form.
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
        }
        serde_yaml::Value::String(s) => serde_json::Value::String(s),
        serde_yaml::Value::Sequence(items) => serde_json::Value::Array(
            items
                .into_iter()
                .map(|item| json_value(item, index))
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            serde_json::Value::Object(json_object(mapping, index)?)
        }
        serde_yaml::Value::Tagged(tagged) => json_value(tagged.value, index)?,
    })
}

pub fn decode_reader(mut reader: impl Read) -> Result<Vec<Document>, SchemaError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    decode_str(&input)
}

/// Serialize documents in canonical form.
///
/// Each document is preceded by a `---` marker, including the first. Keys
/// are emitted in sorted order at every depth regardless of the input order.
pub fn encode(documents: &[Document]) -> Result<String, SchemaError> {
    let mut out = String::new();
    for doc in documents {
        let canonical = canonical_mapping(doc.as_object());
        let text = serde_yaml::to_string(&canonical)
            .map_err(|e| SchemaError::Encode(format!("{}: {e}", doc.resource_id())))?;
        out.push_str(DOCUMENT_MARKER);
        out.push_str(&text);
    }
    Ok(out)
}

fn canonical_mapping(object: &serde_json::Map<String, serde_json::Value>) -> serde_yaml::Value {
    let mut keys: Vec<&String> = object.keys().collect();
    keys.sort();
    let mut mapping = serde_yaml::Mapping::with_capacity(keys.len());
    for key in keys {
        mapping.insert(
            serde_yaml::Value::String(key.clone()),
            canonical_value(&object[key.as_str()]),
        );
    }
    serde_yaml::Value::Mapping(mapping)
}

fn canonical_value(value: &serde_json::Value) -> serde_yaml::Value {
    match value {
        serde_json::Value::Null => serde_yaml::Value::Null,
        serde_json::Value::Bool(b) => serde_yaml::Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                serde_yaml::Value::Number(u.into())
            } else if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else {
                serde_yaml::Value::Number(n.as_f64().unwrap_or_default().into())
            }
        }
        serde_json::Value::String(s) => serde_yaml::Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            serde_yaml::Value::Sequence(items.iter().map(canonical_value).collect())
        }
        serde_json::Value::Object(object) => canonical_mapping(object),
    }
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
