use crate::identity::{GroupVersionKind, ResourceId};
use serde_json::{Map, Value};

/// A single parsed manifest document.
///
/// The payload is an arbitrary-depth tree of objects, arrays, and scalars.
/// Only the top level is guaranteed to be an object; everything below is
/// accessed through the helpers here or through the raw [`Value`] tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    object: Map<String, Value>,
}

impl Document {
    pub fn new(object: Map<String, Value>) -> Self {
        Self { object }
    }

    #[inline]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.object
    }

    #[inline]
    pub fn as_object_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.object
    }

    pub fn into_object(self) -> Map<String, Value> {
        self.object
    }

    pub fn api_version(&self) -> &str {
        str_field(&self.object, "apiVersion")
    }

    pub fn kind(&self) -> &str {
        str_field(&self.object, "kind")
    }

    pub fn name(&self) -> &str {
        self.metadata().map_or("", |m| str_field(m, "name"))
    }

    /// Empty for cluster-scoped resources.
    pub fn namespace(&self) -> &str {
        self.metadata().map_or("", |m| str_field(m, "namespace"))
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(self.api_version(), self.kind())
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::of(self)
    }

    /// Look up an array at a nested object path, e.g. `spec.template.spec.containers`.
    ///
    /// Returns `None` if any segment is missing, any intermediate value is not
    /// an object, or the leaf is not an array.
    pub fn nested_slice(&self, path: &[&str]) -> Option<&Vec<Value>> {
        let (leaf, parents) = path.split_last()?;
        let mut current = &self.object;
        for segment in parents {
            current = current.get(*segment)?.as_object()?;
        }
        current.get(*leaf)?.as_array()
    }

    pub fn nested_slice_mut(&mut self, path: &[&str]) -> Option<&mut Vec<Value>> {
        let (leaf, parents) = path.split_last()?;
        let mut current = &mut self.object;
        for segment in parents {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        current.get_mut(*leaf)?.as_array_mut()
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.object.get("metadata")?.as_object()
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.object)
    }
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or("")
}
