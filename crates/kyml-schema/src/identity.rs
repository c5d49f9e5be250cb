use crate::document::Document;
use serde::Serialize;
use std::fmt;

/// API group, version, and kind of a manifest, split out of `apiVersion`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_owned(),
            version: version.to_owned(),
            kind: kind.to_owned(),
        }
    }

    /// Split an `apiVersion` string into group and version.
    ///
    /// `"apps/v1"` yields group `apps`, `"v1"` yields the core (empty) group.
    /// Values with more than one `/` are not valid group versions and produce
    /// an entirely empty GVK, kind included.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        match api_version.split_once('/') {
            None => Self::new("", api_version, kind),
            Some((group, version)) if !version.contains('/') => Self::new(group, version, kind),
            Some(_) => Self::default(),
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

/// Identity of a Kubernetes resource across documents.
///
/// Two documents describe the same resource iff group, version, kind,
/// namespace, and name are all equal. No normalization is applied; documents
/// without kind or apiVersion share the empty identity.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub gvk: GroupVersionKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn of(doc: &Document) -> Self {
        Self {
            gvk: doc.gvk(),
            namespace: doc.namespace().to_owned(),
            name: doc.name().to_owned(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_version = self.gvk.api_version();
        if self.namespace.is_empty() {
            write!(f, "{} {api_version} {}", self.gvk.kind, self.name)
        } else {
            write!(
                f,
                "{} {api_version} {}/{}",
                self.gvk.kind, self.namespace, self.name
            )
        }
    }
}
