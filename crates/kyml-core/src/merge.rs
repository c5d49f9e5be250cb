use kyml_schema::{Document, ResourceId};
use tracing::debug;

/// Ordered, deduplicated sequence of manifest documents.
///
/// Folding in a document whose identity is already present replaces the
/// earlier one at its original position; anything else is appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestSet {
    documents: Vec<Document>,
}

impl ManifestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, doc: Document) {
        let id = doc.resource_id();
        match self.position(&id) {
            Some(index) => {
                debug!("replacing {id}");
                self.documents[index] = doc;
            }
            None => {
                debug!("adding {id}");
                self.documents.push(doc);
            }
        }
    }

    fn position(&self, id: &ResourceId) -> Option<usize> {
        self.documents.iter().position(|d| d.resource_id() == *id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

impl Extend<Document> for ManifestSet {
    fn extend<I: IntoIterator<Item = Document>>(&mut self, iter: I) {
        for doc in iter {
            self.push(doc);
        }
    }
}

impl FromIterator<Document> for ManifestSet {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
