use crate::resolver::ImageResolver;
use crate::ResolveError;
use kyml_schema::{Document, GroupVersionKind, ImageRef};
use serde_json::Value;
use tracing::{debug, info};

/// Workload kinds whose pod template lives at `spec.template.spec`, as
/// `(group, version, kind)`.
pub const SUPPORTED_KINDS: &[(&str, &str, &str)] = &[
    ("apps", "v1", "DaemonSet"),
    ("apps", "v1", "Deployment"),
    ("apps", "v1", "ReplicaSet"),
    ("apps", "v1", "StatefulSet"),
    ("batch", "v1", "Job"),
    ("", "v1", "ReplicationController"),
];

const CONTAINER_LISTS: [&str; 2] = ["initContainers", "containers"];

pub fn is_supported_kind(gvk: &GroupVersionKind) -> bool {
    SUPPORTED_KINDS
        .iter()
        .any(|&(g, v, k)| gvk.group == g && gvk.version == v && gvk.kind == k)
}

/// Pin every container image in supported workloads to a digest.
///
/// Documents are visited in order; within one, init containers come before
/// regular containers. A container list entry that is not an object or has
/// no string `image` ends processing of that list. Returns the number of
/// images rewritten.
pub fn resolve_documents(
    documents: &mut [Document],
    resolver: &mut dyn ImageResolver,
) -> Result<usize, ResolveError> {
    let mut rewritten = 0;
    for doc in documents.iter_mut() {
        let gvk = doc.gvk();
        if !is_supported_kind(&gvk) {
            debug!("skipping {}", doc.resource_id());
            continue;
        }
        for list in CONTAINER_LISTS {
            if let Some(containers) = doc.nested_slice_mut(&["spec", "template", "spec", list]) {
                rewritten += resolve_containers(containers, resolver)?;
            }
        }
    }
    info!("pinned {rewritten} image(s)");
    Ok(rewritten)
}

fn resolve_containers(
    containers: &mut [Value],
    resolver: &mut dyn ImageResolver,
) -> Result<usize, ResolveError> {
    let mut rewritten = 0;
    for container in containers {
        let Some(container) = container.as_object_mut() else {
            return Ok(rewritten);
        };
        let Some(image) = container.get("image").and_then(Value::as_str) else {
            return Ok(rewritten);
        };
        let image = image.to_owned();

        let pinned = resolver
            .resolve(&image)?
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ResolveError::ImageNotFound(ImageRef::new(image.as_str())))?;
        debug!("{image} -> {pinned}");
        container.insert("image".to_owned(), Value::String(pinned));
        rewritten += 1;
    }
    Ok(rewritten)
}
