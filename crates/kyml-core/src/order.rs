use kyml_schema::{Document, GroupVersionKind};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Apply order for well-known kinds, as `(group, version, kind)`.
///
/// Namespaces first, then definitions, storage, config and secrets, service
/// accounts and RBAC, services, and finally the controllers that create pods.
pub const KIND_PRIORITY: &[(&str, &str, &str)] = &[
    ("", "v1", "Namespace"),
    ("apiextensions.k8s.io", "v1beta1", "CustomResourceDefinition"),
    ("storage.k8s.io", "v1", "StorageClass"),
    // Service accounts fail to create if a referenced imagePullSecret is missing.
    ("", "v1", "ConfigMap"),
    ("", "v1", "Secret"),
    // Pods need their service account; bindings need the account and the role.
    ("", "v1", "ServiceAccount"),
    ("rbac.authorization.k8s.io", "v1", "Role"),
    ("rbac.authorization.k8s.io", "v1", "ClusterRole"),
    ("rbac.authorization.k8s.io", "v1", "RoleBinding"),
    ("rbac.authorization.k8s.io", "v1", "ClusterRoleBinding"),
    // Services before controllers so the scheduler can spread their pods.
    ("", "v1", "Service"),
    ("apps", "v1", "DaemonSet"),
    ("apps", "v1", "Deployment"),
    ("apps", "v1", "ReplicaSet"),
    ("apps", "v1", "StatefulSet"),
    ("batch", "v1", "Job"),
    ("batch", "v1beta1", "CronJob"),
    ("", "v1", "ReplicationController"),
];

static RANKS: LazyLock<HashMap<GroupVersionKind, usize>> = LazyLock::new(|| {
    KIND_PRIORITY
        .iter()
        .enumerate()
        .map(|(rank, &(g, v, k))| (GroupVersionKind::new(g, v, k), rank))
        .collect()
});

/// Position of `gvk` in [`KIND_PRIORITY`], if listed.
pub fn kind_rank(gvk: &GroupVersionKind) -> Option<usize> {
    RANKS.get(gvk).copied()
}

// Unranked kinds never compare less than anything, so the relation is not a
// total order. Only a ranked left side can move ahead of its neighbour.
fn precedes(left: Option<usize>, right: Option<usize>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => l < r,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Stable-sort documents so dependencies come before their dependents.
///
/// Uses an insertion sort rather than `slice::sort_by`, which may panic on
/// comparators that are not a total order.
pub fn sort_by_dependencies(docs: &mut [Document]) {
    let mut ranks: Vec<Option<usize>> = docs.iter().map(|d| kind_rank(&d.gvk())).collect();
    for i in 1..docs.len() {
        let mut j = i;
        while j > 0 && precedes(ranks[j], ranks[j - 1]) {
            docs.swap(j, j - 1);
            ranks.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyml_schema::decode_str;

    fn kinds(docs: &[Document]) -> Vec<String> {
        docs.iter()
            .map(|d| format!("{}/{}", d.kind(), d.name()))
            .collect()
    }

    fn manifest(kind: &str, api_version: &str, name: &str) -> String {
        format!("---\napiVersion: {api_version}\nkind: {kind}\nmetadata:\n  name: {name}\n")
    }

    #[test]
    fn table_is_complete_and_unique() {
        assert_eq!(KIND_PRIORITY.len(), 18);
        assert_eq!(RANKS.len(), KIND_PRIORITY.len());
        assert_eq!(
            kind_rank(&GroupVersionKind::from_api_version("v1", "Namespace")),
            Some(0)
        );
        assert_eq!(
            kind_rank(&GroupVersionKind::from_api_version("v1", "ReplicationController")),
            Some(17)
        );
        assert_eq!(
            kind_rank(&GroupVersionKind::from_api_version("extensions/v1beta1", "Deployment")),
            None
        );
    }

    #[test]
    fn namespace_moves_before_deployment() {
        let input = manifest("Deployment", "apps/v1", "web") + &manifest("Namespace", "v1", "ns");
        let mut docs = decode_str(&input).unwrap();
        sort_by_dependencies(&mut docs);
        assert_eq!(kinds(&docs), vec!["Namespace/ns", "Deployment/web"]);
    }

    #[test]
    fn full_dependency_chain() {
        let input = [
            manifest("Deployment", "apps/v1", "web"),
            manifest("Service", "v1", "web"),
            manifest("RoleBinding", "rbac.authorization.k8s.io/v1", "rb"),
            manifest("ServiceAccount", "v1", "sa"),
            manifest("Secret", "v1", "s"),
            manifest("ConfigMap", "v1", "cm"),
            manifest("Namespace", "v1", "ns"),
        ]
        .concat();
        let mut docs = decode_str(&input).unwrap();
        sort_by_dependencies(&mut docs);
        assert_eq!(
            kinds(&docs),
            vec![
                "Namespace/ns",
                "ConfigMap/cm",
                "Secret/s",
                "ServiceAccount/sa",
                "RoleBinding/rb",
                "Service/web",
                "Deployment/web",
            ]
        );
    }

    #[test]
    fn equal_ranks_keep_input_order() {
        let input = manifest("Service", "v1", "b") + &manifest("Service", "v1", "a");
        let mut docs = decode_str(&input).unwrap();
        sort_by_dependencies(&mut docs);
        assert_eq!(kinds(&docs), vec!["Service/b", "Service/a"]);
    }

    #[test]
    fn unranked_kinds_keep_input_order() {
        let input = manifest("Ingress", "networking.k8s.io/v1", "b")
            + &manifest("HorizontalPodAutoscaler", "autoscaling/v2", "a");
        let mut docs = decode_str(&input).unwrap();
        sort_by_dependencies(&mut docs);
        assert_eq!(kinds(&docs), vec!["Ingress/b", "HorizontalPodAutoscaler/a"]);
    }

    #[test]
    fn ranked_kinds_move_ahead_of_unranked() {
        let input = manifest("Ingress", "networking.k8s.io/v1", "web")
            + &manifest("Deployment", "apps/v1", "web")
            + &manifest("Namespace", "v1", "ns");
        let mut docs = decode_str(&input).unwrap();
        sort_by_dependencies(&mut docs);
        assert_eq!(
            kinds(&docs),
            vec!["Namespace/ns", "Deployment/web", "Ingress/web"]
        );
    }

    #[test]
    fn precedes_is_asymmetric() {
        assert!(precedes(Some(3), None));
        assert!(!precedes(None, Some(3)));
        assert!(!precedes(None, None));
        assert!(!precedes(Some(3), Some(3)));
        assert!(precedes(Some(1), Some(2)));
    }

    #[test]
    fn empty_and_single() {
        let mut docs: Vec<Document> = Vec::new();
        sort_by_dependencies(&mut docs);
        let mut docs = decode_str(&manifest("Service", "v1", "a")).unwrap();
        sort_by_dependencies(&mut docs);
        assert_eq!(docs.len(), 1);
    }
}
