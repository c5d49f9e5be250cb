use crate::command::{CommandRunner, SystemRunner};
use crate::reference::strip_tag_and_digest;
use crate::resolver::ImageResolver;
use crate::ResolveError;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

const DOCKER: &str = "docker";
const INSPECT: &str = "docker inspect";
const MANIFEST_INSPECT: &str = "docker manifest inspect";

/// Target platform used to pick an entry out of a multi-platform manifest list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
}

impl Platform {
    pub fn new(architecture: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            architecture: architecture.into(),
            os: os.into(),
        }
    }

    fn matches(&self, spec: &PlatformSpec) -> bool {
        spec.architecture == self.architecture && spec.os == self.os
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new("amd64", "linux")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)
    }
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(rename = "Descriptor")]
    descriptor: Descriptor,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    #[serde(default)]
    digest: String,
    #[serde(default)]
    platform: Option<PlatformSpec>,
}

#[derive(Debug, Deserialize)]
struct PlatformSpec {
    #[serde(default)]
    architecture: String,
    #[serde(default)]
    os: String,
}

/// Resolves image references through the docker CLI.
///
/// The local image store is consulted first (`docker inspect`); if the image
/// is not present locally the registry is asked (`docker manifest inspect`).
pub struct DockerResolver<R = SystemRunner> {
    runner: R,
    platform: Platform,
}

impl DockerResolver<SystemRunner> {
    pub fn system() -> Self {
        Self::new(SystemRunner)
    }
}

impl<R: CommandRunner> DockerResolver<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            platform: Platform::default(),
        }
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Look the image up in the local image store.
    ///
    /// Returns the repo digest whose repository matches `image`, or `None`
    /// when the image is unknown locally.
    pub fn inspect_local(&self, image: &str) -> Result<Option<String>, ResolveError> {
        let out = self.runner.run(
            DOCKER,
            &["inspect", "--format", "{{json .RepoDigests}}", image],
        )?;
        if !out.success {
            if out.stderr.contains("No such object:") {
                debug!("{image}: not present locally");
                return Ok(None);
            }
            return Err(ResolveError::ToolFailed {
                tool: INSPECT.to_owned(),
                stderr: out.stderr.trim().to_owned(),
            });
        }

        let repo_digests: Vec<String> =
            serde_json::from_str(&out.stdout).map_err(|e| ResolveError::Decode {
                tool: INSPECT.to_owned(),
                message: format!("repo digests: {e}"),
            })?;

        let prefix = format!("{}@", strip_tag_and_digest(image));
        Ok(repo_digests.into_iter().find(|d| d.starts_with(&prefix)))
    }

    /// Ask the registry for the image manifest.
    ///
    /// For a manifest list the entry matching the configured platform is
    /// used; a list without such an entry yields `None`.
    pub fn inspect_manifest(&self, image: &str) -> Result<Option<String>, ResolveError> {
        let out = self
            .runner
            .run(DOCKER, &["manifest", "inspect", "--verbose", image])?;
        if !out.success {
            if out.stderr.contains("no such manifest:") {
                debug!("{image}: no manifest in registry");
                return Ok(None);
            }
            return Err(ResolveError::ToolFailed {
                tool: MANIFEST_INSPECT.to_owned(),
                stderr: out.stderr.trim().to_owned(),
            });
        }

        let decode_err = |e: serde_json::Error| ResolveError::Decode {
            tool: MANIFEST_INSPECT.to_owned(),
            message: e.to_string(),
        };

        let body = out.stdout.trim_start();
        let digest = if body.starts_with('[') {
            let entries: Vec<ManifestEntry> = serde_json::from_str(body).map_err(decode_err)?;
            let found = entries.into_iter().find(|entry| {
                entry
                    .descriptor
                    .platform
                    .as_ref()
                    .is_some_and(|p| self.platform.matches(p))
            });
            match found {
                Some(entry) => entry.descriptor.digest,
                None => {
                    debug!("{image}: manifest list has no {} entry", self.platform);
                    return Ok(None);
                }
            }
        } else {
            let entry: ManifestEntry = serde_json::from_str(body).map_err(decode_err)?;
            entry.descriptor.digest
        };

        if digest.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!("{}@{digest}", strip_tag_and_digest(image))))
    }
}

impl<R: CommandRunner> ImageResolver for DockerResolver<R> {
    fn resolve(&mut self, image: &str) -> Result<Option<String>, ResolveError> {
        if let Some(pinned) = self.inspect_local(image)? {
            return Ok(Some(pinned));
        }
        self.inspect_manifest(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use crate::mock::MockRunner;

    const IMAGE: &str = "registry:5000/path/hello:latest";
    const HELLO_DIGEST: &str =
        "sha256:2d8b22d01ca51eef988ff3ae8dcf37c182553b662ea47d3d62ce8208a3b83aef";
    const INSPECT_CMD: &str =
        "docker inspect --format {{json .RepoDigests}} registry:5000/path/hello:latest";
    const MANIFEST_CMD: &str = "docker manifest inspect --verbose registry:5000/path/hello:latest";

    const OPENJDK_ARM_ONLY: &str = r#"[
        {
            "Ref": "docker.io/library/openjdk:latest@sha256:ff3da04131714a6e03d02684a33a3858e622923344534de87ff453d03181337a",
            "Descriptor": {
                "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                "digest": "sha256:ff3da04131714a6e03d02684a33a3858e622923344534de87ff453d03181337a",
                "size": 2000,
                "platform": { "architecture": "arm", "os": "linux", "variant": "v5" }
            }
        }
    ]"#;

    const OPENJDK_LIST: &str = r#"[
        {
            "Ref": "docker.io/library/openjdk:latest@sha256:c7381bfd53670f1211314885b03b98f5e13fddf6958afeec61092b07c56ddef1",
            "Descriptor": {
                "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                "digest": "sha256:c7381bfd53670f1211314885b03b98f5e13fddf6958afeec61092b07c56ddef1",
                "size": 2000,
                "platform": { "architecture": "amd64", "os": "linux" }
            }
        },
        {
            "Ref": "docker.io/library/openjdk:latest@sha256:ff3da04131714a6e03d02684a33a3858e622923344534de87ff453d03181337a",
            "Descriptor": {
                "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                "digest": "sha256:ff3da04131714a6e03d02684a33a3858e622923344534de87ff453d03181337a",
                "size": 2000,
                "platform": { "architecture": "arm", "os": "linux", "variant": "v5" }
            }
        }
    ]"#;

    fn resolver(runner: MockRunner) -> DockerResolver<MockRunner> {
        DockerResolver::new(runner)
    }

    #[test]
    fn inspect_image_not_found() {
        let r = resolver(MockRunner::new().respond(CommandOutput::failed(
            "\nError: No such object: registry:5000/path/hello:latest\n",
        )));
        assert_eq!(r.inspect_local(IMAGE).unwrap(), None);
        assert_eq!(r.runner().calls(), vec![INSPECT_CMD]);
    }

    #[test]
    fn inspect_daemon_error() {
        let r = resolver(MockRunner::new().respond(CommandOutput::failed(
            "\nError response from daemon: Bad response from Docker engine\n",
        )));
        let err = r.inspect_local(IMAGE).unwrap_err();
        assert!(matches!(err, ResolveError::ToolFailed { .. }));
        assert!(err.to_string().contains("Bad response from Docker engine"));
    }

    #[test]
    fn inspect_docker_missing() {
        let r = resolver(
            MockRunner::new().fail_to_spawn("exec: \"docker\": executable file not found in $PATH"),
        );
        assert!(matches!(
            r.inspect_local(IMAGE),
            Err(ResolveError::Spawn { .. })
        ));
        assert_eq!(r.runner().calls(), vec![INSPECT_CMD]);
    }

    #[test]
    fn inspect_success_picks_matching_repository() {
        let stdout = format!(
            "[\"another-registry.example.com/hello@{HELLO_DIGEST}\",\"registry:5000/path/hello@{HELLO_DIGEST}\"]\n"
        );
        let r = resolver(MockRunner::new().respond(CommandOutput::ok(stdout)));
        assert_eq!(
            r.inspect_local(IMAGE).unwrap(),
            Some(format!("registry:5000/path/hello@{HELLO_DIGEST}"))
        );
    }

    #[test]
    fn inspect_without_matching_repository_is_none() {
        let stdout = format!("[\"another-registry.example.com/hello@{HELLO_DIGEST}\"]");
        let r = resolver(MockRunner::new().respond(CommandOutput::ok(stdout)));
        assert_eq!(r.inspect_local(IMAGE).unwrap(), None);
    }

    #[test]
    fn inspect_garbage_output_is_decode_error() {
        let r = resolver(MockRunner::new().respond(CommandOutput::ok("not json")));
        assert!(matches!(
            r.inspect_local(IMAGE),
            Err(ResolveError::Decode { .. })
        ));
    }

    #[test]
    fn manifest_not_found() {
        let r = resolver(MockRunner::new().respond(CommandOutput::failed(
            "no such manifest: registry:5000/path/hello:latest\n",
        )));
        assert_eq!(r.inspect_manifest(IMAGE).unwrap(), None);
        assert_eq!(r.runner().calls(), vec![MANIFEST_CMD]);
    }

    #[test]
    fn manifest_experimental_cli_disabled() {
        let r = resolver(MockRunner::new().respond(CommandOutput::failed(
            "docker manifest inspect is only supported on a Docker cli with experimental cli features enabled\n",
        )));
        let err = r.inspect_manifest(IMAGE).unwrap_err();
        assert!(err.to_string().starts_with("docker manifest inspect:"));
    }

    #[test]
    fn manifest_docker_missing() {
        let r = resolver(MockRunner::new().fail_to_spawn("executable file not found in $PATH"));
        assert!(r.inspect_manifest(IMAGE).is_err());
        assert_eq!(r.runner().calls(), vec![MANIFEST_CMD]);
    }

    #[test]
    fn manifest_list_without_platform_is_none() {
        let r = resolver(MockRunner::new().respond(CommandOutput::ok(OPENJDK_ARM_ONLY)));
        assert_eq!(r.inspect_manifest("openjdk:latest").unwrap(), None);
        assert_eq!(
            r.runner().calls(),
            vec!["docker manifest inspect --verbose openjdk:latest"]
        );
    }

    #[test]
    fn manifest_list_picks_default_platform() {
        let r = resolver(MockRunner::new().respond(CommandOutput::ok(OPENJDK_LIST)));
        assert_eq!(
            r.inspect_manifest("openjdk:latest").unwrap().as_deref(),
            Some("openjdk@sha256:c7381bfd53670f1211314885b03b98f5e13fddf6958afeec61092b07c56ddef1")
        );
    }

    #[test]
    fn manifest_list_honours_configured_platform() {
        let r = resolver(MockRunner::new().respond(CommandOutput::ok(OPENJDK_LIST)))
            .with_platform(Platform::new("arm", "linux"));
        assert_eq!(
            r.inspect_manifest("openjdk:latest").unwrap().as_deref(),
            Some("openjdk@sha256:ff3da04131714a6e03d02684a33a3858e622923344534de87ff453d03181337a")
        );
    }

    #[test]
    fn manifest_single_platform() {
        let stdout = format!(
            r#"{{
                "Ref": "registry:5000/path/hello:latest",
                "Descriptor": {{
                    "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                    "digest": "{HELLO_DIGEST}",
                    "size": 3661,
                    "platform": {{ "architecture": "amd64", "os": "linux" }}
                }}
            }}"#
        );
        let r = resolver(MockRunner::new().respond(CommandOutput::ok(stdout)));
        assert_eq!(
            r.inspect_manifest(IMAGE).unwrap(),
            Some(format!("registry:5000/path/hello@{HELLO_DIGEST}"))
        );
    }

    #[test]
    fn manifest_empty_output_is_decode_error() {
        let r = resolver(MockRunner::new().respond(CommandOutput::ok("")));
        assert!(matches!(
            r.inspect_manifest(IMAGE),
            Err(ResolveError::Decode { .. })
        ));
    }

    #[test]
    fn resolve_falls_back_to_registry() {
        let mut r = resolver(
            MockRunner::new()
                .respond(CommandOutput::failed("Error: No such object: openjdk:latest"))
                .respond(CommandOutput::ok(OPENJDK_LIST)),
        );
        let pinned = r.resolve("openjdk:latest").unwrap();
        assert!(pinned.unwrap().starts_with("openjdk@sha256:c7381"));
        assert_eq!(r.runner().calls().len(), 2);
    }

    #[test]
    fn resolve_stops_after_local_hit() {
        let stdout = format!("[\"registry:5000/path/hello@{HELLO_DIGEST}\"]");
        let mut r = resolver(MockRunner::new().respond(CommandOutput::ok(stdout)));
        assert!(r.resolve(IMAGE).unwrap().is_some());
        assert_eq!(r.runner().calls(), vec![INSPECT_CMD]);
    }

    #[test]
    fn resolve_does_not_fall_back_on_error() {
        let mut r = resolver(
            MockRunner::new().respond(CommandOutput::failed("Cannot connect to the Docker daemon")),
        );
        assert!(r.resolve(IMAGE).is_err());
        assert_eq!(r.runner().calls().len(), 1);
    }

    #[test]
    fn platform_display() {
        assert_eq!(Platform::default().to_string(), "linux/amd64");
    }
}
