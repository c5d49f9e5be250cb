use crate::cat::{concatenate, concatenate_stream, CatOptions, Source};
use crate::drift::{run_snapshot_test, DriftOptions, DriftReport};
use crate::template::{render_documents, TemplateContext};
use crate::CoreError;
use kyml_resolve::{resolve_documents, ImageResolver};
use kyml_schema::encode;
use kyml_store::{Filesystem, OsFilesystem, SnapshotStore};
use std::io::{self, Read};
use tracing::info;

/// Entry point for every kyml operation.
///
/// All file access goes through the engine's [`Filesystem`], so the same
/// pipeline runs against the real disk or an in-memory tree.
pub struct Engine {
    fs: Box<dyn Filesystem>,
}

/// Result of [`Engine::test`].
#[derive(Debug, Clone)]
pub struct TestRun {
    pub report: DriftReport,
    /// Canonical text of the main environment, to be emitted on success.
    pub main: String,
}

/// Result of [`Engine::resolve`].
#[derive(Debug, Clone)]
pub struct ResolveRun {
    pub output: String,
    /// Container images rewritten, counting repeated references each time.
    pub pinned: usize,
}

impl Engine {
    pub fn new(fs: impl Filesystem + 'static) -> Self {
        Self { fs: Box::new(fs) }
    }

    /// Engine over the operating system's filesystem.
    pub fn os() -> Self {
        Self::new(OsFilesystem::new())
    }

    pub fn filesystem(&self) -> &dyn Filesystem {
        self.fs.as_ref()
    }

    /// Concatenate `sources` into canonical text. `-` sources read `stdin`.
    pub fn cat(
        &self,
        sources: &[Source],
        stdin: &mut dyn Read,
        options: CatOptions,
    ) -> Result<String, CoreError> {
        let docs = concatenate(self.fs.as_ref(), sources, stdin, options)?;
        Ok(encode(&docs)?)
    }

    pub fn cat_stream(&self, reader: impl Read, options: CatOptions) -> Result<String, CoreError> {
        let docs = concatenate_stream(reader, options)?;
        Ok(encode(&docs)?)
    }

    /// Snapshot-test the main environment (`main_text`) against the
    /// environment concatenated from `comparison`.
    pub fn test(
        &self,
        main_text: &str,
        comparison: &[Source],
        options: &DriftOptions,
    ) -> Result<TestRun, CoreError> {
        let main = self.cat_stream(main_text.as_bytes(), options.cat)?;
        let comparison = self.cat(comparison, &mut io::empty(), options.cat)?;

        let store = SnapshotStore::new(self.fs.as_ref(), options.snapshot_file.clone());
        let report = run_snapshot_test(&store, &main, &comparison, options)?;
        info!("snapshot test: {:?}", report.outcome);
        Ok(TestRun { report, main })
    }

    /// Render string values of the (deduplicated) stream as templates.
    pub fn template(&self, reader: impl Read, ctx: &TemplateContext) -> Result<String, CoreError> {
        let mut docs = concatenate_stream(reader, CatOptions::unsorted())?;
        render_documents(&mut docs, ctx)?;
        Ok(encode(&docs)?)
    }

    /// Pin container images in the (deduplicated) stream to digests.
    pub fn resolve(
        &self,
        reader: impl Read,
        resolver: &mut dyn ImageResolver,
    ) -> Result<ResolveRun, CoreError> {
        let mut docs = concatenate_stream(reader, CatOptions::unsorted())?;
        let pinned = resolve_documents(&mut docs, resolver)?;
        Ok(ResolveRun {
            output: encode(&docs)?,
            pinned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::DriftOutcome;
    use kyml_resolve::{CachingResolver, CommandOutput, DockerResolver, MockRunner};
    use kyml_schema::{EnvName, MissingSnapshotPolicy};
    use kyml_store::MemoryFilesystem;
    use std::path::Path;

    const NAMESPACE: &str = "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: hello\n";
    const DEPLOYMENT: &str = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: hello\nspec:\n  template:\n    spec:\n      containers:\n      - image: kyml/hello:1.0\n        name: web\n";

    fn engine() -> Engine {
        Engine::new(
            MemoryFilesystem::new()
                .with_file("prod/deployment.yml", DEPLOYMENT)
                .with_file("prod/namespace.yml", NAMESPACE)
                .with_file(
                    "staging/deployment.yml",
                    DEPLOYMENT.replace("1.0", "1.1-rc"),
                )
                .with_file("staging/namespace.yml", NAMESPACE),
        )
    }

    fn files(paths: &[&str]) -> Vec<Source> {
        paths.iter().map(|p| Source::parse(p)).collect()
    }

    #[test]
    fn cat_sorts_and_encodes() {
        let out = engine()
            .cat(
                &files(&["prod/deployment.yml", "prod/namespace.yml"]),
                &mut io::empty(),
                CatOptions::default(),
            )
            .unwrap();
        assert_eq!(out, format!("---\n{NAMESPACE}---\n{DEPLOYMENT}"));
    }

    #[test]
    fn cat_stream_keeps_order_when_unsorted() {
        let input = format!("{DEPLOYMENT}---\n{NAMESPACE}");
        let out = engine()
            .cat_stream(input.as_bytes(), CatOptions::unsorted())
            .unwrap();
        assert_eq!(out, format!("---\n{DEPLOYMENT}---\n{NAMESPACE}"));
    }

    #[test]
    fn test_creates_then_passes() {
        let engine = engine();
        let main = engine
            .cat(
                &files(&["prod/namespace.yml", "prod/deployment.yml"]),
                &mut io::empty(),
                CatOptions::default(),
            )
            .unwrap();
        let options = DriftOptions {
            name_main: EnvName::new("production"),
            name_comparison: EnvName::new("staging"),
            missing_snapshot: MissingSnapshotPolicy::Create,
            ..DriftOptions::default()
        };
        let staging = files(&["staging/namespace.yml", "staging/deployment.yml"]);

        let first = engine.test(&main, &staging, &options).unwrap();
        assert_eq!(first.report.outcome, DriftOutcome::Created);
        assert!(first.report.diff.contains("-      - image: kyml/hello:1.0\n"));
        assert!(engine
            .filesystem()
            .exists(Path::new(kyml_store::DEFAULT_SNAPSHOT_FILE)));

        let second = engine.test(&main, &staging, &options).unwrap();
        assert_eq!(second.report.outcome, DriftOutcome::Passed);
        assert_eq!(second.main, main);
    }

    #[test]
    fn template_renders_values() {
        let input = "kind: ConfigMap\napiVersion: v1\nmetadata:\n  name: cfg\ndata:\n  branch: \"{{ BRANCH }}\"\n";
        let ctx: TemplateContext = [("BRANCH", "main")].into_iter().collect();
        let out = engine().template(input.as_bytes(), &ctx).unwrap();
        assert!(out.contains("branch: main\n"));
    }

    #[test]
    fn resolve_pins_images() {
        let digest = "sha256:2cbb95c7479634c53bc2be243554a98d6928c189360fa958d2c970974e7f131f";
        let runner = MockRunner::new().respond(CommandOutput::ok(format!(
            "[\"kyml/hello@{digest}\"]"
        )));
        let mut resolver = DockerResolver::new(runner);
        let run = engine()
            .resolve(DEPLOYMENT.as_bytes(), &mut resolver)
            .unwrap();
        assert_eq!(run.pinned, 1);
        assert!(run.output.contains(&format!("image: kyml/hello@{digest}\n")));
    }

    #[test]
    fn resolve_counts_every_rewritten_container() {
        let digest = "sha256:2cbb95c7479634c53bc2be243554a98d6928c189360fa958d2c970974e7f131f";
        let runner = MockRunner::new().respond(CommandOutput::ok(format!(
            "[\"kyml/hello@{digest}\"]"
        )));
        let input = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\nspec:\n  template:\n    spec:\n      initContainers:\n      - image: kyml/hello:1.0\n        name: init\n      containers:\n      - image: kyml/hello:1.0\n        name: web\n";
        let mut resolver = CachingResolver::new(DockerResolver::new(runner));
        let run = engine().resolve(input.as_bytes(), &mut resolver).unwrap();
        assert_eq!(run.pinned, 2);
        assert_eq!(resolver.cached(), 1);
        assert_eq!(run.output.matches(&format!("kyml/hello@{digest}")).count(), 2);
    }
}
