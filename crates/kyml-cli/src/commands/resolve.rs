use super::{emit, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use kyml_core::Engine;
use kyml_resolve::{CachingResolver, DockerResolver, Platform};
use kyml_schema::ResolveSection;

pub fn run(engine: &Engine, config: &ResolveSection) -> Result<u8, String> {
    let platform = platform(config);
    let mut resolver = CachingResolver::new(DockerResolver::system().with_platform(platform));

    let pb = console::Term::stderr()
        .is_term()
        .then(|| spinner("resolving image digests..."));

    match engine.resolve(std::io::stdin().lock(), &mut resolver) {
        Ok(run) => {
            if let Some(pb) = &pb {
                spin_ok(pb, &pinned_message(run.pinned));
            }
            emit(&run.output)?;
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "resolution failed");
            }
            Err(e.to_string())
        }
    }
}

fn pinned_message(pinned: usize) -> String {
    match pinned {
        1 => "pinned 1 image".to_owned(),
        n => format!("pinned {n} images"),
    }
}

fn platform(config: &ResolveSection) -> Platform {
    let default = Platform::default();
    Platform::new(
        config.architecture.clone().unwrap_or(default.architecture),
        config.os.clone().unwrap_or(default.os),
    )
}
