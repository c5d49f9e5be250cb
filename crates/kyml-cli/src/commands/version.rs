use super::{json_pretty, EXIT_SUCCESS};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: &'static str,
    commit: &'static str,
    build_date: &'static str,
}

impl VersionInfo {
    fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("KYML_COMMIT").unwrap_or("none"),
            build_date: option_env!("KYML_BUILD_DATE").unwrap_or("unknown"),
        }
    }

    fn line(&self) -> String {
        format!(
            "{}, commit {}, built at {}",
            self.version, self.commit, self.build_date
        )
    }
}

pub fn run(json: bool) -> Result<u8, String> {
    let info = VersionInfo::current();
    if json {
        println!("{}", json_pretty(&info)?);
    } else {
        println!("{}", info.line());
    }
    Ok(EXIT_SUCCESS)
}
