use super::{emit, sources, EXIT_SUCCESS};
use kyml_core::{CatOptions, Engine};

pub fn run(engine: &Engine, files: &[String], sort: bool) -> Result<u8, String> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let out = engine
        .cat(&sources(files), &mut input, CatOptions { sort })
        .map_err(|e| e.to_string())?;
    emit(&out)?;
    Ok(EXIT_SUCCESS)
}
