use super::{emit, EXIT_SUCCESS};
use kyml_core::{Engine, TemplateContext};

pub fn run(engine: &Engine, values: &[(String, String)], env: &[String]) -> Result<u8, String> {
    let ctx = context(values, env);
    let out = engine
        .template(std::io::stdin().lock(), &ctx)
        .map_err(|e| e.to_string())?;
    emit(&out)?;
    Ok(EXIT_SUCCESS)
}

// Environment variables win over --value pairs of the same name.
fn context(values: &[(String, String)], env: &[String]) -> TemplateContext {
    let mut ctx: TemplateContext = values.iter().cloned().collect();
    for name in env {
        ctx.insert_env(name);
    }
    ctx
}
