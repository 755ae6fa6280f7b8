pub mod apis;
pub mod models;

use minijinja::Environment;

use crate::error::GenerateError;

/// Wrap free text in a docstring literal.
fn docstring(value: String) -> String {
    let escaped = value.trim().replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"\"\"{escaped}\"\"\"")
}

fn render(
    name: &'static str,
    source: &'static str,
    ctx: minijinja::Value,
) -> Result<String, GenerateError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("docstring", docstring);
    env.add_template(name, source)
        .expect("template should be valid");
    let tmpl = env.get_template(name)?;
    Ok(tmpl.render(ctx)?)
}
