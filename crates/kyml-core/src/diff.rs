use similar::TextDiff;

/// Unified diff of `a` against `b` with no context lines.
///
/// Both texts are treated as ending in a newline, so a missing trailing
/// newline never shows up as a change. Identical inputs give an empty string.
pub fn unified_diff(name_a: &str, a: &str, name_b: &str, b: &str) -> String {
    let a = format!("{a}\n");
    let b = format!("{b}\n");
    TextDiff::from_lines(&a, &b)
        .unified_diff()
        .context_radius(0)
        .header(name_a, name_b)
        .to_string()
}
