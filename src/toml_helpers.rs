// Small helpers for turning TOML parser errors into located messages.

/// 1-based (line, column) of byte `offset` within `src`.
#[must_use]
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = src.get(..offset).unwrap_or(src);
    let line = before.matches('\n').count() + 1;
    let col = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, col)
}

/// Render a deserialization error as `at L:C: message` when the parser
/// reported a span, or the bare message otherwise.
#[must_use]
pub fn describe_toml_error(src: &str, err: &toml::de::Error) -> String {
    let msg = err.message().trim().to_string();
    match err.span() {
        Some(span) => {
            let (line, col) = line_col(src, span.start);
            format!("at {line}:{col}: {msg}")
        }
        None => msg,
    }
}
