//! `{name}` placeholder templates.

/// Literal written into a rewritten path when a positional placeholder has
/// no matching segment in the route's match path or the inbound path.
pub const UNRESOLVED_SEGMENT: &str = "index-out-of-range";

/// Render `template` in a single pass.
///
/// Each `{name}` is replaced by `resolve(name)`; placeholders the resolver
/// returns `None` for are kept verbatim.  Substituted values are never
/// scanned for further placeholders.
pub fn render<F>(template: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        out.push_str(&rest[..open]);
        let name = &after[..close];
        match resolve(name) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Segment index of placeholder `{name}` inside path template `template`.
///
/// Segments are counted after stripping the leading `/`; the comparison
/// ignores ASCII case.
pub fn segment_index(template: &str, name: &str) -> Option<usize> {
    let wanted = format!("{{{name}}}");
    template
        .trim_start_matches('/')
        .split('/')
        .position(|segment| segment.eq_ignore_ascii_case(&wanted))
}

/// Segment at `index` of a concrete request path.
pub fn segment_at(path: &str, index: usize) -> Option<&str> {
    path.trim_start_matches('/').split('/').nth(index)
}
