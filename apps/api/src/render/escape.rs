//! Markup escaping for LaTeX output.
//!
//! Every reserved character is replaced in a single left-to-right scan, so a
//! replacement is never itself re-escaped. Structural punctuation maps first,
//! braces next, backslash and tilde last; because the scan looks at each
//! input character exactly once, the `{}` emitted by `\textbackslash{}` never
//! reaches the brace rule.
//!
//! HAZARD: this is not idempotent. Escaping `\&` a second time yields
//! `\textbackslash{}\&`. Callers escape raw text exactly once.

/// Escapes `text` so it can be embedded in a LaTeX document body.
/// Empty input returns an empty string.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        match c {
            '#' => out.push_str(r"\#"),
            '$' => out.push_str(r"\$"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes an optional field; `None` becomes an empty string.
pub fn escape_opt(text: Option<&str>) -> String {
    text.map(escape_latex).unwrap_or_default()
}
