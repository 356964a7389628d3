//! Text helpers shared by the span-splicing editors.

/// Byte offset of the start of the line containing `pos`.
pub(crate) fn line_start(src: &str, pos: usize) -> usize {
    src.get(..pos)
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |i| i + 1)
}

/// Leading whitespace of the line containing `pos`.
pub(crate) fn line_indent(src: &str, pos: usize) -> &str {
    let start = line_start(src, pos);
    let line = &src[start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &src[start..start + width]
}

/// The line ending new lines should use: `\r\n` if the source has any.
pub(crate) fn line_ending(src: &str) -> &'static str {
    if src.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Prefix every line after the first with `base`.
pub(crate) fn indent_continuation(text: &str, base: &str) -> String {
    if base.is_empty() {
        return text.to_string();
    }
    text.replace('\n', &format!("\n{base}"))
}

/// Replace `start..end` of `src` with `text`.
pub(crate) fn splice(src: &str, start: usize, end: usize, text: &str) -> Option<String> {
    let head = src.get(..start)?;
    let tail = src.get(end..)?;
    let mut out = String::with_capacity(head.len() + text.len() + tail.len());
    out.push_str(head);
    out.push_str(text);
    out.push_str(tail);
    Some(out)
}
