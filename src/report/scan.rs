//! Brace-depth scanning for JSON objects embedded in free text.
//!
//! A span opens at a `{` outside any object and closes at the matching `}`.
//! Braces inside JSON string literals are ignored once a span is open; quotes in
//! the surrounding prose are not interpreted. An opening brace that never
//! balances is skipped and scanning resumes after it.

/// Iterator over top-level balanced `{...}` spans, in order of appearance.
#[derive(Debug, Clone)]
pub struct JsonSpans<'a> {
    text: &'a str,
    pos: usize,
}

/// Scan `text` for balanced `{...}` spans.
pub fn json_object_spans(text: &str) -> JsonSpans<'_> {
    JsonSpans { text, pos: 0 }
}

/// The first top-level balanced `{...}` span in `text`.
pub fn find_json_span(text: &str) -> Option<&str> {
    json_object_spans(text).next()
}

/// The greedy span from the first `{` to the last `}`, if ordered.
pub fn greedy_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

impl<'a> Iterator for JsonSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while self.pos < self.text.len() {
            let start = self.pos + self.text[self.pos..].find('{')?;
            match balanced_end(&self.text[start..]) {
                Some(len) => {
                    self.pos = start + len;
                    return Some(&self.text[start..start + len]);
                }
                None => self.pos = start + 1,
            }
        }
        None
    }
}

/// Byte length of the balanced object starting at `text[0] == '{'`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}
