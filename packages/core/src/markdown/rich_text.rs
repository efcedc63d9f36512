//! Inline Rich Text Codec
//!
//! Converts between [`RichTextRun`]s and Markdown inline spans.
//!
//! Encoding nests delimiters in a fixed order, outermost first: link,
//! strikethrough (`~~`), bold (`**`), italic (`*`), inline code (`` ` ``).
//! Decoding scans left to right and, at each position, tries the delimiters
//! in precedence order:
//!
//! 1. Inline code (content is taken verbatim, spaces included)
//! 2. Links (`[label](url)`, label decoded recursively)
//! 3. Strikethrough
//! 4. Bold (before italic since `**` starts with `*`)
//! 5. Italic
//!
//! Anything that does not close properly is kept as literal text. Decoding
//! never fails.
//!
//! # Examples
//!
//! ```
//! use pagebridge_core::markdown::rich_text;
//! use pagebridge_core::models::RichTextRun;
//!
//! let runs = rich_text::decode("World **bold**");
//! assert_eq!(runs, vec![RichTextRun::plain("World "), RichTextRun::bold("bold")]);
//! assert_eq!(rich_text::encode(&runs), "World **bold**");
//! ```

use crate::models::{Annotations, RichTextRun};

/// Render runs as Markdown inline text
pub fn encode(runs: &[RichTextRun]) -> String {
    runs.iter().map(encode_run).collect()
}

/// Concatenated run text without any markup
pub fn plain_text(runs: &[RichTextRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

fn encode_run(run: &RichTextRun) -> String {
    let annotations = run.annotations;
    if annotations.is_plain() && run.link_url.is_none() {
        return run.text.clone();
    }

    // Code text is kept verbatim inside the backticks; for everything else
    // delimiters must hug non-whitespace, so surrounding spaces go outside.
    let (leading, core, trailing) = if annotations.code {
        ("", run.text.as_str(), "")
    } else {
        split_edges(&run.text)
    };
    if core.is_empty() {
        return run.text.clone();
    }

    let mut out = core.to_string();
    if annotations.code {
        out = format!("`{}`", out);
    }
    if annotations.italic {
        out = format!("*{}*", out);
    }
    if annotations.bold {
        out = format!("**{}**", out);
    }
    if annotations.strikethrough {
        out = format!("~~{}~~", out);
    }
    if let Some(url) = &run.link_url {
        out = format!("[{}]({})", out, url);
    }

    format!("{}{}{}", leading, out, trailing)
}

/// Leading whitespace, trimmed core and trailing whitespace of `text`
fn split_edges(text: &str) -> (&str, &str, &str) {
    let core = text.trim();
    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];
    (leading, core, trailing)
}

/// Parse Markdown inline text into runs
///
/// Empty runs are dropped, whitespace at the edges of formatted runs becomes
/// plain text and adjacent runs with identical formatting are merged. The
/// output is therefore a normal form: decoding the encoding of a decoded
/// string gives the same runs back.
pub fn decode(markdown: &str) -> Vec<RichTextRun> {
    let mut runs = Vec::new();
    decode_into(markdown, Annotations::default(), None, &mut runs);
    merge_adjacent(runs)
}

enum Span<'a> {
    Code(&'a str),
    Link { label: &'a str, url: &'a str },
    Strikethrough(&'a str),
    Bold(&'a str),
    Italic(&'a str),
}

fn decode_into(
    input: &str,
    annotations: Annotations,
    link: Option<&str>,
    out: &mut Vec<RichTextRun>,
) {
    let mut plain = String::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];

        if let Some((span, consumed)) = match_span(rest) {
            flush_plain(&mut plain, annotations, link, out);
            match span {
                Span::Code(text) => out.push(make_run(
                    text,
                    Annotations {
                        code: true,
                        ..annotations
                    },
                    link,
                )),
                Span::Link { label, url } => decode_into(label, annotations, Some(url), out),
                Span::Strikethrough(inner) => decode_into(
                    inner,
                    Annotations {
                        strikethrough: true,
                        ..annotations
                    },
                    link,
                    out,
                ),
                Span::Bold(inner) => decode_into(
                    inner,
                    Annotations {
                        bold: true,
                        ..annotations
                    },
                    link,
                    out,
                ),
                Span::Italic(inner) => decode_into(
                    inner,
                    Annotations {
                        italic: true,
                        ..annotations
                    },
                    link,
                    out,
                ),
            }
            pos += consumed;
            continue;
        }

        match rest.chars().next() {
            Some(ch) => {
                plain.push(ch);
                pos += ch.len_utf8();
            }
            None => break,
        }
    }

    flush_plain(&mut plain, annotations, link, out);
}

fn flush_plain(
    plain: &mut String,
    annotations: Annotations,
    link: Option<&str>,
    out: &mut Vec<RichTextRun>,
) {
    if !plain.is_empty() {
        out.push(make_run(plain, annotations, link));
        plain.clear();
    }
}

fn make_run(text: &str, annotations: Annotations, link: Option<&str>) -> RichTextRun {
    RichTextRun {
        text: text.to_string(),
        annotations,
        link_url: link.map(str::to_string),
    }
}

/// Try to match a delimited span starting at the beginning of `rest`
///
/// Returns the span and the number of bytes it covers.
fn match_span(rest: &str) -> Option<(Span<'_>, usize)> {
    if rest.starts_with('`') {
        let len = code_span_len(rest)?;
        return Some((Span::Code(&rest[1..len - 1]), len));
    }

    if let Some(body) = rest.strip_prefix('[') {
        let close = body.find(']')?;
        let label = &body[..close];
        let after = body[close + 1..].strip_prefix('(')?;
        let url_end = after.find(')')?;
        if label.trim().is_empty() {
            return None;
        }
        let url = after[..url_end].trim();
        return Some((Span::Link { label, url }, 1 + close + 2 + url_end + 1));
    }

    if let Some(body) = rest.strip_prefix("~~") {
        let end = find_closing_pair(body, b'~')?;
        return Some((Span::Strikethrough(&body[..end]), end + 4));
    }

    if let Some(body) = rest.strip_prefix("**") {
        if let Some(end) = find_closing_bold(body) {
            return Some((Span::Bold(&body[..end]), end + 4));
        }
    }

    if let Some(body) = rest.strip_prefix('*') {
        let end = find_closing_italic(body)?;
        return Some((Span::Italic(&body[..end]), end + 2));
    }

    None
}

/// Emphasis content may not be empty or start/end with whitespace
fn is_flanked(content: &str) -> bool {
    !content.is_empty()
        && !content.starts_with(char::is_whitespace)
        && !content.ends_with(char::is_whitespace)
}

/// Length of the inline code span at the start of `rest`, if one closes
fn code_span_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('`')?;
    match body.find('`')? {
        0 => None,
        end => Some(end + 2),
    }
}

/// Byte offsets of `body` that lie outside inline code spans
fn outside_code(body: &str) -> Vec<usize> {
    let mut positions = Vec::with_capacity(body.len());
    let mut j = 0;
    while j < body.len() {
        if body.as_bytes()[j] == b'`' {
            if let Some(len) = code_span_len(&body[j..]) {
                j += len;
                continue;
            }
        }
        positions.push(j);
        j += 1;
    }
    positions
}

fn is_pair_at(bytes: &[u8], j: usize, delimiter: u8) -> bool {
    bytes[j] == delimiter && bytes.get(j + 1) == Some(&delimiter)
}

fn find_closing_pair(body: &str, delimiter: u8) -> Option<usize> {
    let bytes = body.as_bytes();
    outside_code(body)
        .into_iter()
        .find(|&j| j >= 1 && is_pair_at(bytes, j, delimiter) && is_flanked(&body[..j]))
}

/// Closing `**` for a bold span
///
/// `***x***` is bold wrapping italic, so among the candidate closers the
/// first one leaving an even number of `*` inside wins; otherwise the first
/// candidate. Stars inside code spans are content, not delimiters.
fn find_closing_bold(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut first = None;
    let mut stars = 0;

    for j in outside_code(body) {
        if j >= 1 && is_pair_at(bytes, j, b'*') && is_flanked(&body[..j]) {
            if stars % 2 == 0 {
                return Some(j);
            }
            first.get_or_insert(j);
        }
        if bytes[j] == b'*' {
            stars += 1;
        }
    }

    first
}

/// Closing `*` for an italic span
///
/// A `**` inside the span opens or closes nested bold. In a run of three
/// stars the italic closer is the first star when no bold is open (the other
/// two open bold) and the last one when bold is open.
fn find_closing_italic(body: &str) -> Option<usize> {
    if body.starts_with('*') {
        return None;
    }
    let bytes = body.as_bytes();
    let mut bold_open = false;
    let mut skip_until = 0;

    for j in outside_code(body) {
        if j < skip_until || bytes[j] != b'*' {
            continue;
        }
        let run = bytes[j..].iter().take_while(|&&b| b == b'*').count();
        skip_until = j + run;

        let closer = match run {
            1 => Some(j),
            2 => {
                bold_open = !bold_open;
                None
            }
            _ if bold_open => {
                bold_open = false;
                Some(j + 2)
            }
            _ => Some(j),
        };
        if let Some(closer) = closer.filter(|&c| c >= 1 && is_flanked(&body[..c])) {
            return Some(closer);
        }
    }
    None
}

/// Split surrounding whitespace of a formatted run into plain runs,
/// matching what `encode` emits; code runs keep their spaces
fn split_outer_whitespace(run: RichTextRun) -> Vec<RichTextRun> {
    if run.annotations.code || (run.annotations.is_plain() && run.link_url.is_none()) {
        return vec![run];
    }

    let (leading, core, trailing) = split_edges(&run.text);
    if core.is_empty() {
        return vec![RichTextRun::plain(run.text)];
    }

    let mut pieces = Vec::with_capacity(3);
    if !leading.is_empty() {
        pieces.push(RichTextRun::plain(leading));
    }
    pieces.push(RichTextRun {
        text: core.to_string(),
        annotations: run.annotations,
        link_url: run.link_url.clone(),
    });
    if !trailing.is_empty() {
        pieces.push(RichTextRun::plain(trailing));
    }
    pieces
}

fn merge_adjacent(runs: Vec<RichTextRun>) -> Vec<RichTextRun> {
    let mut merged: Vec<RichTextRun> = Vec::with_capacity(runs.len());

    for run in runs
        .into_iter()
        .filter(|run| !run.text.is_empty())
        .flat_map(split_outer_whitespace)
    {
        match merged.last_mut() {
            Some(last) if last.same_format(&run) => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }

    merged
}

#[cfg(test)]
#[path = "rich_text_test.rs"]
mod rich_text_test;
