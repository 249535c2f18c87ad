//! Splitting long content into post-sized chunks.
//!
//! URLs are swapped for fixed-width placeholders before measuring so that a
//! link always weighs what the platform charges for it, no matter how long
//! the raw URL is. Splitting prefers paragraph boundaries, then sentences,
//! then words, and only cuts inside a word when nothing else fits.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Characters the platform charges for any link.
pub const URL_WEIGHT: usize = 23;

const PARAGRAPH_SEP: &str = "\n\n";
const SENTENCE_SEP: &str = " ";

#[allow(clippy::expect_used)]
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

#[allow(clippy::expect_used)]
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

// Every character belongs to some match: runs ending in terminal
// punctuation, or a trailing run without any.
#[allow(clippy::expect_used)]
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]*[.!?]+|[^.!?]+").expect("valid sentence regex"));

// Placeholder-shaped text already in the input is swapped out like a URL so
// that every placeholder left in the working text was minted by this call.
#[allow(clippy::expect_used)]
static PROTECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+|<<URL_\d{15}>>").expect("valid protected span regex")
});

#[allow(clippy::expect_used)]
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<URL_(\d{15})>>").expect("valid placeholder regex"));

/// Spans pulled out of one input, indexed by placeholder number.
struct Placeholders {
    urls: Vec<String>,
}

impl Placeholders {
    fn extract(text: &str) -> (String, Self) {
        let mut urls = Vec::new();
        let substituted = PROTECTED_RE.replace_all(text, |caps: &Captures<'_>| {
            let index = urls.len();
            urls.push(caps[0].to_string());
            placeholder(index)
        });
        (substituted.into_owned(), Self { urls })
    }

    /// Put the extracted URLs back. Placeholders with no recorded URL stay
    /// as they are.
    fn restore(&self, text: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.urls.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn placeholder(index: usize) -> String {
    format!("<<URL_{index:015}>>")
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Length as the platform counts it: characters, with every URL weighing
/// [`URL_WEIGHT`].
#[must_use]
pub fn weighted_len(text: &str) -> usize {
    URL_RE
        .find_iter(text)
        .fold(char_len(text), |len, m| len - char_len(m.as_str()) + URL_WEIGHT)
}

fn fits(current: &str, sep: &str, next: &str, max_length: usize) -> bool {
    if current.is_empty() {
        char_len(next) <= max_length
    } else {
        char_len(current) + char_len(sep) + char_len(next) <= max_length
    }
}

fn append(current: &mut String, sep: &str, next: &str) {
    if !current.is_empty() {
        current.push_str(sep);
    }
    current.push_str(next);
}

fn flush(out: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        out.push(std::mem::take(current));
    }
}

/// Split `text` into chunks whose weighted length is at most `max_length`.
///
/// A `max_length` of zero yields no chunks. Each chunk has its leading
/// mentions deduplicated. URLs are never cut: below [`URL_WEIGHT`] a URL
/// gets a chunk of its own even though that chunk weighs more than
/// `max_length`.
#[must_use]
pub fn segment(text: &str, max_length: usize) -> Vec<String> {
    if max_length == 0 {
        return Vec::new();
    }

    let (substituted, placeholders) = Placeholders::extract(text);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let paragraphs = PARAGRAPH_RE
        .split(&substituted)
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for paragraph in paragraphs {
        if fits(&current, PARAGRAPH_SEP, paragraph, max_length) {
            append(&mut current, PARAGRAPH_SEP, paragraph);
            continue;
        }
        flush(&mut chunks, &mut current);
        if char_len(paragraph) <= max_length {
            current.push_str(paragraph);
        } else {
            let mut pieces = split_paragraph(paragraph, max_length);
            current = pieces.pop().unwrap_or_default();
            chunks.extend(pieces);
        }
    }
    flush(&mut chunks, &mut current);

    chunks
        .iter()
        .map(|chunk| dedupe_leading_mentions(&placeholders.restore(chunk)))
        .collect()
}

/// Sentence-level split of a paragraph that is too long on its own. The
/// last piece is returned open so following paragraphs may join it.
fn split_paragraph(paragraph: &str, max_length: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    let sentences = SENTENCE_RE
        .find_iter(paragraph)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty());

    for sentence in sentences {
        if fits(&current, SENTENCE_SEP, sentence, max_length) {
            append(&mut current, SENTENCE_SEP, sentence);
            continue;
        }
        flush(&mut pieces, &mut current);
        if char_len(sentence) <= max_length {
            current.push_str(sentence);
            continue;
        }
        for word in sentence.split_whitespace() {
            if fits(&current, SENTENCE_SEP, word, max_length) {
                append(&mut current, SENTENCE_SEP, word);
                continue;
            }
            flush(&mut pieces, &mut current);
            if char_len(word) <= max_length {
                current.push_str(word);
            } else {
                let mut parts = hard_split(word, max_length);
                current = parts.pop().unwrap_or_default();
                pieces.extend(parts);
            }
        }
    }
    flush(&mut pieces, &mut current);
    pieces
}

/// Cut a single over-long word at character boundaries. Placeholders are
/// kept whole.
fn hard_split(word: &str, max_length: usize) -> Vec<String> {
    let mut atoms: Vec<&str> = Vec::new();
    let mut last = 0;
    for m in PLACEHOLDER_RE.find_iter(word) {
        atoms.extend(char_atoms(&word[last..m.start()]));
        atoms.push(m.as_str());
        last = m.end();
    }
    atoms.extend(char_atoms(&word[last..]));

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for atom in atoms {
        let atom_len = char_len(atom);
        if current_len > 0 && current_len + atom_len > max_length {
            flush(&mut parts, &mut current);
            current_len = 0;
        }
        current.push_str(atom);
        current_len += atom_len;
    }
    flush(&mut parts, &mut current);
    parts
}

fn char_atoms(s: &str) -> impl Iterator<Item = &str> {
    s.char_indices()
        .map(move |(i, c)| &s[i..i + c.len_utf8()])
}

fn is_mention(token: &str) -> bool {
    token
        .strip_prefix('@')
        .is_some_and(|handle| {
            !handle.is_empty() && handle.chars().all(|c| c.is_alphanumeric() || c == '_')
        })
}

/// Collapse repeated `@handle` tokens at the start of a chunk, keeping the
/// first occurrence of each in order. Everything after the first
/// non-mention token is left untouched.
#[must_use]
pub fn dedupe_leading_mentions(chunk: &str) -> String {
    if !chunk.starts_with('@') {
        return chunk.to_string();
    }

    let mut mentions: Vec<&str> = Vec::new();
    let mut rest = chunk;
    loop {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let token = &rest[..end];
        if !is_mention(token) {
            break;
        }
        if !mentions.contains(&token) {
            mentions.push(token);
        }
        rest = rest[end..].trim_start();
        if rest.is_empty() {
            break;
        }
    }

    if mentions.is_empty() {
        return chunk.to_string();
    }
    let mut out = mentions.join(" ");
    if !rest.is_empty() {
        out.push(' ');
        out.push_str(rest);
    }
    out
}
