use crate::node::Json;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

/// max width of the parse-error excerpt window
const EXCERPT_WIDTH: usize = 67;

/// Malformed JSON input, with a bounded excerpt window centered on the
/// offending spot and a caret offset into it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
  message: String,
  pub line: usize,
  pub column: usize,
  excerpt: String,
  caret: usize,
}

impl ParseError {
  fn new(err: &serde_json::Error, text: &str) -> Self {
    let (excerpt, caret) = excerpt_window(text, err.line(), err.column());
    ParseError {
      message: err.to_string(),
      line: err.line(),
      column: err.column(),
      excerpt,
      caret,
    }
  }

  /// two-line report: the excerpt and a caret pointing at the error
  pub fn location_report(&self) -> String {
    format!(
      "parse locus: {}\nparse spot: {}>| (offset: {})",
      self.excerpt,
      "-".repeat(self.caret),
      self.caret
    )
  }
}

/// Build a window of at most `EXCERPT_WIDTH` characters around the error
/// position. Control characters are blanked, line breaks shown as `|`.
fn excerpt_window(text: &str, line: usize, column: usize) -> (String, usize) {
  let mut flat = String::new();
  let mut caret = 0;
  for (ln, src) in text.lines().enumerate() {
    if ln + 1 == line.max(1) {
      caret = flat.chars().count() + column.saturating_sub(1);
    }
    for c in src.chars() {
      flat.push(if c.is_control() { ' ' } else { c });
    }
    flat.push('|');
  }
  if flat.ends_with('|') {
    flat.pop();
  }
  let total = flat.chars().count();
  caret = caret.min(total);

  let half = EXCERPT_WIDTH / 2;
  let mut start = 0;
  let mut prefix = String::new();
  if caret > half {
    start = caret - half + 3;
    prefix = "...".to_string();
  }
  let kept: String = flat.chars().skip(start).take(EXCERPT_WIDTH).collect();
  let suffix = if start + EXCERPT_WIDTH < total { "..." } else { "" };
  let shown_caret = prefix.chars().count() + (caret - start);
  (format!("{prefix}{kept}{suffix}"), shown_caret)
}

/// Parse one JSON document; trailing garbage is an error.
pub fn parse_json(text: &str) -> Result<Json, ParseError> {
  serde_json::from_str(text).map_err(|e| ParseError::new(&e, text))
}

/// Lazily parse a stream of whitespace-separated JSON documents (`-a`).
pub fn parse_stream(text: &str) -> impl Iterator<Item = Result<Json, ParseError>> + '_ {
  serde_json::Deserializer::from_str(text)
    .into_iter::<Json>()
    .map(move |item| item.map_err(|e| ParseError::new(&e, text)))
}

/// Print configuration shared by every output path.
#[derive(Debug, Clone)]
pub struct PrintStyle {
  /// indent width for pretty printing
  pub indent: usize,
  /// one-line compact output
  pub raw: bool,
  /// emit solidus escaped as `\/`
  pub quote_solidus: bool,
}

impl Default for PrintStyle {
  fn default() -> Self {
    PrintStyle {
      indent: 3,
      raw: false,
      quote_solidus: false,
    }
  }
}

/// Render a tree to text according to the style.
pub fn to_text(json: &Json, style: &PrintStyle) -> String {
  let rendered = if style.raw {
    serde_json::to_string(json)
  } else {
    let indent = b" ".repeat(style.indent);
    let mut out = Vec::new();
    let fmt = PrettyFormatter::with_indent(&indent);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
    json
      .serialize(&mut ser)
      .map(|_| String::from_utf8_lossy(&out).into_owned())
  }
  .expect("tree serialization is infallible");
  if style.quote_solidus {
    // solidus occurs only inside string literals, a blanket replace is safe
    rendered.replace('/', "\\/")
  } else {
    rendered
  }
}

/// Wrap a tree's compact rendition into a JSON string literal (`-rr`).
pub fn stringify(json: &Json) -> String {
  let compact = serde_json::to_string(json).expect("tree serialization is infallible");
  serde_json::to_string(&compact).expect("string serialization is infallible")
}
