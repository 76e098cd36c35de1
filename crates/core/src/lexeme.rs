use crate::node::{Json, Number};
use crate::parse::parse_json;

use regex::Regex;
use thiserror::Error;

/// Malformed walk-path. Raised while compiling, before any walking or
/// mutation takes place.
#[derive(Debug, Error)]
pub enum WalkPathError {
  #[error("unterminated lexeme at offset {0}, missing closing `{1}`")]
  Unterminated(usize, char),
  #[error("unexpected character `{1}` at offset {0}, expected a lexeme bracket")]
  UnexpectedChar(usize, char),
  #[error("unknown search suffix `{0}`")]
  BadSuffix(char),
  #[error("malformed search quantifier `{0}`")]
  BadQuantifier(String),
  #[error("empty search body is only allowed with suffixes r, l, n, a")]
  EmptyBody,
  #[error("boolean search body must be `true`, `false` or `any`, got `{0}`")]
  BadBoolBody(String),
  #[error("search body `{0}` is not a valid JSON value")]
  BadJsonBody(String),
  #[error("search body `{0}` is not a valid number")]
  BadNumberBody(String),
  #[error("invalid search regex: {0}")]
  BadRegex(#[from] regex::Error),
  #[error("attached label must be followed by a search lexeme")]
  DanglingAttachedLabel,
  #[error("attached label requires a plain label offset")]
  BadAttachedLabel,
  #[error("attached label cannot be combined with label search suffixes")]
  AttachedLabelOnLabelSearch,
}

/// Python-style slice bounds of a `[N:N]` offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
  pub start: Option<i64>,
  pub end: Option<i64>,
}

impl Slice {
  /// concrete half-open index range over a container of `len` children
  pub fn bounds(&self, len: usize) -> (usize, usize) {
    let clamp = |v: i64| -> usize {
      if v < 0 {
        len.saturating_sub(v.unsigned_abs() as usize)
      } else {
        (v as usize).min(len)
      }
    };
    let lo = self.start.map_or(0, clamp);
    let hi = self.end.map_or(len, clamp);
    (lo, hi.max(lo))
  }
}

/// Search match instance selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
  /// the k-th match only
  Index(usize),
  /// matches k, k+1, ...
  From(usize),
  /// half-open match range
  Range(usize, Option<usize>),
}

impl Quantifier {
  pub fn is_generator(&self) -> bool {
    !matches!(self, Quantifier::Index(_))
  }
}

/// What a search lexeme matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
  /// `r` — string values, exact
  Str,
  /// `R` — string values, regex
  StrRegex,
  /// `l` — labels, exact
  Label,
  /// `L` — labels, regex
  LabelRegex,
  /// `d` — numeric values, exact
  Num,
  /// `D` — numeric values, regex over the textual form
  NumRegex,
  /// `b` — booleans spelled `true`/`false`/`any`
  Bool,
  /// `n` — nulls
  Null,
  /// `a` — any atomic value
  Atom,
  /// `o` — any object
  Object,
  /// `i` — any array
  Array,
  /// `j` — structural equality with a JSON body
  Literal,
  /// `w` — any node
  Wide,
  /// `e` — leaves: atomics, `{}`, `[]`
  End,
}

impl SearchKind {
  fn from_suffix(c: char) -> Option<Self> {
    use SearchKind::*;
    Some(match c {
      'r' => Str,
      'R' => StrRegex,
      'l' => Label,
      'L' => LabelRegex,
      'd' => Num,
      'D' => NumRegex,
      'b' => Bool,
      'n' => Null,
      'a' => Atom,
      'o' => Object,
      'i' => Array,
      'j' => Literal,
      'w' => Wide,
      'e' => End,
      _ => return None,
    })
  }

  pub fn is_label_kind(&self) -> bool {
    matches!(self, SearchKind::Label | SearchKind::LabelRegex)
  }
}

/// A compiled search lexeme with its prepared match payload.
#[derive(Debug, Clone)]
pub struct Search {
  pub kind: SearchKind,
  pub body: String,
  pub quantifier: Quantifier,
  /// `<...>` recurses, `>...<` visits immediate children only
  pub recursive: bool,
  /// restrict matches to values living under this object label
  pub attached: Option<String>,
  pub regex: Option<Regex>,
  pub number: Option<Number>,
  pub literal: Option<Json>,
}

/// One instruction of a walk-path program.
#[derive(Debug, Clone)]
pub enum Lexeme {
  /// `[n]` — n-th child by traversal order
  Plain(usize),
  /// `[-n]` — ascend n steps
  Back(usize),
  /// `[^n]` — keep the first n steps of the current path
  FromRoot(usize),
  /// `[text]` / `[]` — object child by label
  Label(String),
  /// `[+n]` — enumerate children from n
  Iterable(usize),
  /// `[N:N]` — enumerate a slice of children
  Range(Slice),
  Search(Search),
}

impl Lexeme {
  pub fn is_generator(&self) -> bool {
    match self {
      Lexeme::Iterable(_) | Lexeme::Range(_) => true,
      Lexeme::Search(s) => s.quantifier.is_generator(),
      _ => false,
    }
  }

  pub fn is_label_search(&self) -> bool {
    matches!(self, Lexeme::Search(s) if s.kind.is_label_kind())
  }
}

/// A compiled walk-path: the ordered lexeme program.
#[derive(Debug, Clone, Default)]
pub struct WalkPath {
  pub lexemes: Vec<Lexeme>,
}

impl WalkPath {
  pub fn len(&self) -> usize {
    self.lexemes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lexemes.is_empty()
  }

  /// Compile a walk-path string. An empty (or blank) path compiles to the
  /// empty program, which yields the root once.
  pub fn parse(src: &str) -> Result<Self, WalkPathError> {
    Lexer::new(src).run()
  }
}

struct Lexer {
  chars: Vec<char>,
  pos: usize,
}

impl Lexer {
  fn new(src: &str) -> Self {
    Lexer {
      chars: src.chars().collect(),
      pos: 0,
    }
  }

  fn run(mut self) -> Result<WalkPath, WalkPathError> {
    let mut lexemes = Vec::new();
    let mut attached: Option<String> = None;
    loop {
      self.skip_ws();
      let Some(&c) = self.chars.get(self.pos) else {
        break;
      };
      match c {
        '[' => {
          let start = self.pos;
          self.pos += 1;
          let body = self.scan_body(']', start)?;
          if attached.is_some() {
            return Err(WalkPathError::DanglingAttachedLabel);
          }
          if self.chars.get(self.pos) == Some(&':') {
            // `[label]:` prefix of the search lexeme that follows
            let Lexeme::Label(label) = classify_offset(&body) else {
              return Err(WalkPathError::BadAttachedLabel);
            };
            attached = Some(label);
            self.pos += 1;
          } else {
            lexemes.push(classify_offset(&body));
          }
        }
        '<' | '>' => {
          let recursive = c == '<';
          let close = if recursive { '>' } else { '<' };
          let start = self.pos;
          self.pos += 1;
          let body = self.scan_body(close, start)?;
          let tail = self.scan_tail();
          let search = build_search(body, &tail, recursive, attached.take())?;
          lexemes.push(Lexeme::Search(search));
        }
        other => return Err(WalkPathError::UnexpectedChar(self.pos, other)),
      }
    }
    if attached.is_some() {
      return Err(WalkPathError::DanglingAttachedLabel);
    }
    Ok(WalkPath { lexemes })
  }

  fn skip_ws(&mut self) {
    while self
      .chars
      .get(self.pos)
      .is_some_and(|c| c.is_ascii_whitespace())
    {
      self.pos += 1;
    }
  }

  /// body text up to the unescaped closing bracket; `\<close>` unescapes,
  /// any other backslash sequence is preserved (regex bodies rely on it)
  fn scan_body(&mut self, close: char, start: usize) -> Result<String, WalkPathError> {
    let mut body = String::new();
    loop {
      match self.chars.get(self.pos) {
        None => return Err(WalkPathError::Unterminated(start, close)),
        Some(&c) if c == close => {
          self.pos += 1;
          return Ok(body);
        }
        Some('\\') => {
          match self.chars.get(self.pos + 1) {
            Some(&next) if next == close => {
              body.push(next);
              self.pos += 2;
            }
            _ => {
              body.push('\\');
              self.pos += 1;
            }
          }
        }
        Some(&c) => {
          body.push(c);
          self.pos += 1;
        }
      }
    }
  }

  /// suffix + quantifier run following a search bracket
  fn scan_tail(&mut self) -> String {
    let mut tail = String::new();
    while let Some(&c) = self.chars.get(self.pos) {
      if matches!(c, '[' | '<' | '>') || c.is_ascii_whitespace() {
        break;
      }
      tail.push(c);
      self.pos += 1;
    }
    tail
  }
}

fn all_digits(s: &str) -> bool {
  !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// optionally signed integer, empty allowed (`None`)
fn slice_part(s: &str) -> Option<Option<i64>> {
  if s.is_empty() {
    return Some(None);
  }
  let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
  if !all_digits(digits) {
    return None;
  }
  s.parse::<i64>().ok().map(Some)
}

fn classify_offset(body: &str) -> Lexeme {
  if body.is_empty() {
    return Lexeme::Label(String::new());
  }
  if let Some(rest) = body.strip_prefix('-') {
    if all_digits(rest) {
      let n: i64 = body.parse().unwrap_or(0);
      return if n < 0 {
        Lexeme::Back(n.unsigned_abs() as usize)
      } else {
        Lexeme::Plain(0)
      };
    }
  }
  if all_digits(body) {
    return Lexeme::Plain(body.parse().unwrap_or(0));
  }
  if let Some(rest) = body.strip_prefix('^') {
    let digits = rest.strip_prefix('+').unwrap_or(rest);
    if all_digits(digits) {
      return Lexeme::FromRoot(digits.parse().unwrap_or(0));
    }
  }
  if let Some(rest) = body.strip_prefix('+') {
    if all_digits(rest) {
      return Lexeme::Iterable(rest.parse().unwrap_or(0));
    }
  }
  if let Some((lo, hi)) = body.split_once(':') {
    if let (Some(start), Some(end)) = (slice_part(lo), slice_part(hi)) {
      return Lexeme::Range(Slice { start, end });
    }
  }
  Lexeme::Label(body.to_string())
}

fn parse_quantifier(text: &str) -> Result<Quantifier, WalkPathError> {
  if text.is_empty() {
    return Ok(Quantifier::Index(0));
  }
  let bad = || WalkPathError::BadQuantifier(text.to_string());
  if let Some((lo, hi)) = text.split_once(':') {
    let part = |s: &str| -> Result<Option<usize>, WalkPathError> {
      if s.is_empty() {
        return Ok(None);
      }
      let digits = s.strip_prefix('+').unwrap_or(s);
      if !all_digits(digits) {
        return Err(bad());
      }
      digits.parse().map(Some).map_err(|_| bad())
    };
    let start = part(lo)?.unwrap_or(0);
    return Ok(Quantifier::Range(start, part(hi)?));
  }
  if let Some(rest) = text.strip_prefix('+') {
    if all_digits(rest) {
      return Ok(Quantifier::From(rest.parse().map_err(|_| bad())?));
    }
    return Err(bad());
  }
  if all_digits(text) {
    return Ok(Quantifier::Index(text.parse().map_err(|_| bad())?));
  }
  Err(bad())
}

fn build_search(
  body: String,
  tail: &str,
  recursive: bool,
  attached: Option<String>,
) -> Result<Search, WalkPathError> {
  let mut rest = tail;
  let mut kind = SearchKind::Str;
  if let Some(first) = rest.chars().next() {
    if first.is_ascii_alphabetic() {
      kind = SearchKind::from_suffix(first).ok_or(WalkPathError::BadSuffix(first))?;
      rest = &rest[first.len_utf8()..];
    }
  }
  let quantifier = parse_quantifier(rest)?;

  if body.is_empty()
    && !matches!(
      kind,
      SearchKind::Str | SearchKind::Label | SearchKind::Null | SearchKind::Atom
    )
  {
    return Err(WalkPathError::EmptyBody);
  }
  if attached.is_some() && kind.is_label_kind() {
    return Err(WalkPathError::AttachedLabelOnLabelSearch);
  }

  let mut search = Search {
    kind,
    quantifier,
    recursive,
    attached,
    regex: None,
    number: None,
    literal: None,
    body,
  };
  match kind {
    SearchKind::StrRegex | SearchKind::LabelRegex | SearchKind::NumRegex => {
      search.regex = Some(Regex::new(&search.body)?);
    }
    SearchKind::Num => {
      search.number = Some(
        search
          .body
          .parse::<Number>()
          .map_err(|_| WalkPathError::BadNumberBody(search.body.clone()))?,
      );
    }
    SearchKind::Literal => {
      search.literal =
        Some(parse_json(&search.body).map_err(|_| WalkPathError::BadJsonBody(search.body.clone()))?);
    }
    SearchKind::Bool => {
      if !matches!(search.body.as_str(), "true" | "false" | "any") {
        return Err(WalkPathError::BadBoolBody(search.body.clone()));
      }
    }
    _ => {}
  }
  Ok(search)
}
