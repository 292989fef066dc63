use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "**Exercise 2:** ...", "Exercice 3 - ...", "1) ..."
    static ref HEADER_RE: Regex =
        Regex::new(r"(?i)^\*{0,2}\s*(?:exercice|exercise)?\s*(\d+)\s*[:.)\-]\s*(.*)$").unwrap();
    static ref PLAIN_NUMBER_RE: Regex = Regex::new(r"^\s*(\d+)[).:\-]\s*(.*)$").unwrap();
    static ref BARE_LABEL_RE: Regex = Regex::new(r"(?i)^(?:exercice|exercise)\s*\d*$").unwrap();
    static ref EMPHASIS_RE: Regex = Regex::new(r"^\*{1,2}|\*{1,2}$").unwrap();
}

/// How one trimmed line reads to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Numbered or labelled header; carries whatever follows the separator.
    Header(&'a str),
    Continuation(&'a str),
    Blank,
}

pub fn classify_line(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    let caps = HEADER_RE
        .captures(line)
        .or_else(|| PLAIN_NUMBER_RE.captures(line));
    match caps.and_then(|c| c.get(2)) {
        Some(rest) => Line::Header(rest.as_str().trim()),
        None => Line::Continuation(line),
    }
}

enum State {
    SeekingHeader,
    Accumulating(String),
}

/// Turns loosely numbered model output into a bounded list of questions.
#[derive(Debug, Clone)]
pub struct ExerciseExtractor {
    pub min_chars: usize,
    pub max_items: usize,
}

impl Default for ExerciseExtractor {
    fn default() -> Self {
        Self {
            min_chars: 8,
            max_items: 6,
        }
    }
}

impl ExerciseExtractor {
    pub fn new(min_chars: usize, max_items: usize) -> Self {
        Self {
            min_chars,
            max_items,
        }
    }

    /// Never fails; an empty result means nothing usable was generated.
    pub fn extract(&self, raw: &str) -> Vec<String> {
        let normalized = raw.replace("\r\n", "\n");
        let mut found = Vec::new();
        let mut state = State::SeekingHeader;

        for raw_line in normalized.trim().lines() {
            let stripped = strip_emphasis(raw_line.trim());

            state = match (state, classify_line(&stripped)) {
                (state, Line::Blank) => state,
                // preamble
                (State::SeekingHeader, Line::Continuation(_)) => State::SeekingHeader,
                (State::SeekingHeader, Line::Header(rest)) => State::Accumulating(rest.to_string()),
                (State::Accumulating(current), Line::Header(rest)) => {
                    self.flush(current, &mut found);
                    State::Accumulating(rest.to_string())
                }
                (State::Accumulating(current), Line::Continuation(text)) => {
                    State::Accumulating(format!("{} {}", current, text).trim().to_string())
                }
            };
        }

        if let State::Accumulating(current) = state {
            self.flush(current, &mut found);
        }

        self.clean_up(found)
    }

    fn flush(&self, question: String, found: &mut Vec<String>) {
        let question = question.trim();
        if question.chars().count() >= self.min_chars {
            found.push(question.to_string());
        }
    }

    fn clean_up(&self, found: Vec<String>) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.max_items);
        for question in found {
            let question = strip_emphasis(&question);
            if question.chars().count() < self.min_chars || BARE_LABEL_RE.is_match(&question) {
                continue;
            }
            if out.contains(&question) {
                continue;
            }
            out.push(question);
            if out.len() == self.max_items {
                break;
            }
        }
        out
    }
}

fn strip_emphasis(line: &str) -> String {
    EMPHASIS_RE.replace_all(line, "").trim().to_string()
}

/// Renders questions the way the model is asked to number them.
pub fn render_numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}
