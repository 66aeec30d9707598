/*!
 * Engine response parsing.
 *
 * The engine answers with one `# <path>` heading per file followed by a fenced
 * code block. This module runs a three-state machine over the response lines
 * and yields one `ResponseRecord` per heading. It does no extension filtering;
 * a heading without a code block still produces a record with empty content.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

use crate::language_utils::LanguagePair;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#[ \t]+(.+?)[ \t]*$").expect("heading pattern is valid")
});

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*```[ \t]*([A-Za-z0-9_.+#-]*)[ \t]*$").expect("fence pattern is valid")
});

// Trailing "(draft: ...)" style annotations the engine may copy from the prompt
static ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t]+\([^)]*\)$").expect("annotation pattern is valid")
});

/// One file extracted from the engine output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub path: PathBuf,
    /// Tag of the code block, `None` when the record had no block
    pub language: Option<String>,
    pub content: String,
}

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    OutsideRecord,
    InRecordOutsideCode,
    InRecordInCode,
}

#[derive(Debug, PartialEq)]
enum Line<'a> {
    Heading(&'a str),
    FenceOpen(Option<&'a str>),
    FenceClose,
    Text(&'a str),
}

impl<'a> Line<'a> {
    fn classify(line: &'a str, in_code: bool) -> Self {
        if let Some(caps) = HEADING.captures(line) {
            if let Some(path) = caps.get(1) {
                return Line::Heading(path.as_str());
            }
        }
        if in_code {
            if line.trim() == "```" {
                return Line::FenceClose;
            }
            return Line::Text(line);
        }
        if let Some(caps) = FENCE_OPEN.captures(line) {
            let tag = caps.get(1).map(|m| m.as_str()).filter(|t| !t.is_empty());
            return Line::FenceOpen(tag);
        }
        Line::Text(line)
    }
}

/// Streaming parser; feed lines then call `finish`
///
/// Only fences tagged with one of the pair's fence tags open a code block,
/// and the first completed block of a record is kept. Untagged or foreign
/// fences (usage examples, shell snippets) are treated as prose.
#[derive(Debug)]
pub struct ResponseParser<'a> {
    languages: &'a LanguagePair,
    state: ParserState,
    current: Option<ResponseRecord>,
    /// The open record already holds a closed block
    captured: bool,
    records: Vec<ResponseRecord>,
}

impl<'a> ResponseParser<'a> {
    pub fn new(languages: &'a LanguagePair) -> Self {
        Self {
            languages,
            state: ParserState::OutsideRecord,
            current: None,
            captured: false,
            records: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Records completed so far
    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn feed_line(&mut self, line: &str) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let in_code = self.state == ParserState::InRecordInCode;

        match (self.state, Line::classify(line, in_code)) {
            (_, Line::Heading(text)) => {
                self.flush();
                self.current = Some(ResponseRecord {
                    path: PathBuf::from(heading_path(text)),
                    language: None,
                    content: String::new(),
                });
                self.state = ParserState::InRecordOutsideCode;
            }
            (ParserState::InRecordOutsideCode, Line::FenceOpen(Some(tag)))
                if !self.captured && self.languages.side_of_fence_tag(tag).is_some() =>
            {
                if let Some(record) = self.current.as_mut() {
                    record.language = Some(tag.to_string());
                }
                self.state = ParserState::InRecordInCode;
            }
            (ParserState::InRecordInCode, Line::FenceClose) => {
                if let Some(record) = self.current.as_mut() {
                    trim_trailing(&mut record.content);
                }
                self.captured = true;
                self.state = ParserState::InRecordOutsideCode;
            }
            (ParserState::InRecordInCode, Line::Text(text)) => {
                if let Some(record) = self.current.as_mut() {
                    record.content.push_str(text);
                    record.content.push('\n');
                }
            }
            // Prose, foreign fences and later blocks are ignored
            _ => {}
        }
    }

    /// Flush the open record and return everything parsed
    pub fn finish(mut self) -> Vec<ResponseRecord> {
        self.flush();
        self.records
    }

    fn flush(&mut self) {
        if let Some(mut record) = self.current.take() {
            trim_trailing(&mut record.content);
            self.records.push(record);
        }
        self.captured = false;
        self.state = ParserState::OutsideRecord;
    }
}

/// Parse a complete engine response
pub fn parse_response(text: &str, languages: &LanguagePair) -> Vec<ResponseRecord> {
    let mut parser = ResponseParser::new(languages);
    for line in text.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

fn heading_path(text: &str) -> String {
    let text = ANNOTATION.replace(text, "");
    text.trim().trim_matches('`').to_string()
}

fn trim_trailing(content: &mut String) {
    let len = content.trim_end().len();
    content.truncate(len);
}
