use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::ops::Range;

use ariadne::{Cache, Config, Label, Report, ReportKind, Source};
use serde::Serialize;

use crate::utils::maybe_strip_colors;
use crate::Span;
use crate::{Error, Errors, MessageKind};

/// A compile error, as reported to callers of [crate::compile].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub kind: MessageKind,
    /// Machine-readable code, such as `E0006`
    pub code: Option<String>,
    pub reason: String,
    pub hints: Vec<String>,
    /// Character offsets of the offending fragment
    pub span: Option<Span>,
    /// The query excerpt with the fragment underlined; set once composed.
    pub display: Option<String>,
    /// Line and column of the fragment; set once composed.
    pub location: Option<SourceLocation>,
}

/// `(line, column)` pairs, both 0-based.
#[derive(Debug, Clone, Serialize)]
pub struct SourceLocation {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessages {
    pub inner: Vec<ErrorMessage>,
}

impl StdError for ErrorMessages {}

impl From<Error> for ErrorMessage {
    fn from(e: Error) -> Self {
        log::debug!("{:#?}", e);
        ErrorMessage {
            kind: e.kind,
            code: e.code.map(str::to_string),
            reason: e.reason.to_string(),
            hints: e.hints,
            span: e.span,
            display: None,
            location: None,
        }
    }
}

impl From<Error> for ErrorMessages {
    fn from(e: Error) -> Self {
        ErrorMessages::from(vec![e])
    }
}

impl From<Vec<Error>> for ErrorMessages {
    fn from(errors: Vec<Error>) -> Self {
        ErrorMessages {
            inner: errors.into_iter().map(ErrorMessage::from).collect(),
        }
    }
}

impl From<Errors> for ErrorMessages {
    fn from(errors: Errors) -> Self {
        ErrorMessages::from(errors.0)
    }
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Some(display) = &self.display else {
            if let Some(code) = &self.code {
                write!(f, "[{code}] ")?;
            }
            writeln!(f, "Error: {}", self.reason)?;
            for hint in &self.hints {
                writeln!(f, "↳ Hint: {hint}")?;
            }
            return Ok(());
        };

        // ariadne pads its lines with spaces
        for (i, line) in display.split('\n').enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line.trim_end())?;
        }
        Ok(())
    }
}

impl Display for ErrorMessages {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.inner.iter().try_for_each(|e| Display::fmt(e, f))
    }
}

impl ErrorMessages {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Locates every message within `query` and renders its excerpt.
    ///
    /// `source_id` names the query in the excerpt header.
    pub fn composed(mut self, source_id: &str, query: &str) -> Self {
        let mut cache = QueryCache {
            source_id: source_id.to_string(),
            source: Source::from(query.to_string()),
        };

        for e in &mut self.inner {
            let Some(span) = e.span else {
                continue;
            };
            let (Some(start), Some(end)) = (
                cache.source.get_offset_line(span.start),
                cache.source.get_offset_line(span.end),
            ) else {
                log::warn!("span {span:?} is out of bounds of the query");
                continue;
            };

            e.location = Some(SourceLocation {
                start: (start.1, start.2),
                end: (end.1, end.2),
            });
            e.display = e.render(Range::from(span), &mut cache);
        }
        self
    }
}

impl ErrorMessage {
    fn render(&self, span: Range<usize>, cache: &mut QueryCache) -> Option<String> {
        let id = cache.source_id.clone();

        // always colored here, stripped below unless stderr takes colors
        let mut report = Report::build(ReportKind::Error, id.clone(), span.start)
            .with_config(Config::default().with_color(true))
            .with_label(Label::new((id, span)).with_message(&self.reason));

        if let Some(code) = &self.code {
            report = report.with_code(code);
        }
        if let Some((help, notes)) = self.hints.split_first() {
            report.set_help(help);
            if !notes.is_empty() {
                report.set_note(notes.join("\n"));
            }
        }

        let mut out = Vec::new();
        report.finish().write(cache, &mut out).ok()?;
        let out = String::from_utf8(out).ok()?;
        Some(maybe_strip_colors(&out))
    }
}

/// The one query being compiled, for ariadne.
struct QueryCache {
    source_id: String,
    source: Source,
}

impl Cache<String> for QueryCache {
    type Storage = String;

    fn fetch(&mut self, id: &String) -> Result<&Source, Box<dyn fmt::Debug + '_>> {
        if *id == self.source_id {
            Ok(&self.source)
        } else {
            Err(Box::new(format!("unknown query `{id}`")))
        }
    }

    fn display<'b>(&self, id: &'b String) -> Option<Box<dyn fmt::Display + 'b>> {
        Some(Box::new(id))
    }
}
