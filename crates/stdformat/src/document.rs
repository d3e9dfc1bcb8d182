use anyhow::Result;
use anyhow::bail;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatTrigger {
  /// Explicit command invocation. Non-empty selections each become a
  /// formatting span.
  Manual,
  /// Pre-save hook. Always formats the whole document, ignoring
  /// selection state.
  OnSave,
}

/// An open buffer as the host editor hands it over: its text, where
/// it lives, what syntax the editor assigned, and the current
/// selections as byte ranges into the text.
#[derive(Clone, Debug)]
pub struct Document {
  file_name: Option<PathBuf>,
  syntax: Option<String>,
  text: String,
  selections: Vec<Range<usize>>,
}

impl Document {
  pub fn new(file_name: Option<PathBuf>, syntax: Option<String>, text: String) -> Document {
    Document {
      file_name,
      syntax,
      text,
      selections: Vec::new(),
    }
  }

  pub fn file_name(&self) -> Option<&Path> {
    self.file_name.as_deref()
  }

  pub fn syntax(&self) -> Option<&str> {
    self.syntax.as_deref()
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn set_selections(&mut self, selections: Vec<Range<usize>>) -> Result<()> {
    for selection in &selections {
      if selection.start > selection.end {
        bail!("Selection {}:{} is inverted.", selection.start, selection.end);
      }
      if selection.end > self.text.len() {
        bail!("Selection {}:{} is past the end of the document ({} bytes).", selection.start, selection.end, self.text.len());
      }
      if !self.text.is_char_boundary(selection.start) || !self.text.is_char_boundary(selection.end) {
        bail!("Selection {}:{} does not fall on character boundaries.", selection.start, selection.end);
      }
    }
    // overlapping spans would invalidate each other's offsets once
    // replacements start shrinking or growing the text
    let mut sorted: Vec<&Range<usize>> = selections.iter().filter(|selection| !selection.is_empty()).collect();
    sorted.sort_by_key(|selection| selection.start);
    for pair in sorted.windows(2) {
      if pair[0].end > pair[1].start {
        bail!(
          "Selection {}:{} overlaps selection {}:{}.",
          pair[0].start,
          pair[0].end,
          pair[1].start,
          pair[1].end
        );
      }
    }
    self.selections = selections;
    Ok(())
  }

  /// The spans to submit for formatting, in document order. Manual
  /// invocations format each non-empty selection independently and
  /// fall back to the whole document when nothing is selected.
  pub fn format_spans(&self, trigger: FormatTrigger, force_whole_document: bool) -> Vec<Range<usize>> {
    if trigger == FormatTrigger::OnSave || force_whole_document {
      return vec![0..self.text.len()];
    }
    let mut spans: Vec<Range<usize>> = self.selections.iter().filter(|selection| !selection.is_empty()).cloned().collect();
    if spans.is_empty() {
      return vec![0..self.text.len()];
    }
    spans.sort_by_key(|span| span.start);
    spans
  }

  /// Replaces a span's content wholesale. Callers track how earlier
  /// replacements shift later span offsets.
  pub fn replace(&mut self, span: Range<usize>, new_text: &str) {
    self.text.replace_range(span, new_text);
  }
}
