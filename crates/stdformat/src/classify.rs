use std::path::Path;

use crate::configuration::Settings;

/// Decides whether a document should be treated as JavaScript.
///
/// Policy, in order: an excluded extension wins over everything, an
/// included extension matches, and otherwise the declared syntax
/// label's last path segment is checked for the substring
/// "javascript" unless it names a blacklisted syntax (ex. JSON
/// syntaxes living under a JavaScript package directory).
pub fn is_javascript(settings: &Settings, file_name: Option<&Path>, syntax: Option<&str>) -> bool {
  if let Some(extension) = file_name.and_then(file_extension) {
    if settings.excludes.iter().any(|excluded| excluded.eq_ignore_ascii_case(extension)) {
      return false;
    }
    if settings.includes.iter().any(|included| included.eq_ignore_ascii_case(extension)) {
      return true;
    }
  }

  if let Some(syntax) = syntax {
    let segment = syntax.rsplit(['/', '\\']).next().unwrap_or(syntax).to_lowercase();
    if settings.syntax_blacklist.iter().any(|blacklisted| segment.contains(&blacklisted.to_lowercase())) {
      return false;
    }
    if segment.contains("javascript") {
      return true;
    }
  }

  false
}

fn file_extension(file_name: &Path) -> Option<&str> {
  file_name.extension()?.to_str()
}
