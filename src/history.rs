//! Persisted query history.
//!
//! Histories are newline-separated files owned by the embedder. The last
//! line is always an empty "edit buffer" entry the cursor starts on;
//! navigating away from it and back preserves whatever was being typed.
//! Files are created with mode 0600 since queries can be sensitive.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced while reading or writing a history file.
#[derive(Debug, Error)]
pub enum HistoryError {
	#[error("permission denied: {}", path.display())]
	PermissionDenied { path: PathBuf },
	#[error("invalid history file: {source}")]
	Invalid {
		#[source]
		source: io::Error,
	},
}

fn classify(err: io::Error, path: &Path) -> HistoryError {
	if err.kind() == io::ErrorKind::PermissionDenied {
		HistoryError::PermissionDenied {
			path: path.to_path_buf(),
		}
	} else {
		HistoryError::Invalid { source: err }
	}
}

fn write_history_file(path: &Path, contents: &str) -> io::Result<()> {
	let mut options = fs::OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}
	let mut file = options.open(path)?;
	file.write_all(contents.as_bytes())
}

/// Input history with a navigation cursor.
pub struct History {
	path: PathBuf,
	lines: Vec<String>,
	modified: HashMap<usize, String>,
	max_size: usize,
	cursor: usize,
}

impl History {
	/// Load the history at `path`, creating an empty file when none
	/// exists.
	pub fn new(path: impl Into<PathBuf>, max_size: usize) -> Result<Self, HistoryError> {
		let path = path.into();
		let data = match fs::read_to_string(&path) {
			Ok(data) => data,
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				write_history_file(&path, "").map_err(|err| classify(err, &path))?;
				String::new()
			}
			Err(err) => return Err(classify(err, &path)),
		};

		let mut lines: Vec<String> = data
			.trim_matches('\n')
			.split('\n')
			.map(str::to_string)
			.collect();
		// Terminal empty line is the edit buffer.
		if lines.last().is_some_and(|line| !line.is_empty()) {
			lines.push(String::new());
		}
		let cursor = lines.len() - 1;
		Ok(Self {
			path,
			lines,
			modified: HashMap::new(),
			max_size,
			cursor,
		})
	}

	/// Append a query and persist the file, dropping the oldest entries
	/// beyond `max_size`. Empty queries are not recorded.
	pub fn append(&mut self, line: &str) -> Result<(), HistoryError> {
		if line.is_empty() {
			return Ok(());
		}
		self.lines.pop();
		self.lines.push(line.to_string());
		if self.lines.len() > self.max_size {
			let excess = self.lines.len() - self.max_size;
			self.lines.drain(..excess);
		}
		self.lines.push(String::new());
		self.cursor = self.lines.len() - 1;
		write_history_file(&self.path, &self.lines.join("\n"))
			.map_err(|err| classify(err, &self.path))
	}

	/// Replace the entry under the cursor for this session only; overrides
	/// are never written back to the file.
	pub fn override_current(&mut self, line: &str) {
		if self.cursor == self.lines.len() - 1 {
			self.lines[self.cursor] = line.to_string();
		} else if self.cursor < self.lines.len() - 1 {
			self.modified.insert(self.cursor, line.to_string());
		}
	}

	/// The entry under the cursor, with any session override applied.
	#[must_use]
	pub fn current(&self) -> &str {
		self.modified
			.get(&self.cursor)
			.map_or(&self.lines[self.cursor], String::as_str)
	}

	/// Move the cursor one entry back and return it.
	pub fn previous(&mut self) -> &str {
		if self.cursor > 0 {
			self.cursor -= 1;
		}
		self.current()
	}

	/// Move the cursor one entry forward and return it.
	pub fn next(&mut self) -> &str {
		if self.cursor < self.lines.len() - 1 {
			self.cursor += 1;
		}
		self.current()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn history_path(dir: &tempfile::TempDir) -> PathBuf {
		dir.path().join("history")
	}

	#[test]
	fn creates_a_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = history_path(&dir);
		let history = History::new(&path, 10).unwrap();
		assert!(path.exists());
		assert_eq!(history.current(), "");

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let mode = fs::metadata(&path).unwrap().permissions().mode();
			assert_eq!(mode & 0o777, 0o600);
		}
	}

	#[test]
	fn append_persists_and_trims() {
		let dir = tempfile::tempdir().unwrap();
		let path = history_path(&dir);
		let mut history = History::new(&path, 2).unwrap();
		history.append("one").unwrap();
		history.append("two").unwrap();
		history.append("three").unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "two\nthree\n");

		let reloaded = History::new(&path, 2).unwrap();
		assert_eq!(reloaded.lines, vec!["two", "three", ""]);
	}

	#[test]
	fn duplicate_and_empty_appends() {
		let dir = tempfile::tempdir().unwrap();
		let mut history = History::new(history_path(&dir), 10).unwrap();
		history.append("").unwrap();
		assert_eq!(history.lines, vec![""]);
		history.append("same").unwrap();
		history.append("same").unwrap();
		assert_eq!(history.lines, vec!["same", "same", ""]);
	}

	#[test]
	fn navigation_walks_entries() {
		let dir = tempfile::tempdir().unwrap();
		let mut history = History::new(history_path(&dir), 10).unwrap();
		history.append("first").unwrap();
		history.append("second").unwrap();

		assert_eq!(history.current(), "");
		assert_eq!(history.previous(), "second");
		assert_eq!(history.previous(), "first");
		// The cursor saturates at both ends.
		assert_eq!(history.previous(), "first");
		assert_eq!(history.next(), "second");
		assert_eq!(history.next(), "");
		assert_eq!(history.next(), "");
	}

	#[test]
	fn overrides_are_session_only() {
		let dir = tempfile::tempdir().unwrap();
		let path = history_path(&dir);
		let mut history = History::new(&path, 10).unwrap();
		history.append("first").unwrap();

		history.previous();
		history.override_current("edited");
		assert_eq!(history.current(), "edited");
		assert!(!fs::read_to_string(&path).unwrap().contains("edited"));

		// Typing into the edit buffer mutates it directly.
		history.next();
		history.override_current("draft");
		assert_eq!(history.current(), "draft");
	}

	#[test]
	fn error_messages_name_the_failure() {
		let err = HistoryError::PermissionDenied {
			path: PathBuf::from("/locked"),
		};
		assert_eq!(err.to_string(), "permission denied: /locked");
		let err = HistoryError::Invalid {
			source: io::Error::new(io::ErrorKind::InvalidData, "broken"),
		};
		assert_eq!(err.to_string(), "invalid history file: broken");
	}
}
