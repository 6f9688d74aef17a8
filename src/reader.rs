//! Document reader boundary, used only by file ingestion.
//!
//! Resolves a file to text plus format metadata, with format detection by
//! extension. Unknown extensions degrade to plain-text reading with a logged
//! warning; a missing file is `NotFound`. Page-based and packaged binary
//! formats (`.pdf`, `.docx`) are not decoded by this crate: they go through
//! the same plain-text path, which reads the bytes as UTF-8 and fails with an
//! `Io` error on content that is not valid UTF-8.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ArcaError, Result};

/// Text content and format metadata produced by [`read`].
#[derive(Debug)]
pub struct Document {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

/// Read a file into text, detecting the format by extension.
pub fn read(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ArcaError::NotFound(format!("file {}", path.display())));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut doc = match extension.as_str() {
        "txt" => plain_text(path, "text")?,
        "md" | "markdown" => markdown(path)?,
        ext if code_language(ext).is_some() => code(path, ext)?,
        ext => {
            tracing::warn!(
                path = %path.display(),
                extension = ext,
                "unsupported file type, treating as plain text"
            );
            plain_text(path, "text")?
        }
    };

    doc.metadata
        .insert("filename".into(), file_name(path));
    doc.metadata
        .insert("filepath".into(), path.display().to_string());
    doc.metadata
        .insert("extension".into(), extension);
    doc.metadata
        .insert("size".into(), doc.text.len().to_string());

    Ok(doc)
}

fn plain_text(path: &Path, kind: &str) -> Result<Document> {
    let text = std::fs::read_to_string(path)?;
    let mut metadata = BTreeMap::new();
    metadata.insert("type".to_string(), kind.to_string());
    Ok(Document { text, metadata })
}

/// Markdown: plain text plus the first `# ` heading as a title, if present.
fn markdown(path: &Path) -> Result<Document> {
    let mut doc = plain_text(path, "markdown")?;
    if let Some(title) = doc
        .text
        .lines()
        .find_map(|line| line.strip_prefix("# "))
    {
        doc.metadata
            .insert("title".to_string(), title.trim().to_string());
    }
    Ok(doc)
}

/// Source code: plain text tagged with the language and line count.
fn code(path: &Path, extension: &str) -> Result<Document> {
    let mut doc = plain_text(path, "code")?;
    if let Some(language) = code_language(extension) {
        doc.metadata.insert("language".to_string(), language.to_string());
    }
    doc.metadata
        .insert("lines".to_string(), doc.text.lines().count().to_string());
    Ok(doc)
}

fn code_language(extension: &str) -> Option<&'static str> {
    match extension {
        "py" => Some("python"),
        "js" => Some("javascript"),
        "ts" => Some("typescript"),
        "java" => Some("java"),
        "cpp" => Some("cpp"),
        "c" => Some("c"),
        "go" => Some("go"),
        "rs" => Some("rust"),
        _ => None,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_plain_text_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", "hello world");

        let doc = read(&path).unwrap();
        assert_eq!(doc.text, "hello world");
        assert_eq!(doc.metadata.get("type").unwrap(), "text");
        assert_eq!(doc.metadata.get("filename").unwrap(), "notes.txt");
        assert_eq!(doc.metadata.get("extension").unwrap(), "txt");
        assert_eq!(doc.metadata.get("size").unwrap(), "11");
    }

    #[test]
    fn markdown_extracts_first_heading_as_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "doc.md", "intro\n# The Title\n\n# Second\nbody");

        let doc = read(&path).unwrap();
        assert_eq!(doc.metadata.get("type").unwrap(), "markdown");
        assert_eq!(doc.metadata.get("title").unwrap(), "The Title");
    }

    #[test]
    fn markdown_without_heading_has_no_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "doc.md", "just text");
        let doc = read(&path).unwrap();
        assert!(doc.metadata.get("title").is_none());
    }

    #[test]
    fn code_files_are_tagged_with_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tool.py", "print('hi')\nprint('bye')\n");

        let doc = read(&path).unwrap();
        assert_eq!(doc.metadata.get("type").unwrap(), "code");
        assert_eq!(doc.metadata.get("language").unwrap(), "python");
        assert_eq!(doc.metadata.get("lines").unwrap(), "2");
    }

    #[test]
    fn unknown_extension_falls_back_to_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.xyz", "raw bytes as text");

        let doc = read(&path).unwrap();
        assert_eq!(doc.text, "raw bytes as text");
        assert_eq!(doc.metadata.get("type").unwrap(), "text");
    }

    #[test]
    fn non_utf8_content_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, [0x25, 0x50, 0x44, 0x46, 0xff, 0xfe, 0x00]).unwrap();

        let result = read(&path);
        assert!(matches!(result, Err(ArcaError::Io(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = read("/definitely/not/here.txt");
        assert!(matches!(result, Err(ArcaError::NotFound(_))));
    }
}
