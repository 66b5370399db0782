//! Loading input documents from corpus files or a directory of `.txt` files.
use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Document;

#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self { Self }

    /// Load documents from `path`:
    /// - `*.toml`: `[[documents]]` tables with `title` and `text`
    /// - `*.json`: an array of `{ "title", "text" }` objects
    /// - a directory: one document per paragraph of every `.txt` file, titled by file stem
    ///
    /// Documents whose text is blank are dropped.
    pub fn load(&self, path: &Path) -> Result<Vec<Document>> {
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let docs = if path.is_dir() {
            self.load_directory(path)?
        } else {
            match path.extension().and_then(|s| s.to_str()) {
                Some("toml") => self.load_toml(path)?,
                Some("json") => self.load_json(path)?,
                other => {
                    return Err(Error::InvalidConfig(format!(
                        "unsupported corpus format {:?} for {}",
                        other.unwrap_or(""),
                        path.display()
                    )))
                }
            }
        };
        Ok(docs.into_iter().filter(|d| !d.text.trim().is_empty()).collect())
    }

    fn load_toml(&self, path: &Path) -> Result<Vec<Document>> {
        let file: CorpusFile = Figment::from(Toml::file(path))
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Ok(file.documents)
    }

    fn load_json(&self, path: &Path) -> Result<Vec<Document>> {
        let raw = self.read_file_content(path)?;
        serde_json::from_str(&raw).map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    fn load_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for file_path in self.list_txt_files(dir) {
            let content = self.read_file_content(&file_path)?;
            let title = file_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
            docs.extend(split_paragraphs(&content).into_iter().map(|p| Document::new(title.clone(), p)));
        }
        Ok(docs)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        let bytes = fs::read(file_path).map_err(|e| Error::NotFound(format!("{}: {}", file_path.display(), e)))?;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path(); if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort(); txt_files
    }
}

/// Split on blank lines, trimming each paragraph and dropping empty ones.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    content
        .replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
