//! Build recipe (`.spec`) artifacts

use super::{Artifact, ArtifactError, ArtifactKind};
use std::io::Read;
use std::path::Path;

/// Artifact name used for a recipe read from standard input
pub const STDIN_NAME: &str = "(standard input)";

/// A recipe file held in memory
#[derive(Debug, Clone)]
pub struct RecipeFile {
    name: String,
    filename: String,
    lines: Vec<String>,
}

impl RecipeFile {
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let name = name.into();
        Self {
            filename: name.clone(),
            name,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Read a recipe from disk; the artifact is named after the file
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut recipe = Self::from_text(name, &String::from_utf8_lossy(&bytes));
        recipe.filename = path.display().to_string();
        Ok(recipe)
    }

    /// Read a recipe from a stream such as stdin
    pub fn from_reader(name: &str, mut reader: impl Read) -> Result<Self, ArtifactError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| ArtifactError::Io {
                path: name.into(),
                source,
            })?;
        Ok(Self::from_text(name, &String::from_utf8_lossy(&bytes)))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

impl Artifact for RecipeFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Recipe
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn header(&self, tag: &str) -> Option<String> {
        // Preamble tags, first occurrence wins
        self.lines.iter().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(tag)
                .then(|| value.trim().to_string())
        })
    }

    fn recipe_lines(&self) -> Option<&[String]> {
        Some(&self.lines)
    }
}
