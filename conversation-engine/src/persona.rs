use std::{fs, path::Path};

use common::error::AppError;

const SUMMARY_FILE: &str = "summary.txt";
const RESUME_FILE: &str = "resume.txt";
const PROFILE_FILE: &str = "github_profile.txt";

/// The background documents the agent answers from. The resume arrives as
/// plain text, extracted from its source document by the offline
/// preprocessing step.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub summary: String,
    pub resume: String,
    pub github_profile: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        resume: impl Into<String>,
        github_profile: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            resume: resume.into(),
            github_profile: github_profile.into(),
        }
    }

    pub fn load(data_dir: &Path, name: &str) -> Result<Self, AppError> {
        Ok(Self::new(
            name,
            read_document(data_dir, SUMMARY_FILE)?,
            read_document(data_dir, RESUME_FILE)?,
            read_document(data_dir, PROFILE_FILE)?,
        ))
    }

    /// Concatenation of all background documents, the text the corpus was
    /// chunked and embedded from. Must match the preprocessing step's
    /// concatenation order for the stored vectors to line up.
    pub fn combined_documents(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            self.resume.trim(),
            self.summary.trim(),
            self.github_profile.trim()
        )
    }
}

fn read_document(data_dir: &Path, file_name: &str) -> Result<String, AppError> {
    let path = data_dir.join(file_name);
    fs::read_to_string(&path)
        .map(|text| text.trim().to_string())
        .map_err(|err| AppError::Corpus(format!("failed to read {}: {err}", path.display())))
}
