//! The Instruction Bundle: fixed text sent as `system` on every request.
//!
//! A bundle has two layers.  The *rules* describe how the counselor behaves
//! and stay the same regardless of program; the *knowledge* describes one
//! program's courses and is meant to be swapped out.  The bundle also carries
//! the course-code prefixes the renderer highlights and the suggested
//! questions offered on an empty transcript.
//!
//! ## File format
//!
//! ```yaml
//! name: "Champlain CS"
//! rules: "rules.md"          # optional; built-in rules when omitted
//! knowledge: "subject.md"    # required; inline text or a .md file reference
//! course_prefixes: [CSI, SEC, MAT]
//! suggestions:
//!   - "What courses should I take as a freshman CS major?"
//! ```
//!
//! A `rules` or `knowledge` value that is a single-line relative path ending in
//! `.md` is read from the directory holding the YAML file.  Absolute paths are
//! treated as literal text, and paths that climb out of that directory are
//! rejected.

use std::path::{Component, Path};

use serde::Deserialize;

use crate::error::{Error, Result};

const BUILTIN_RULES: &str = include_str!("../prompts/system.md");
const BUILTIN_KNOWLEDGE: &str = include_str!("../prompts/subject.md");

/// Course subject prefixes highlighted when no bundle overrides them.
pub const DEFAULT_COURSE_PREFIXES: [&str; 3] = ["CSI", "SEC", "MAT"];

/// Questions offered to a student who has not said anything yet.
pub const DEFAULT_SUGGESTIONS: [&str; 4] = [
    "What courses should I take as a freshman CS major?",
    "I want to get into AI — what's the prerequisite chain?",
    "Can you help me plan my junior year schedule?",
    "What cybersecurity electives can I take?",
];

/// Separator placed between the rules and the knowledge.
const LAYER_SEPARATOR: &str = "\n\n";

/// Fixed behavioural rules plus fixed domain knowledge.
///
/// Never mutated once a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionBundle {
    name: String,
    rules: String,
    knowledge: String,
    course_prefixes: Vec<String>,
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstructionFile {
    name: Option<String>,
    rules: Option<String>,
    knowledge: String,
    course_prefixes: Option<Vec<String>>,
    suggestions: Option<Vec<String>>,
}

impl InstructionBundle {
    /// The Champlain College Computer Science & Cybersecurity bundle.
    pub fn builtin() -> Self {
        Self {
            name: "Champlain College CS & Cybersecurity".to_string(),
            rules: BUILTIN_RULES.trim_end().to_string(),
            knowledge: BUILTIN_KNOWLEDGE.trim_end().to_string(),
            course_prefixes: DEFAULT_COURSE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Builds a bundle from explicit rules and knowledge, keeping the default
    /// prefixes and suggestions.
    pub fn new(rules: impl Into<String>, knowledge: impl Into<String>) -> Self {
        Self {
            name: "custom".to_string(),
            rules: rules.into(),
            knowledge: knowledge.into(),
            ..Self::builtin()
        }
    }

    /// Replaces the course prefixes.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a prefix is empty or contains anything
    /// other than ASCII letters and digits.
    pub fn with_course_prefixes<I, S>(mut self, prefixes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        for prefix in &prefixes {
            validate_prefix(prefix)?;
        }
        self.course_prefixes = prefixes;
        Ok(self)
    }

    /// Replaces the suggested questions.
    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    /// Loads a bundle from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(
                format!("failed to read instruction file {}", path.display()),
                err,
            )
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml_str(&content, base_dir)
    }

    /// Parses a bundle from YAML, resolving `.md` references against `base_dir`.
    pub fn from_yaml_str(content: &str, base_dir: &Path) -> Result<Self> {
        let file: InstructionFile = serde_yaml::from_str(content)?;
        let builtin = Self::builtin();

        let rules = match file.rules {
            Some(value) => resolve_text(&value, base_dir)?,
            None => builtin.rules,
        };
        let knowledge = resolve_text(&file.knowledge, base_dir)?;
        if knowledge.trim().is_empty() {
            return Err(Error::validation(
                "knowledge must not be empty",
                Some("knowledge".to_string()),
            ));
        }

        let bundle = Self {
            name: file.name.unwrap_or_else(|| "custom".to_string()),
            rules,
            knowledge,
            course_prefixes: builtin.course_prefixes,
            suggestions: file.suggestions.unwrap_or(builtin.suggestions),
        };
        match file.course_prefixes {
            Some(prefixes) => bundle.with_course_prefixes(prefixes),
            None => Ok(bundle),
        }
    }

    /// A short display name for the bundle.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The behavioural rules layer.
    pub fn rules(&self) -> &str {
        &self.rules
    }

    /// The domain knowledge layer.
    pub fn knowledge(&self) -> &str {
        &self.knowledge
    }

    /// Course subject prefixes to highlight.
    pub fn course_prefixes(&self) -> &[String] {
        &self.course_prefixes
    }

    /// Suggested opening questions.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// The text sent as the request's `system` field.
    pub fn system_prompt(&self) -> String {
        format!("{}{LAYER_SEPARATOR}{}", self.rules, self.knowledge)
    }
}

impl Default for InstructionBundle {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::validation(
            format!("course prefix {prefix:?} must be ASCII letters or digits"),
            Some("course_prefixes".to_string()),
        ));
    }
    Ok(())
}

fn is_file_reference(value: &str) -> bool {
    let value = value.trim();
    !value.contains('\n') && value.ends_with(".md") && !Path::new(value).is_absolute()
}

fn resolve_text(value: &str, base_dir: &Path) -> Result<String> {
    if !is_file_reference(value) {
        return Ok(value.to_string());
    }
    let relative = Path::new(value.trim());
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::validation(
            format!("instruction file {value:?} may not refer to a parent directory"),
            None,
        ));
    }
    let path = base_dir.join(relative);
    let text = std::fs::read_to_string(&path).map_err(|err| {
        Error::io(
            format!("failed to read instruction text {}", path.display()),
            err,
        )
    })?;
    Ok(text.trim_end().to_string())
}
