//! Filename policy: which subtitle files get translated and what the
//! translated copy is called.
//!
//! Two conventions exist. The locale-tag convention maps `movie.en_US.srt`
//! to `movie.ru_RU.srt`. The literal-suffix convention swaps one
//! user-supplied ending for another (`lesson_en.srt` -> `lesson_ru.srt`).
//! Both are pure string functions; the filesystem is only consulted by the
//! runner.

use crate::error::ConventionError;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Suffix appended by the locale-tag convention.
pub const RUSSIAN_SUFFIX: &str = ".ru_RU.srt";

static ENGLISH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.en(?:[-_][a-z]{2})?\.srt$").expect("valid regex"));
static RUSSIAN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.ru(?:[-_][a-z]{2})?\.srt$").expect("valid regex"));
static SRT_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.srt$").expect("valid regex"));
static LOCALE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.([a-z]{2}(?:[-_][a-z]{2})?)\.srt$").expect("valid regex")
});

/// True when `name` ends with an English tag (`.en`, `.en_US`, `.en-GB`, ...)
/// followed by `.srt`, in any case.
pub fn is_english_subtitle(name: &str) -> bool {
    ENGLISH_TAG.is_match(name)
}

/// True when `name` already carries a Russian tag (`.ru`, `.ru_RU`, `.ru-RU`)
/// before `.srt`. Such files are never translated again.
pub fn is_russian_subtitle(name: &str) -> bool {
    RUSSIAN_TAG.is_match(name)
}

/// Output name under the locale-tag convention.
///
/// The English tag and the extension are stripped by two separate trailing
/// substitutions, so untagged input still gets a Russian name:
/// `lesson.srt` becomes `lesson.ru_RU.srt`.
pub fn locale_output_name(name: &str) -> String {
    let untagged = ENGLISH_TAG.replace(name, "");
    let stem = SRT_EXTENSION.replace(&untagged, "");
    format!("{stem}{RUSSIAN_SUFFIX}")
}

/// Which files count as English under the locale-tag convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnglishMatch {
    /// Every subtitle that is not already Russian, tagged or not.
    #[default]
    AnyNonRussian,
    /// Only names ending in `.en.srt`, `.en_XX.srt` or `.en-XX.srt`.
    TaggedOnly,
}

/// Fixed English to Russian mapping based on locale tags in the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocaleTagConvention {
    pub english: EnglishMatch,
}

impl LocaleTagConvention {
    pub fn new(english: EnglishMatch) -> Self {
        Self { english }
    }

    pub fn is_eligible(&self, name: &str) -> bool {
        match self.english {
            EnglishMatch::AnyNonRussian => !is_russian_subtitle(name),
            EnglishMatch::TaggedOnly => is_english_subtitle(name),
        }
    }

    pub fn output_name(&self, name: &str) -> String {
        locale_output_name(name)
    }
}

/// Replace one literal filename ending with another.
///
/// Matching is case-insensitive; the retained prefix keeps its original
/// case and the new suffix is appended verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralSuffixConvention {
    old_suffix: String,
    new_suffix: String,
}

impl LiteralSuffixConvention {
    /// Validate and build the convention. Surrounding whitespace is ignored.
    pub fn new(old_suffix: &str, new_suffix: &str) -> Result<Self, ConventionError> {
        let old_suffix = validate_suffix("old", old_suffix)?;
        let new_suffix = validate_suffix("new", new_suffix)?;
        Ok(Self {
            old_suffix,
            new_suffix,
        })
    }

    pub fn old_suffix(&self) -> &str {
        &self.old_suffix
    }

    pub fn new_suffix(&self) -> &str {
        &self.new_suffix
    }

    pub fn is_eligible(&self, name: &str) -> bool {
        strip_suffix_ignore_case(name, &self.old_suffix).is_some()
    }

    /// Output name for an eligible `name`. Names that do not end with the
    /// old suffix are returned unchanged.
    pub fn output_name(&self, name: &str) -> String {
        match strip_suffix_ignore_case(name, &self.old_suffix) {
            Some(prefix) => format!("{prefix}{}", self.new_suffix),
            None => name.to_string(),
        }
    }
}

fn validate_suffix(which: &'static str, value: &str) -> Result<String, ConventionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConventionError::EmptySuffix { which });
    }
    if !value.to_lowercase().ends_with(".srt") {
        return Err(ConventionError::MissingSrtExtension {
            which,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Strip `suffix` from the end of `name` when the last `suffix.chars().count()`
/// characters match it case-insensitively. Returns the retained prefix.
fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let want = suffix.chars().count();
    let have = name.chars().count();
    if want == 0 || want > have {
        return None;
    }
    let cut = name
        .char_indices()
        .nth(have - want)
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    let (prefix, tail) = name.split_at(cut);
    (tail.to_lowercase() == suffix.to_lowercase()).then_some(prefix)
}

/// The rule set for one run. Chosen up front and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingConvention {
    LocaleTag(LocaleTagConvention),
    LiteralSuffix(LiteralSuffixConvention),
}

impl NamingConvention {
    pub fn is_eligible(&self, name: &str) -> bool {
        match self {
            Self::LocaleTag(c) => c.is_eligible(name),
            Self::LiteralSuffix(c) => c.is_eligible(name),
        }
    }

    pub fn output_name(&self, name: &str) -> String {
        match self {
            Self::LocaleTag(c) => c.output_name(name),
            Self::LiteralSuffix(c) => c.output_name(name),
        }
    }

    /// Whether an existing output file means the task is skipped instead of
    /// overwritten.
    pub fn skips_existing_output(&self) -> bool {
        matches!(self, Self::LiteralSuffix(_))
    }
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::LocaleTag(LocaleTagConvention::default())
    }
}

impl From<LocaleTagConvention> for NamingConvention {
    fn from(c: LocaleTagConvention) -> Self {
        Self::LocaleTag(c)
    }
}

impl From<LiteralSuffixConvention> for NamingConvention {
    fn from(c: LiteralSuffixConvention) -> Self {
        Self::LiteralSuffix(c)
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocaleTag(c) => match c.english {
                EnglishMatch::AnyNonRussian => {
                    write!(f, "locale tag (any non-Russian .srt -> *{RUSSIAN_SUFFIX})")
                }
                EnglishMatch::TaggedOnly => {
                    write!(f, "locale tag (*.en*.srt -> *{RUSSIAN_SUFFIX})")
                }
            },
            Self::LiteralSuffix(c) => {
                write!(f, "literal suffix (*{} -> *{})", c.old_suffix, c.new_suffix)
            }
        }
    }
}

/// A candidate subtitle file found in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleFile {
    pub path: PathBuf,
    pub name: String,
}

impl SubtitleFile {
    /// Build from a path whose file name is valid UTF-8.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            path: path.to_path_buf(),
            name,
        })
    }

    /// Name without the trailing `.srt`.
    pub fn stem(&self) -> &str {
        match SRT_EXTENSION.find(&self.name) {
            Some(m) => &self.name[..m.start()],
            None => &self.name,
        }
    }

    /// Locale tag right before `.srt`, such as `en`, `en_US` or `ru-RU`.
    pub fn locale_tag(&self) -> Option<&str> {
        LOCALE_TAG
            .captures(&self.name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

/// One eligible file paired with the path its translation is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTask {
    pub input: SubtitleFile,
    pub output: PathBuf,
}

impl TranslationTask {
    pub fn new(input: SubtitleFile, convention: &NamingConvention) -> Self {
        let output = input
            .path
            .with_file_name(convention.output_name(&input.name));
        Self { input, output }
    }

    pub fn output_name(&self) -> String {
        self.output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
