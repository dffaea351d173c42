//! Sequential batch run over one directory.
//!
//! Every candidate is checked against the active convention, translated,
//! and recorded in a [`RunSummary`]. A failing file never stops the run.

use crate::error::TranslationError;
use crate::naming::{is_russian_subtitle, NamingConvention, SubtitleFile, TranslationTask};
use crate::scan::list_candidates;
use crate::translate::FileTranslator;
use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause after each translated file, to stay under backend rate limits.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Minimum pause between two translated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

/// Why a candidate was not translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The name already carries a Russian tag.
    AlreadyTranslated,
    /// The active convention does not select this name.
    NotEligible,
    /// The output file exists and the convention forbids overwriting it.
    OutputExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub file: SubtitleFile,
    pub reason: SkipReason,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Number of `.srt` files found.
    pub candidates: usize,
    pub translated: Vec<TranslationTask>,
    pub skipped: Vec<Skipped>,
    pub failed: Vec<TranslationError>,
}

impl RunSummary {
    pub fn translated_names(&self) -> Vec<String> {
        self.translated.iter().map(|t| t.output_name()).collect()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> Vec<&str> {
        self.skipped
            .iter()
            .filter(|s| s.reason == reason)
            .map(|s| s.file.name.as_str())
            .collect()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|e| e.file.as_str()).collect()
    }
}

/// Drives one run: list, filter, translate, throttle.
pub struct Runner<F> {
    translator: F,
    throttle: Throttle,
}

impl<F: FileTranslator> Runner<F> {
    pub fn new(translator: F) -> Self {
        Self {
            translator,
            throttle: Throttle::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Translate every eligible file in `dir`. Only a failure to list the
    /// directory is returned as an error.
    pub async fn run(&self, dir: &Path, convention: &NamingConvention) -> Result<RunSummary> {
        info!("using convention: {convention}");
        let files = list_candidates(dir)?;
        let mut summary = RunSummary {
            candidates: files.len(),
            ..Default::default()
        };
        if files.is_empty() {
            info!("no .srt files in {}", dir.display());
            return Ok(summary);
        }

        for file in files {
            if is_russian_subtitle(&file.name) {
                debug!("skipping {}: already Russian", file.name);
                summary.skipped.push(Skipped {
                    file,
                    reason: SkipReason::AlreadyTranslated,
                });
                continue;
            }
            if !convention.is_eligible(&file.name) {
                debug!(
                    "skipping {}: not selected (locale tag {:?})",
                    file.name,
                    file.locale_tag()
                );
                summary.skipped.push(Skipped {
                    file,
                    reason: SkipReason::NotEligible,
                });
                continue;
            }
            let task = TranslationTask::new(file, convention);
            if convention.skips_existing_output() && task.output.exists() {
                info!(
                    "skipping {}: {} already exists",
                    task.input.name,
                    task.output_name()
                );
                summary.skipped.push(Skipped {
                    file: task.input,
                    reason: SkipReason::OutputExists,
                });
                continue;
            }

            info!("translating {} -> {}", task.input.name, task.output_name());
            match self
                .translator
                .translate_file(&task.input.path, &task.output)
                .await
            {
                Ok(blocks) => {
                    info!("done: {} ({blocks} blocks)", task.output_name());
                    summary.translated.push(task);
                    self.throttle.pause().await;
                }
                Err(source) => {
                    let err = TranslationError {
                        file: task.input.name,
                        source,
                    };
                    warn!("error translating {}: {}", err.file, err.detail());
                    summary.failed.push(err);
                }
            }
        }

        if summary.translated.is_empty() && summary.failed.is_empty() {
            info!("nothing to translate (only Russian or unselected subtitles)");
        } else {
            info!(
                "finished: {} translated, {} skipped, {} failed",
                summary.translated.len(),
                summary.skipped.len(),
                summary.failed.len()
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{EnglishMatch, LiteralSuffixConvention, LocaleTagConvention};
    use crate::translate::{IndexedLine, SrtFileTranslator, Translator};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Copies input to output with a marker, failing for names containing `bad`.
    #[derive(Default)]
    struct CopyTr {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FileTranslator for CopyTr {
        async fn translate_file(&self, input: &Path, output: &Path) -> Result<usize> {
            let name = input.file_name().unwrap().to_string_lossy().into_owned();
            self.seen.lock().unwrap().push(name.clone());
            if name.contains("bad") {
                return Err(anyhow!("malformed subtitle"));
            }
            fs::write(output, format!("translated {name}"))?;
            Ok(1)
        }
    }

    fn runner() -> Runner<CopyTr> {
        Runner::new(CopyTr::default()).with_throttle(Throttle::none())
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    #[tokio::test]
    async fn locale_convention_translates_non_russian_files() {
        let dir = tempdir().unwrap();
        touch(
            dir.path(),
            &["b.en_US.srt", "a.srt", "c.ru.srt", "d.RU-ru.SRT", "readme.txt"],
        );
        let r = runner();

        let summary = r
            .run(dir.path(), &NamingConvention::default())
            .await
            .unwrap();

        assert_eq!(summary.candidates, 4);
        assert_eq!(
            summary.translated_names(),
            vec!["a.ru_RU.srt", "b.ru_RU.srt"]
        );
        assert_eq!(
            summary.skipped_for(SkipReason::AlreadyTranslated),
            vec!["c.ru.srt", "d.RU-ru.SRT"]
        );
        assert!(dir.path().join("b.ru_RU.srt").exists());
        assert_eq!(*r.translator.seen.lock().unwrap(), vec!["a.srt", "b.en_US.srt"]);
    }

    #[tokio::test]
    async fn strict_rule_skips_untagged_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["movie.srt", "movie.en.srt"]);
        let conv: NamingConvention = LocaleTagConvention::new(EnglishMatch::TaggedOnly).into();

        let summary = runner().run(dir.path(), &conv).await.unwrap();

        assert_eq!(summary.translated_names(), vec!["movie.ru_RU.srt"]);
        assert_eq!(summary.skipped_for(SkipReason::NotEligible), vec!["movie.srt"]);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["a.en.srt", "b.en-GB.srt"]);
        let conv = NamingConvention::default();
        let r = runner();

        let first = r.run(dir.path(), &conv).await.unwrap();
        assert_eq!(first.translated.len(), 2);
        let files_after_first = fs::read_dir(dir.path()).unwrap().count();

        let second = r.run(dir.path(), &conv).await.unwrap();
        assert_eq!(second.translated_names(), first.translated_names());
        assert_eq!(
            second.skipped_for(SkipReason::AlreadyTranslated),
            vec!["a.ru_RU.srt", "b.ru_RU.srt"]
        );
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), files_after_first);
    }

    #[tokio::test]
    async fn failures_are_recorded_and_run_continues() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["a_bad.en.srt", "b.en.srt"]);

        let summary = runner()
            .run(dir.path(), &NamingConvention::default())
            .await
            .unwrap();

        assert_eq!(summary.failed_names(), vec!["a_bad.en.srt"]);
        assert_eq!(summary.failed[0].detail(), "malformed subtitle");
        assert_eq!(summary.translated_names(), vec!["b.ru_RU.srt"]);
    }

    #[tokio::test]
    async fn empty_directory_runs_nothing() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["notes.txt"]);
        let r = runner();

        let summary = r
            .run(dir.path(), &NamingConvention::default())
            .await
            .unwrap();

        assert_eq!(summary.candidates, 0);
        assert!(summary.translated.is_empty() && summary.skipped.is_empty());
        assert!(r.translator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn literal_convention_never_overwrites() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["lesson_en.srt", "LESSON2_EN.SRT", "other.srt"]);
        fs::write(dir.path().join("lesson_ru.srt"), "keep me").unwrap();
        let conv: NamingConvention = LiteralSuffixConvention::new("_en.srt", "_ru.srt")
            .unwrap()
            .into();
        let r = runner();

        let summary = r.run(dir.path(), &conv).await.unwrap();

        assert_eq!(summary.translated_names(), vec!["LESSON2_ru.srt"]);
        assert_eq!(
            summary.skipped_for(SkipReason::OutputExists),
            vec!["lesson_en.srt"]
        );
        assert_eq!(
            summary.skipped_for(SkipReason::NotEligible),
            vec!["lesson_ru.srt", "other.srt"]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("lesson_ru.srt")).unwrap(),
            "keep me"
        );
    }

    #[tokio::test]
    async fn russian_files_are_skipped_under_literal_convention() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["a.ru.srt", "b.srt"]);
        let conv: NamingConvention = LiteralSuffixConvention::new(".srt", "_x.srt")
            .unwrap()
            .into();
        // the suffix alone would select the Russian file too
        assert!(conv.is_eligible("a.ru.srt"));
        let r = runner();

        let summary = r.run(dir.path(), &conv).await.unwrap();

        assert_eq!(
            summary.skipped_for(SkipReason::AlreadyTranslated),
            vec!["a.ru.srt"]
        );
        assert_eq!(summary.translated_names(), vec!["b_x.srt"]);
        assert_eq!(*r.translator.seen.lock().unwrap(), vec!["b.srt"]);
        assert!(dir.path().join("b_x.srt").exists());
        assert!(!dir.path().join("a.ru_x.srt").exists());
    }

    #[tokio::test]
    async fn throttle_pauses_after_each_translation() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["a.srt", "b.srt"]);
        let r = Runner::new(CopyTr::default())
            .with_throttle(Throttle::new(Duration::from_millis(20)));

        let start = std::time::Instant::now();
        r.run(dir.path(), &NamingConvention::default())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    struct UpperTr;

    #[async_trait]
    impl Translator for UpperTr {
        async fn translate_batch(
            &self,
            lines: &[IndexedLine],
            _source: &str,
            _target: &str,
        ) -> Result<Vec<IndexedLine>> {
            Ok(lines
                .iter()
                .map(|l| IndexedLine {
                    index: l.index,
                    text: l.text.to_uppercase(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn runs_real_srt_pipeline() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ep1.en.srt"),
            "1\n00:00:00,000 --> 00:00:01,000\nhello\n",
        )
        .unwrap();
        fs::write(dir.path().join("ep2.en.srt"), "garbage\n").unwrap();
        let r = Runner::new(SrtFileTranslator::new(UpperTr)).with_throttle(Throttle::none());

        let summary = r
            .run(dir.path(), &NamingConvention::default())
            .await
            .unwrap();

        assert_eq!(summary.translated_names(), vec!["ep1.ru_RU.srt"]);
        assert_eq!(summary.failed_names(), vec!["ep2.en.srt"]);
        let out = fs::read_to_string(dir.path().join("ep1.ru_RU.srt")).unwrap();
        assert!(out.contains("HELLO"));
        assert!(!dir.path().join("ep2.ru_RU.srt").exists());
    }
}
