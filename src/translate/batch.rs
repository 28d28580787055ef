use std::path::Path;
use std::sync::Arc;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, SubtransError};
use crate::subtitle::SubtitleRecord;
use super::{PromptBuilder, TranslationBackend};

/// Outcome of translating one subtitle file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub records: usize,
    pub batches: usize,
}

/// Translates subtitle records in fixed-size batches.
///
/// Every request of a batch is in flight at the same time, and the batch is
/// fully resolved before the next one is dispatched. Completed batches are
/// appended to the output file right away, in parse order.
pub struct BatchTranslator {
    backend: Arc<dyn TranslationBackend>,
    model: String,
    batch_size: usize,
    prompts: PromptBuilder,
    show_progress: bool,
}

impl BatchTranslator {
    pub fn new(backend: Arc<dyn TranslationBackend>, config: &TranslateConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(SubtransError::Config("batch_size must be at least 1".to_string()));
        }

        Ok(Self {
            backend,
            model: config.model.clone(),
            batch_size: config.batch_size,
            prompts: PromptBuilder::from_config(config),
            show_progress: false,
        })
    }

    /// Draw a progress bar on stderr while translating
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Translate `records` in place and write them to `output_path`
    pub async fn translate<P: AsRef<Path>>(
        &self,
        records: &mut [SubtitleRecord],
        output_path: P,
    ) -> Result<TranslationStats> {
        let output_path = output_path.as_ref();
        let total = records.len();
        info!(
            "Translating {} subtitles to {} with {} (batch size {})",
            total,
            self.prompts.language(),
            self.model,
            self.batch_size
        );

        let mut output = File::create(output_path).await?;
        let progress = self.progress_bar(total as u64);
        let mut stats = TranslationStats { records: total, batches: 0 };

        for (batch_index, batch) in records.chunks_mut(self.batch_size).enumerate() {
            info!(
                "Processing batch starting at index {} of {}",
                batch_index * self.batch_size,
                total
            );

            // Records that already carry a translation are written as they are
            let pending: Vec<usize> = batch
                .iter()
                .enumerate()
                .filter(|(_, record)| !record.is_translated())
                .map(|(index, _)| index)
                .collect();
            if pending.len() < batch.len() {
                debug!("Keeping {} existing translations", batch.len() - pending.len());
            }

            let prompts: Vec<String> = pending
                .iter()
                .map(|&index| self.prompts.build(&batch[index].source_text))
                .collect();

            // Barrier: the whole batch resolves before anything is written or
            // the next batch is dispatched. Results come back in dispatch order.
            let results = join_all(
                prompts.iter().map(|prompt| self.backend.generate(&self.model, prompt)),
            )
            .await;

            for (&index, translation) in pending.iter().zip(results) {
                let record = &mut batch[index];
                debug!("{} {} -> {}", record.id(), record.timestamp_range(), translation);
                record.set_translation(translation)?;
            }

            let chunk: String = batch.iter().filter_map(SubtitleRecord::translated_block).collect();
            output.write_all(chunk.as_bytes()).await?;
            output.flush().await?;

            stats.batches += 1;
            progress.inc(batch.len() as u64);
        }

        progress.finish_and_clear();
        info!("Wrote {} translated subtitles to {}", total, output_path.display());
        Ok(stats)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} subtitles ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::subtitle::parse_srt;
    use crate::translate::MockTranslationBackend;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Start(String),
        End(String),
    }

    /// Echoes the prompt back after a per-prompt delay and records when each
    /// request starts and finishes.
    #[derive(Default)]
    struct ScriptedBackend {
        delays_ms: HashMap<String, u64>,
        events: Mutex<Vec<Event>>,
        snapshot_on: Option<(String, PathBuf)>,
        snapshot: Mutex<Option<String>>,
    }

    impl ScriptedBackend {
        fn with_delays(delays: &[(&str, u64)]) -> Self {
            Self {
                delays_ms: delays.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                ..Default::default()
            }
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        /// Sizes of the groups of requests that were in flight together
        fn rounds(&self) -> Vec<usize> {
            let mut rounds = Vec::new();
            let mut previous_was_end = true;
            for event in self.events() {
                match event {
                    Event::Start(_) => {
                        if previous_was_end {
                            rounds.push(0);
                        }
                        *rounds.last_mut().unwrap() += 1;
                        previous_was_end = false;
                    }
                    Event::End(_) => previous_was_end = true,
                }
            }
            rounds
        }
    }

    #[async_trait]
    impl TranslationBackend for ScriptedBackend {
        async fn generate(&self, _model: &str, prompt: &str) -> String {
            self.events.lock().unwrap().push(Event::Start(prompt.to_string()));

            if let Some((trigger, path)) = &self.snapshot_on {
                if trigger == prompt {
                    *self.snapshot.lock().unwrap() = std::fs::read_to_string(path).ok();
                }
            }

            let delay = self.delays_ms.get(prompt).copied().unwrap_or(1);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.events.lock().unwrap().push(Event::End(prompt.to_string()));
            format!("[{}]", prompt)
        }
    }

    fn config(batch_size: usize) -> TranslateConfig {
        let mut config = Config::default().translate;
        config.batch_size = batch_size;
        config.prompt_template = "{text}".to_string();
        config
    }

    fn records(count: i64) -> Vec<SubtitleRecord> {
        (1..=count)
            .map(|i| SubtitleRecord::new(i, format!("00:00:{:02},000 --> 00:00:{:02},500", i, i), format!("line {}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_three_blocks_two_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("movie_translated.srt");
        let srt = "1\n00:00:01,000 --> 00:00:03,000\nHello.\n\n\
                   2\n00:00:04,000 --> 00:00:06,000\nHow are you?\n\n\
                   3\n00:00:07,000 --> 00:00:09,000\nBye.\n\n";
        let mut subs = parse_srt(srt);

        let backend = Arc::new(ScriptedBackend::default());
        let translator = BatchTranslator::new(backend.clone(), &config(2)).unwrap();
        let stats = translator.translate(&mut subs, &output).await.unwrap();

        assert_eq!(stats, TranslationStats { records: 3, batches: 2 });
        assert_eq!(backend.rounds(), vec![2, 1]);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "1\n00:00:01,000 --> 00:00:03,000\n[Hello.]\n\n\
             2\n00:00:04,000 --> 00:00:06,000\n[How are you?]\n\n\
             3\n00:00:07,000 --> 00:00:09,000\n[Bye.]\n\n"
        );
        assert!(subs.iter().all(|s| s.is_translated()));
    }

    #[tokio::test]
    async fn test_order_independent_of_response_latency() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        let mut subs = records(5);

        let backend = Arc::new(ScriptedBackend::with_delays(&[("line 1", 40), ("line 2", 25), ("line 4", 10)]));
        let translator = BatchTranslator::new(backend.clone(), &config(5)).unwrap();
        translator.translate(&mut subs, &output).await.unwrap();

        let finished: Vec<String> = backend
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::End(p) => Some(p),
                Event::Start(_) => None,
            })
            .collect();
        assert_ne!(finished.first().map(String::as_str), Some("line 1"));

        let reparsed = parse_srt(&std::fs::read_to_string(&output).unwrap());
        let ids: Vec<i64> = reparsed.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        for (record, original) in reparsed.iter().zip(&subs) {
            assert_eq!(record.source_text, format!("[{}]", original.source_text));
            assert_eq!(record.timestamp_range(), original.timestamp_range());
            assert_eq!(original.translated_text(), Some(record.source_text.as_str()));
        }
    }

    #[tokio::test]
    async fn test_batches_never_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        let mut subs = records(7);

        let backend = Arc::new(ScriptedBackend::with_delays(&[
            ("line 1", 30),
            ("line 3", 2),
            ("line 4", 35),
            ("line 5", 20),
            ("line 7", 5),
        ]));
        let translator = BatchTranslator::new(backend.clone(), &config(3)).unwrap();
        let stats = translator.translate(&mut subs, &output).await.unwrap();

        assert_eq!(stats.batches, 3);
        assert_eq!(backend.rounds(), vec![3, 3, 1]);

        let events = backend.events();
        let position = |event: Event| events.iter().position(|e| *e == event).unwrap();
        let batches: Vec<Vec<i64>> = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]];
        for pair in batches.windows(2) {
            let last_end = pair[0]
                .iter()
                .map(|i| position(Event::End(format!("line {}", i))))
                .max()
                .unwrap();
            let first_start = pair[1]
                .iter()
                .map(|i| position(Event::Start(format!("line {}", i))))
                .min()
                .unwrap();
            assert!(last_end < first_start, "batch overlap in {:?}", events);
        }
    }

    #[tokio::test]
    async fn test_failed_request_only_affects_its_record() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        let mut subs = records(3);

        let mut backend = MockTranslationBackend::new();
        backend
            .expect_generate()
            .times(3)
            .returning(|_, prompt| {
                if prompt == "line 2" {
                    "Error: 500".to_string()
                } else {
                    prompt.replace("line", "linie")
                }
            });

        let translator = BatchTranslator::new(Arc::new(backend), &config(3)).unwrap();
        translator.translate(&mut subs, &output).await.unwrap();

        assert_eq!(subs[0].translated_text(), Some("linie 1"));
        assert_eq!(subs[1].translated_text(), Some("Error: 500"));
        assert_eq!(subs[2].translated_text(), Some("linie 3"));
        assert!(std::fs::read_to_string(&output).unwrap().contains("2\n00:00:02,000 --> 00:00:02,500\nError: 500\n\n"));
    }

    #[tokio::test]
    async fn test_existing_translations_are_kept_and_written() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        let mut subs = records(3);
        subs[1].set_translation("gata").unwrap();

        let mut backend = MockTranslationBackend::new();
        backend
            .expect_generate()
            .times(2)
            .returning(|_, prompt| {
                assert_ne!(prompt, "line 2");
                prompt.replace("line", "linie")
            });

        let stats = BatchTranslator::new(Arc::new(backend), &config(3))
            .unwrap()
            .translate(&mut subs, &output)
            .await
            .unwrap();

        assert_eq!(stats, TranslationStats { records: 3, batches: 1 });
        assert_eq!(subs[1].translated_text(), Some("gata"));
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "1\n00:00:01,000 --> 00:00:01,500\nlinie 1\n\n\
             2\n00:00:02,000 --> 00:00:02,500\ngata\n\n\
             3\n00:00:03,000 --> 00:00:03,500\nlinie 3\n\n"
        );
    }

    #[tokio::test]
    async fn test_completed_batches_are_on_disk_before_next_batch() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        let mut subs = records(3);

        let backend = Arc::new(ScriptedBackend {
            snapshot_on: Some(("line 3".to_string(), output.clone())),
            ..Default::default()
        });
        let translator = BatchTranslator::new(backend.clone(), &config(2)).unwrap();
        translator.translate(&mut subs, &output).await.unwrap();

        let snapshot = backend.snapshot.lock().unwrap().clone().unwrap();
        let ids: Vec<i64> = parse_srt(&snapshot).iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_identity_translation_reproduces_source() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        let srt = "4\n00:00:01,000 --> 00:00:02,000\nTwo\nlines\n\n9\n00:00:03,000 --> 00:00:04,000\nOne\n\n";
        let mut subs = parse_srt(srt);

        let mut backend = MockTranslationBackend::new();
        backend.expect_generate().returning(|_, prompt| prompt.to_string());

        BatchTranslator::new(Arc::new(backend), &config(1))
            .unwrap()
            .translate(&mut subs, &output)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), srt);
    }

    #[tokio::test]
    async fn test_model_and_prompt_template_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        let mut subs = records(1);

        let mut backend = MockTranslationBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|model, prompt| {
                assert_eq!(model, "gemma3:12b");
                assert_eq!(prompt, "Give me only the Romanian translation: 'line 1'");
                "rândul 1".to_string()
            });

        let config = Config::default().translate;
        BatchTranslator::new(Arc::new(backend), &config)
            .unwrap()
            .translate(&mut subs, &output)
            .await
            .unwrap();

        assert_eq!(subs[0].translated_text(), Some("rândul 1"));
    }

    #[tokio::test]
    async fn test_no_records_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");

        let backend = MockTranslationBackend::new();
        let stats = BatchTranslator::new(Arc::new(backend), &config(2))
            .unwrap()
            .translate(&mut [], &output)
            .await
            .unwrap();

        assert_eq!(stats, TranslationStats::default());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let backend = MockTranslationBackend::new();
        assert!(BatchTranslator::new(Arc::new(backend), &config(0)).is_err());
    }
}
