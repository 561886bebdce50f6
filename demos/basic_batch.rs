use std::sync::Arc;
use std::time::Duration;

use page_batch_queue::events::names;
use page_batch_queue::*;
use serde_json::Value;

struct FakeOcr;

impl RecognitionStage<String> for FakeOcr {
    async fn process(
        &self,
        page: &String,
        _options: &StageOptions,
    ) -> anyhow::Result<RecognitionResult> {
        tokio::time::sleep(Duration::from_millis(120)).await;
        if page.ends_with("blank.png") {
            anyhow::bail!("no text regions found on {}", page);
        }
        Ok(RecognitionResult::new(format!("こんにちは ({})", page)))
    }
}

struct FakeTranslator;

impl TranslationStage for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        options: &StageOptions,
    ) -> anyhow::Result<TranslationResult> {
        tokio::time::sleep(Duration::from_millis(60)).await;
        let target = options
            .get("target_language")
            .and_then(Value::as_str)
            .unwrap_or("en");
        Ok(TranslationResult::new(format!("[{}] hello {}", target, text)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let bus = Arc::new(EventBus::new());
    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();

    bus.subscribe(
        names::BATCH_PROGRESS,
        Arc::new(|payload: &Value| {
            println!(
                "{} ({:.0}%, ~{}ms left)",
                payload["message"].as_str().unwrap_or_default(),
                payload["progress"].as_f64().unwrap_or_default(),
                payload["remainingTime"]
            );
        }),
    );
    bus.subscribe(
        names::BATCH_ERROR,
        Arc::new(|payload: &Value| println!("  page failed: {}", payload["error"])),
    );
    bus.subscribe(
        names::BATCH_COMPLETED,
        Arc::new(move |payload: &Value| {
            let _ = done_tx.send(payload["results"].clone());
        }),
    );

    let mut translation_defaults = StageOptions::new();
    translation_defaults.insert("target_language".into(), "en".into());
    let config = SchedulerConfig::builder()
        .with_translation_options(translation_defaults)
        .build();

    let scheduler = Scheduler::new(config, FakeOcr, FakeTranslator, bus.clone());
    scheduler.start()?;

    let pages = vec![
        "chapter-1/001.png".to_string(),
        "chapter-1/002-blank.png".to_string(),
        "chapter-1/003.png".to_string(),
    ];
    let batch_id = scheduler.create_batch(
        BatchRequest::new(pages)
            .with_name("Chapter 1")
            .auto_start(true),
    )?;
    println!("Started {}", batch_id);

    if let Some(summary) = done_rx.recv().await {
        println!(
            "Done: {} completed, {} failed in {}ms",
            summary["completedPages"], summary["failedPages"], summary["totalDuration"]
        );
    }

    println!("{:#?}", scheduler.get_stats());
    scheduler.shutdown();
    Ok(())
}
