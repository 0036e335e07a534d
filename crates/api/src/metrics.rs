use async_trait::async_trait;
use extract::{ExtractionError, ExtractionRecord, ExtractionSource, Extractor, ImagePayload};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
struct SourceCounters {
    requests: AtomicUsize,
    failures: AtomicUsize,
    total_time_us: AtomicU64,
}

impl SourceCounters {
    fn record(&self, duration: Duration, success: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SourceSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let total_us = self.total_time_us.load(Ordering::Relaxed) as f64;

        SourceSnapshot {
            requests,
            failures: self.failures.load(Ordering::Relaxed),
            avg_time_ms: if requests > 0 {
                total_us / requests as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
        }
    }
}

pub struct Metrics {
    url: SourceCounters,
    image: SourceCounters,
    emails_extracted: AtomicUsize,
    phones_extracted: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            url: SourceCounters::default(),
            image: SourceCounters::default(),
            emails_extracted: AtomicUsize::new(0),
            phones_extracted: AtomicUsize::new(0),
        })
    }

    pub fn record_extraction(
        &self,
        source: ExtractionSource,
        duration: Duration,
        outcome: Result<&ExtractionRecord, &ExtractionError>,
    ) {
        let counters = match source {
            ExtractionSource::Url => &self.url,
            ExtractionSource::Image => &self.image,
        };
        counters.record(duration, outcome.is_ok());

        if let Ok(record) = outcome {
            self.emails_extracted.fetch_add(record.emails.len(), Ordering::Relaxed);
            self.phones_extracted.fetch_add(record.phone_numbers.len(), Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let url = self.url.snapshot();
        let image = self.image.snapshot();

        MetricsSnapshot {
            total_requests: url.requests + image.requests,
            failed_requests: url.failures + image.failures,
            url,
            image,
            total_emails_extracted: self.emails_extracted.load(Ordering::Relaxed),
            total_phones_extracted: self.phones_extracted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SourceSnapshot {
    pub requests: usize,
    pub failures: usize,
    pub avg_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub failed_requests: usize,
    pub url: SourceSnapshot,
    pub image: SourceSnapshot,
    pub total_emails_extracted: usize,
    pub total_phones_extracted: usize,
}

/// Wraps an extractor and records every call into [`Metrics`].
pub struct MeteredExtractor<E> {
    inner: E,
    metrics: Arc<Metrics>,
}

impl<E: Extractor> MeteredExtractor<E> {
    pub fn new(inner: E, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl<E: Extractor> Extractor for MeteredExtractor<E> {
    async fn extract_from_image(&self, image: &ImagePayload) -> Result<ExtractionRecord, ExtractionError> {
        let start = Instant::now();
        let result = self.inner.extract_from_image(image).await;
        self.metrics
            .record_extraction(ExtractionSource::Image, start.elapsed(), result.as_ref());
        result
    }

    async fn extract_from_url(&self, url: &str) -> Result<ExtractionRecord, ExtractionError> {
        let start = Instant::now();
        let result = self.inner.extract_from_url(url).await;
        self.metrics
            .record_extraction(ExtractionSource::Url, start.elapsed(), result.as_ref());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubExtractor;

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn extract_from_image(&self, _image: &ImagePayload) -> Result<ExtractionRecord, ExtractionError> {
            Err(ExtractionError::Parse("not json".to_string()))
        }

        async fn extract_from_url(&self, _url: &str) -> Result<ExtractionRecord, ExtractionError> {
            Ok(ExtractionRecord {
                emails: vec!["a@b.io".into(), "c@d.io".into()],
                phone_numbers: vec!["+1 555 0100".into()],
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_metered_extractor_counts_per_source() {
        let metrics = Metrics::new();
        let extractor = MeteredExtractor::new(StubExtractor, metrics.clone());
        let image = ImagePayload::from_data_uri("data:image/png;base64,AAAA").unwrap();

        extractor.extract_from_url("https://x").await.unwrap();
        extractor.extract_from_url("https://y").await.unwrap();
        assert!(extractor.extract_from_image(&image).await.is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.url.requests, 2);
        assert_eq!(snapshot.url.failures, 0);
        assert_eq!(snapshot.image.failures, 1);
        assert_eq!(snapshot.total_emails_extracted, 4);
        assert_eq!(snapshot.total_phones_extracted, 2);
    }

    #[test]
    fn test_empty_metrics() {
        let snapshot = Metrics::new().snapshot();

        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.url.avg_time_ms, 0.0);
    }
}
