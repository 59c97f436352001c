//! The poll driver: refresh the store, emit one record, sleep, repeat.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use ufm_streamer_sdk::Emitter;

use crate::store::{ApiSource, ApiStore};

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the update cycle completed without error.
    pub refreshed: bool,
    /// Sequence number of the emitted record, if every output accepted it.
    pub emitted: Option<u64>,
}

/// Owns the per-process state and drives the tick loop.
pub struct Streamer<S> {
    source: S,
    store: ApiStore,
    emitter: Emitter,
    interval: Duration,
    ticks: u64,
}

impl<S: ApiSource> Streamer<S> {
    pub fn new(source: S, store: ApiStore, emitter: Emitter, interval: Duration) -> Self {
        Self {
            source,
            store,
            emitter,
            interval,
            ticks: 0,
        }
    }

    /// Fill empty slots from the file cache. Call once before the first tick.
    pub fn warm_up(&mut self) -> usize {
        self.store.load_from_cache()
    }

    /// Run one update cycle and emit a record.
    ///
    /// A failed update is logged and the record is still emitted with the
    /// slots as they are. A failed emission is logged and reported.
    pub async fn tick(&mut self) -> TickReport {
        self.ticks += 1;

        let refreshed = match self.store.update(&self.source).await {
            Ok(fetched) => {
                debug!(tick = self.ticks, fetched = fetched.len(), "store refreshed");
                true
            }
            Err(e) => {
                warn!(tick = self.ticks, error = %e, "failed to refresh UFM data, streaming retained values");
                false
            }
        };

        let emitted = match self.emitter.emit(&self.store).await {
            Ok(record) => {
                info!(
                    tick = self.ticks,
                    sequence = record.sequence_stamp,
                    sections = record.sections.len(),
                    "streamed record"
                );
                Some(record.sequence_stamp)
            }
            Err(e) => {
                warn!(tick = self.ticks, error = %e, "failed to stream record");
                None
            }
        };

        TickReport { refreshed, emitted }
    }

    /// Warm the cache, then tick every interval until Ctrl-C.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Warm the cache, then tick every interval until `shutdown` completes.
    ///
    /// The first tick runs immediately. A tick that overruns the interval
    /// delays the following ones instead of bursting.
    pub async fn run_until<F>(&mut self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let warmed = self.warm_up();
        info!(
            interval_secs = self.interval.as_secs(),
            warmed,
            outputs = self.emitter.output_count(),
            "streaming started"
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(ticks = self.ticks, "shutdown requested, stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        Ok(())
    }

    pub fn store(&self) -> &ApiStore {
        &self.store
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileCache;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use ufm_streamer_adapters::AdapterError;
    use ufm_streamer_sdk::{EndpointKind, ForwardMessage, Output, StreamToggles};

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        down: AtomicBool,
    }

    #[async_trait]
    impl ApiSource for FakeSource {
        async fn fetch(&self, path: &str) -> Result<Value, AdapterError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(AdapterError::Connection("ufm unreachable".to_string()));
            }
            Ok(json!([{"path": path, "call": n}]))
        }
    }

    fn streamer(
        dir: &tempfile::TempDir,
        toggles: StreamToggles,
    ) -> (Streamer<FakeSource>, mpsc::Receiver<ForwardMessage>) {
        let (output, rx) = Output::channel(64);
        let emitter = Emitter::builder()
            .output(output)
            .server_name("ufm-test")
            .toggles(toggles)
            .build();
        let store = ApiStore::new(FileCache::new(dir.path()));
        let streamer = Streamer::new(
            FakeSource::default(),
            store,
            emitter,
            Duration::from_secs(10),
        );
        (streamer, rx)
    }

    #[tokio::test]
    async fn test_tick_refreshes_and_emits() {
        let dir = tempfile::tempdir().unwrap();
        let (mut streamer, mut rx) = streamer(&dir, StreamToggles::all());

        let report = streamer.tick().await;
        assert_eq!(
            report,
            TickReport {
                refreshed: true,
                emitted: Some(1),
            }
        );

        let message = rx.try_recv().unwrap();
        assert_eq!(message.record.ufm_server_name, "ufm-test");
        assert_eq!(
            message.record.get(EndpointKind::Systems),
            streamer.store().get(EndpointKind::Systems)
        );
        assert!(!message.record.contains(EndpointKind::Versioning));
    }

    #[tokio::test]
    async fn test_disabled_sections_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let toggles = StreamToggles {
            systems: true,
            ports: false,
            links: true,
            alarms: false,
        };
        let (mut streamer, mut rx) = streamer(&dir, toggles);

        streamer.tick().await;
        let message = rx.try_recv().unwrap();
        let record = serde_json::to_value(&message.record).unwrap();

        assert!(record.get("systems").is_some());
        assert!(record.get("links").is_some());
        assert!(record.get("ports").is_none());
        assert!(record.get("alarms").is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_still_emits() {
        let dir = tempfile::tempdir().unwrap();
        let (mut streamer, mut rx) = streamer(&dir, StreamToggles::all());

        streamer.tick().await;
        let first = rx.try_recv().unwrap();

        streamer.source.down.store(true, Ordering::SeqCst);
        let report = streamer.tick().await;
        assert!(!report.refreshed);
        assert_eq!(report.emitted, Some(2));

        let second = rx.try_recv().unwrap();
        assert_eq!(second.record.sequence_stamp, 2);
        assert_eq!(
            second.record.get(EndpointKind::Ports),
            first.record.get(EndpointKind::Ports)
        );
    }

    #[tokio::test]
    async fn test_failed_emit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (mut streamer, rx) = streamer(&dir, StreamToggles::all());
        drop(rx);

        let report = streamer.tick().await;
        assert!(report.refreshed);
        assert_eq!(report.emitted, None);
        assert_eq!(streamer.emitter().metadata().next_sequence(), 2);
    }

    #[tokio::test]
    async fn test_warm_up_feeds_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.save_endpoint(EndpointKind::Links, &json!([{"source_port": "cached"}]));

        let (mut streamer, mut rx) = streamer(&dir, StreamToggles::all());
        streamer.source.down.store(true, Ordering::SeqCst);

        assert_eq!(streamer.warm_up(), 1);
        streamer.tick().await;

        let message = rx.try_recv().unwrap();
        assert_eq!(
            message.record.get(EndpointKind::Links),
            Some(&json!([{"source_port": "cached"}]))
        );
        assert_eq!(message.record.get(EndpointKind::Systems), Some(&Value::Null));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_ticks_on_interval() {
        let dir = tempfile::tempdir().unwrap();
        let (mut streamer, mut rx) = streamer(&dir, StreamToggles::all());

        // Ticks at 0s, 10s and 20s, then shutdown at 25s
        streamer
            .run_until(time::sleep(Duration::from_secs(25)))
            .await
            .unwrap();

        assert_eq!(streamer.ticks(), 3);
        let mut sequences = Vec::new();
        while let Ok(message) = rx.try_recv() {
            sequences.push(message.record.sequence_stamp);
        }
        assert_eq!(sequences, vec![1, 2, 3]);
    }
}
