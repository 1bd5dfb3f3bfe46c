//! Bridge facade
//!
//! The single object the host talks to. It owns the report store, the
//! lifecycle observer and the metrics registry, and reaches its collaborators
//! only through the ports handed over in a [`BridgeContext`].
//!
//! Crash reporting and lifecycle tracking are initialized separately. Each
//! init is idempotent: a repeated call reports [`InitOutcome::AlreadyInitialized`]
//! and has no side effect.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lifeline_core::config::{Config, CrashReportingConfig, DEFAULT_CACHE_CAPACITY};
use lifeline_core::domain::{
    constants_table, Breadcrumb, BreadcrumbLevel, DomainError, LifecycleEvent, SessionMetadata,
    SessionState, User,
};
use lifeline_core::ports::{
    IClock, ICrashReportingClient, IEnvironmentProvider, IEventSink, IKeyValueStore,
    ILifecycleSource, LifecycleCallbacks, UiUnit,
};
use lifeline_telemetry::{
    BoundedReportStore, CrashFilter, LocalEnvironment, MetricsRegistry, StoredReport,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::clock::SystemClock;
use crate::emitter::MeteredSink;
use crate::observer::LifecycleObserver;
use crate::BridgeError;

/// Breadcrumbs kept in the session history; older ones are dropped first.
pub const MAX_BREADCRUMBS: usize = 32;

/// Result of an init call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The concern was initialized by this call
    Initialized,
    /// An earlier call already initialized it; nothing was done
    AlreadyInitialized,
    /// The configuration disables the concern; nothing was done
    Disabled,
}

/// Result of caching a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Stored; `evicted` older reports were dropped to respect the capacity
    Stored { evicted: usize },
    /// Rejected by the crash filter and not stored
    Vetoed,
}

// ============================================================================
// Context
// ============================================================================

/// Collaborators injected into the bridge at construction
pub struct BridgeContext {
    store_backend: Arc<dyn IKeyValueStore>,
    crash_client: Arc<dyn ICrashReportingClient>,
    sink: Arc<dyn IEventSink>,
    lifecycle_source: Arc<dyn ILifecycleSource>,
    environment: Option<Arc<dyn IEnvironmentProvider>>,
    clock: Option<Arc<dyn IClock>>,
    cache_capacity: i64,
}

impl BridgeContext {
    pub fn new(
        store_backend: Arc<dyn IKeyValueStore>,
        crash_client: Arc<dyn ICrashReportingClient>,
        sink: Arc<dyn IEventSink>,
        lifecycle_source: Arc<dyn ILifecycleSource>,
    ) -> Self {
        Self {
            store_backend,
            crash_client,
            sink,
            lifecycle_source,
            environment: None,
            clock: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY as i64,
        }
    }

    /// Defaults to [`LocalEnvironment::collect`].
    pub fn with_environment(mut self, environment: Arc<dyn IEnvironmentProvider>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn IClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Initial report cache capacity (clamped into `0..=64`).
    pub fn with_cache_capacity(mut self, capacity: i64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Applies the `cache` section of a loaded configuration.
    pub fn with_config(self, config: &Config) -> Self {
        self.with_cache_capacity(config.cache.capacity)
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Facade over the report cache, lifecycle tracking and session metadata
pub struct Bridge {
    store: Arc<BoundedReportStore>,
    observer: Arc<LifecycleObserver>,
    crash_client: Arc<dyn ICrashReportingClient>,
    lifecycle_source: Arc<dyn ILifecycleSource>,
    environment: Arc<dyn IEnvironmentProvider>,
    clock: Arc<dyn IClock>,
    sink: Arc<dyn IEventSink>,
    metrics: Arc<MetricsRegistry>,
    crash_config: Mutex<Option<CrashReportingConfig>>,
    /// Set once the SDK's own init has run; only touched under `crash_config`.
    crash_client_started: AtomicBool,
    lifecycle_initialized: Mutex<bool>,
    metadata: Mutex<SessionMetadata>,
    device_id: String,
}

impl Bridge {
    pub fn new(context: BridgeContext) -> Result<Self, BridgeError> {
        let metrics = Arc::new(
            MetricsRegistry::new().map_err(|e| BridgeError::Metrics(format!("{:#}", e)))?,
        );
        let environment = context
            .environment
            .unwrap_or_else(|| Arc::new(LocalEnvironment::collect()) as Arc<dyn IEnvironmentProvider>);
        let clock = context
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn IClock>);

        let sink: Arc<dyn IEventSink> =
            Arc::new(MeteredSink::new(context.sink, Arc::clone(&metrics)));
        let observer = Arc::new(LifecycleObserver::new(Arc::clone(&sink), Arc::clone(&clock)));
        let store = Arc::new(BoundedReportStore::with_capacity(
            context.store_backend,
            context.cache_capacity,
        ));
        let device_id = environment.device_id();

        debug!(capacity = store.capacity(), "Bridge constructed");

        Ok(Self {
            store,
            observer,
            crash_client: context.crash_client,
            lifecycle_source: context.lifecycle_source,
            environment,
            clock,
            sink,
            metrics,
            crash_config: Mutex::new(None),
            crash_client_started: AtomicBool::new(false),
            lifecycle_initialized: Mutex::new(false),
            metadata: Mutex::new(SessionMetadata::default()),
            device_id,
        })
    }

    // ------------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------------

    /// Initializes crash reporting and installs the crash filter as the
    /// SDK's before-send hook.
    ///
    /// The configuration is validated first; an invalid one initializes
    /// nothing and may be retried.
    pub fn init(&self, config: &CrashReportingConfig) -> Result<InitOutcome, BridgeError> {
        let mut current = lock(&self.crash_config);
        if current.is_some() {
            info!("Crash reporting already initialized; ignoring init");
            return Ok(InitOutcome::AlreadyInitialized);
        }
        if !config.enabled {
            info!("Crash reporting disabled by configuration");
            return Ok(InitOutcome::Disabled);
        }
        config.check()?;

        // A retry after a failed hook install must not start the SDK twice
        if !self.crash_client_started.load(Ordering::SeqCst) {
            self.crash_client
                .init(config)
                .map_err(|e| BridgeError::CrashClient(format!("{:#}", e)))?;
            self.crash_client_started.store(true, Ordering::SeqCst);
        }
        self.crash_client
            .set_before_send(CrashFilter::hook())
            .map_err(|e| BridgeError::CrashClient(format!("{:#}", e)))?;

        *current = Some(config.clone());
        info!(
            version = %config.version,
            custom_endpoint = config.custom_endpoint.as_deref().unwrap_or(""),
            "Crash reporting initialized"
        );
        Ok(InitOutcome::Initialized)
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.crash_config).is_some()
    }

    /// Registers the lifecycle observer with the host exactly once and adopts
    /// `current` (the unit already on screen, if any).
    pub fn init_lifecycle_tracking(
        &self,
        current: Option<Arc<dyn UiUnit>>,
    ) -> Result<InitOutcome, BridgeError> {
        {
            let mut initialized = lock(&self.lifecycle_initialized);
            if *initialized {
                info!("Lifecycle tracking already initialized; ignoring init");
                return Ok(InitOutcome::AlreadyInitialized);
            }
            let callbacks: Arc<dyn LifecycleCallbacks> = self.observer.clone();
            self.lifecycle_source
                .register(callbacks)
                .map_err(|e| BridgeError::Lifecycle(format!("{:#}", e)))?;
            *initialized = true;
        }

        self.observer.attach(current.as_ref());
        info!("Lifecycle tracking initialized");
        Ok(InitOutcome::Initialized)
    }

    pub fn is_lifecycle_initialized(&self) -> bool {
        *lock(&self.lifecycle_initialized)
    }

    // ------------------------------------------------------------------------
    // Report cache
    // ------------------------------------------------------------------------

    /// Caches a serialized crash report for later delivery.
    ///
    /// Reports raised by the script runtime are vetoed and not stored. The
    /// durable write runs on the blocking pool.
    pub async fn cache_report(&self, payload: String) -> Result<CacheOutcome, BridgeError> {
        if let Ok(report) = serde_json::from_str::<Value>(&payload) {
            if !CrashFilter::filter_value(&report) {
                self.metrics.record_vetoed();
                return Ok(CacheOutcome::Vetoed);
            }
        }

        let store = Arc::clone(&self.store);
        let receipt = tokio::task::spawn_blocking(move || store.cache(&payload)).await??;

        self.metrics.record_cached(receipt.evicted, receipt.len);
        if receipt.evicted > 0 {
            debug!(evicted = receipt.evicted, "Oldest cached reports evicted");
        }
        Ok(CacheOutcome::Stored {
            evicted: receipt.evicted,
        })
    }

    /// Returns every cached report in insertion order and empties the cache.
    pub async fn flush_report_cache(&self) -> Result<Vec<StoredReport>, BridgeError> {
        let store = Arc::clone(&self.store);
        let reports = tokio::task::spawn_blocking(move || store.flush()).await??;
        self.metrics.record_flushed(reports.len());
        Ok(reports)
    }

    pub async fn is_cache_empty(&self) -> Result<bool, BridgeError> {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || store.is_empty()).await??)
    }

    /// Drops every cached report without returning them.
    pub async fn clear_report_cache(&self) -> Result<(), BridgeError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.clear()).await??;
        self.metrics.set_cache_size(0);
        Ok(())
    }

    /// Sets the report cache capacity, clamped into `0..=64`.
    ///
    /// Returns the capacity applied. Existing reports are evicted on the next
    /// insert, not now.
    pub fn set_cache_capacity(&self, capacity: i64) -> usize {
        let applied = self.store.set_capacity(capacity);
        if applied as i64 != capacity {
            warn!(requested = capacity, applied, "Report cache capacity clamped");
        }
        applied
    }

    pub fn cache_capacity(&self) -> usize {
        self.store.capacity()
    }

    /// The underlying store, for tooling that needs to inspect or trim it.
    pub fn report_store(&self) -> &Arc<BoundedReportStore> {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Session metadata
    // ------------------------------------------------------------------------

    pub fn set_user(&self, user: User) -> Result<(), BridgeError> {
        let mut metadata = lock(&self.metadata);
        self.crash_client.set_user(&user).map_err(client_error)?;
        metadata.user = user;
        Ok(())
    }

    /// Replaces the tag set.
    pub fn set_tags<I, S>(&self, tags: I) -> Result<(), BridgeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        let mut metadata = lock(&self.metadata);
        self.crash_client.set_tags(&tags).map_err(client_error)?;
        metadata.tags = tags;
        Ok(())
    }

    /// Unions `tags` into the tag set.
    pub fn add_tags<I, S>(&self, tags: I) -> Result<(), BridgeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut metadata = lock(&self.metadata);
        let mut next = metadata.clone();
        next.add_tags(tags);
        self.crash_client.set_tags(&next.tags).map_err(client_error)?;
        metadata.tags = next.tags;
        Ok(())
    }

    /// Replaces the custom data.
    pub fn set_custom_data(&self, data: Map<String, Value>) -> Result<(), BridgeError> {
        let mut metadata = lock(&self.metadata);
        self.crash_client
            .set_custom_data(&data)
            .map_err(client_error)?;
        metadata.custom_data = data;
        Ok(())
    }

    /// Merges `data` into the custom data; new keys win.
    pub fn add_custom_data(&self, data: Map<String, Value>) -> Result<(), BridgeError> {
        let mut metadata = lock(&self.metadata);
        let mut next = metadata.clone();
        next.merge_custom_data(data);
        self.crash_client
            .set_custom_data(&next.custom_data)
            .map_err(client_error)?;
        metadata.custom_data = next.custom_data;
        Ok(())
    }

    /// Records a breadcrumb. `level` is parsed case-insensitively and falls
    /// back to `info`.
    pub fn record_breadcrumb(
        &self,
        message: &str,
        category: Option<&str>,
        level: &str,
        custom_data: Map<String, Value>,
    ) -> Result<Breadcrumb, BridgeError> {
        if message.trim().is_empty() {
            return Err(DomainError::MissingField("breadcrumb.message".into()).into());
        }

        let breadcrumb = Breadcrumb::new(message, self.clock.now_ms())
            .with_category(category.unwrap_or_default())
            .with_level(BreadcrumbLevel::parse_lenient(level))
            .with_custom_data(custom_data);

        let mut metadata = lock(&self.metadata);
        self.crash_client
            .record_breadcrumb(&breadcrumb)
            .map_err(client_error)?;
        metadata.breadcrumbs.push(breadcrumb.clone());
        let excess = metadata.breadcrumbs.len().saturating_sub(MAX_BREADCRUMBS);
        metadata.breadcrumbs.drain(..excess);
        Ok(breadcrumb)
    }

    pub fn clear_breadcrumbs(&self) -> Result<(), BridgeError> {
        let mut metadata = lock(&self.metadata);
        self.crash_client.clear_breadcrumbs().map_err(client_error)?;
        metadata.breadcrumbs.clear();
        Ok(())
    }

    /// Resets user, tags, custom data and breadcrumbs in one step.
    ///
    /// The metadata lock is held throughout, so no setter interleaves. The
    /// local copy is reset even when mirroring to the SDK fails; the first
    /// SDK error is returned.
    pub fn clear_session(&self) -> Result<(), BridgeError> {
        let mut metadata = lock(&self.metadata);
        *metadata = SessionMetadata::default();

        let results = [
            self.crash_client.set_user(&metadata.user),
            self.crash_client.set_tags(&metadata.tags),
            self.crash_client.set_custom_data(&metadata.custom_data),
            self.crash_client.clear_breadcrumbs(),
        ];
        drop(metadata);

        debug!("Session metadata cleared");
        match results.into_iter().find_map(Result::err) {
            Some(e) => Err(client_error(e)),
            None => Ok(()),
        }
    }

    /// Read-back of the session metadata.
    pub fn session_metadata(&self) -> SessionMetadata {
        lock(&self.metadata).clone()
    }

    // ------------------------------------------------------------------------
    // Environment, events and metrics
    // ------------------------------------------------------------------------

    pub fn environment_snapshot(&self) -> BTreeMap<String, Value> {
        self.environment.snapshot()
    }

    /// Stable device identifier, read from memory.
    pub fn unique_device_id(&self) -> &str {
        &self.device_id
    }

    /// Event names plus device facts, handed to the consumer at startup.
    pub fn constants(&self) -> BTreeMap<String, Value> {
        constants_table(
            &self.device_id,
            &self.environment.os_version(),
            &self.environment.platform(),
        )
    }

    /// Pushes a `ViewLoaded` event with a caller-measured duration.
    pub fn report_view_loaded(&self, name: &str, duration_ms: u64) {
        self.sink.emit(&LifecycleEvent::ViewLoaded {
            name: name.to_string(),
            time_ms: duration_ms,
        });
    }

    /// Name of the foreground unit, empty when none is tracked.
    pub fn current_view_name(&self) -> String {
        self.observer.current_unit_name()
    }

    pub fn session_state(&self) -> SessionState {
        self.observer.session_state()
    }

    /// The observer, for hosts that deliver callbacks themselves.
    pub fn observer(&self) -> &Arc<LifecycleObserver> {
        &self.observer
    }

    /// Metrics in Prometheus text exposition format.
    pub fn metrics_text(&self) -> Result<String, BridgeError> {
        self.metrics
            .encode()
            .map_err(|e| BridgeError::Metrics(format!("{:#}", e)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn client_error(e: anyhow::Error) -> BridgeError {
    warn!(error = %e, "Crash reporting client call failed");
    BridgeError::CrashClient(format!("{:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::emitter::RecordingSink;
    use crate::host::{ManualLifecycleSource, RecordingCrashClient};
    use lifeline_core::config::ConfigBuilder;
    use lifeline_telemetry::MemoryKeyValueStore;
    use serde_json::json;

    struct Fixture {
        bridge: Bridge,
        client: Arc<RecordingCrashClient>,
        sink: Arc<RecordingSink>,
        source: Arc<ManualLifecycleSource>,
        backend: Arc<MemoryKeyValueStore>,
    }

    fn fixture() -> Fixture {
        let client = Arc::new(RecordingCrashClient::new());
        let sink = Arc::new(RecordingSink::new());
        let source = Arc::new(ManualLifecycleSource::new());
        let backend = Arc::new(MemoryKeyValueStore::new());
        let context = BridgeContext::new(
            backend.clone(),
            client.clone(),
            sink.clone(),
            source.clone(),
        )
        .with_environment(Arc::new(LocalEnvironment::with_device_id("device-1")))
        .with_clock(Arc::new(ManualClock::starting_at(1_000)));
        Fixture {
            bridge: Bridge::new(context).unwrap(),
            client,
            sink,
            source,
            backend,
        }
    }

    fn config() -> CrashReportingConfig {
        ConfigBuilder::new()
            .api_key("key-1")
            .version("1.0.0")
            .build()
            .crash_reporting
    }

    #[test]
    fn test_init_is_idempotent() {
        let f = fixture();
        assert_eq!(f.bridge.init(&config()).unwrap(), InitOutcome::Initialized);
        assert_eq!(
            f.bridge.init(&config()).unwrap(),
            InitOutcome::AlreadyInitialized
        );
        assert_eq!(f.client.init_calls(), 1);
        assert!(f.bridge.is_initialized());
    }

    #[test]
    fn test_init_installs_crash_filter_hook() {
        let f = fixture();
        f.bridge.init(&config()).unwrap();
        let scripted = json!({"Details": {"Error": {"Message": "JavascriptException: boom"}}});
        assert_eq!(f.client.would_send(&scripted), Some(false));
        assert_eq!(f.client.would_send(&json!({})), Some(true));
    }

    #[test]
    fn test_invalid_config_initializes_nothing() {
        let f = fixture();
        let mut bad = config();
        bad.api_key = String::new();
        assert!(matches!(
            f.bridge.init(&bad),
            Err(BridgeError::Invalid(DomainError::MissingField(_)))
        ));
        assert!(!f.bridge.is_initialized());
        assert_eq!(f.client.init_calls(), 0);

        assert_eq!(f.bridge.init(&config()).unwrap(), InitOutcome::Initialized);
    }

    #[test]
    fn test_failed_hook_install_retries_without_second_client_init() {
        let f = fixture();
        f.client.set_failing_hook(true);
        assert!(matches!(
            f.bridge.init(&config()),
            Err(BridgeError::CrashClient(_))
        ));
        assert!(!f.bridge.is_initialized());
        assert_eq!(f.client.init_calls(), 1);

        f.client.set_failing_hook(false);
        assert_eq!(f.bridge.init(&config()).unwrap(), InitOutcome::Initialized);
        assert_eq!(f.client.init_calls(), 1);
        assert_eq!(f.client.would_send(&json!({})), Some(true));
    }

    #[test]
    fn test_disabled_config_is_reported() {
        let f = fixture();
        let mut disabled = config();
        disabled.enabled = false;
        assert_eq!(f.bridge.init(&disabled).unwrap(), InitOutcome::Disabled);
        assert!(!f.bridge.is_initialized());
    }

    #[test]
    fn test_lifecycle_init_registers_once() {
        let f = fixture();
        let main = crate::host::NamedUnit::shared("Main");
        assert_eq!(
            f.bridge.init_lifecycle_tracking(Some(main.clone())).unwrap(),
            InitOutcome::Initialized
        );
        assert_eq!(
            f.bridge.init_lifecycle_tracking(Some(main)).unwrap(),
            InitOutcome::AlreadyInitialized
        );
        assert_eq!(f.source.registrations(), 1);
        assert_eq!(f.sink.events().len(), 1);
        assert_eq!(f.bridge.current_view_name(), "Main");
    }

    #[tokio::test]
    async fn test_vetoed_report_is_not_cached() {
        let f = fixture();
        let scripted = json!({"Details": {"Error": {"Message": "JavascriptException: boom"}}});
        let outcome = f.bridge.cache_report(scripted.to_string()).await.unwrap();
        assert_eq!(outcome, CacheOutcome::Vetoed);
        assert!(f.bridge.is_cache_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_report_is_surfaced() {
        let f = fixture();
        let err = f.bridge.cache_report("{oops".to_string()).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Store(lifeline_telemetry::StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_surfaced() {
        let f = fixture();
        f.backend.set_fail_writes(true);
        let err = f
            .bridge
            .cache_report(json!({"id": 1}).to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Store(lifeline_telemetry::StoreError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_capacity_is_clamped_and_applied_on_next_insert() {
        let f = fixture();
        assert_eq!(f.bridge.set_cache_capacity(-5), 0);
        assert_eq!(f.bridge.set_cache_capacity(1000), 64);
        f.bridge.set_cache_capacity(2);

        for id in 0..3 {
            f.bridge
                .cache_report(json!({ "id": id }).to_string())
                .await
                .unwrap();
        }
        let reports = f.bridge.flush_report_cache().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].as_value()["id"], 1);
        assert!(f.bridge.is_cache_empty().await.unwrap());
    }

    #[test]
    fn test_metadata_setters_mirror_to_client() {
        let f = fixture();
        f.bridge.set_user(User::new("u-42").with_email("a@b.c")).unwrap();
        f.bridge.set_tags(["beta"]).unwrap();
        f.bridge.add_tags(["paid", "beta"]).unwrap();

        let mut first = Map::new();
        first.insert("plan".into(), json!("free"));
        first.insert("region".into(), json!("eu"));
        f.bridge.set_custom_data(first).unwrap();
        let mut second = Map::new();
        second.insert("plan".into(), json!("pro"));
        f.bridge.add_custom_data(second).unwrap();

        let local = f.bridge.session_metadata();
        assert_eq!(local.user.identifier, "u-42");
        assert_eq!(
            local.tags.iter().cloned().collect::<Vec<_>>(),
            vec!["beta".to_string(), "paid".to_string()]
        );
        assert_eq!(local.custom_data["plan"], "pro");
        assert_eq!(local.custom_data["region"], "eu");

        let remote = f.client.metadata();
        assert_eq!(remote.user, local.user);
        assert_eq!(remote.tags, local.tags);
        assert_eq!(remote.custom_data, local.custom_data);
    }

    #[test]
    fn test_breadcrumb_level_is_lenient() {
        let f = fixture();
        let crumb = f
            .bridge
            .record_breadcrumb("opened settings", Some("navigation"), "WARNING", Map::new())
            .unwrap();
        assert_eq!(crumb.level, BreadcrumbLevel::Warning);
        assert_eq!(crumb.timestamp, 1_000);

        let crumb = f
            .bridge
            .record_breadcrumb("tapped", None, "loud", Map::new())
            .unwrap();
        assert_eq!(crumb.level, BreadcrumbLevel::Info);
        assert_eq!(f.client.metadata().breadcrumbs.len(), 2);

        assert!(f.bridge.record_breadcrumb("  ", None, "info", Map::new()).is_err());
    }

    #[test]
    fn test_breadcrumb_history_is_bounded() {
        let f = fixture();
        for i in 0..(MAX_BREADCRUMBS + 5) {
            f.bridge
                .record_breadcrumb(&format!("crumb {i}"), None, "info", Map::new())
                .unwrap();
        }
        let crumbs = f.bridge.session_metadata().breadcrumbs;
        assert_eq!(crumbs.len(), MAX_BREADCRUMBS);
        assert_eq!(crumbs[0].message, "crumb 5");
    }

    #[test]
    fn test_clear_session_resets_everything() {
        let f = fixture();
        f.bridge.set_user(User::new("u-1")).unwrap();
        f.bridge.set_tags(["a", "b"]).unwrap();
        let mut data = Map::new();
        data.insert("k".into(), json!(1));
        f.bridge.set_custom_data(data).unwrap();
        f.bridge
            .record_breadcrumb("hello", None, "debug", Map::new())
            .unwrap();

        f.bridge.clear_session().unwrap();

        let local = f.bridge.session_metadata();
        assert!(local.is_cleared());
        assert!(local.user.is_anonymous);
        assert!(f.client.metadata().is_cleared());
    }

    #[test]
    fn test_client_failure_leaves_metadata_untouched() {
        let f = fixture();
        f.bridge.set_tags(["a"]).unwrap();
        f.client.set_failing(true);
        assert!(matches!(
            f.bridge.set_tags(["b"]),
            Err(BridgeError::CrashClient(_))
        ));
        assert_eq!(
            f.bridge.session_metadata().tags,
            BTreeSet::from(["a".to_string()])
        );
    }

    #[test]
    fn test_constants_and_device_id() {
        let f = fixture();
        assert_eq!(f.bridge.unique_device_id(), "device-1");
        let constants = f.bridge.constants();
        assert_eq!(constants["DEVICE_ID"], "device-1");
        assert_eq!(constants["ON_SESSION_END"], "ON_SESSION_END");
    }

    #[tokio::test]
    async fn test_metrics_track_activity() {
        let f = fixture();
        f.bridge
            .cache_report(json!({"id": 1}).to_string())
            .await
            .unwrap();
        f.bridge.report_view_loaded("Home", 87);

        let text = f.bridge.metrics_text().unwrap();
        assert!(text.contains("lifeline_reports_cached_total 1"));
        assert!(text.contains("lifeline_lifecycle_events_total{event=\"ON_VIEW_LOADED\"} 1"));
        assert_eq!(
            f.sink.events(),
            vec![LifecycleEvent::ViewLoaded {
                name: "Home".into(),
                time_ms: 87
            }]
        );
    }
}
