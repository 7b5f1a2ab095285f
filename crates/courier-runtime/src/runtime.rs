//! Main runtime: configuration, command registry and the inbound message loop.
//!
//! The runtime owns the [`CommandRegistry`] (with the help command already
//! installed), the [`Router`] and a bounded inbound queue. Transports push
//! messages into the queue through an [`InboundSender`]; the loop hands them
//! to the router one at a time until shutdown.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier_runtime::CourierRuntime;
//!
//! let runtime = CourierRuntime::builder()
//!     .config_file("config/courier.toml")
//!     .hooks(MyHooks)
//!     .build(my_transport)?;
//!
//! runtime.register_provider(Arc::new(UptimeCommands::new()));
//! my_transport_listener.attach(runtime.inbound());
//!
//! // Run until Ctrl+C
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use courier_core::{
    BoxedTransport, Dispatcher, IncomingMessage, Transport, TransportError, TransportResult,
};
use courier_framework::{
    CommandProvider, CommandRegistry, CommandSpec, DefaultHooks, HandlerFailure, HelpSynthesizer,
    Router, RouterHooks,
};

use crate::config::{ConfigLoader, CourierConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

// =============================================================================
// InboundSender
// =============================================================================

/// Handle used by transports to deliver messages to a running runtime.
///
/// Cheap to clone. Also implements [`Dispatcher`], so a transport written
/// against that trait can feed the runtime directly.
#[derive(Debug, Clone)]
pub struct InboundSender {
    tx: mpsc::Sender<IncomingMessage>,
}

impl InboundSender {
    /// Queues a message, waiting for space if the queue is full.
    pub async fn send(&self, msg: IncomingMessage) -> TransportResult<()> {
        self.tx.send(msg).await.map_err(|_| TransportError::Closed)
    }

    /// Queues a message without waiting.
    pub fn try_send(&self, msg: IncomingMessage) -> TransportResult<()> {
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TransportError::SendFailed("inbound queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

#[async_trait]
impl Dispatcher for InboundSender {
    async fn dispatch(&self, msg: IncomingMessage) {
        if let Err(e) = self.send(msg).await {
            warn!(error = %e, "Dropping inbound message");
        }
    }
}

// =============================================================================
// CourierRuntime
// =============================================================================

/// The Courier runtime.
pub struct CourierRuntime {
    config: CourierConfig,
    registry: Arc<CommandRegistry>,
    router: Router,
    inbound_tx: mpsc::Sender<IncomingMessage>,
    /// Taken by the loop while it runs.
    inbound_rx: Mutex<Option<mpsc::Receiver<IncomingMessage>>>,
    shutdown: CancellationToken,
}

impl CourierRuntime {
    /// Creates a runtime builder.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let runtime = CourierRuntime::builder()
    ///     .config_file("config/production.toml")
    ///     .profile("production")
    ///     .build(transport)?;
    /// ```
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Initializes logging from `config.logging` (unless a subscriber is
    /// already installed), then builds the registry, help command and router.
    pub fn from_config(
        config: &CourierConfig,
        transport: BoxedTransport,
        hooks: Arc<dyn RouterHooks>,
    ) -> Self {
        logging::init_from_config(&config.logging);

        let registry = Arc::new(CommandRegistry::new(config.commands.prefix.clone()));
        let help = HelpSynthesizer::new(&registry, Arc::clone(&hooks)).with_texts(config.help_texts());
        Arc::new(help).install();

        let router = Router::new(config.router_config(), Arc::clone(&registry), transport)
            .with_hooks(hooks);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.runtime.inbound_buffer.max(1));

        info!(
            identity = %config.bot.identity,
            prefix = %config.commands.prefix,
            trigger = %config.commands.trigger,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            registry,
            router,
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// The command registry. Commands may be added at any time.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// A handle for transports to deliver messages.
    pub fn inbound(&self) -> InboundSender {
        InboundSender {
            tx: self.inbound_tx.clone(),
        }
    }

    /// Registers a single command.
    pub fn register(&self, spec: CommandSpec) -> Option<Arc<CommandSpec>> {
        self.registry.register(spec)
    }

    /// Registers every command of a provider.
    pub fn register_provider<P>(&self, provider: Arc<P>) -> usize
    where
        P: CommandProvider + ?Sized,
    {
        self.registry.register_provider(provider)
    }

    /// Token cancelled when the runtime is stopped.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Asks a running loop to stop after the message in progress.
    ///
    /// A stopped runtime cannot be run again.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Stopping Courier runtime");
            self.shutdown.cancel();
        }
    }

    /// Runs the loop until Ctrl+C, SIGTERM or [`stop`](Self::stop).
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("Courier runtime is now running. Press Ctrl+C to stop.");
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs the loop until `shutdown` completes or [`stop`](Self::stop) is called.
    ///
    /// The hooks' `on_start` runs first and `on_shutdown` runs when the loop
    /// ends, including when this future is dropped early. Dropping it leaves
    /// the runtime ready to run again. Threaded commands still in flight are
    /// not awaited.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut active = ActiveLoop::start(self)?;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                () = &mut shutdown => break,
                msg = active.recv() => match msg {
                    Some(msg) => self.router.dispatch(msg).await,
                    None => break,
                },
            }
        }

        Ok(())
    }
}

/// A running loop's hold on the inbound queue.
///
/// Dropping it puts the receiver back and calls `on_shutdown`.
struct ActiveLoop<'a> {
    runtime: &'a CourierRuntime,
    inbound: Option<mpsc::Receiver<IncomingMessage>>,
}

impl<'a> ActiveLoop<'a> {
    fn start(runtime: &'a CourierRuntime) -> RuntimeResult<Self> {
        let inbound = runtime
            .inbound_rx
            .lock()
            .take()
            .ok_or(RuntimeError::AlreadyRunning)?;
        let active = Self {
            runtime,
            inbound: Some(inbound),
        };

        debug!(commands = runtime.registry.len(), "Message loop started");
        call_hook("on_start", || runtime.router.hooks().on_start());
        Ok(active)
    }

    async fn recv(&mut self) -> Option<IncomingMessage> {
        match self.inbound.as_mut() {
            Some(inbound) => inbound.recv().await,
            None => None,
        }
    }
}

impl Drop for ActiveLoop<'_> {
    fn drop(&mut self) {
        if let Some(inbound) = self.inbound.take() {
            *self.runtime.inbound_rx.lock() = Some(inbound);
        }
        if !std::thread::panicking() {
            call_hook("on_shutdown", || self.runtime.router.hooks().on_shutdown());
        }
        info!("Courier runtime stopped");
    }
}

fn call_hook(hook: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!(
            hook,
            error = %HandlerFailure::from_panic(payload),
            "Lifecycle hook panicked"
        );
    }
}

impl std::fmt::Debug for CourierRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierRuntime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                return wait_for_ctrl_c().await;
            }
        };

        tokio::select! {
            () = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            // only stop() can end the loop now
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `CourierRuntime` with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    hooks: Arc<dyn RouterHooks>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            hooks: Arc::new(DefaultHooks),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: CourierConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides a single value by its dotted key.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Sets the router hooks.
    pub fn hooks<H: RouterHooks>(mut self, hooks: H) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Loads and validates the configuration, then builds the runtime.
    pub fn build<T: Transport>(self, transport: T) -> RuntimeResult<CourierRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;
        Ok(CourierRuntime::from_config(
            &config,
            Arc::new(transport),
            self.hooks,
        ))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use courier_core::ReplyTarget;
    use courier_framework::fallback_fn;
    use figment::Jail;

    struct RecordingTransport(mpsc::UnboundedSender<(ReplyTarget, String)>);

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send_reply(&self, target: &ReplyTarget, text: &str) -> TransportResult<()> {
            self.0
                .send((target.clone(), text.to_string()))
                .map_err(|_| TransportError::Closed)
        }
    }

    fn config() -> CourierConfig {
        let mut config = CourierConfig::default();
        config.bot.identity = "bot@example.org".to_string();
        config.bot.display_name = Some("BotName".to_string());
        config.bot.description = Some("A test bot.".to_string());
        config
    }

    fn runtime(
        config: &CourierConfig,
    ) -> (Arc<CourierRuntime>, mpsc::UnboundedReceiver<(ReplyTarget, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hooks = Arc::new(fallback_fn(|msg, _command, _args| {
            msg.is_group().then(|| "Ask me in private".to_string())
        }));
        let runtime = CourierRuntime::from_config(config, Arc::new(RecordingTransport(tx)), hooks);
        runtime.register(
            CommandSpec::new("uptime", |_msg, _args| async move { "up 3 days" })
                .doc("Shows uptime."),
        );
        (Arc::new(runtime), rx)
    }

    async fn next_reply(rx: &mut mpsc::UnboundedReceiver<(ReplyTarget, String)>) -> (ReplyTarget, String) {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("reply in time")
            .expect("transport open")
    }

    #[tokio::test]
    async fn test_loop_routes_inbound_messages() {
        let (runtime, mut rx) = runtime(&config());
        let inbound = runtime.inbound();
        let task = tokio::spawn({
            let runtime = Arc::clone(&runtime);
            async move { runtime.run_until(std::future::pending()).await }
        });

        inbound
            .send(IncomingMessage::direct("alice@example.org", "!uptime"))
            .await
            .unwrap();
        inbound
            .send(IncomingMessage::group("room@muc", "Alice", "hey BotName can you help"))
            .await
            .unwrap();
        inbound.dispatch(IncomingMessage::direct("alice@example.org", "!help")).await;

        assert_eq!(
            next_reply(&mut rx).await,
            (ReplyTarget::Direct("alice@example.org".into()), "up 3 days".into())
        );
        assert_eq!(
            next_reply(&mut rx).await,
            (ReplyTarget::Group("room@muc".into()), "Ask me in private".into())
        );
        let (_, help) = next_reply(&mut rx).await;
        assert!(help.starts_with("A test bot.\n\n"));
        assert!(help.contains("uptime: Shows uptime."));

        runtime.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_until_returns_when_future_completes() {
        let (runtime, _rx) = runtime(&config());
        runtime.run_until(async {}).await.unwrap();
        // the loop can be started again
        runtime
            .run_until(tokio::time::sleep(Duration::from_millis(10)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_second_loop_is_rejected() {
        let (runtime, _rx) = runtime(&config());
        let task = tokio::spawn({
            let runtime = Arc::clone(&runtime);
            async move { runtime.run_until(std::future::pending()).await }
        });
        // let the first loop take the receiver
        tokio::task::yield_now().await;
        while runtime.inbound_rx.lock().is_some() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            runtime.run_until(async {}).await,
            Err(RuntimeError::AlreadyRunning)
        ));
        runtime.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_dropped_loop_releases_inbound_queue() {
        let (runtime, mut rx) = runtime(&config());
        let first = tokio::time::timeout(
            Duration::from_millis(20),
            runtime.run_until(std::future::pending()),
        )
        .await;
        assert!(first.is_err());

        // the queue still accepts messages and a new loop picks them up
        let inbound = runtime.inbound();
        inbound
            .send(IncomingMessage::direct("alice@example.org", "!uptime"))
            .await
            .unwrap();
        let task = tokio::spawn({
            let runtime = Arc::clone(&runtime);
            async move { runtime.run_until(std::future::pending()).await }
        });
        assert_eq!(next_reply(&mut rx).await.1, "up 3 days");

        runtime.stop();
        task.await.unwrap().unwrap();
    }

    #[derive(Default)]
    struct LifecycleCounts {
        started: AtomicUsize,
        stopped: AtomicUsize,
    }

    struct LifecycleHooks(Arc<LifecycleCounts>);

    impl RouterHooks for LifecycleHooks {
        fn on_start(&self) {
            self.0.started.fetch_add(1, Ordering::SeqCst);
        }

        fn on_shutdown(&self) {
            self.0.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_lifecycle_hooks() {
        let counts = Arc::new(LifecycleCounts::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let runtime = CourierRuntime::from_config(
            &config(),
            Arc::new(RecordingTransport(tx)),
            Arc::new(LifecycleHooks(Arc::clone(&counts))),
        );
        let calls = || {
            (
                counts.started.load(Ordering::SeqCst),
                counts.stopped.load(Ordering::SeqCst),
            )
        };
        assert_eq!(calls(), (0, 0));

        runtime.run_until(async {}).await.unwrap();
        assert_eq!(calls(), (1, 1));

        // a loop dropped mid-run still reports its shutdown
        let _ = tokio::time::timeout(
            Duration::from_millis(10),
            runtime.run_until(std::future::pending()),
        )
        .await;
        assert_eq!(calls(), (2, 2));

        // a rejected second loop calls neither
        *runtime.inbound_rx.lock() = None;
        assert!(runtime.run_until(async {}).await.is_err());
        assert_eq!(calls(), (2, 2));
    }

    #[tokio::test]
    async fn test_panicking_lifecycle_hook_is_contained() {
        struct Grumpy;

        impl RouterHooks for Grumpy {
            fn on_start(&self) {
                panic!("not today");
            }
        }

        let (tx, _rx) = mpsc::unbounded_channel();
        let runtime =
            CourierRuntime::from_config(&config(), Arc::new(RecordingTransport(tx)), Arc::new(Grumpy));
        runtime.run_until(async {}).await.unwrap();
        runtime.run_until(async {}).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_before_run() {
        let (runtime, _rx) = runtime(&config());
        runtime.stop();
        assert!(runtime.shutdown_token().is_cancelled());
        runtime.run_until(std::future::pending()).await.unwrap();
    }

    #[tokio::test]
    async fn test_prefix_and_help_from_config() {
        let mut config = config();
        config.commands.prefix = "bot_".to_string();
        let (runtime, _rx) = runtime(&config);

        assert!(runtime.registry().contains("bot_help"));
        assert!(runtime.registry().contains("bot_uptime"));
        let reply = runtime
            .router()
            .route(IncomingMessage::direct("alice@example.org", "!bot_help uptime"))
            .await;
        assert_eq!(reply.as_deref(), Some("Shows uptime."));
    }

    #[test]
    fn test_try_send_on_full_queue() {
        let mut config = config();
        config.runtime.inbound_buffer = 1;
        let (runtime, _rx) = runtime(&config);
        let inbound = runtime.inbound();

        inbound
            .try_send(IncomingMessage::direct("a@b", "!uptime"))
            .unwrap();
        assert!(matches!(
            inbound.try_send(IncomingMessage::direct("a@b", "!uptime")),
            Err(TransportError::SendFailed(_))
        ));
    }

    #[test]
    fn test_builder_validates_config() {
        Jail::expect_with(|jail| {
            let (tx, _rx) = mpsc::unbounded_channel();
            let result = CourierRuntime::builder()
                .without_env()
                .search_path(jail.directory())
                .build(RecordingTransport(tx));
            assert!(matches!(
                result,
                Err(RuntimeError::Config(crate::config::ConfigError::MissingField { .. }))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_builder_loads_file_and_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "courier.toml",
                "[bot]\nidentity = \"bot@example.org\"\n\n[commands]\ntrigger = \"/\"",
            )?;
            let (tx, _rx) = mpsc::unbounded_channel();
            let runtime = CourierRuntime::builder()
                .without_env()
                .search_path(jail.directory())
                .set("bot.display_name", "Courier")
                .build(RecordingTransport(tx))
                .map_err(|e| figment::Error::from(e.to_string()))?;

            assert_eq!(runtime.config().bot.identity, "bot@example.org");
            assert_eq!(runtime.router().config().trigger, '/');
            assert_eq!(runtime.router().config().display_name.as_deref(), Some("Courier"));
            assert!(runtime.registry().contains("help"));
            Ok(())
        });
    }
}
