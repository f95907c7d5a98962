use super::rate::RateTimer;
use crate::core::{Node, NodeInfo, NodeState};
use crate::error::{LumenError, LumenResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Node registration info with lifecycle tracking
struct RegisteredNode {
    node: Box<dyn Node>,
    priority: u32,
    initialized: bool,
    context: NodeInfo,
}

/// Requests that a scheduler stop, from any thread or a signal handler.
///
/// A request made before the loop starts is kept: the next `run*` call
/// initializes and shuts down its nodes without ticking them.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Central orchestrator: holds nodes, drives the fixed-rate tick loop.
///
/// Nodes tick in priority order (0 = first) on the calling thread. A node
/// error stops the loop; every initialized node is still shut down before
/// the error is returned.
pub struct Scheduler {
    nodes: Vec<RegisteredNode>,
    running: Arc<AtomicBool>,
    stop_requested: StopHandle,
    scheduler_name: String,
    rate_hz: f64,
    logging_enabled: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler ticking at 100 Hz.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: StopHandle(Arc::new(AtomicBool::new(false))),
            scheduler_name: "DefaultScheduler".to_string(),
            rate_hz: 100.0,
            logging_enabled: true,
        }
    }

    /// Set the scheduler name (chainable)
    pub fn name(mut self, name: &str) -> Self {
        self.scheduler_name = name.to_string();
        self
    }

    /// Set the global tick rate in Hz (chainable)
    pub fn with_rate(mut self, rate_hz: f64) -> Self {
        self.rate_hz = rate_hz;
        self
    }

    /// Enable or disable per-node info/debug logging (chainable)
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    /// Stop the loop on Ctrl+C.
    ///
    /// The handler can only be installed once per process; a second attempt
    /// is logged and ignored.
    pub fn handle_ctrl_c(self) -> Self {
        let stop = self.stop_requested.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::warn!("Ctrl+C received, shutting down scheduler");
            stop.stop();
        }) {
            tracing::warn!("failed to set signal handler: {}", e);
        }
        self
    }

    /// Register a node. Lower priority values tick first.
    pub fn add(&mut self, node: Box<dyn Node>, priority: u32) -> &mut Self {
        let context = NodeInfo::new(node.name(), self.logging_enabled);
        tracing::debug!(scheduler = %self.scheduler_name, node = node.name(), priority, "added node");
        self.nodes.push(RegisteredNode {
            node,
            priority,
            initialized: false,
            context,
        });
        self.nodes.sort_by_key(|registered| registered.priority);
        self
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the loop to exit after the current tick, or to skip ticking
    /// entirely if it has not started yet.
    pub fn stop(&self) {
        self.stop_requested.stop();
    }

    /// Handle that stops the loop from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop_requested.clone()
    }

    pub fn get_node_list(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|registered| registered.node.name().to_string())
            .collect()
    }

    /// Tick count of a node, if registered
    pub fn node_ticks(&self, name: &str) -> Option<u64> {
        self.nodes
            .iter()
            .find(|registered| registered.node.name() == name)
            .map(|registered| registered.context.metrics().total_ticks)
    }

    /// Initialize pending nodes and tick every node exactly once, unpaced.
    pub fn step(&mut self) -> LumenResult<()> {
        self.init_nodes()?;
        self.tick_all()
    }

    /// Main loop; runs until stopped or a node fails
    pub fn run(&mut self) -> LumenResult<()> {
        self.run_with_limit(None, None)
    }

    /// Run for a wall-clock duration, then shut down
    pub fn run_for(&mut self, duration: Duration) -> LumenResult<()> {
        self.run_with_limit(None, Some(duration))
    }

    /// Run a fixed number of paced ticks, then shut down
    pub fn run_ticks(&mut self, ticks: u64) -> LumenResult<()> {
        self.run_with_limit(Some(ticks), None)
    }

    /// Shut down every initialized node
    pub fn shutdown(&mut self) {
        for registered in self.nodes.iter_mut().filter(|r| r.initialized) {
            let name = registered.node.name().to_string();
            registered.context.log_metrics_summary();
            match registered.node.shutdown(&mut registered.context) {
                Ok(()) => tracing::debug!(node = %name, "shutdown complete"),
                Err(e) => tracing::error!(node = %name, "error during shutdown: {}", e),
            }
            registered.context.set_state(NodeState::Stopped);
            registered.initialized = false;
        }
    }

    fn run_with_limit(&mut self, ticks: Option<u64>, duration: Option<Duration>) -> LumenResult<()> {
        let mut timer = RateTimer::new(self.rate_hz)?;
        self.running.store(true, Ordering::SeqCst);

        if let Err(e) = self.init_nodes() {
            self.running.store(false, Ordering::SeqCst);
            self.shutdown();
            return Err(e);
        }

        tracing::info!(
            scheduler = %self.scheduler_name,
            rate_hz = self.rate_hz,
            nodes = self.nodes.len(),
            "scheduler started"
        );

        let start_time = Instant::now();
        let mut completed: u64 = 0;
        let mut result = Ok(());
        timer.reset();

        while !self.stop_requested.is_stop_requested() {
            if ticks.is_some_and(|max| completed >= max) {
                break;
            }
            if let Some(max_duration) = duration {
                if start_time.elapsed() >= max_duration {
                    tracing::info!("scheduler reached time limit of {:?}", max_duration);
                    break;
                }
            }

            if let Err(e) = self.tick_all() {
                result = Err(e);
                break;
            }
            completed += 1;

            if timer.wait() {
                tracing::debug!(scheduler = %self.scheduler_name, "tick overran its period");
            }
        }

        if self.stop_requested.is_stop_requested() {
            tracing::info!(scheduler = %self.scheduler_name, "stop requested");
        }
        // The request is consumed by this run
        self.stop_requested.clear();
        self.running.store(false, Ordering::SeqCst);
        self.shutdown();
        tracing::info!(
            scheduler = %self.scheduler_name,
            ticks = completed,
            overruns = timer.overruns(),
            "scheduler shutdown complete"
        );
        result
    }

    fn init_nodes(&mut self) -> LumenResult<()> {
        for registered in self.nodes.iter_mut().filter(|r| !r.initialized) {
            let name = registered.node.name().to_string();
            match registered.node.init(&mut registered.context) {
                Ok(()) => {
                    registered.initialized = true;
                    registered.context.set_state(NodeState::Running);
                    tracing::debug!(node = %name, "initialized");
                }
                Err(e) => {
                    registered
                        .context
                        .transition_to_error(format!("Initialization failed: {}", e));
                    tracing::error!(node = %name, "failed to initialize: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn tick_all(&mut self) -> LumenResult<()> {
        for registered in self.nodes.iter_mut() {
            if !registered.initialized {
                return Err(LumenError::Internal(format!(
                    "node '{}' ticked before initialization",
                    registered.node.name()
                )));
            }
            registered.context.start_tick();
            match registered.node.tick(&mut registered.context) {
                Ok(()) => registered.context.record_tick(),
                Err(e) => {
                    registered.context.record_tick_failure(e.to_string());
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
