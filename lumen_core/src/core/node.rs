use crate::error::LumenResult;
use std::fmt;
use std::time::{Duration, Instant};

/// Node states for lifecycle management
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    Uninitialized,
    Running,
    Stopped,
    Error(String),
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Uninitialized => write!(f, "Uninitialized"),
            NodeState::Running => write!(f, "Running"),
            NodeState::Stopped => write!(f, "Stopped"),
            NodeState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Performance metrics for node execution
#[derive(Debug, Clone, Default)]
pub struct NodeMetrics {
    pub total_ticks: u64,
    pub successful_ticks: u64,
    pub failed_ticks: u64,
    pub avg_tick_duration_ms: f64,
    pub max_tick_duration_ms: f64,
    pub min_tick_duration_ms: f64,
    pub last_tick_duration_ms: f64,
}

/// Runtime context handed to a node on every lifecycle call.
///
/// Tracks state and tick timing, and routes log output through `tracing`
/// with the node name attached.
pub struct NodeInfo {
    name: String,
    state: NodeState,
    metrics: NodeMetrics,
    logging_enabled: bool,
    creation_time: Instant,
    tick_start: Option<Instant>,
}

impl NodeInfo {
    pub fn new(node_name: impl Into<String>, logging_enabled: bool) -> Self {
        Self {
            name: node_name.into(),
            state: NodeState::Uninitialized,
            metrics: NodeMetrics::default(),
            logging_enabled,
            creation_time: Instant::now(),
            tick_start: None,
        }
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn set_state(&mut self, new_state: NodeState) {
        if self.state != new_state {
            tracing::debug!(node = %self.name, from = %self.state, to = %new_state, "state change");
            self.state = new_state;
        }
    }

    pub fn transition_to_error(&mut self, error_msg: String) {
        self.set_state(NodeState::Error(error_msg));
    }

    pub fn start_tick(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// Record a completed tick and fold its duration into the metrics.
    pub fn record_tick(&mut self) {
        let duration_ms = self.finish_tick();
        self.metrics.successful_ticks += 1;

        let n = self.metrics.successful_ticks as f64;
        self.metrics.avg_tick_duration_ms += (duration_ms - self.metrics.avg_tick_duration_ms) / n;
        self.metrics.max_tick_duration_ms = self.metrics.max_tick_duration_ms.max(duration_ms);
        self.metrics.min_tick_duration_ms = if self.metrics.successful_ticks == 1 {
            duration_ms
        } else {
            self.metrics.min_tick_duration_ms.min(duration_ms)
        };
    }

    pub fn record_tick_failure(&mut self, error_msg: String) {
        self.finish_tick();
        self.metrics.failed_ticks += 1;
        self.log_error(&error_msg);
        self.transition_to_error(error_msg);
    }

    fn finish_tick(&mut self) -> f64 {
        let duration_ms = self
            .tick_start
            .take()
            .map(|start| start.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.metrics.total_ticks += 1;
        self.metrics.last_tick_duration_ms = duration_ms;
        duration_ms
    }

    pub fn log_info(&self, message: &str) {
        if self.logging_enabled {
            tracing::info!(node = %self.name, "{}", message);
        }
    }

    pub fn log_warning(&self, message: &str) {
        tracing::warn!(node = %self.name, "{}", message);
    }

    pub fn log_error(&self, message: &str) {
        tracing::error!(node = %self.name, "{}", message);
    }

    pub fn log_debug(&self, message: &str) {
        if self.logging_enabled {
            tracing::debug!(node = %self.name, "{}", message);
        }
    }

    pub fn log_metrics_summary(&self) {
        tracing::info!(
            node = %self.name,
            ticks = self.metrics.total_ticks,
            failed = self.metrics.failed_ticks,
            avg_ms = format_args!("{:.3}", self.metrics.avg_tick_duration_ms),
            max_ms = format_args!("{:.3}", self.metrics.max_tick_duration_ms),
            "node metrics"
        );
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn uptime(&self) -> Duration {
        self.creation_time.elapsed()
    }
}

/// A unit of work driven by the [`Scheduler`](crate::Scheduler).
///
/// `tick` returning an error is fatal: the scheduler stops, shuts down every
/// node and hands the error back to its caller.
pub trait Node: Send {
    /// Get the node's name (must be unique)
    fn name(&self) -> &str;

    /// Initialize the node (called once before the first tick)
    fn init(&mut self, ctx: &mut NodeInfo) -> LumenResult<()> {
        ctx.log_info("Node initialized successfully");
        Ok(())
    }

    /// One step of work
    fn tick(&mut self, ctx: &mut NodeInfo) -> LumenResult<()>;

    /// Shutdown the node (called once at cleanup)
    fn shutdown(&mut self, ctx: &mut NodeInfo) -> LumenResult<()> {
        ctx.log_info("Node shutdown successfully");
        Ok(())
    }
}
