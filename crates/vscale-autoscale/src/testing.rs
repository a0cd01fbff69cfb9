//! In-memory collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vscale_core::{
    ActionStatus, AsyncAction, CloudProvider, ConsoleConnector, ConsoleError, MetricsError,
    MetricsSource, ProviderError, QueryValue, RemoteConsole, Sample, ShutdownSignal, SizeInfo,
    SizeName,
};

pub fn size(name: &str, cost: f64) -> SizeInfo {
    SizeInfo {
        name: SizeName::from(name),
        hourly_cost: cost,
        architecture: "x86".into(),
        location: "fsn1".into(),
    }
}

pub fn three_sizes() -> Vec<SizeInfo> {
    vec![size("small", 0.01), size("medium", 0.02), size("large", 0.04)]
}

pub fn allowed(list: &[&str]) -> Vec<SizeName> {
    list.iter().map(|n| SizeName::from(*n)).collect()
}

pub fn players_online(n: u32) -> String {
    format!("There are {n} out of maximum 20 players online.")
}

// ── Provider ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ProviderState {
    pub current: SizeName,
    pub sizes: Vec<SizeInfo>,
    /// Status returned by `resize` itself.
    pub resize_status: Option<ActionStatus>,
    /// Scripted `poll_action` results; `Running` once exhausted.
    pub polls: VecDeque<ActionStatus>,
    pub fail_stop: bool,
    pub fail_power_on: bool,
    pub pending_target: Option<SizeName>,

    pub stop_calls: u32,
    pub resize_calls: u32,
    pub poll_calls: u32,
    pub power_on_calls: u32,
}

#[derive(Clone)]
pub struct StubProvider {
    pub state: Arc<Mutex<ProviderState>>,
}

impl StubProvider {
    pub fn new(current: &str, sizes: Vec<SizeInfo>) -> Self {
        let state = ProviderState {
            current: SizeName::from(current),
            sizes,
            resize_status: Some(ActionStatus::Running),
            polls: VecDeque::from([ActionStatus::Success]),
            ..ProviderState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ProviderState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn mutations(&self) -> u32 {
        self.with(|s| s.stop_calls + s.resize_calls + s.power_on_calls)
    }
}

impl ProviderState {
    fn finish_resize(&mut self) {
        if let Some(target) = self.pending_target.take() {
            self.current = target;
        }
    }
}

#[async_trait]
impl CloudProvider for StubProvider {
    async fn current_size(&self) -> Result<SizeName, ProviderError> {
        Ok(self.with(|s| s.current.clone()))
    }

    async fn available_sizes(&self) -> Result<Vec<SizeInfo>, ProviderError> {
        Ok(self.with(|s| s.sizes.clone()))
    }

    async fn stop_instance(&self, _shutdown: &ShutdownSignal) -> Result<(), ProviderError> {
        self.with(|s| {
            s.stop_calls += 1;
            if s.fail_stop {
                return Err(ProviderError::StopTimeout(std::time::Duration::from_secs(300)));
            }
            Ok(())
        })
    }

    async fn resize(&self, size: &SizeName) -> Result<AsyncAction, ProviderError> {
        self.with(|s| {
            s.resize_calls += 1;
            s.pending_target = Some(size.clone());
            let status = s.resize_status.clone().unwrap_or(ActionStatus::Running);
            if status == ActionStatus::Success {
                s.finish_resize();
            }
            Ok(AsyncAction::new(100, status))
        })
    }

    async fn poll_action(&self, _action: &AsyncAction) -> Result<ActionStatus, ProviderError> {
        self.with(|s| {
            s.poll_calls += 1;
            let status = s.polls.pop_front().unwrap_or(ActionStatus::Running);
            if status == ActionStatus::Success {
                s.finish_resize();
            }
            Ok(status)
        })
    }

    async fn power_on(&self) -> Result<(), ProviderError> {
        self.with(|s| {
            s.power_on_calls += 1;
            if s.fail_power_on {
                return Err(ProviderError::Api {
                    code: "locked".into(),
                    message: "server is locked".into(),
                });
            }
            Ok(())
        })
    }
}

// ── Console ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ConsoleState {
    /// Responses to `list`; the last one repeats once the queue is drained.
    pub list_responses: VecDeque<String>,
    pub commands: Vec<String>,
    pub connects: u32,
    pub refuse_connect: bool,
}

#[derive(Clone)]
pub struct StubConsole {
    pub state: Arc<Mutex<ConsoleState>>,
}

impl StubConsole {
    pub fn new(list_responses: &[String]) -> Self {
        let state = ConsoleState {
            list_responses: list_responses.iter().cloned().collect(),
            ..ConsoleState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn empty_server() -> Self {
        Self::new(&[players_online(0)])
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn connects(&self) -> u32 {
        self.state.lock().unwrap().connects
    }
}

struct StubSession {
    state: Arc<Mutex<ConsoleState>>,
    last: Option<String>,
}

#[async_trait]
impl ConsoleConnector for StubConsole {
    async fn connect(&self) -> Result<Box<dyn RemoteConsole>, ConsoleError> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;
        if state.refuse_connect {
            return Err(ConsoleError::Connect("connection refused".into()));
        }
        Ok(Box::new(StubSession {
            state: self.state.clone(),
            last: None,
        }))
    }
}

#[async_trait]
impl RemoteConsole for StubSession {
    async fn send(&mut self, command: &str) -> Result<(), ConsoleError> {
        self.state.lock().unwrap().commands.push(command.to_string());
        self.last = Some(command.to_string());
        Ok(())
    }

    async fn receive(&mut self) -> Result<String, ConsoleError> {
        let mut state = self.state.lock().unwrap();
        match self.last.take().as_deref() {
            Some("list") => {
                if state.list_responses.len() > 1 {
                    Ok(state.list_responses.pop_front().unwrap_or_default())
                } else {
                    Ok(state.list_responses.front().cloned().unwrap_or_default())
                }
            }
            Some("stop") => Ok("Stopping the server".into()),
            Some(_) => Ok(String::new()),
            None => Err(ConsoleError::Protocol("receive without a command".into())),
        }
    }
}

// ── Metrics ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StubMetrics {
    results: Mutex<HashMap<String, QueryValue>>,
    failing: Mutex<Vec<String>>,
    pub queried: Mutex<Vec<String>>,
}

impl StubMetrics {
    /// `query` returns a vector with `n` samples.
    pub fn with_vector(self, query: &str, n: usize) -> Self {
        let samples = (0..n)
            .map(|i| Sample {
                labels: Default::default(),
                timestamp: 1_700_000_000.0,
                value: i as f64,
            })
            .collect();
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), QueryValue::Vector(samples));
        self
    }

    pub fn with_value(self, query: &str, value: QueryValue) -> Self {
        self.results.lock().unwrap().insert(query.to_string(), value);
        self
    }

    pub fn failing(self, query: &str) -> Self {
        self.failing.lock().unwrap().push(query.to_string());
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsSource for StubMetrics {
    async fn query(&self, query: &str) -> Result<QueryValue, MetricsError> {
        self.queried.lock().unwrap().push(query.to_string());
        if self.failing.lock().unwrap().iter().any(|q| q == query) {
            return Err(MetricsError::Transport("connection refused".into()));
        }
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or(QueryValue::Vector(Vec::new())))
    }
}
