#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use connectors_rs::{
    diagnostics::ProbeResult, secret::MASK, Connection, ConnectionError, Connector, DiagnosticStep,
    FailureKind, Redact, Result, Secret, StepFailure,
};

pub const SERVICE: &str = "Fake";
pub const PASSWORD: &str = "s3cr3t-Pa55";

/// Config for [`FakeConnector`]: which steps fail, and whether the
/// "server" is reachable at all.
#[derive(Clone)]
pub struct FakeConfig {
    pub password: Secret,
    pub reachable: bool,
    pub failures: HashMap<String, StepFailure>,
    pub closed: Arc<AtomicBool>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeConfig {
    pub fn new() -> Self {
        Self {
            password: Secret::from(PASSWORD),
            reachable: true,
            failures: HashMap::new(),
            closed: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Make step `name` fail with `kind`.
    pub fn failing(mut self, name: &str, kind: FailureKind, message: &str) -> Self {
        self.failures
            .insert(name.to_string(), StepFailure::new(kind, message));
        self
    }

    /// Names of the steps invoked so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Redact for FakeConfig {
    fn redacted(&self) -> String {
        format!("FakeConfig(password={MASK}, reachable={})", self.reachable)
    }

    fn secrets(&self) -> Vec<&Secret> {
        vec![&self.password]
    }
}

/// Connection stand-in that records every probe and answers from its config.
pub struct FakeConnection {
    config: FakeConfig,
}

impl FakeConnection {
    pub fn new(config: &FakeConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn probe(&self, name: &str) -> ProbeResult {
        self.config.calls.lock().unwrap().push(name.to_string());
        match self.config.failures.get(name) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

impl Connection for FakeConnection {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.config.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Step whose probe asks the fake connection for its scripted outcome.
pub fn step(name: &str) -> DiagnosticStep<FakeConnection> {
    let owned = name.to_string();
    DiagnosticStep::new(name, move |conn: &FakeConnection| {
        let name = owned.clone();
        Box::pin(async move { conn.probe(&name) })
    })
}

/// Three steps: `Reach`, `Auth` (needs `Reach`), `ListTables`.
pub struct FakeConnector;

impl Connector for FakeConnector {
    type Config = FakeConfig;
    type Connection = FakeConnection;

    const SERVICE_TYPE: &'static str = SERVICE;

    async fn connect(config: &FakeConfig) -> std::result::Result<FakeConnection, ConnectionError> {
        if !config.reachable {
            // Echo the password the way careless client libraries do.
            let cause = format!(
                "connection refused (user=admin password={})",
                config.password.expose()
            );
            return Err(ConnectionError::new(config, FailureKind::Connectivity, cause));
        }
        Ok(FakeConnection::new(config))
    }

    fn test_steps() -> Vec<DiagnosticStep<FakeConnection>> {
        vec![step("Reach"), step("Auth").depends_on("Reach"), step("ListTables")]
    }
}
