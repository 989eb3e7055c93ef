#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use subagent_core::api::{
    ExecutionContext, RunOutcome, RunnerConfig, RunnerPlugin, RunnerSession, RunnerStartArgs,
    Signal,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;

/// What a scripted agent does for one prompt.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub lines: Vec<String>,
    pub stderr: String,
    pub exit_code: i32,
    pub delay: Duration,
    /// Block in `wait` until signalled.
    pub hang: bool,
    /// While hanging, only `Kill` ends the process.
    pub ignore_term: bool,
}

impl Script {
    pub fn reply(text: &str) -> Self {
        Self {
            lines: vec![assistant_line(text, 100, 20, 0.01)],
            ..Self::default()
        }
    }

    pub fn fail(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stderr: stderr.to_string(),
            ..Self::default()
        }
    }

    pub fn hang() -> Self {
        Self {
            lines: vec![assistant_line("working", 10, 1, 0.001)],
            hang: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }
}

pub fn assistant_line(text: &str, input: u64, output: u64, cost: f64) -> String {
    json!({
        "type": "message_end",
        "message": {
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "modelX",
            "usage": {
                "input": input,
                "output": output,
                "cacheRead": 0,
                "cacheWrite": 0,
                "totalTokens": input + output,
                "cost": {"total": cost}
            },
            "stopReason": "stop"
        }
    })
    .to_string()
}

type ScriptFn = dyn Fn(&str) -> Script + Send + Sync;

/// Runner whose sessions replay a script chosen from the prompt.
pub struct ScriptedRunner {
    script_for: Box<ScriptFn>,
    started: Mutex<Vec<RunnerStartArgs>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    fail_spawn: bool,
}

impl ScriptedRunner {
    pub fn new(script_for: impl Fn(&str) -> Script + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script_for: Box::new(script_for),
            started: Mutex::new(Vec::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            fail_spawn: false,
        })
    }

    pub fn failing_spawn() -> Arc<Self> {
        Arc::new(Self {
            script_for: Box::new(|_| Script::default()),
            started: Mutex::new(Vec::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            fail_spawn: true,
        })
    }

    pub fn started(&self) -> Vec<RunnerStartArgs> {
        self.started.lock().unwrap().clone()
    }

    /// Prompts in spawn order.
    pub fn prompts(&self) -> Vec<String> {
        self.started()
            .iter()
            .map(|a| a.args.last().cloned().unwrap_or_default())
            .collect()
    }

    pub fn spawn_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunnerPlugin for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> anyhow::Result<Box<dyn RunnerSession>> {
        if self.fail_spawn {
            anyhow::bail!("No such file or directory (os error 2)");
        }
        self.started.lock().unwrap().push(args.clone());
        let prompt = args.args.last().cloned().unwrap_or_default();
        let script = (self.script_for)(&prompt);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (signal_tx, signal_rx) = watch::channel(None);
        let mut stdout = script.lines.join("\n").into_bytes();
        if !stdout.is_empty() {
            stdout.push(b'\n');
        }
        Ok(Box::new(ScriptedSession {
            stdout: Some(stdout),
            stderr: Some(script.stderr.clone().into_bytes()),
            script,
            signal_tx,
            signal_rx,
            in_flight: self.in_flight.clone(),
            exited: false,
        }))
    }
}

struct ScriptedSession {
    script: Script,
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
    signal_tx: watch::Sender<Option<Signal>>,
    signal_rx: watch::Receiver<Option<Signal>>,
    in_flight: Arc<AtomicUsize>,
    exited: bool,
}

impl ScriptedSession {
    fn finish(&mut self, exit_code: i32) -> RunOutcome {
        if !self.exited {
            self.exited = true;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        RunOutcome { exit_code }
    }
}

#[async_trait]
impl RunnerSession for ScriptedSession {
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
        Some(Box::new(tokio::io::sink()))
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout
            .take()
            .map(|b| Box::new(Cursor::new(b)) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stderr
            .take()
            .map(|b| Box::new(Cursor::new(b)) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()> {
        if !self.exited {
            self.signal_tx.send_replace(Some(signal));
        }
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<RunOutcome> {
        if self.exited {
            return Ok(RunOutcome {
                exit_code: self.script.exit_code,
            });
        }
        if !self.script.delay.is_zero() {
            tokio::time::sleep(self.script.delay).await;
        }
        if !self.script.hang {
            let code = self.script.exit_code;
            return Ok(self.finish(code));
        }

        let ignore_term = self.script.ignore_term;
        let mut rx = self.signal_rx.clone();
        let got = *rx
            .wait_for(|s| match s {
                Some(Signal::Kill) => true,
                Some(Signal::Term) => !ignore_term,
                None => false,
            })
            .await?;
        let code = match got {
            Some(Signal::Kill) => 137,
            _ => 143,
        };
        Ok(self.finish(code))
    }
}

pub fn context(runner: Arc<ScriptedRunner>) -> ExecutionContext {
    context_with(runner, RunnerConfig::default())
}

pub fn context_with(runner: Arc<ScriptedRunner>, config: RunnerConfig) -> ExecutionContext {
    ExecutionContext::new(runner, config).with_active_tools(vec!["read".into(), "bash".into()])
}

/// A session log on disk, for fork tests.
pub fn session_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("session.jsonl");
    std::fs::write(&path, "{\"type\":\"session\",\"id\":\"s1\"}\n").unwrap();
    path
}

pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}


/// Mark every task that does not say otherwise as non-forking.
pub fn request(mut raw: serde_json::Value) -> serde_json::Value {
    if let Some(tasks) = raw.get_mut("tasks").and_then(|t| t.as_array_mut()) {
        for task in tasks {
            if let Some(obj) = task.as_object_mut() {
                obj.entry("fork").or_insert(json!(false));
            }
        }
    }
    raw
}
