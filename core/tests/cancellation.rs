mod common;

use std::time::Duration;

use common::{context_with, request, Script, ScriptedRunner};
use serde_json::json;
use subagent_core::api::{execute, RunnerConfig, TaskState};
use tokio::sync::mpsc;

const GUARD: Duration = Duration::from_secs(10);

#[tokio::test]
async fn abort_stops_running_tasks_and_keeps_finished_ones() {
    let runner = ScriptedRunner::new(|prompt| {
        if prompt.starts_with("slow") {
            Script::hang()
        } else {
            Script::reply(&format!("{prompt} done"))
        }
    });
    let ctx = context_with(runner.clone(), RunnerConfig::default());
    let abort = ctx.abort.clone();
    let raw = request(json!({"type": "parallel", "tasks": [
        {"prompt": "fast-1"}, {"prompt": "slow-1"}, {"prompt": "fast-2"}, {"prompt": "slow-2"}
    ]}));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let run = async {
        let tx = tx;
        execute(&raw, &ctx, Some(&tx)).await
    };
    let watch = async {
        while let Some(update) = rx.recv().await {
            if update.done == 2 && update.running == 2 {
                abort.abort();
            }
        }
    };
    let (outcome, ()) = tokio::time::timeout(GUARD, async { tokio::join!(run, watch) })
        .await
        .expect("call did not finish after abort");
    let outcome = outcome.unwrap();

    let states: Vec<TaskState> = outcome.results.iter().map(|r| r.state()).collect();
    assert_eq!(
        states,
        vec![TaskState::Done, TaskState::Failed, TaskState::Done, TaskState::Failed]
    );
    assert!(!outcome.results[0].is_aborted());
    assert!(outcome.results[1].is_aborted());
    assert!(outcome.results[3].is_aborted());
    assert_eq!(outcome.results[1].exit_code, 143);
    assert_eq!(outcome.results[2].output(), "fast-2 done");
    assert!(outcome.is_error);
    assert!(outcome.text.contains("⊘ aborted"), "{}", outcome.text);
}

#[tokio::test]
async fn agent_ignoring_terminate_is_killed_after_grace() {
    let runner = ScriptedRunner::new(|_| Script {
        ignore_term: true,
        ..Script::hang()
    });
    let config = RunnerConfig {
        abort_grace_ms: 50,
        ..RunnerConfig::default()
    };
    let ctx = context_with(runner, config);
    let abort = ctx.abort.clone();
    let raw = request(json!({"type": "single", "tasks": [{"prompt": "stubborn"}]}));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let run = async {
        let tx = tx;
        execute(&raw, &ctx, Some(&tx)).await
    };
    let watch = async {
        while let Some(update) = rx.recv().await {
            if update.running == 1 {
                abort.abort();
            }
        }
    };
    let (outcome, ()) = tokio::time::timeout(GUARD, async { tokio::join!(run, watch) })
        .await
        .expect("kill escalation did not finish");
    let outcome = outcome.unwrap();

    let result = &outcome.results[0];
    assert_eq!(result.exit_code, 137);
    assert!(result.is_aborted());
    assert!(outcome.text.starts_with("Task aborted:"), "{}", outcome.text);
}

#[tokio::test]
async fn aborted_chain_does_not_start_later_steps() {
    let runner = ScriptedRunner::new(|prompt| match prompt {
        "first" => Script::hang(),
        _ => Script::reply("never"),
    });
    let ctx = context_with(runner.clone(), RunnerConfig::default());
    let abort = ctx.abort.clone();
    let raw = request(json!({"type": "chain", "tasks": [{"prompt": "first"}, {"prompt": "second"}]}));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let run = async {
        let tx = tx;
        execute(&raw, &ctx, Some(&tx)).await
    };
    let watch = async {
        while let Some(update) = rx.recv().await {
            if update.running == 1 {
                abort.abort();
            }
        }
    };
    let (outcome, ()) = tokio::time::timeout(GUARD, async { tokio::join!(run, watch) })
        .await
        .expect("chain did not stop");
    let outcome = outcome.unwrap();

    assert!(outcome.is_error);
    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results[0].is_aborted());
    assert_eq!(runner.prompts(), vec!["first"]);
    assert!(outcome.text.starts_with("Chain stopped at step 1/2"));
}

#[tokio::test]
async fn pre_raised_abort_spawns_nothing() {
    let runner = ScriptedRunner::new(|_| Script::reply("x"));
    let ctx = context_with(runner.clone(), RunnerConfig::default());
    ctx.abort.abort();

    let outcome = execute(
        &request(json!({"type": "parallel", "tasks": [{"prompt": "a"}, {"prompt": "b"}]})),
        &ctx,
        None,
    )
    .await
    .unwrap();

    assert_eq!(runner.spawn_count(), 0);
    assert!(outcome.results.iter().all(|r| r.is_aborted() && r.is_failed()));
}
