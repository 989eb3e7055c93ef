mod common;

use std::path::{Path, PathBuf};

use common::{context, flag_value, request, session_file, Script, ScriptedRunner};
use pretty_assertions::assert_eq;
use serde_json::json;
use subagent_core::api::{execute, SkillCatalog, SkillRecord, TaskError};

#[tokio::test]
async fn fork_without_session_file_spawns_nothing() {
    let runner = ScriptedRunner::new(|_| Script::reply("ok"));
    let ctx = context(runner.clone());

    let err = execute(
        &json!({"type": "parallel", "tasks": [{"prompt": "a", "fork": false}, {"prompt": "b"}]}),
        &ctx,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TaskError::ForkPrerequisite(_)));
    assert!(err.to_string().contains("no session file"));
    assert_eq!(runner.spawn_count(), 0);
}

#[tokio::test]
async fn missing_session_file_is_reported_by_path() {
    let runner = ScriptedRunner::new(|_| Script::reply("ok"));
    let ctx = context(runner.clone()).with_session_file(Some(PathBuf::from("/nonexistent/s.jsonl")));

    let err = execute(&json!({"type": "single", "tasks": [{"prompt": "a"}]}), &ctx, None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("/nonexistent/s.jsonl"));
    assert_eq!(runner.spawn_count(), 0);
}

#[tokio::test]
async fn forked_tasks_get_private_seed_copies_that_are_removed() {
    let dir = tempfile::tempdir().unwrap();
    let source = session_file(&dir);
    let original = std::fs::read_to_string(&source).unwrap();

    let runner = ScriptedRunner::new(|_| Script::reply("ok"));
    let ctx = context(runner.clone()).with_session_file(Some(source.clone()));

    let outcome = execute(
        &json!({"type": "parallel", "tasks": [{"prompt": "a"}, {"prompt": "b"}, {"prompt": "c", "fork": false}]}),
        &ctx,
        None,
    )
    .await
    .unwrap();
    assert!(!outcome.is_error);

    let started = runner.started();
    let mut session_dirs = Vec::new();
    for start in &started {
        let prompt = start.args.last().unwrap().as_str();
        if prompt == "c" {
            assert!(start.args.contains(&"--no-session".to_string()));
            assert_eq!(flag_value(&start.args, "--session"), None);
            continue;
        }
        assert!(!start.args.contains(&"--no-session".to_string()));
        let seed = flag_value(&start.args, "--session").unwrap();
        let session_dir = flag_value(&start.args, "--session-dir").unwrap();
        assert_eq!(Path::new(seed).parent(), Some(Path::new(session_dir)));
        session_dirs.push(session_dir.to_string());
    }

    assert_eq!(session_dirs.len(), 2);
    assert_ne!(session_dirs[0], session_dirs[1]);
    for d in &session_dirs {
        assert!(!Path::new(d).exists(), "{d} was not cleaned up");
    }
    assert_eq!(std::fs::read_to_string(&source).unwrap(), original);
}

#[tokio::test]
async fn fork_session_is_removed_after_failed_task() {
    let dir = tempfile::tempdir().unwrap();
    let source = session_file(&dir);
    let runner = ScriptedRunner::new(|_| Script::fail(1, "crashed"));
    let ctx = context(runner.clone()).with_session_file(Some(source));

    let outcome = execute(&json!({"type": "single", "tasks": [{"prompt": "a"}]}), &ctx, None)
        .await
        .unwrap();
    assert!(outcome.is_error);

    let session_dir = flag_value(&runner.started()[0].args, "--session-dir")
        .unwrap()
        .to_string();
    assert!(!Path::new(&session_dir).exists());
}

fn write_skill(root: &Path, name: &str, body: &str) -> SkillRecord {
    let base = root.join(name);
    std::fs::create_dir_all(&base).unwrap();
    let file = base.join("SKILL.md");
    std::fs::write(&file, body).unwrap();
    SkillRecord {
        name: name.to_string(),
        source: "user".to_string(),
        file_path: file,
        base_dir: base,
    }
}

#[tokio::test]
async fn skill_body_is_wrapped_around_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let skill = write_skill(
        dir.path(),
        "review",
        "---\nname: review\ndescription: code review\n---\nCheck every diff hunk.\n",
    );
    let runner = ScriptedRunner::new(|_| Script::reply("reviewed"));
    let ctx = context(runner.clone()).with_skills(SkillCatalog::new(vec![skill.clone()]), 10);

    execute(
        &request(json!({"type": "chain", "tasks": [
            {"skill": "review", "prompt": "look at main.rs"},
            {"skill": "review"}
        ]})),
        &ctx,
        None,
    )
    .await
    .unwrap();

    let prompts = runner.prompts();
    assert!(prompts[0].starts_with(&format!(
        "Skill \"review\" loaded from {}",
        skill.file_path.display()
    )));
    assert!(prompts[0].contains("Check every diff hunk."));
    assert!(!prompts[0].contains("description: code review"));
    assert!(prompts[0].ends_with("look at main.rs"));
    assert!(prompts[1].contains("Check every diff hunk."));
    assert_eq!(ctx.skills.cached_len(), 1);
}

#[tokio::test]
async fn unknown_skill_lists_available_names_and_spawns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let skills = vec![
        write_skill(dir.path(), "alpha", "a"),
        write_skill(dir.path(), "beta", "b"),
        write_skill(dir.path(), "gamma", "c"),
    ];
    let runner = ScriptedRunner::new(|_| Script::reply("ok"));
    let ctx = context(runner.clone()).with_skills(SkillCatalog::new(skills), 2);

    let err = execute(
        &request(json!({"type": "parallel", "tasks": [{"prompt": "a"}, {"skill": "delta"}]})),
        &ctx,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TaskError::SkillResolution(_)));
    assert_eq!(
        err.to_string(),
        "Unknown skill \"delta\". Available skills: alpha, beta (+1 more)"
    );
    assert_eq!(runner.spawn_count(), 0);
}
