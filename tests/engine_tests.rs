//! End-to-end engine behaviour through the public API

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::tempdir;
use warp_complete::executables::spec_matches_executable;
use warp_complete::{
    extract_prefix, ArgSpec, CancellationCheck, CancellationToken, CommandSpec, CompletionContext,
    CompletionEngine, CompletionKind, CompletionRequest, EngineConfig, ExecutableEntry,
    ExtensionMatching, OptionSpec, ShellKind, SpecCatalog, StaticBuiltins, TemplateKind,
};

fn unix_config() -> EngineConfig {
    EngineConfig {
        query_shell_builtins: false,
        ..EngineConfig::unix()
    }
}

fn windows_config() -> EngineConfig {
    EngineConfig {
        query_shell_builtins: false,
        ..EngineConfig::windows()
    }
}

fn context(cwd: &std::path::Path, executables: &[&str]) -> CompletionContext {
    CompletionContext {
        available_executables: executables.iter().map(|e| ExecutableEntry::new(e)).collect(),
        current_working_directory: Some(cwd.to_path_buf()),
        ..CompletionContext::default()
    }
}

#[test]
fn test_blank_lines_have_empty_prefix() {
    for line in ["", " ", "   ", "\t \t"] {
        for cursor in 0..6 {
            assert_eq!(extract_prefix(line, cursor), "", "line {:?} cursor {}", line, cursor);
        }
    }
}

#[tokio::test]
async fn test_replacement_range_for_partial_subcommand() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::new(), unix_config());
    let request = CompletionRequest::new("git chec", 9).with_context(context(dir.path(), &["git"]));

    let response = engine.complete(&request).await;
    let checkout = response
        .candidates
        .iter()
        .find(|c| c.label == "checkout")
        .expect("checkout offered");

    assert_eq!(checkout.kind, CompletionKind::Method);
    assert_eq!(checkout.replacement_start, 5);
    assert_eq!(checkout.replacement_length, 4);
    assert_eq!(checkout.detail, "Switch branches or restore files");
}

#[tokio::test]
async fn test_cursor_inside_word_replaces_nothing() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::new(), unix_config());
    let request = CompletionRequest::new("git checkout", 6).with_context(context(dir.path(), &[]));

    let response = engine.complete(&request).await;
    assert!(!response.candidates.is_empty());
    assert!(response.candidates.iter().all(|c| c.replacement_length == 0));
    assert!(response.candidates.iter().all(|c| c.replacement_start == 6));
}

#[cfg(unix)]
#[tokio::test]
async fn test_generator_labels_are_deduplicated() {
    use warp_complete::{GeneratorSpec, PostProcess};

    let dir = tempdir().unwrap();
    let spec = CommandSpec::new("deploy").arg(
        ArgSpec::new("target")
            .generator(GeneratorSpec::script(
                "printf",
                &["prod\tProduction\nstaging\tStaging\n"],
                PostProcess::lookup("keyValue").unwrap(),
            ))
            .generator(GeneratorSpec::script(
                "printf",
                &["staging\nqa\n"],
                PostProcess::default(),
            ))
            .suggestions(&["prod", "local"]),
    );
    let engine = CompletionEngine::new(SpecCatalog::from_specs(vec![spec]), unix_config());
    let request = CompletionRequest::at_end("deploy ").with_context(context(dir.path(), &[]));

    let response = engine.complete(&request).await;
    assert_eq!(response.labels(), vec!["prod", "staging", "qa", "local"]);
    assert_eq!(response.candidates[1].detail, "Staging");
    assert!(response.candidates.iter().all(|c| c.kind == CompletionKind::Argument));
}

#[tokio::test]
async fn test_filepaths_template_requests_files_without_candidates() {
    let dir = tempdir().unwrap();
    let spec = CommandSpec::new("open").arg(ArgSpec::new("file").template(TemplateKind::Filepaths));
    let engine = CompletionEngine::new(SpecCatalog::from_specs(vec![spec]), unix_config());
    let request = CompletionRequest::at_end("open ").with_context(context(dir.path(), &[]));

    let response = engine.complete(&request).await;
    assert!(response.files_requested);
    assert!(!response.folders_requested);
    assert!(response.candidates.is_empty());
    assert_eq!(response.resolved_cwd.as_deref(), Some(dir.path()));
}

#[test]
fn test_extension_matching_rules() {
    let strip = ExtensionMatching::Strip;
    assert!(spec_matches_executable("code", "code.cmd", strip));
    assert!(spec_matches_executable("code", "code.exe", strip));
    assert!(!spec_matches_executable("code", "code-insiders.cmd", strip));

    let prefix = ExtensionMatching::Prefix;
    assert!(spec_matches_executable("code", "code", prefix));
    assert!(spec_matches_executable("code", "code-insiders", prefix));
    assert!(!spec_matches_executable("code", "vscode", prefix));
}

#[tokio::test]
async fn test_spec_offered_only_for_matching_executable() {
    let dir = tempdir().unwrap();
    let catalog = || SpecCatalog::from_specs(vec![CommandSpec::new("code").description("Editor")]);

    let engine = CompletionEngine::new(catalog(), windows_config());
    let request = CompletionRequest::at_end("").with_context(context(dir.path(), &["code-insiders.cmd"]));
    let response = engine.complete(&request).await;
    assert_eq!(response.labels(), vec!["code-insiders.cmd"]);

    let request = CompletionRequest::at_end("").with_context(context(dir.path(), &["code.exe"]));
    let response = engine.complete(&request).await;
    assert_eq!(response.labels(), vec!["code", "code.exe"]);
    assert_eq!(response.candidates[0].detail, "Editor");
}

#[tokio::test]
async fn test_stripped_command_word_selects_spec() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::new(), windows_config());
    let request =
        CompletionRequest::at_end("code.exe --").with_context(context(dir.path(), &["code.exe"]));

    let response = engine.complete(&request).await;
    assert!(response.labels().contains(&"--new-window"));
}

#[tokio::test]
async fn test_working_directory_follows_prefix() {
    let repo = tempdir().unwrap();
    fs::create_dir(repo.path().join("src")).unwrap();
    let engine = CompletionEngine::new(SpecCatalog::new(), unix_config());

    let request = CompletionRequest::at_end("cat src/comp").with_context(context(repo.path(), &[]));
    let response = engine.complete(&request).await;
    assert!(response.files_requested);
    assert_eq!(response.resolved_cwd, Some(repo.path().join("src")));

    let request = CompletionRequest::at_end("cat lib/comp").with_context(context(repo.path(), &[]));
    let response = engine.complete(&request).await;
    assert_eq!(response.resolved_cwd, Some(repo.path().to_path_buf()));
}

#[cfg(unix)]
#[tokio::test]
async fn test_home_shorthand_from_request_environment() {
    let home = tempdir().unwrap();
    fs::create_dir(home.path().join("notes")).unwrap();
    let cwd = tempdir().unwrap();

    let mut ctx = context(cwd.path(), &[]);
    ctx.environment_variables = HashMap::from([(
        "HOME".to_string(),
        home.path().display().to_string(),
    )]);
    let engine = CompletionEngine::new(SpecCatalog::new(), unix_config());
    let response = engine
        .complete(&CompletionRequest::at_end("cd ~/notes/").with_context(ctx))
        .await;

    assert!(response.folders_requested);
    assert_eq!(response.resolved_cwd, Some(home.path().join("notes")));
}

/// Reports cancellation from the `after`-th poll onwards
struct CancelAfter {
    polls: AtomicUsize,
    after: usize,
}

impl CancellationCheck for CancelAfter {
    fn is_cancelled(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst) >= self.after
    }
}

#[tokio::test]
async fn test_cancellation_keeps_first_spec_candidates() {
    let dir = tempdir().unwrap();
    let specs = vec![
        CommandSpec::new("tool").subcommand(CommandSpec::new("first")),
        CommandSpec::new("tl").alias("tool").subcommand(CommandSpec::new("second")),
        CommandSpec::new("other").subcommand(CommandSpec::new("third")),
    ];
    let engine = CompletionEngine::new(SpecCatalog::from_specs(specs), unix_config());
    let request = CompletionRequest::at_end("tool ").with_context(context(dir.path(), &[]));

    let uncancelled = engine.complete(&request).await;
    assert_eq!(uncancelled.labels(), vec!["first", "second"]);

    // One poll per spec: the second spec observes cancellation
    let cancel = CancelAfter {
        polls: AtomicUsize::new(0),
        after: 1,
    };
    let response = engine.complete_with_cancel(&request, &cancel).await;
    assert_eq!(response.labels(), vec!["first"]);
    assert!(!response.files_requested);
    assert!(!response.folders_requested);
    assert_eq!(response.resolved_cwd, None);
}

#[tokio::test]
async fn test_cancelled_token_returns_empty_response() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::new(), unix_config());
    let token = CancellationToken::new();
    token.cancel();

    let request = CompletionRequest::at_end("git ").with_context(context(dir.path(), &["git"]));
    let response = engine.complete_with_cancel(&request, &token).await;
    assert!(response.candidates.is_empty());
}

#[tokio::test]
async fn test_command_position_falls_back_to_executables() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::empty(), unix_config());
    let request =
        CompletionRequest::at_end("").with_context(context(dir.path(), &["make", "python3", "make"]));

    let response = engine.complete(&request).await;
    assert_eq!(response.labels(), vec!["make", "python3"]);
    assert!(response.files_requested);
    assert!(response.folders_requested);
    assert!(response.candidates.iter().all(|c| c.kind == CompletionKind::Method));
}

#[tokio::test]
async fn test_builtins_follow_path_executables() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::empty(), unix_config())
        .with_builtin_source(StaticBuiltins::new().with(ShellKind::Zsh, &["cd", "print"]));

    let mut ctx = context(dir.path(), &["print"]);
    ctx.shell_kind = Some(ShellKind::Zsh);
    let response = engine.complete(&CompletionRequest::at_end("").with_context(ctx)).await;
    assert_eq!(response.labels(), vec!["print", "cd"]);
    assert_eq!(response.candidates[1].detail, "Shell builtin");

    // No builtins for a shell the source does not know
    let mut ctx = context(dir.path(), &["print"]);
    ctx.shell_kind = Some(ShellKind::Fish);
    let response = engine.complete(&CompletionRequest::at_end("").with_context(ctx)).await;
    assert_eq!(response.labels(), vec!["print"]);
}

#[tokio::test]
async fn test_persistent_option_inside_subcommand() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::new(), unix_config());
    let request =
        CompletionRequest::at_end("kubectl get -").with_context(context(dir.path(), &["kubectl"]));

    let response = engine.complete(&request).await;
    let labels = response.labels();
    let resource = labels.iter().position(|l| *l == "pod").unwrap();
    let namespace = labels.iter().position(|l| *l == "--namespace").unwrap();
    assert!(resource < namespace);
}

#[tokio::test]
async fn test_option_value_context() {
    let dir = tempdir().unwrap();
    let engine = CompletionEngine::new(SpecCatalog::new(), unix_config());

    let request = CompletionRequest::at_end("git log -n ").with_context(context(dir.path(), &[]));
    let response = engine.complete(&request).await;
    assert_eq!(response.labels(), vec!["5", "10", "20"]);
    assert!(!response.files_requested);

    let request = CompletionRequest::at_end("git -C ").with_context(context(dir.path(), &[]));
    let response = engine.complete(&request).await;
    assert!(response.folders_requested);
    assert!(response.candidates.is_empty());
}

#[tokio::test]
async fn test_specs_loaded_from_directory() {
    let specs = tempdir().unwrap();
    fs::write(
        specs.path().join("deploy.yaml"),
        "name: deploy\noptions:\n  - name: [--env, -e]\n    args:\n      suggestions: [prod, staging]\n",
    )
    .unwrap();

    let mut catalog = SpecCatalog::empty();
    assert_eq!(catalog.load_from_directory(specs.path()).unwrap(), 1);
    let engine = CompletionEngine::new(catalog, unix_config());

    let cwd = tempdir().unwrap();
    let request = CompletionRequest::at_end("deploy --env ").with_context(context(cwd.path(), &[]));
    let response = engine.complete(&request).await;
    assert_eq!(response.labels(), vec!["prod", "staging"]);
}

#[tokio::test]
async fn test_independent_engines_do_not_share_builtins() {
    let dir = tempdir().unwrap();
    let first = CompletionEngine::new(SpecCatalog::empty(), unix_config())
        .with_builtin_source(StaticBuiltins::new().with(ShellKind::Bash, &["alias"]));
    let second = CompletionEngine::new(SpecCatalog::empty(), unix_config())
        .with_builtin_source(StaticBuiltins::new().with(ShellKind::Bash, &["export"]));

    let mut ctx = context(dir.path(), &[]);
    ctx.shell_kind = Some(ShellKind::Bash);
    let request = CompletionRequest::at_end("").with_context(ctx);

    assert_eq!(first.complete(&request).await.labels(), vec!["alias"]);
    assert_eq!(second.complete(&request).await.labels(), vec!["export"]);
}

#[tokio::test]
async fn test_option_spec_builder_roundtrip_in_engine() {
    let dir = tempdir().unwrap();
    let spec = CommandSpec::new("fmt")
        .option(OptionSpec::new(&["--width"]).arg(ArgSpec::new("cols").suggestions(&["80", "100"])))
        .arg(ArgSpec::new("file").template(TemplateKind::Filepaths));
    let engine = CompletionEngine::new(SpecCatalog::from_specs(vec![spec]), unix_config());

    let request = CompletionRequest::at_end("fmt --width=80 ").with_context(context(dir.path(), &[]));
    let response = engine.complete(&request).await;
    assert!(response.files_requested);
    assert_eq!(response.labels(), vec!["--width"]);
}
