//! End-to-end tests: archive in, task record out.
//!
//! Adding a case means adding an entry to `TEST_CASES`; each case is
//! uploaded through a fresh orchestrator with no text generator configured.

mod common;

use std::sync::Arc;

use codestory::llm::LlmError;
use codestory::project::TreeNode;
use codestory::task::{StatusKind, TaskStatus};
use codestory::FileSummary;

use common::{RecordingStore, ScriptedGenerator, TestHarness, ZipBuilder};

struct TestCase {
    name: &'static str,
    files: &'static [(&'static str, &'static str)],
    expect_completed: bool,
    /// (path, functions, classes) for every file expected in the summaries.
    expected_symbols: &'static [(&'static str, &'static [&'static str], &'static [&'static str])],
}

const TEST_CASES: &[TestCase] = &[
    TestCase {
        name: "single_python_function",
        files: &[("hello.py", "def hello():\n    print('hi')")],
        expect_completed: true,
        expected_symbols: &[("hello.py", &["hello"], &[])],
    },
    TestCase {
        name: "python_class_and_module",
        files: &[
            ("app/models.py", "class User:\n    def save(self):\n        pass\n"),
            ("app/main.py", "import os\n\ndef run():\n    pass\n"),
        ],
        expect_completed: true,
        expected_symbols: &[
            ("app/main.py", &["run"], &[]),
            ("app/models.py", &[], &["User"]),
        ],
    },
    TestCase {
        name: "javascript_functions",
        files: &[(
            "web/util.js",
            "function add(a, b) {\n  return a + b;\n}\nconst mul = (a, b) => a * b;\n",
        )],
        expect_completed: true,
        expected_symbols: &[("web/util.js", &["add", "mul"], &[])],
    },
    TestCase {
        name: "image_only_archive_fails",
        files: &[("logo.png", "\u{89}PNG")],
        expect_completed: false,
        expected_symbols: &[],
    },
    TestCase {
        name: "dependency_dirs_only_fails",
        files: &[("node_modules/lib/index.js", "function x() {}\n")],
        expect_completed: false,
        expected_symbols: &[],
    },
];

fn build_archive(files: &[(&str, &str)]) -> Vec<u8> {
    files
        .iter()
        .fold(ZipBuilder::new(), |zip, (name, body)| zip.file(name, body))
        .build()
}

fn find<'a>(summaries: &'a [FileSummary], path: &str) -> &'a FileSummary {
    summaries
        .iter()
        .find(|s| s.file_path == path)
        .unwrap_or_else(|| panic!("no summary for {}", path))
}

#[tokio::test]
async fn test_all_cases() {
    for case in TEST_CASES {
        let harness = TestHarness::new();
        let orchestrator = harness.orchestrator();

        let (receipt, handle) = orchestrator
            .submit(build_archive(case.files))
            .unwrap_or_else(|e| panic!("[{}] upload rejected: {}", case.name, e));
        let outcome = handle.wait().await.unwrap();

        let task = orchestrator.task(&receipt.task_id).unwrap();
        if case.expect_completed {
            assert!(outcome.success, "[{}] failed: {:?}", case.name, task.error);
            assert_eq!(task.status, TaskStatus::Completed, "[{}]", case.name);
            assert_eq!(task.progress, 100, "[{}]", case.name);

            let summaries = orchestrator.file_summaries(&receipt.task_id);
            for (path, functions, classes) in case.expected_symbols {
                let summary = find(&summaries, path);
                assert_eq!(&summary.functions, functions, "[{}] {}", case.name, path);
                assert_eq!(&summary.classes, classes, "[{}] {}", case.name, path);
            }
        } else {
            assert!(!outcome.success, "[{}] unexpectedly completed", case.name);
            assert_eq!(task.status, TaskStatus::Failed, "[{}]", case.name);
            assert!(task.progress < 100, "[{}]", case.name);
            assert!(orchestrator.result(&receipt.task_id).is_none());
            assert!(orchestrator.file_summaries(&receipt.task_id).is_empty());
        }

        assert!(
            harness.leftover_work_dirs().is_empty(),
            "[{}] work directory left behind",
            case.name
        );
        orchestrator.shutdown().await;
    }
}

#[tokio::test]
async fn test_empty_project_reports_reason() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator();

    let archive = ZipBuilder::new().file("photo.jpg", "jpeg").build();
    let (receipt, handle) = orchestrator.submit(archive).unwrap();
    handle.wait().await.unwrap();

    let status = orchestrator.status(&receipt.task_id);
    assert_eq!(status.status, StatusKind::Failed);
    assert_eq!(status.progress, Some(25));
    let error = orchestrator.task(&receipt.task_id).unwrap().error.unwrap();
    assert!(error.contains("empty"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_generated_summaries_and_diagram_are_used() {
    let harness = TestHarness::new();
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok(r#"```json
{"api/server.py": "Serves the HTTP API."}
```"#
            .to_string()),
        Ok("```mermaid\ngraph TD\n    A[api] --> B[db]\n```".to_string()),
    ]));
    let orchestrator = harness.orchestrator_with(generator.clone(), Arc::new(RecordingStore::new()));

    let archive = ZipBuilder::new()
        .file("api/server.py", "def serve():\n    pass\n")
        .build();
    let (receipt, handle) = orchestrator.submit(archive).unwrap();
    let outcome = handle.wait().await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.warnings, 0);

    let summaries = orchestrator.file_summaries(&receipt.task_id);
    assert_eq!(
        summaries[0].ai_summary.as_deref(),
        Some("Serves the HTTP API.")
    );

    let result = orchestrator.result(&receipt.task_id).unwrap();
    assert_eq!(result.diagram, "graph TD\n    A[api] --> B[db]");

    let mut tree_summaries = Vec::new();
    collect_file_summaries(&result.tree, &mut tree_summaries);
    assert!(tree_summaries.contains(&Some("Serves the HTTP API.".to_string())));

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].user.contains("api/server.py"));
}

#[tokio::test]
async fn test_generator_failure_falls_back() {
    let harness = TestHarness::new();
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Err(LlmError::Http {
            status: 503,
            body: "unavailable".to_string(),
        }),
        Err(LlmError::Network("connection reset".to_string())),
    ]));
    let orchestrator = harness.orchestrator_with(generator, Arc::new(RecordingStore::new()));

    let archive = ZipBuilder::new()
        .file("backend/app.py", "def main():\n    pass\n")
        .file("frontend/index.js", "function render() {}\n")
        .build();
    let (receipt, handle) = orchestrator.submit(archive).unwrap();
    let outcome = handle.wait().await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.warnings, 2);

    let result = orchestrator.result(&receipt.task_id).unwrap();
    assert!(result.diagram.starts_with("graph TD"));
    assert!(result.diagram.contains("backend"));
    assert!(result.diagram.contains("frontend"));
    assert!(result.diagram.contains("-->"));

    let summaries = orchestrator.file_summaries(&receipt.task_id);
    assert!(summaries.iter().all(|s| s.ai_summary.is_some()));
}

#[tokio::test]
async fn test_secrets_never_reach_collaborators() {
    let harness = TestHarness::new();
    let generator = Arc::new(ScriptedGenerator::failing());
    let store = Arc::new(RecordingStore::new());
    let orchestrator = harness.orchestrator_with(generator.clone(), store.clone());

    let source = "API_KEY = \"sk-live-abcdef123456\"\nADMIN = 'root@example.com'\nHOST = '10.0.0.12'\n\ndef connect():\n    pass\n";
    let archive = ZipBuilder::new().file("settings.py", source).build();
    let (receipt, handle) = orchestrator.submit(archive).unwrap();
    assert!(handle.wait().await.unwrap().success);

    let summaries = orchestrator.file_summaries(&receipt.task_id);
    let preview = &summaries[0].sanitized_preview;
    assert!(preview.contains("***REDACTED***"));
    assert!(!preview.contains("sk-live-abcdef123456"));
    assert!(!preview.contains("root@example.com"));
    assert!(!preview.contains("10.0.0.12"));

    let fragments = store.fragments();
    assert!(!fragments.is_empty());
    for fragment in &fragments {
        assert!(!fragment.text.contains("sk-live-abcdef123456"));
        assert!(!fragment.text.contains("root@example.com"));
    }
    assert_eq!(fragments[0].id, "settings.py#0");
    assert_eq!(fragments[0].metadata.language, "py");

    for prompt in generator.prompts() {
        assert!(!prompt.user.contains("sk-live-abcdef123456"));
    }
}

#[tokio::test]
async fn test_docstrings_are_redacted_in_file_summaries() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator();

    let source = "\"\"\"Ops: admin@corp.example, db 10.1.2.3, password: 'hunter2'\"\"\"\n\ndef serve():\n    pass\n";
    let archive = ZipBuilder::new().file("svc.py", source).build();
    let (receipt, handle) = orchestrator.submit(archive).unwrap();
    assert!(handle.wait().await.unwrap().success);

    let summaries = orchestrator.file_summaries(&receipt.task_id);
    let doc = summaries[0].doc_comment.as_deref().unwrap();
    assert!(doc.contains("***REDACTED***"));
    for leaked in ["admin@corp.example", "10.1.2.3", "hunter2"] {
        assert!(!doc.contains(leaked), "doc comment leaked {}", leaked);
    }
}

fn collect_file_summaries(node: &TreeNode, out: &mut Vec<Option<String>>) {
    match node {
        TreeNode::File { summary, .. } => out.push(summary.clone()),
        TreeNode::Folder { children, .. } => {
            for child in children {
                collect_file_summaries(child, out);
            }
        }
    }
}
