use testforge::ops::command::CommandSpec;
use testforge::ops::reporting::ReportCommands;
use testforge::pipeline::context::RunContext;

pub const LOGIN_RESPONSE: &str = concat!(
    r#"{"pageObjectCode":"export class LoginPage {\n  constructor(readonly page) {}\n}","#,
    r#""testSpecCode":"import { test } from '@playwright/test';\ntest('login', async () => {});"}"#
);

pub fn temp_context() -> (tempfile::TempDir, RunContext) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(dir.path().join("output"));
    (dir, ctx)
}

/// `sh -c <script>`; any path appended by the caller lands in `$0`.
pub fn shell(script: &str) -> CommandSpec {
    CommandSpec::new("sh", &["-c", script])
}

pub fn passing_runner() -> CommandSpec {
    shell("echo '1 passed'")
}

pub fn failing_runner() -> CommandSpec {
    shell("echo '1 failed: login should succeed'; exit 1")
}

pub fn working_reports(dir: &std::path::Path) -> ReportCommands {
    ReportCommands {
        generate: shell("exit 0"),
        open: Some(shell("exit 0")),
        report_dir: dir.join("allure-report"),
    }
}

pub fn broken_reports(dir: &std::path::Path) -> ReportCommands {
    ReportCommands {
        generate: shell("echo 'allure: command not found' >&2; exit 127"),
        open: Some(shell("exit 0")),
        report_dir: dir.join("allure-report"),
    }
}
