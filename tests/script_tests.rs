//! End-to-end tests that run the fixture submissions under a real Python
//! interpreter. Each test is skipped when no interpreter is available.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use scorecard::{
    ExerciseKind, ReportWriter,
    config::GradingConfig,
    constants::UTF8_BOM,
    exercise::file,
    grade::grade_all,
    python::Interpreter,
    submission::{ScriptResolver, Submission, SubmissionLoadError, SubmissionResolver},
};

fn fixture_root(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn python() -> Option<Interpreter> {
    match Interpreter::discover() {
        Ok(interpreter) => Some(interpreter),
        Err(e) => {
            eprintln!("skipping: {e}");
            None
        }
    }
}

fn temp_csv() -> PathBuf {
    std::env::temp_dir()
        .join(format!("scorecard-{}", uuid::Uuid::new_v4()))
        .join("grades.csv")
}

fn config(src: &str, interpreter: Interpreter) -> GradingConfig {
    GradingConfig::builder()
        .src_dir(fixture_root(src))
        .output(temp_csv())
        .interpreter(interpreter)
        .build()
}

fn remove_output(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn python_list_fixtures_are_scored() {
    let Some(interpreter) = python() else {
        return;
    };
    let exercise = ExerciseKind::PythonList.exercise();
    let config = config("python_list", interpreter);
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    let totals: Vec<(&str, f64)> = report
        .rows()
        .iter()
        .map(|r| (r.student_id(), r.total()))
        .collect();
    assert_eq!(
        totals,
        [("alice", 70.0), ("bob", 55.0), ("carol", 0.0), ("dave", 0.0), ("erin", 0.0)]
    );

    let bob = report.row("bob").unwrap();
    assert_eq!(bob.points(), [15.0, 30.0, 0.0, 10.0]);
    assert!(bob.remarks()[0].starts_with("sorted_result: expected [('Alice'"));

    let carol = report.row("carol").unwrap();
    assert_eq!(carol.remarks().len(), 1);
    assert!(carol.remarks()[0].starts_with("Script failed (exit 1). Stderr: Traceback"));

    assert!(report.row("dave").unwrap().remarks()[0].starts_with("Syntax error near line"));
    assert_eq!(
        report.row("erin").unwrap().remarks(),
        ["Missing definition(s): top_user"]
    );
}

#[tokio::test]
async fn report_is_written_and_reproducible() {
    let Some(interpreter) = python() else {
        return;
    };
    let exercise = ExerciseKind::PythonList.exercise();
    let config = config("python_list", interpreter);
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");
    let writer = ReportWriter::default();

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    writer.write(&report, config.output()).expect("write");
    let first = std::fs::read_to_string(config.output()).expect("read");

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    writer.write(&report, config.output()).expect("write");
    let second = std::fs::read_to_string(config.output()).expect("read");

    assert_eq!(first, second);
    let mut lines = first.trim_start_matches(UTF8_BOM).lines();
    assert!(first.starts_with(UTF8_BOM));
    assert_eq!(
        lines.next(),
        Some("student_id,joined,grouped,sorted_result,top_user,total")
    );
    assert_eq!(lines.next(), Some("alice,15,30,15,10,70"));

    remove_output(config.output());
}

#[tokio::test]
async fn roster_students_without_files_score_zero() {
    let Some(interpreter) = python() else {
        return;
    };
    let exercise = ExerciseKind::PythonList.exercise();
    let config = GradingConfig::builder()
        .src_dir(fixture_root("python_list"))
        .output(temp_csv())
        .roster(fixture_root("roster.txt"))
        .interpreter(interpreter)
        .build();
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let entries = resolver.discover().expect("discover");
    let ids: Vec<_> = entries.iter().map(|e| e.student_id()).collect();
    assert_eq!(ids, ["alice", "zed", "bob", "carol", "dave", "erin"]);
    assert_eq!(resolver.resolve(&entries[1]).unwrap_err(), SubmissionLoadError::Missing);

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    let zed = report.row("zed").unwrap();
    assert_eq!(zed.points(), [0.0, 0.0, 0.0, 0.0]);
    assert_eq!(zed.file_name(), None);
}

#[tokio::test]
async fn runaway_scripts_time_out() {
    let Some(interpreter) = python() else {
        return;
    };
    let exercise = ExerciseKind::PythonList.exercise();
    let config = GradingConfig::builder()
        .src_dir(fixture_root("slow"))
        .output(temp_csv())
        .timeout(Duration::from_secs(1))
        .interpreter(interpreter)
        .build();
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    let sam = report.row("sam").unwrap();
    assert_eq!(sam.total(), 0.0);
    assert_eq!(sam.remarks(), ["Timed out after 1s"]);
}

#[tokio::test]
async fn runs_are_cached_per_stdin() {
    let Some(interpreter) = python() else {
        return;
    };
    let exercise = file::load(&fixture_root("exercises").join("double.json")).expect("exercise");
    let config = config("stdin", interpreter);
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let entries = resolver.discover().expect("discover");
    let mut submission = resolver.resolve(&entries[0]).expect("resolve");
    assert_eq!(submission.student_id(), "pat");

    let first = submission.execute(Some("4\n")).await.expect("run");
    assert_eq!(first.stdout.lines().last(), Some("[4, 8]"));
    let again = submission.execute(Some("4\n")).await.expect("run");
    assert_eq!(first, again);

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    let pat = report.row("pat").unwrap();
    assert_eq!(pat.points(), [2.0]);
    assert_eq!(pat.remarks().len(), 1);
    assert!(pat.remarks()[0].starts_with("Script failed (exit 1)"));
}

#[tokio::test]
async fn printed_tables_are_accepted_for_pandas() {
    let Some(interpreter) = python() else {
        return;
    };
    let exercise = ExerciseKind::Pandas.exercise();
    let config = config("pandas_text", interpreter);
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    assert_eq!(report.row("hank").unwrap().points(), [5.0, 10.0, 20.0, 5.0]);
    assert_eq!(report.row("ivy").unwrap().points(), [5.0, 10.0, 0.0, 0.0]);
}

#[tokio::test]
async fn real_pandas_submission_earns_full_points() {
    let Some(interpreter) = python() else {
        return;
    };
    let Interpreter::Python(python) = &interpreter else {
        return;
    };
    let has_pandas = std::process::Command::new(python)
        .args(["-c", "import pandas"])
        .output()
        .is_ok_and(|out| out.status.success());
    if !has_pandas {
        eprintln!("skipping: pandas is not installed");
        return;
    }

    let exercise = ExerciseKind::Pandas.exercise();
    let config = config("pandas", interpreter.clone());
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    let alice = report.row("alice").unwrap();
    assert_eq!(alice.total(), 40.0, "{:?}", alice.remarks());
}

#[test]
fn non_utf8_sources_still_load() {
    let exercise = ExerciseKind::PythonList.exercise();
    let config = config("encodings", Interpreter::Python(PathBuf::from("python3")));
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let entries = resolver.discover().expect("discover");
    assert_eq!(entries.len(), 1);
    let submission = resolver.resolve(&entries[0]).expect("latin-1 file should load");
    assert_eq!(submission.student_id(), "lee");
}

#[tokio::test]
async fn coding_declarations_are_left_to_python() {
    let Some(interpreter) = python() else {
        return;
    };
    let exercise = ExerciseKind::PythonList.exercise();
    let config = config("encodings", interpreter);
    let resolver = ScriptResolver::new(&config, &exercise).expect("resolver");

    let report = grade_all(&resolver, &exercise).await.expect("grade");
    let lee = report.row("lee").unwrap();
    assert_eq!(lee.total(), 70.0, "{:?}", lee.remarks());
}
