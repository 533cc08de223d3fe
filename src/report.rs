#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Per-student score rows, the report that collects them, and the CSV writer.

use std::{
    collections::HashSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use bon::Builder;
use tabled::{
    Table,
    settings::{Panel, Style},
};

use crate::constants::{STUDENT_ID_COLUMN, TOTAL_COLUMN, UTF8_BOM};

/// Errors that abort a run while collecting or writing the report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// Two rows were produced for the same student.
    #[error("Student `{0}` appears more than once")]
    DuplicateStudent(String),
    /// The report could not be written.
    #[error("Could not write report to {}: {source}", .path.display())]
    Io {
        /// Destination being written.
        path:   PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// One student's result.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    /// Student identifier.
    student_id: String,
    /// Submission file name, if there was one.
    file_name:  Option<String>,
    /// Points per question, in question order.
    points:     Vec<f64>,
    /// Human-readable notes on lost points.
    remarks:    Vec<String>,
}

impl ScoreRow {
    /// Creates a new row.
    pub fn new(
        student_id: impl Into<String>,
        file_name: Option<String>,
        points: Vec<f64>,
        remarks: Vec<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            file_name,
            points,
            remarks,
        }
    }

    /// A row with zero points for every question.
    pub fn zero(
        student_id: impl Into<String>,
        file_name: Option<String>,
        questions: usize,
        remark: impl Into<String>,
    ) -> Self {
        Self::new(student_id, file_name, vec![0.0; questions], vec![remark.into()])
    }

    /// Student identifier.
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Submission file name.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Points per question.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Remarks.
    pub fn remarks(&self) -> &[String] {
        &self.remarks
    }

    /// Remarks joined for a single cell.
    pub fn remarks_line(&self) -> String {
        self.remarks.join(" | ")
    }

    /// Sum of question points.
    pub fn total(&self) -> f64 {
        self.points.iter().sum()
    }
}

/// All rows of a run, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Question identifiers, one score column each.
    questions: Vec<String>,
    /// Rows in insertion order.
    rows:      Vec<ScoreRow>,
    /// Student identifiers already present.
    seen:      HashSet<String>,
}

impl Report {
    /// Creates an empty report with one column per question.
    pub fn new(questions: Vec<String>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    /// Appends a row, rejecting a student seen before.
    pub fn push(&mut self, row: ScoreRow) -> Result<(), ReportError> {
        if !self.seen.insert(row.student_id.clone()) {
            return Err(ReportError::DuplicateStudent(row.student_id));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Question columns.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Rows in order.
    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the report has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds a student's row.
    pub fn row(&self, student_id: &str) -> Option<&ScoreRow> {
        self.rows.iter().find(|r| r.student_id == student_id)
    }

    /// Mean total over all rows, `0` when empty.
    pub fn mean_total(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.rows.iter().map(ScoreRow::total).sum::<f64>() / self.rows.len() as f64
    }

    /// Renders the rows as a terminal table titled `title`.
    pub fn summary_table(&self, title: &str, max_points: f64) -> String {
        let mut records: Vec<Vec<String>> = Vec::with_capacity(self.rows.len() + 1);
        let mut header = vec![STUDENT_ID_COLUMN.to_string()];
        header.extend(self.questions.iter().cloned());
        header.push(format!("{TOTAL_COLUMN} / {}", format_points(max_points)));
        records.push(header);

        for row in &self.rows {
            let mut record = vec![row.student_id.clone()];
            record.extend(row.points.iter().map(|p| format_points(*p)));
            record.push(format_points(row.total()));
            records.push(record);
        }

        Table::from_iter(records)
            .with(Panel::header(title))
            .with(Panel::footer(format!(
                "Mean: {:.2}/{}",
                self.mean_total(),
                format_points(max_points)
            )))
            .with(Style::modern())
            .to_string()
    }
}

/// Prints points as an integer when whole, otherwise as the shortest decimal
/// that round-trips.
pub fn format_points(points: f64) -> String {
    if points == 0.0 {
        return "0".to_string();
    }
    if points.fract() == 0.0 && points.abs() < 1e15 {
        return format!("{}", points as i64);
    }
    format!("{points}")
}

/// Quotes a CSV field when it contains a separator, quote or line break.
pub fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Serializes reports to CSV and writes them atomically.
#[derive(Debug, Clone, Copy, Builder)]
pub struct ReportWriter {
    /// Add `filename` and `remarks` columns.
    #[builder(default)]
    remarks: bool,
    /// Start with a UTF-8 byte order mark.
    #[builder(default = true)]
    bom:     bool,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReportWriter {
    /// Renders the full CSV document.
    pub fn render(&self, report: &Report) -> String {
        let mut out = String::new();
        if self.bom {
            out.push_str(UTF8_BOM);
        }

        let mut header = vec![STUDENT_ID_COLUMN.to_string()];
        header.extend(report.questions().iter().map(|q| csv_field(q)));
        header.push(TOTAL_COLUMN.to_string());
        if self.remarks {
            header.push("filename".to_string());
            header.push("remarks".to_string());
        }
        out.push_str(&header.join(","));
        out.push_str("\r\n");

        for row in report.rows() {
            let mut fields = vec![csv_field(row.student_id())];
            fields.extend(row.points().iter().map(|p| format_points(*p)));
            fields.push(format_points(row.total()));
            if self.remarks {
                fields.push(csv_field(row.file_name().unwrap_or_default()));
                fields.push(csv_field(&row.remarks_line()));
            }
            out.push_str(&fields.join(","));
            out.push_str("\r\n");
        }

        out
    }

    /// Writes the report to `path`: either the complete new file is in place
    /// afterwards, or the previous contents are untouched.
    pub fn write(&self, report: &Report, path: &Path) -> Result<(), ReportError> {
        let content = self.render(report);
        let io_err = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let tmp = temp_path(&dir, path);
        let written = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(content.as_bytes())?;
            file.flush()?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();

        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(source));
        }
        Ok(())
    }
}

/// Hidden sibling of `path` with a unique suffix.
fn temp_path(dir: &Path, path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.csv".to_string());
    dir.join(format!(".{name}.{}.tmp", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        let mut report = Report::new(vec!["q1".into(), "q2".into()]);
        report
            .push(ScoreRow::new(
                "alice",
                Some("alice_x.py".into()),
                vec![1.0, 2.5],
                vec![],
            ))
            .unwrap();
        report
            .push(ScoreRow::new(
                "bob",
                None,
                vec![0.0, 0.0],
                vec!["q1: expected [1, 2], got \"x\"".into(), "No submission found".into()],
            ))
            .unwrap();
        report
    }

    #[test]
    fn points_formatting() {
        assert_eq!(format_points(15.0), "15");
        assert_eq!(format_points(-0.0), "0");
        assert_eq!(format_points(2.5), "2.5");
        assert_eq!(format_points(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut report = report();
        let err = report
            .push(ScoreRow::zero("alice", None, 2, "again"))
            .unwrap_err();
        assert!(matches!(err, ReportError::DuplicateStudent(id) if id == "alice"));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn renders_plain_csv() {
        let writer = ReportWriter::builder().bom(false).build();
        assert_eq!(
            writer.render(&report()),
            "student_id,q1,q2,total\r\nalice,1,2.5,3.5\r\nbob,0,0,0\r\n"
        );
    }

    #[test]
    fn renders_remarks_with_quoting() {
        let writer = ReportWriter::builder().remarks(true).build();
        let csv = writer.render(&report());
        assert!(csv.starts_with(UTF8_BOM));
        let lines: Vec<&str> = csv.trim_start_matches(UTF8_BOM).lines().collect();
        assert_eq!(lines[0], "student_id,q1,q2,total,filename,remarks");
        assert_eq!(lines[1], "alice,1,2.5,3.5,alice_x.py,");
        assert_eq!(
            lines[2],
            "bob,0,0,0,,\"q1: expected [1, 2], got \"\"x\"\" | No submission found\""
        );
    }

    #[test]
    fn writes_atomically() {
        let dir = std::env::temp_dir().join(format!("scorecard-report-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("grades.csv");
        let writer = ReportWriter::default();

        writer.write(&report(), &path).unwrap();
        let first = fs::read(&path).unwrap();
        writer.write(&report(), &path).unwrap();
        assert_eq!(first, fs::read(&path).unwrap());

        let leftovers = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = std::env::temp_dir().join(format!("scorecard-report-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        // a directory in the way makes the final rename fail
        let path = dir.join("grades.csv");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let err = ReportWriter::default().write(&report(), &path).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        let entries: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(Result::ok).collect();
        assert_eq!(entries.len(), 1);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn summary_lists_every_student() {
        let table = report().summary_table("demo", 3.5);
        assert!(table.contains("alice"));
        assert!(table.contains("total / 3.5"));
        assert!(table.contains("Mean: 1.75/3.5"));
    }
}
