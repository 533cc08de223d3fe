#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

/// Header printed before the joined users/orders answer.
pub const JOINED_HEADER: &str = "✅ Joined Result:";

/// Header printed before the per-user aggregate answer.
pub const GROUPED_HEADER: &str = "✅ Grouped Result:";

/// Header printed before the sorted aggregate answer.
pub const SORTED_HEADER: &str = "✅ Sorted Result:";

/// Header printed before the top spender answer.
pub const TOP_USER_HEADER: &str = "🏆 Top User:";

/// Submissions for the list exercise.
pub const PYTHON_LIST_SRC_DIR: &str = "python_list_src";

/// Report for the list exercise.
pub const PYTHON_LIST_OUTPUT: &str = "output/python_list_grades.csv";

/// Submissions for the pandas exercise.
pub const PANDAS_SRC_DIR: &str = "pandas_src";

/// Report for the pandas exercise.
pub const PANDAS_OUTPUT: &str = "output/pandas_grades.csv";

/// Wall-clock limit for a single submission run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Overrides the Python interpreter used to run submissions.
pub const PYTHON_ENV: &str = "SCORECARD_PYTHON";

/// Overrides [`DEFAULT_TIMEOUT`], in whole seconds.
pub const TIMEOUT_ENV: &str = "SCORECARD_TIMEOUT_SECS";

/// UTF-8 byte order mark, written so spreadsheet tools detect the encoding.
pub const UTF8_BOM: &str = "\u{feff}";

/// Characters of stderr kept in a remark.
pub const STDERR_EXCERPT_CHARS: usize = 500;

/// First column of every report.
pub const STUDENT_ID_COLUMN: &str = "student_id";

/// Last score column of every report.
pub const TOTAL_COLUMN: &str = "total";
