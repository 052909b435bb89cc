//! Batch run driver.
//!
//! One run reads the input workbook, builds the three exports and writes
//! them into a dated run directory:
//!
//! ```text
//! <base_dir>/
//! ├── logs/
//! │   └── log-10.18.txt              append-only, one line per event
//! └── 10.18.26/
//!     ├── Percentages-10.18-142501.xlsx
//!     ├── SMS-10.18-142501.xlsx
//!     └── RequestedDep-10.18-142501.xlsx
//! ```
//!
//! The clock and base directory are passed in through [`RunContext`]; nothing
//! here reads the current directory or the system time.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::logs::{log_error, log_info, log_success};
use crate::error::{ExportError, PipelineResult};
use crate::export::ExportKind;
use crate::transform::pipeline::{transform_file, TransformOptions};

/// Where and when a run happens.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub base_dir: PathBuf,
    pub now: DateTime<Local>,
}

impl RunContext {
    pub fn new(base_dir: impl Into<PathBuf>, now: DateTime<Local>) -> Self {
        Self {
            base_dir: base_dir.into(),
            now,
        }
    }

    /// `<base_dir>/<mm.dd.yy>`
    pub fn run_dir(&self) -> PathBuf {
        self.base_dir.join(self.now.format("%m.%d.%y").to_string())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// `<base_dir>/logs/log-<mm.dd>.txt`
    pub fn log_path(&self) -> PathBuf {
        self.log_dir()
            .join(format!("log-{}.txt", self.now.format("%m.%d")))
    }

    /// Suffix shared by the file names of one run.
    pub fn tag(&self) -> String {
        self.now.format("%m.%d-%H%M%S").to_string()
    }
}

/// The daily run log.
///
/// Every write opens the file in append mode, so earlier runs of the day are
/// never touched.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    now: DateTime<Local>,
}

impl RunLog {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            path: ctx.log_path(),
            now: ctx.now,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `<timestamp>: <message>`.
    pub fn write(&self, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}: {}", self.now.format("%Y-%m-%dT%H:%M:%S"), message)
    }
}

/// One workbook written by a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenWorkbook {
    pub kind: ExportKind,
    pub path: PathBuf,
    pub sheets: usize,
    pub rows: u32,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub log_path: PathBuf,
    pub row_count: usize,
    pub workbooks: Vec<WrittenWorkbook>,
}

/// Run the whole batch for `input`.
///
/// Failures are recorded in the run log as `Error: <message>` and then
/// returned. A failure before serialization leaves no workbook behind.
pub fn run_batch(ctx: &RunContext, input: &Path, options: &TransformOptions) -> PipelineResult<RunReport> {
    let run_dir = ctx.run_dir();
    fs::create_dir_all(ctx.log_dir()).map_err(ExportError::from)?;
    fs::create_dir_all(&run_dir).map_err(ExportError::from)?;

    let log = RunLog::new(ctx);
    log.write("Run started.").map_err(ExportError::from)?;

    match execute(ctx, &run_dir, input, options, &log) {
        Ok(report) => {
            log.write("Run finished successfully.").map_err(ExportError::from)?;
            log_success(format!("Run finished: {}", run_dir.display()));
            Ok(report)
        }
        Err(e) => {
            // the original error matters more than a failed log write
            let _ = log.write(&format!("Error: {}", e));
            log_error(e.to_string());
            Err(e)
        }
    }
}

fn execute(
    ctx: &RunContext,
    run_dir: &Path,
    input: &Path,
    options: &TransformOptions,
    log: &RunLog,
) -> PipelineResult<RunReport> {
    let output = transform_file(input, options)?;
    let files = output.bundle.to_xlsx()?;

    let tag = ctx.tag();
    let mut workbooks = Vec::with_capacity(files.len());

    for (kind, bytes) in files {
        let path = run_dir.join(kind.file_name(&tag));
        fs::write(&path, bytes).map_err(ExportError::from)?;

        let workbook = output.bundle.get(kind);
        log.write(&format!("{} workbook created: {}", kind_label(kind), path.display()))
            .map_err(ExportError::from)?;
        log_info(format!("💾 {} → {}", kind, path.display()));

        workbooks.push(WrittenWorkbook {
            kind,
            path,
            sheets: workbook.sheets().len(),
            rows: workbook.body_rows(),
        });
    }

    Ok(RunReport {
        run_dir: run_dir.to_path_buf(),
        log_path: log.path().to_path_buf(),
        row_count: output.info.row_count,
        workbooks,
    })
}

fn kind_label(kind: ExportKind) -> &'static str {
    match kind {
        ExportKind::Percentages => "Percentages",
        ExportKind::Sms => "SMS",
        ExportKind::Deposits => "RequestedDep",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Reader, Xlsx};
    use chrono::TimeZone;
    use tempfile::tempdir;

    const CSV: &str = "userid,nickname,phone,percentages,localecode,requested_dep,coin_reward_value\n\
                       101,nino,599000001,20,ka,50,5\n\
                       102,levan,599000002,0.3,en,100,10\n";

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, h, m, s).single().unwrap()
    }

    #[test]
    fn test_context_naming() {
        let ctx = RunContext::new("daily", at(14, 25, 1));
        assert_eq!(ctx.run_dir(), PathBuf::from("daily").join("10.18.26"));
        assert_eq!(ctx.log_path(), PathBuf::from("daily").join("logs").join("log-10.18.txt"));
        assert_eq!(ctx.tag(), "10.18-142501");
    }

    #[test]
    fn test_run_writes_three_workbooks_and_log() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("promo.csv");
        fs::write(&input, CSV).unwrap();

        let ctx = RunContext::new(dir.path().join("daily"), at(9, 0, 0));
        let report = run_batch(&ctx, &input, &TransformOptions::default()).unwrap();

        assert_eq!(report.row_count, 2);
        let names: Vec<String> = report
            .workbooks
            .iter()
            .map(|w| w.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Percentages-10.18-090000.xlsx",
                "SMS-10.18-090000.xlsx",
                "RequestedDep-10.18-090000.xlsx"
            ]
        );
        for w in &report.workbooks {
            assert!(w.path.starts_with(ctx.run_dir()));
        }

        let sms: Xlsx<_> = open_workbook(&report.workbooks[1].path).unwrap();
        assert_eq!(sms.sheet_names(), vec!["en".to_string(), "ka".to_string()]);

        let log = fs::read_to_string(ctx.log_path()).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "2026-10-18T09:00:00: Run started.");
        assert!(lines[1].contains("Percentages workbook created: "));
        assert!(lines[2].contains("SMS workbook created: "));
        assert!(lines[3].contains("RequestedDep workbook created: "));
        assert_eq!(lines[4], "2026-10-18T09:00:00: Run finished successfully.");
    }

    #[test]
    fn test_log_is_appended_across_runs() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("promo.csv");
        fs::write(&input, CSV).unwrap();

        let base = dir.path().join("daily");
        run_batch(&RunContext::new(&base, at(9, 0, 0)), &input, &TransformOptions::default()).unwrap();
        let ctx = RunContext::new(&base, at(9, 30, 0));
        run_batch(&ctx, &input, &TransformOptions::default()).unwrap();

        let log = fs::read_to_string(ctx.log_path()).unwrap();
        assert_eq!(log.lines().count(), 10);
        assert_eq!(fs::read_dir(ctx.run_dir()).unwrap().count(), 6);
    }

    #[test]
    fn test_missing_field_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("promo.csv");
        fs::write(&input, "userid,nickname,phone,localecode,requested_dep,coin_reward\n1,a,2,ka,50,5\n").unwrap();

        let ctx = RunContext::new(dir.path().join("daily"), at(9, 0, 0));
        let err = run_batch(&ctx, &input, &TransformOptions::default()).unwrap_err();
        assert!(err.to_string().contains("percent"));

        assert_eq!(fs::read_dir(ctx.run_dir()).unwrap().count(), 0);
        let log = fs::read_to_string(ctx.log_path()).unwrap();
        let last = log.lines().last().unwrap();
        assert!(last.starts_with("2026-10-18T09:00:00: Error: Missing column for field 'percent'"));
    }

    #[test]
    fn test_missing_input_is_logged() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path().join("daily"), at(9, 0, 0));
        let result = run_batch(&ctx, &dir.path().join("nope.xlsx"), &TransformOptions::default());
        assert!(result.is_err());
        let log = fs::read_to_string(ctx.log_path()).unwrap();
        assert!(log.contains(": Error: "));
    }
}
