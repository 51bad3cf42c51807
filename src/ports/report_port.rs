//! Report generation port trait.

use crate::domain::error::WfoptError;
use crate::domain::walk_forward::EvaluationResult;

/// Everything a report needs about one walk-forward run.
pub struct ReportInput<'a> {
    pub results: &'a [EvaluationResult],
    /// Bar timestamps of the analysed series, indexed like the windows.
    pub timestamps: &'a [chrono::NaiveDateTime],
}

/// Port for writing walk-forward reports.
pub trait ReportPort {
    fn write(&self, input: &ReportInput<'_>, output_path: &str) -> Result<(), WfoptError>;
}
