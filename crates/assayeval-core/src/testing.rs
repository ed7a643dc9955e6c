use assayeval_types::EvalReport;
use anyhow::Result;

/// Helper to assert every classification endpoint reaches an AUC threshold.
///
/// Use this in your `#[test]` functions.
///
/// # Example
/// ```ignore
/// #[test]
/// fn test_my_model() -> Result<()> {
///     let eval = Evaluation::builder()
///         .data_source(data)
///         .model(model)
///         .task_types(task_types)
///         .build()?;
///
///     let report = eval.run()?;
///
///     assert_min_auc(&report, 0.7)?;
///
///     Ok(())
/// }
/// ```
pub fn assert_min_auc(report: &EvalReport, min_auc: f64) -> Result<()> {
    for (endpoint, auc) in &report.auc {
        if auc.is_nan() || *auc < min_auc {
            anyhow::bail!(
                "Evaluation failed: AUC {:.3} on '{}' is below threshold {:.3}\n{}",
                auc,
                endpoint,
                min_auc,
                report.summary_table()
            );
        }
    }
    Ok(())
}

/// Helper to assert every regression endpoint reaches an R² threshold.
pub fn assert_min_r2(report: &EvalReport, min_r2: f64) -> Result<()> {
    for (endpoint, r2) in &report.r2 {
        if r2.is_nan() || *r2 < min_r2 {
            anyhow::bail!(
                "Evaluation failed: R² {:.3} on '{}' is below threshold {:.3}\n{}",
                r2,
                endpoint,
                min_r2,
                report.summary_table()
            );
        }
    }
    Ok(())
}

/// Helper to assert no regression endpoint exceeds an RMS error.
pub fn assert_max_rms(report: &EvalReport, max_rms: f64) -> Result<()> {
    for (endpoint, rms) in &report.rms {
        if rms.is_nan() || *rms > max_rms {
            anyhow::bail!(
                "Evaluation failed: RMS {:.3} on '{}' is above limit {:.3}\n{}",
                rms,
                endpoint,
                max_rms,
                report.summary_table()
            );
        }
    }
    Ok(())
}
