use crate::errors::SyncError;
use crate::metrics_defs::{RECORDS_CREATED, RECORDS_SKIPPED, RECORDS_UPDATED};
use crate::reconcile::{Plan, ReconciliationOp};
use notion::RecordSource;
use serde::Serialize;
use shared::counter;

/// Outcome of one handler run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Applies the plan's operations one after another, in order.
///
/// The first failed write aborts the run. Writes that already succeeded are
/// not rolled back.
pub async fn apply(
    source: &dyn RecordSource,
    table_id: &str,
    plan: Plan,
) -> Result<RunResult, SyncError> {
    let mut result = RunResult {
        skipped: plan.skipped,
        ..Default::default()
    };
    counter!(RECORDS_SKIPPED).increment(plan.skipped as u64);

    for op in plan.ops {
        match op {
            ReconciliationOp::Create { fields } => {
                let id = source
                    .create(table_id, &fields)
                    .await
                    .map_err(|e| SyncError::Write {
                        target: format!("new record in {table_id}"),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(record_id = %id, "Created record");
                result.created += 1;
                counter!(RECORDS_CREATED).increment(1);
            }
            ReconciliationOp::Update { id, fields } => {
                source
                    .update(&id, &fields)
                    .await
                    .map_err(|e| SyncError::Write {
                        target: id.clone(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(record_id = %id, "Updated record");
                result.updated += 1;
                counter!(RECORDS_UPDATED).increment(1);
            }
        }
    }

    Ok(result)
}
