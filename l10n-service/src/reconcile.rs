//! Computes the writes needed to bring the table in line with a dictionary
//! or with machine translations.

use crate::config::TranslationTarget;
use crate::dictionary::LocaleDictionary;
use crate::errors::SyncError;
use crate::index::RecordIndex;
use crate::translate::Translator;
use notion::types::FieldValues;
use serde::Deserialize;

/// Whether existing field values may be replaced.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Overwrite {
    /// Dictionary wins: missing keys are created and every matching record
    /// is rewritten.
    Always,
    /// Only empty fields of existing records are filled.
    #[default]
    IfEmpty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconciliationOp {
    Create { fields: FieldValues },
    Update { id: String, fields: FieldValues },
}

/// Ordered writes plus the number of records that needed none.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plan {
    pub ops: Vec<ReconciliationOp>,
    pub skipped: usize,
}

fn single_field(field: &str, value: &str) -> FieldValues {
    FieldValues::from([(field.to_string(), value.to_string())])
}

/// Diffs the indexed table against one locale of the dictionary.
///
/// With `Overwrite::Always` every create precedes every update.
pub fn reconcile(
    index: &RecordIndex,
    dictionary: &LocaleDictionary,
    business_key_field: &str,
    target_field: &str,
    overwrite: Overwrite,
) -> Plan {
    let mut plan = Plan {
        ops: Vec::new(),
        skipped: index.skipped(),
    };

    if overwrite == Overwrite::Always {
        for (key, text) in dictionary.iter() {
            if !index.contains_key(key) {
                let mut fields = single_field(target_field, text);
                fields.insert(business_key_field.to_string(), key.to_string());
                plan.ops.push(ReconciliationOp::Create { fields });
            }
        }
    }

    for (key, record) in index.iter() {
        let Some(text) = dictionary.get(key) else {
            plan.skipped += 1;
            continue;
        };

        let needs_write = match overwrite {
            Overwrite::Always => true,
            Overwrite::IfEmpty => record.text(target_field).is_none(),
        };

        if needs_write {
            plan.ops.push(ReconciliationOp::Update {
                id: record.id.clone(),
                fields: single_field(target_field, text),
            });
        } else {
            plan.skipped += 1;
        }
    }

    plan
}

/// Fills empty target fields with translations of `source_field`.
///
/// Records without source text, or whose targets are all populated, are
/// skipped without calling the translator. Translations are requested one
/// at a time.
pub async fn reconcile_translations(
    index: &RecordIndex,
    source_field: &str,
    targets: &[TranslationTarget],
    translator: &dyn Translator,
) -> Result<Plan, SyncError> {
    let mut plan = Plan {
        ops: Vec::new(),
        skipped: index.skipped(),
    };

    for (key, record) in index.iter() {
        let Some(source_text) = record.text(source_field) else {
            plan.skipped += 1;
            continue;
        };

        let missing: Vec<&TranslationTarget> = targets
            .iter()
            .filter(|target| record.text(&target.field).is_none())
            .collect();
        if missing.is_empty() {
            plan.skipped += 1;
            continue;
        }

        let mut fields = FieldValues::new();
        for target in missing {
            let translated = translator.translate(source_text, &target.language).await?;
            tracing::debug!(key, field = %target.field, "Translated");
            fields.insert(target.field.clone(), translated);
        }

        plan.ops.push(ReconciliationOp::Update {
            id: record.id.clone(),
            fields,
        });
    }

    Ok(plan)
}
