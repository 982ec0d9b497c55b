//! The handler pipelines: read the table, reconcile, write back.

use crate::config::{DictionarySync, ExportSettings, HandlerAction, TranslateSettings};
use crate::dictionary::DictionarySource;
use crate::errors::SyncError;
use crate::export::{Archive, archive_filename, build_archive, locale_documents};
use crate::index::RecordIndex;
use crate::reconcile::{Overwrite, reconcile, reconcile_translations};
use crate::translate::Translator;
use crate::writer::{RunResult, apply};
use notion::types::SelectFilter;
use notion::{Record, RecordSource, TablePager, TableQuery};
use serde::Serialize;
use std::sync::Arc;

/// JSON body of a successful sync response.
#[derive(Debug, PartialEq, Serialize)]
pub struct Summary {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<usize>,
}

#[derive(Debug)]
pub enum HandlerOutput {
    Summary(Summary),
    Attachment(Archive),
}

/// Everything a handler run needs. Built once at startup and shared by all
/// requests; holds no per-request state.
pub struct SyncContext {
    pub source: Arc<dyn RecordSource>,
    pub dictionary: Arc<dyn DictionarySource>,
    pub translator: Option<Arc<dyn Translator>>,
    pub table_id: String,
    pub business_key: String,
}

impl SyncContext {
    async fn read_table(&self, filter: Option<SelectFilter>) -> Result<Vec<Record>, SyncError> {
        let query = TableQuery::new(self.table_id.as_str()).with_filter(filter);
        Ok(TablePager::new(self.source.as_ref(), query).read_all().await?)
    }

    pub async fn execute(&self, action: &HandlerAction) -> Result<HandlerOutput, SyncError> {
        match action {
            HandlerAction::SyncDictionary(settings) => {
                let result = self.sync_dictionary(settings).await?;
                let summary = match settings.overwrite {
                    Overwrite::IfEmpty => Summary {
                        message: format!(
                            "Filled {} for {} records",
                            settings.target_field, result.updated
                        ),
                        added: None,
                        updated: Some(result.updated),
                    },
                    Overwrite::Always => Summary {
                        message: format!(
                            "Synced {}: {} added, {} updated",
                            settings.target_field, result.created, result.updated
                        ),
                        added: Some(result.created),
                        updated: Some(result.updated),
                    },
                };
                Ok(HandlerOutput::Summary(summary))
            }
            HandlerAction::Translate(settings) => {
                let result = self.translate(settings).await?;
                Ok(HandlerOutput::Summary(Summary {
                    message: format!("Translated {} records", result.updated),
                    added: None,
                    updated: Some(result.updated),
                }))
            }
            HandlerAction::Export(settings) => {
                Ok(HandlerOutput::Attachment(self.export(settings).await?))
            }
        }
    }

    /// Copies one dictionary locale into `target_field`.
    pub async fn sync_dictionary(&self, settings: &DictionarySync) -> Result<RunResult, SyncError> {
        let (dictionary, records) = tokio::try_join!(
            self.dictionary.fetch(&settings.locale),
            self.read_table(None),
        )?;

        let index = RecordIndex::build(
            records,
            &self.business_key,
            &[settings.target_field.as_str()],
        );
        let plan = reconcile(
            &index,
            &dictionary,
            &self.business_key,
            &settings.target_field,
            settings.overwrite,
        );

        tracing::info!(
            locale = %settings.locale,
            overwrite = ?settings.overwrite,
            dictionary_entries = dictionary.len(),
            indexed = index.len(),
            ops = plan.ops.len(),
            "Reconciled dictionary"
        );

        apply(self.source.as_ref(), &self.table_id, plan).await
    }

    /// Machine-translates `source_field` into every empty target field.
    pub async fn translate(&self, settings: &TranslateSettings) -> Result<RunResult, SyncError> {
        let translator = self
            .translator
            .as_deref()
            .ok_or(SyncError::NotConfigured("translation"))?;

        let records = self.read_table(None).await?;

        let mut fields = vec![settings.source_field.as_str()];
        fields.extend(settings.targets.iter().map(|t| t.field.as_str()));
        let index = RecordIndex::build(records, &self.business_key, &fields);

        let plan =
            reconcile_translations(&index, &settings.source_field, &settings.targets, translator)
                .await?;

        tracing::info!(
            indexed = index.len(),
            ops = plan.ops.len(),
            "Reconciled translations"
        );

        apply(self.source.as_ref(), &self.table_id, plan).await
    }

    /// Builds the locale archive, named after the table.
    pub async fn export(&self, settings: &ExportSettings) -> Result<Archive, SyncError> {
        let (title, records) = tokio::try_join!(
            async { Ok::<_, SyncError>(self.source.title(&self.table_id).await?) },
            self.read_table(settings.filter.clone()),
        )?;

        let fields: Vec<&str> = settings.locales.values().map(String::as_str).collect();
        let index = RecordIndex::build(records, &self.business_key, &fields);
        let documents = locale_documents(&index, &settings.locales);
        let data = build_archive(&documents)?;
        let filename = archive_filename(&title);

        tracing::info!(
            filename = %filename,
            locales = documents.len(),
            keys = index.len(),
            bytes = data.len(),
            "Built locale archive"
        );

        Ok(Archive { filename, data })
    }
}
