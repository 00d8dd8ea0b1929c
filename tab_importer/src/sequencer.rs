use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use itertools::Itertools;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

use crate::bootstrap::{bootstrap_tournament, TournamentBase, TournamentSettings};
use crate::client::{extract_identifier, SubmissionRequest, TournamentApi};
use crate::entity_type::{EntityType, IMPORT_ORDER};
use crate::error::ImportError;
use crate::registry::{QualifiedKey, ReferenceRegistry, RemoteId};
use crate::row::{cell_text, Row, RowReader};

const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Init,
    BootstrapTournament,
    Importing(EntityType),
    Done,
}

/// A visible record of one successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Created { entity_type: EntityType, key: String },
    Updated { entity_type: EntityType, target: RemoteId },
}

impl Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::Created { key, .. } => write!(f, "Created {}", key),
            Activity::Updated { target, .. } => write!(f, "Updated {}", target),
        }
    }
}

/// The tabular source for each entity type. Types without a source are skipped.
#[derive(Default)]
pub struct ImportSources {
    sources: HashMap<EntityType, Box<dyn Read + Send>>,
}

impl std::fmt::Debug for ImportSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportSources")
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ImportSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `{file_stem}.csv` in `dir` for every entity type that has one.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ImportError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ImportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            )));
        }

        let mut sources = Self::new();
        for entity_type in IMPORT_ORDER {
            let path = dir.join(format!("{}.csv", entity_type.file_stem()));
            if path.is_file() {
                sources.insert(entity_type, BufReader::new(File::open(&path)?));
            }
        }
        Ok(sources)
    }

    pub fn insert(&mut self, entity_type: EntityType, source: impl Read + Send + 'static) {
        self.sources.insert(entity_type, Box::new(source));
    }

    pub fn with(mut self, entity_type: EntityType, source: impl Read + Send + 'static) -> Self {
        self.insert(entity_type, source);
        self
    }

    pub fn contains(&self, entity_type: EntityType) -> bool {
        self.sources.contains_key(&entity_type)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn take(&mut self, entity_type: EntityType) -> Option<Box<dyn Read + Send>> {
        self.sources.remove(&entity_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeSummary {
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub tournament: Option<TournamentBase>,
    pub types: Vec<(EntityType, TypeSummary)>,
}

impl ImportSummary {
    pub fn get(&self, entity_type: EntityType) -> Option<&TypeSummary> {
        self.types.iter().find(|(t, _)| *t == entity_type).map(|(_, s)| s)
    }

    pub fn total_failed(&self) -> usize {
        self.types.iter().map(|(_, s)| s.failed).sum()
    }

    pub fn imported_types(&self) -> String {
        self.types.iter().map(|(t, _)| t.file_stem()).join(", ")
    }
}

pub struct Importer {
    api: Arc<dyn TournamentApi>,
    registry: Arc<ReferenceRegistry>,
    activity: Option<UnboundedSender<Activity>>,
    selection: Option<HashSet<EntityType>>,
    max_concurrent_requests: usize,
    state: ImportState,
}

impl Importer {
    pub fn new(api: Arc<dyn TournamentApi>) -> Self {
        Importer {
            api,
            registry: Arc::new(ReferenceRegistry::new()),
            activity: None,
            selection: None,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            state: ImportState::Init,
        }
    }

    pub fn with_registry(mut self, registry: Arc<ReferenceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_activity_log(mut self, sender: UnboundedSender<Activity>) -> Self {
        self.activity = Some(sender);
        self
    }

    pub fn with_selection(mut self, entity_types: impl IntoIterator<Item = EntityType>) -> Self {
        self.selection = Some(entity_types.into_iter().collect());
        self
    }

    /// Zero means no limit.
    pub fn with_max_concurrent_requests(mut self, max_concurrent_requests: usize) -> Self {
        self.max_concurrent_requests = max_concurrent_requests;
        self
    }

    pub fn registry(&self) -> &Arc<ReferenceRegistry> {
        &self.registry
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    fn set_state(&mut self, state: ImportState) {
        debug!("Import state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn is_selected(&self, entity_type: EntityType) -> bool {
        self.selection.as_ref().map_or(true, |s| s.contains(&entity_type))
    }

    /// Resolves the tournament, then imports every available type in dependency order.
    /// Only a failed bootstrap is returned as an error.
    pub async fn run(
        &mut self,
        settings: &TournamentSettings,
        sources: ImportSources,
    ) -> Result<ImportSummary, ImportError> {
        self.set_state(ImportState::BootstrapTournament);
        let base = bootstrap_tournament(self.api.as_ref(), settings).await?;
        let mut summary = self.import_all(&base, sources).await;
        summary.tournament = Some(base);
        Ok(summary)
    }

    pub async fn import_all(
        &mut self,
        base: &TournamentBase,
        mut sources: ImportSources,
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for entity_type in IMPORT_ORDER {
            if !self.is_selected(entity_type) {
                continue;
            }
            let Some(source) = sources.take(entity_type) else {
                debug!("No {}.csv, skipping", entity_type);
                continue;
            };

            self.set_state(ImportState::Importing(entity_type));
            info!("Importing {}", entity_type);
            let type_summary = self.import_type(base, entity_type, source).await;
            info!(
                "Imported {} {}, hit {} errors",
                type_summary.succeeded, entity_type, type_summary.failed
            );
            summary.types.push((entity_type, type_summary));
        }

        self.set_state(ImportState::Done);
        summary
    }

    /// Submits every row of one type concurrently and waits for all of them
    /// before returning, so later types can refer to what was created here.
    async fn import_type(
        &self,
        base: &TournamentBase,
        entity_type: EntityType,
        source: Box<dyn Read + Send>,
    ) -> TypeSummary {
        let mut summary = TypeSummary::default();

        let rows = match task::spawn_blocking(move || read_rows(source)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                error!("Could not read {}.csv: {}", entity_type, e);
                summary.failed += 1;
                return summary;
            }
            Err(e) => {
                error!("Reading {}.csv did not finish: {}", entity_type, e);
                summary.failed += 1;
                return summary;
            }
        };

        let limit = (self.max_concurrent_requests > 0)
            .then(|| Arc::new(Semaphore::new(self.max_concurrent_requests)));
        let mut tasks = JoinSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            summary.rows += 1;
            let row_number = index + 1;

            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    error!("Could not parse row {} of {}.csv: {}", row_number, entity_type, e);
                    summary.failed += 1;
                    continue;
                }
            };

            let payload = match entity_type.transform(&self.registry, row) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(
                        "Could not build payload for row {} of {}.csv: {}",
                        row_number, entity_type, e
                    );
                    summary.failed += 1;
                    continue;
                }
            };

            let Some(request) = base.request_for(payload) else {
                warn!(
                    "Row {} of {}.csv refers to an unknown object, not sending it",
                    row_number, entity_type
                );
                summary.failed += 1;
                continue;
            };

            let api = self.api.clone();
            let registry = self.registry.clone();
            let activity = self.activity.clone();
            let limit = limit.clone();
            tasks.spawn(async move {
                let _permit = match limit {
                    Some(limit) => limit.acquire_owned().await.ok(),
                    None => None,
                };
                submit_row(api.as_ref(), &registry, activity.as_ref(), entity_type, request).await
            });
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Ok(())) => summary.succeeded += 1,
                Ok(Err(e)) => {
                    error!("Failed to import {}: {}", entity_type, e);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("Submission task for {} did not finish: {}", entity_type, e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

/// Reads a whole file up front. Runs on the blocking pool.
fn read_rows(source: Box<dyn Read + Send>) -> Result<Vec<Result<Row, csv::Error>>, ImportError> {
    Ok(RowReader::new(source)?.collect())
}

/// A field of a created object, as echoed by the service or else as submitted.
fn created_field(response: &Value, submitted: &Value, field: &str) -> Option<String> {
    response
        .get(field)
        .and_then(cell_text)
        .or_else(|| submitted.get(field).and_then(cell_text))
}

async fn submit_row(
    api: &dyn TournamentApi,
    registry: &ReferenceRegistry,
    activity: Option<&UnboundedSender<Activity>>,
    entity_type: EntityType,
    request: SubmissionRequest,
) -> Result<(), ImportError> {
    let response = api
        .submit(&request)
        .await
        .map_err(|source| ImportError::Submission { url: request.url.clone(), source })?;

    let event = match entity_type.key_field() {
        Some(key_field) => {
            let id = extract_identifier(&response)
                .ok_or_else(|| ImportError::MissingIdentifier { url: request.url.clone() })?;

            match created_field(&response, &request.body, key_field) {
                Some(key) => {
                    let qualifier = entity_type
                        .qualifier_field()
                        .and_then(|field| created_field(&response, &request.body, field));
                    if let Some(qualifier) = qualifier {
                        let qualified = QualifiedKey::new(&key, &qualifier);
                        registry.register_qualified(entity_type, qualified, id.clone());
                    }
                    registry.register(entity_type, key.clone(), id);
                    Activity::Created { entity_type, key }
                }
                None => {
                    warn!(
                        "Created {} at {} without a {} to refer to it by",
                        entity_type, id, key_field
                    );
                    Activity::Created { entity_type, key: id }
                }
            }
        }
        None => Activity::Updated { entity_type, target: request.url },
    };

    if let Some(activity) = activity {
        // The receiver going away only silences the activity log.
        let _ = activity.send(event);
    }
    Ok(())
}
