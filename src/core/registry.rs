//! Metric registry and dispatcher
//!
//! The registry is an immutable table from metric name to loader plus the
//! optional arguments that loader understands. The dispatcher resolves a
//! [`MetricRequest`] against it:
//!
//! 1. Unknown metric names fail with [`EmsError::UnknownMetric`].
//! 2. A cached table for the same request is returned as is.
//! 3. A year range is resolved into protocol ids through the mission index
//!    and intersected with any explicit id set. An empty set short-circuits
//!    to an empty table without querying the metric's collection.
//! 4. Otherwise the loader runs with the id restriction pushed down and the
//!    result is filtered to the allowed ids once more.
//!
//! Metrics whose rows carry no protocol id (the dispatch-center log) ignore
//! year and id restrictions altogether.
//!
//! # Example
//!
//! ```rust,no_run
//! use ems_metrics::adapters::fixture::FixtureStore;
//! use ems_metrics::core::cache::NoCache;
//! use ems_metrics::core::registry::{Dispatcher, MetricRequest};
//! use std::sync::Arc;
//!
//! # async fn example() -> ems_metrics::domain::Result<()> {
//! let dispatcher = Dispatcher::new(Arc::new(FixtureStore::new("db")), Arc::new(NoCache), 10_000);
//! let table = dispatcher
//!     .dispatch(&MetricRequest::new("Medikamente").with_medication("ASS"))
//!     .await?;
//! println!("{} rows", table.len());
//! # Ok(())
//! # }
//! ```

use crate::adapters::store::RecordStore;
use crate::config::EmsConfig;
use crate::core::cache::{CacheKey, TableCache, TtlCache};
use crate::core::loaders::findings::{self, FindingMetric};
use crate::core::loaders::index::{self, resolve_protocol_ids};
use crate::core::loaders::results::{self, ResultMetric};
use crate::core::loaders::slots::{MeasureKind, ScoreKind};
use crate::core::loaders::{etu, freetext, measures, vitals, LoadScope};
use crate::domain::{EmsError, MetricTable, ProtocolIdSet, Result, YearRange, PROTOCOL_ID};
use std::collections::HashMap;
use std::sync::Arc;

/// Loader behind a registered metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// Index outer-joined with details
    Index,
    Details,
    Finding(FindingMetric),
    PupilStatus,
    Medications,
    Measure(MeasureKind),
    Result(ResultMetric),
    Reanimation,
    ReanimationWithDestination,
    SymptomOnset,
    /// One vital-sign collection, by code
    Vitals(&'static str),
    Freetext,
    /// Dispatch-center mission log
    Etu,
}

/// Optional arguments a loader consumes directly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptedArgs {
    /// The year range is pushed into the loader's own query
    pub years: bool,

    /// The medication-name filter applies
    pub medication: bool,
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: &'static str,
    pub loader: LoaderKind,
    /// Columns every result of this metric carries
    pub schema: Vec<&'static str>,
    pub accepts: AcceptedArgs,
    /// Rows carry a protocol id, so year and id restrictions apply
    pub mission_scoped: bool,
}

impl MetricSpec {
    fn new(name: &'static str, loader: LoaderKind, schema: Vec<&'static str>) -> Self {
        Self {
            name,
            loader,
            schema,
            accepts: AcceptedArgs::default(),
            mission_scoped: true,
        }
    }

    fn accepting(mut self, accepts: AcceptedArgs) -> Self {
        self.accepts = accepts;
        self
    }

    fn unscoped(mut self) -> Self {
        self.mission_scoped = false;
        self
    }
}

/// Immutable metric name to loader mapping
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    specs: Vec<MetricSpec>,
    by_name: HashMap<&'static str, usize>,
}

impl MetricRegistry {
    /// Registry with every built-in metric
    pub fn standard() -> Self {
        let mut specs = vec![
            MetricSpec::new("Index", LoaderKind::Index, index::joined_columns()).accepting(
                AcceptedArgs {
                    years: true,
                    medication: false,
                },
            ),
            MetricSpec::new("Details", LoaderKind::Details, index::details_columns()),
        ];

        for metric in [
            FindingMetric::Score(ScoreKind::Gcs),
            FindingMetric::Score(ScoreKind::Pain),
            FindingMetric::Neurology,
        ] {
            specs.push(MetricSpec::new(
                metric.name(),
                LoaderKind::Finding(metric),
                metric.schema(),
            ));
        }
        specs.push(MetricSpec::new(
            "Pupillenstatus",
            LoaderKind::PupilStatus,
            findings::pupil_schema(),
        ));

        specs.push(
            MetricSpec::new(
                "Medikamente",
                LoaderKind::Medications,
                measures::schema(MeasureKind::Medication),
            )
            .accepting(AcceptedArgs {
                years: false,
                medication: true,
            }),
        );
        for kind in [MeasureKind::Intubation, MeasureKind::Ecg] {
            specs.push(MetricSpec::new(
                kind.discriminator(),
                LoaderKind::Measure(kind),
                measures::schema(kind),
            ));
        }

        for metric in [ResultMetric::Naca, ResultMetric::PhysicianRequest] {
            specs.push(MetricSpec::new(
                metric.name(),
                LoaderKind::Result(metric),
                metric.schema(),
            ));
        }
        specs.push(MetricSpec::new(
            "Reanimation",
            LoaderKind::Reanimation,
            results::reanimation_schema(),
        ));
        specs.push(MetricSpec::new(
            "Reanimation_mit_targetDestination",
            LoaderKind::ReanimationWithDestination,
            results::reanimation_destination_schema(),
        ));
        specs.push(MetricSpec::new(
            "Symptombeginn",
            LoaderKind::SymptomOnset,
            results::symptom_onset_schema(),
        ));

        for code in vitals::VITAL_CODES {
            specs.push(MetricSpec::new(code, LoaderKind::Vitals(code), vitals::schema()));
        }

        specs.push(MetricSpec::new(
            "Freetext",
            LoaderKind::Freetext,
            vec![PROTOCOL_ID],
        ));
        specs.push(MetricSpec::new("ETU", LoaderKind::Etu, etu::schema()).unscoped());

        Self::from_specs(specs)
    }

    fn from_specs(specs: Vec<MetricSpec>) -> Self {
        let by_name = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name, i))
            .collect();
        Self { specs, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&MetricSpec> {
        self.by_name.get(name).map(|&i| &self.specs[i])
    }

    /// Registered entries in registration order
    pub fn specs(&self) -> &[MetricSpec] {
        &self.specs
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|s| s.name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Arguments of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRequest {
    pub metric: String,
    /// Falls back to the dispatcher's default row limit
    pub limit: Option<usize>,
    pub medication: Option<String>,
    pub years: Option<YearRange>,
    pub protocol_ids: Option<ProtocolIdSet>,
}

impl MetricRequest {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            limit: None,
            medication: None,
            years: None,
            protocol_ids: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_medication(mut self, name: impl Into<String>) -> Self {
        self.medication = Some(name.into());
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = Some(years);
        self
    }

    pub fn with_protocol_ids(mut self, ids: ProtocolIdSet) -> Self {
        self.protocol_ids = Some(ids);
        self
    }
}

/// Routes metric requests to loaders through the cache
pub struct Dispatcher {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn TableCache>,
    registry: MetricRegistry,
    default_limit: usize,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<dyn TableCache>, default_limit: usize) -> Self {
        Self {
            store,
            cache,
            registry: MetricRegistry::standard(),
            default_limit,
        }
    }

    /// Dispatcher with a TTL cache and row limit taken from configuration
    pub fn from_config(store: Arc<dyn RecordStore>, config: &EmsConfig) -> Self {
        Self::new(
            store,
            Arc::new(TtlCache::from_config(&config.cache)),
            config.query.default_row_limit,
        )
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Loads one metric table
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::UnknownMetric`] for names outside the registry
    /// and [`EmsError::Validation`] for a zero row limit.
    /// Missing or broken data never errors; it yields an empty table.
    pub async fn dispatch(&self, request: &MetricRequest) -> Result<Arc<MetricTable>> {
        let spec = self
            .registry
            .get(&request.metric)
            .ok_or_else(|| EmsError::UnknownMetric(request.metric.clone()))?;

        let limit = request.limit.unwrap_or(self.default_limit);
        if limit == 0 {
            return Err(EmsError::Validation(format!(
                "Row limit for {} must be at least 1",
                spec.name
            )));
        }
        let medication = if spec.accepts.medication {
            request.medication.as_deref()
        } else {
            if request.medication.is_some() {
                tracing::debug!(metric = spec.name, "Ignoring medication filter");
            }
            None
        };

        let (years, protocol_ids) = if spec.mission_scoped {
            (request.years, request.protocol_ids.as_ref())
        } else {
            if request.years.is_some() || request.protocol_ids.is_some() {
                tracing::debug!(metric = spec.name, "Ignoring year and protocol-id restriction");
            }
            (None, None)
        };

        let key = CacheKey::new(spec.name, limit, medication, years, protocol_ids);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(metric = spec.name, rows = hit.len(), "Cache hit");
            return Ok(hit);
        }
        tracing::debug!(metric = spec.name, "Cache miss");

        let allowed = self.allowed_ids(spec, years, protocol_ids, limit).await;
        let table = match &allowed {
            Some(ids) if ids.is_empty() => {
                tracing::info!(metric = spec.name, "No protocol ids in scope, skipping load");
                MetricTable::empty(&spec.schema)
            }
            _ => {
                let scope = match &allowed {
                    Some(ids) => LoadScope::new(limit).with_protocol_ids(ids),
                    None => LoadScope::new(limit),
                };
                let years = if spec.accepts.years { years } else { None };
                let mut table = self.run_loader(spec.loader, medication, years, scope).await;
                if let Some(ids) = &allowed {
                    table.retain_protocol_ids(ids);
                }
                table
            }
        };

        tracing::info!(metric = spec.name, rows = table.len(), limit, "Metric loaded");
        let table = Arc::new(table);
        self.cache.insert(key, Arc::clone(&table)).await;
        Ok(table)
    }

    /// Protocol ids the result is restricted to, `None` for unrestricted
    ///
    /// Loaders that take the year range themselves skip the resolution.
    async fn allowed_ids(
        &self,
        spec: &MetricSpec,
        years: Option<YearRange>,
        explicit: Option<&ProtocolIdSet>,
        limit: usize,
    ) -> Option<ProtocolIdSet> {
        match (years, explicit) {
            (Some(years), explicit) if !spec.accepts.years => {
                let resolved = resolve_protocol_ids(self.store.as_ref(), years, limit).await;
                tracing::debug!(metric = spec.name, %years, ids = resolved.len(), "Resolved year range");
                Some(match explicit {
                    Some(ids) => resolved.intersection(ids).cloned().collect(),
                    None => resolved,
                })
            }
            (_, explicit) => explicit.cloned(),
        }
    }

    async fn run_loader(
        &self,
        loader: LoaderKind,
        medication: Option<&str>,
        years: Option<YearRange>,
        scope: LoadScope<'_>,
    ) -> MetricTable {
        let store = self.store.as_ref();
        match loader {
            LoaderKind::Index => index::load_index_with_details(store, years, scope).await,
            LoaderKind::Details => index::load_details(store, scope).await,
            LoaderKind::Finding(metric) => {
                findings::load_metric_from_findings(store, metric, scope).await
            }
            LoaderKind::PupilStatus => findings::load_pupil_status(store, scope).await,
            LoaderKind::Medications => measures::load_medications(store, medication, scope).await,
            LoaderKind::Measure(kind) => measures::load_metric_from_measures(store, kind, scope).await,
            LoaderKind::Result(metric) => {
                results::load_metric_from_results(store, metric, scope).await
            }
            LoaderKind::Reanimation => results::load_reanimation(store, scope).await,
            LoaderKind::ReanimationWithDestination => {
                results::load_reanimation_with_destination(store, scope).await
            }
            LoaderKind::SymptomOnset => results::load_symptom_onset(store, scope).await,
            LoaderKind::Vitals(code) => vitals::load_vitals(store, code, scope).await,
            LoaderKind::Freetext => freetext::load_freetext(store, scope).await,
            LoaderKind::Etu => etu::load_etu(store, scope).await,
        }
    }
}
