//! Parallel orchestration over many series and launches.
//!
//! Every item is independent and read-only over the shared store, so
//! batches run on rayon and results come back in input order. One item
//! failing never aborts the batch.

use crate::config::AnalysisConfig;
use crate::error::{LensError, Result};
use demand_forecast::{ForecastEngine, ForecastResult, Period, SeriesStore};
use launch_impact::{
    identify_launches, rollup_by_brand, rollup_by_category, ControlPolicy, LaunchAnalyzer,
    LaunchEvent, LaunchPerformance, LaunchReport, ProductCatalog, Rollup,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{info, warn};

/// Launch that could not be analysed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchFailure {
    pub launch_id: String,
    pub reason: String,
}

/// Identified launches with their reports and roll-ups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub latest_period: Period,
    pub performance: Vec<LaunchPerformance>,
    pub reports: Vec<LaunchReport>,
    pub failures: Vec<LaunchFailure>,
    pub by_category: Vec<Rollup>,
    pub by_brand: Vec<Rollup>,
}

/// Runs forecasts and launch analyses under one configuration
#[derive(Debug)]
pub struct Pipeline {
    config: AnalysisConfig,
    engine: ForecastEngine,
    policy: Option<ControlPolicy>,
    pool: Option<ThreadPool>,
}

impl Pipeline {
    /// Validate `config` and build the worker pool it asks for
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let engine = ForecastEngine::new(config.forecast.clone())?;
        let pool = config
            .workers
            .map(|n| ThreadPoolBuilder::new().num_threads(n).build())
            .transpose()?;
        Ok(Self {
            config,
            engine,
            policy: None,
            pool,
        })
    }

    /// Use `policy` instead of the configured control selection
    pub fn with_policy(mut self, policy: ControlPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn analyzer<'a>(
        &self,
        store: &'a SeriesStore,
        catalog: &'a ProductCatalog,
    ) -> Result<LaunchAnalyzer<'a>> {
        let analyzer = LaunchAnalyzer::new(store, catalog, self.config.impact.clone())?;
        Ok(match &self.policy {
            Some(policy) => analyzer.with_policy(policy.clone()),
            None => analyzer,
        })
    }

    /// Forecast every series in the store, in ascending id order
    pub fn forecast_all(&self, store: &SeriesStore) -> Vec<(String, Result<ForecastResult>)> {
        let series: Vec<_> = store.iter().collect();
        let results: Vec<(String, Result<ForecastResult>)> = self.install(|| {
            series
                .par_iter()
                .map(|s| {
                    let result = self.engine.forecast(s).map_err(LensError::from);
                    (s.id().to_string(), result)
                })
                .collect()
        });

        let degraded = results
            .iter()
            .filter(|(_, r)| matches!(r, Ok(f) if f.is_degraded()))
            .count();
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(series = results.len(), degraded, failed, "forecast batch complete");
        results
    }

    /// Analyse `events` in parallel; results keep the order of `events`
    pub fn analyze_launches(
        &self,
        store: &SeriesStore,
        catalog: &ProductCatalog,
        events: &[LaunchEvent],
    ) -> Result<Vec<Result<LaunchReport>>> {
        let analyzer = self.analyzer(store, catalog)?;
        Ok(self.install(|| {
            events
                .par_iter()
                .map(|event| analyzer.analyze(event).map_err(LensError::from))
                .collect()
        }))
    }

    /// Identify recent launches, analyse each and roll the results up
    pub fn summarize(
        &self,
        store: &SeriesStore,
        catalog: &ProductCatalog,
        latest_period: Period,
    ) -> Result<PortfolioSummary> {
        let identified = identify_launches(
            catalog,
            store,
            latest_period,
            &self.config.impact.identification,
        )?;
        let events: Vec<LaunchEvent> = identified.iter().map(|l| l.event.clone()).collect();
        let outcomes = self.analyze_launches(store, catalog, &events)?;

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (event, outcome) in events.iter().zip(outcomes) {
            match outcome {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(launch = %event.target, error = %e, "launch analysis failed");
                    failures.push(LaunchFailure {
                        launch_id: event.target.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            analysed = reports.len(),
            failed = failures.len(),
            %latest_period,
            "portfolio summary complete"
        );
        Ok(PortfolioSummary {
            latest_period,
            performance: identified.into_iter().map(|l| l.performance).collect(),
            by_category: rollup_by_category(&reports),
            by_brand: rollup_by_brand(&reports),
            reports,
            failures,
        })
    }
}
