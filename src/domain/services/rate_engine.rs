//! Rate Aggregation Engine
//!
//! Combines core freight indices, modifier indices, region-gated index,
//! seasonality and fuel surcharge into a single estimate with a reliability
//! score and a min/max range.
//!
//! # Pipeline
//! 1. Fetch every catalogued index concurrently (settle-all); each failed or
//!    empty source gets one alternate lookup
//! 2. Core rate = weighted mean of available core indices, or the
//!    deterministic synthetic rate when none is available
//! 3. Charter-market then demand modifier factors, each clamped
//! 4. Region-gated blend on intra-Asia routes
//! 5. Seasonality factor
//! 6. Additive fuel surcharge (reported separately from `rate`)
//! 7. Reliability and min/max range
//!
//! `compute` never fails: internal errors and panics fall back to the
//! synthetic rate with a low fixed reliability and an `error` message.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use futures_util::future::join_all;
use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::RateEngineConfig;
use crate::domain::entities::estimate::{
    CoreInput, DebugStep, RateEstimate, RateRequest, StepStatus, FALLBACK_SOURCE,
};
use crate::domain::entities::index::{IndexId, IndexReading, ModifierCategory, Provenance};
use crate::domain::entities::region::Region;
use crate::domain::errors::{ConfigError, RateError, SourceError};
use crate::domain::repositories::route_data::{FuelSurchargeCalculator, SeasonalityProvider};
use crate::domain::services::fallback::synthetic_base_rate;
use crate::domain::services::modifiers::{blend_gated, category_factor};
use crate::domain::services::region_resolver::RegionResolver;
use crate::domain::services::reliability;
use crate::domain::services::source_registry::SourceRegistry;
use crate::domain::services::statistics::weighted_mean;

/// Charter is always applied before demand so results are reproducible
const MODIFIER_ORDER: [ModifierCategory; 2] = [ModifierCategory::CharterMarket, ModifierCategory::Demand];

struct FetchOutcome {
    readings: HashMap<IndexId, IndexReading>,
    steps: Vec<DebugStep>,
}

struct CoreRate {
    rate: f64,
    inputs: Vec<CoreInput>,
}

struct FuelOutcome {
    surcharge: f64,
    step: DebugStep,
}

impl FuelOutcome {
    fn failed(error: String) -> Self {
        FuelOutcome {
            surcharge: 0.0,
            step: DebugStep::FuelSurcharge {
                surcharge: 0.0,
                fuel_price: None,
                fuel_type: None,
                status: StepStatus::Failed,
                error: Some(error),
            },
        }
    }
}

pub struct RateAggregationEngine {
    config: Arc<RateEngineConfig>,
    sources: SourceRegistry,
    regions: Arc<RegionResolver>,
    seasonality: Arc<dyn SeasonalityProvider>,
    fuel: Arc<dyn FuelSurchargeCalculator>,
}

impl RateAggregationEngine {
    /// Assemble an engine. Fails if the configuration is inconsistent or a
    /// catalogued index has no registered adapter.
    pub fn new(
        config: RateEngineConfig,
        sources: SourceRegistry,
        regions: Arc<RegionResolver>,
        seasonality: Arc<dyn SeasonalityProvider>,
        fuel: Arc<dyn FuelSurchargeCalculator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        for index in config.catalog.all_indices() {
            if sources.get(index).is_none() {
                return Err(ConfigError::MissingSource(index));
            }
        }

        Ok(RateAggregationEngine {
            config: Arc::new(config),
            sources,
            regions,
            seasonality,
            fuel,
        })
    }

    pub fn config(&self) -> &RateEngineConfig {
        &self.config
    }

    /// Estimate the rate for a route and container. Never fails.
    pub async fn compute(&self, request: &RateRequest) -> RateEstimate {
        debug!(
            origin = %request.origin_port_id,
            destination = %request.destination_port_id,
            container = %request.container_type,
            weight = ?request.weight,
            debug = request.debug,
            "Starting rate estimate"
        );

        let attempt = AssertUnwindSafe(self.try_compute(request)).catch_unwind().await;
        let failure = match attempt {
            Ok(Ok(estimate)) => {
                info!(
                    origin = %request.origin_port_id,
                    destination = %request.destination_port_id,
                    container = %request.container_type,
                    rate = estimate.rate,
                    final_rate = estimate.final_rate,
                    reliability = estimate.reliability,
                    source_count = estimate.source_count,
                    fallback = estimate.fallback,
                    "Rate estimate completed"
                );
                return estimate;
            }
            Ok(Err(e)) => e,
            Err(panic) => RateError::Panicked(panic_message(panic.as_ref())),
        };

        error!(
            origin = %request.origin_port_id,
            destination = %request.destination_port_id,
            container = %request.container_type,
            error = %failure,
            "Rate estimate failed, returning synthetic fallback"
        );
        self.recover(request, failure).await
    }

    async fn try_compute(&self, request: &RateRequest) -> Result<RateEstimate, RateError> {
        let month = request
            .month
            .filter(|m| (1..=12).contains(m))
            .unwrap_or_else(|| Utc::now().month());

        let (fetched, (origin, destination), fuel) = tokio::join!(
            self.fetch_all(),
            self.resolve_regions(request),
            self.fuel_surcharge(request),
        );
        let FetchOutcome { readings, mut steps } = fetched;

        let core = self.core_rate(&readings);
        steps.push(DebugStep::CoreRate {
            inputs: core.as_ref().map(|c| c.inputs.clone()).unwrap_or_default(),
            rate: core.as_ref().map(|c| c.rate),
            status: if core.is_some() { StepStatus::Success } else { StepStatus::Fallback },
        });

        let Some(core) = core else {
            let rate = synthetic_base_rate(
                &request.origin_port_id,
                &request.destination_port_id,
                request.container_type,
                &self.config.fallback_band,
            );
            warn!(
                origin = %request.origin_port_id,
                destination = %request.destination_port_id,
                synthetic_rate = rate,
                "No core index available, using synthetic rate"
            );
            steps.push(DebugStep::Fallback {
                reason: "no core index available".to_string(),
                rate,
                status: StepStatus::Fallback,
            });
            return Ok(self.fallback_estimate(
                request,
                rate,
                self.config.reliability.fallback,
                fuel,
                None,
                steps,
            ));
        };
        ensure_finite("core_rate", core.rate)?;

        let mut rate = core.rate;
        let mut used: Vec<IndexId> = core.inputs.iter().map(|i| i.index).collect();

        for category in MODIFIER_ORDER {
            let adjustment = category_factor(
                &self.config.catalog,
                category,
                &readings,
                self.config.clamps.for_category(category),
            );
            rate *= adjustment.factor;
            debug!(
                category = category.name(),
                raw_factor = adjustment.raw_factor,
                factor = adjustment.factor,
                rate,
                "Applied modifier category"
            );
            steps.push(DebugStep::Modifier {
                category,
                indices: adjustment.indices.clone(),
                raw_factor: adjustment.raw_factor,
                factor: adjustment.factor,
                rate_after: rate,
                status: if adjustment.is_neutral() { StepStatus::Skipped } else { StepStatus::Success },
            });
            used.extend(adjustment.indices);
        }
        ensure_finite("modifiers", rate)?;

        if let Some(gated) = &self.config.catalog.gated {
            let reading = readings.get(&gated.index).filter(|r| r.is_usable());
            let admitted = gated.gate.admits(origin, destination);
            let status = match (admitted, reading) {
                (true, Some(reading)) => {
                    rate = blend_gated(rate, reading.current_value, gated.weight);
                    used.push(gated.index);
                    debug!(index = %gated.index, value = reading.current_value, rate, "Blended region-gated index");
                    StepStatus::Success
                }
                _ => StepStatus::Skipped,
            };
            steps.push(DebugStep::RegionGate {
                index: gated.index,
                origin,
                destination,
                value: reading.map(|r| r.current_value),
                rate_after: rate,
                status,
            });
            ensure_finite("region_gate", rate)?;
        }

        let (seasonality_factor, seasonality_step) = self.seasonality_factor(origin, destination, month).await;
        rate *= seasonality_factor;
        steps.push(seasonality_step);
        ensure_finite("seasonality", rate)?;

        steps.push(fuel.step);

        let core_values: Vec<f64> = core.inputs.iter().map(|i| i.value).collect();
        let score = reliability::score(&self.config.reliability, &core_values);
        steps.push(DebugStep::Reliability {
            core_sources: score.core_sources,
            relative_dispersion: score.relative_dispersion,
            reliability: score.value,
            status: StepStatus::Success,
        });

        let rate = rate.max(0.0).round();
        let spread = reliability::spread(&self.config.range, score.value);
        let (min_rate, max_rate) = reliability::range(rate, spread);
        steps.push(DebugStep::Range {
            spread,
            min_rate,
            max_rate,
            status: StepStatus::Success,
        });

        Ok(RateEstimate {
            rate,
            min_rate,
            max_rate,
            fuel_surcharge: fuel.surcharge,
            final_rate: rate + fuel.surcharge,
            reliability: score.value,
            source_count: used.len(),
            sources_used: used.iter().map(|i| i.code().to_string()).collect(),
            seasonality_factor,
            fallback: false,
            error: None,
            debug_log: request.debug.then_some(steps),
        })
    }

    /// Fetch every catalogued index concurrently; failures never block others
    async fn fetch_all(&self) -> FetchOutcome {
        let indices = self.config.catalog.all_indices();
        let results = join_all(indices.iter().map(|&index| {
            AssertUnwindSafe(self.fetch_one(index))
                .catch_unwind()
                .map(move |attempt| {
                    attempt.unwrap_or_else(|panic| {
                        let message = panic_message(panic.as_ref());
                        warn!(index = %index, panic = %message, "Index adapter panicked");
                        Err(SourceError::Unavailable(format!("adapter panicked: {}", message)))
                    })
                })
                .boxed()
        }))
        .await;

        let mut readings = HashMap::new();
        let mut steps = Vec::with_capacity(indices.len());

        for (index, result) in indices.into_iter().zip(results) {
            match result {
                Ok(reading) => {
                    debug!(
                        index = %index,
                        value = reading.current_value,
                        provenance = ?reading.provenance,
                        "Index reading available"
                    );
                    steps.push(DebugStep::SourceFetch {
                        index,
                        status: match reading.provenance {
                            Provenance::Primary => StepStatus::Success,
                            Provenance::FallbackSearch => StepStatus::Fallback,
                        },
                        provenance: Some(reading.provenance),
                        value: Some(reading.current_value),
                        error: None,
                    });
                    readings.insert(index, reading);
                }
                Err(e) => {
                    debug!(index = %index, error = %e, "Index unavailable");
                    steps.push(DebugStep::SourceFetch {
                        index,
                        status: StepStatus::Failed,
                        provenance: None,
                        value: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        FetchOutcome { readings, steps }
    }

    /// Primary fetch, then exactly one alternate lookup if that fails
    async fn fetch_one(&self, index: IndexId) -> Result<IndexReading, SourceError> {
        let Some(source) = self.sources.get(index) else {
            return Err(SourceError::Unavailable(format!("no adapter registered for {}", index)));
        };

        let primary_error = match source.fetch_current(index).await {
            Ok(reading) if reading.is_usable() => {
                return Ok(IndexReading {
                    index,
                    provenance: Provenance::Primary,
                    ..reading
                });
            }
            Ok(_) => SourceError::Empty,
            Err(e) => e,
        };

        debug!(
            index = %index,
            source = source.name(),
            error = %primary_error,
            "Primary fetch failed, trying alternate lookup"
        );

        match source.search_fallback(index).await {
            Ok(reading) if reading.is_usable() => Ok(IndexReading {
                index,
                provenance: Provenance::FallbackSearch,
                ..reading
            }),
            Ok(_) => Err(SourceError::Empty),
            Err(SourceError::Unsupported) => Err(primary_error),
            Err(e) => Err(e),
        }
    }

    fn core_rate(&self, readings: &HashMap<IndexId, IndexReading>) -> Option<CoreRate> {
        let inputs: Vec<CoreInput> = self
            .config
            .catalog
            .core
            .iter()
            .filter_map(|core| {
                readings.get(&core.index).map(|reading| CoreInput {
                    index: core.index,
                    value: reading.current_value,
                    weight: core.weight,
                })
            })
            .collect();

        let pairs: Vec<(f64, f64)> = inputs.iter().map(|i| (i.value, i.weight)).collect();
        let rate = weighted_mean(&pairs)?;
        Some(CoreRate { rate, inputs })
    }

    async fn resolve_regions(&self, request: &RateRequest) -> (Region, Region) {
        tokio::join!(
            self.regions.region_of(&request.origin_port_id),
            self.regions.region_of(&request.destination_port_id),
        )
    }

    async fn seasonality_factor(&self, origin: Region, destination: Region, month: u32) -> (f64, DebugStep) {
        let step = |factor: f64, confidence: Option<f64>, status: StepStatus, error: Option<String>| {
            DebugStep::Seasonality {
                origin,
                destination,
                month,
                factor,
                confidence,
                status,
                error,
            }
        };

        match self.seasonality.factor_for(origin, destination, month).await {
            Ok(Some(s)) if s.factor.is_finite() && s.factor > 0.0 => {
                debug!(origin = %origin, destination = %destination, month, factor = s.factor, "Applied seasonality");
                (s.factor, step(s.factor, Some(s.confidence), StepStatus::Success, None))
            }
            Ok(Some(s)) => {
                warn!(factor = s.factor, "Ignoring invalid seasonality factor");
                (
                    1.0,
                    step(1.0, None, StepStatus::Failed, Some(format!("invalid factor {}", s.factor))),
                )
            }
            Ok(None) => (1.0, step(1.0, None, StepStatus::Skipped, None)),
            Err(e) => {
                warn!(error = %e, "Seasonality lookup failed, using neutral factor");
                (1.0, step(1.0, None, StepStatus::Failed, Some(e.to_string())))
            }
        }
    }

    async fn fuel_surcharge(&self, request: &RateRequest) -> FuelOutcome {
        let result = self
            .fuel
            .surcharge_for(
                &request.origin_port_id,
                &request.destination_port_id,
                request.container_type,
            )
            .await;

        match result {
            Ok(Some(fuel)) if fuel.surcharge.is_finite() && fuel.surcharge >= 0.0 => {
                let surcharge = fuel.surcharge.round();
                FuelOutcome {
                    surcharge,
                    step: DebugStep::FuelSurcharge {
                        surcharge,
                        fuel_price: Some(fuel.fuel_price),
                        fuel_type: Some(fuel.fuel_type),
                        status: StepStatus::Success,
                        error: None,
                    },
                }
            }
            Ok(Some(fuel)) => {
                warn!(surcharge = fuel.surcharge, "Ignoring invalid fuel surcharge");
                FuelOutcome::failed(format!("invalid surcharge {}", fuel.surcharge))
            }
            Ok(None) => FuelOutcome {
                surcharge: 0.0,
                step: DebugStep::FuelSurcharge {
                    surcharge: 0.0,
                    fuel_price: None,
                    fuel_type: None,
                    status: StepStatus::Skipped,
                    error: None,
                },
            },
            Err(e) => {
                warn!(error = %e, "Fuel surcharge lookup failed, adding nothing");
                FuelOutcome::failed(e.to_string())
            }
        }
    }

    /// Last-resort result after an internal failure
    async fn recover(&self, request: &RateRequest, failure: RateError) -> RateEstimate {
        let rate = synthetic_base_rate(
            &request.origin_port_id,
            &request.destination_port_id,
            request.container_type,
            &self.config.fallback_band,
        );
        let fuel = AssertUnwindSafe(self.fuel_surcharge(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| FuelOutcome::failed(panic_message(panic.as_ref())));

        let steps = vec![DebugStep::Fallback {
            reason: failure.to_string(),
            rate,
            status: StepStatus::Fallback,
        }];

        self.fallback_estimate(
            request,
            rate,
            self.config.reliability.failure,
            fuel,
            Some(failure.to_string()),
            steps,
        )
    }

    fn fallback_estimate(
        &self,
        request: &RateRequest,
        rate: f64,
        reliability: f64,
        fuel: FuelOutcome,
        error: Option<String>,
        mut steps: Vec<DebugStep>,
    ) -> RateEstimate {
        let reliability = reliability.clamp(self.config.reliability.min, self.config.reliability.max);
        let rate = rate.max(0.0).round();
        let spread = reliability::spread(&self.config.range, reliability);
        let (min_rate, max_rate) = reliability::range(rate, spread);

        steps.push(fuel.step);
        steps.push(DebugStep::Range {
            spread,
            min_rate,
            max_rate,
            status: StepStatus::Fallback,
        });

        RateEstimate {
            rate,
            min_rate,
            max_rate,
            fuel_surcharge: fuel.surcharge,
            final_rate: rate + fuel.surcharge,
            reliability,
            source_count: 0,
            sources_used: vec![FALLBACK_SOURCE.to_string()],
            seasonality_factor: 1.0,
            fallback: true,
            error,
            debug_log: request.debug.then_some(steps),
        }
    }
}

fn ensure_finite(stage: &'static str, value: f64) -> Result<(), RateError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RateError::NonFiniteRate { stage, value })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
