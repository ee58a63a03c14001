//! Mission runner: one complete headquarters-to-explorers round trip.
//!
//! # Sequence
//!
//! ```text
//! run_mission()
//!  ├─ validate config
//!  ├─ ExplorerCrew::launch()          -- explorer-0 … explorer-N
//!  ├─ thread::scope
//!  │    └─ headquarters-0 … headquarters-M
//!  │         dispatch batch (round-robin share of the plan), sign off
//!  ├─ ResultCollector::collect(published)
//!  └─ ExplorerCrew::shutdown()
//! ```
//!
//! Headquarters threads are scoped because they only live for the dispatch
//! phase; explorers outlive them and are stopped once every result is in or
//! the mission is cancelled.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use deepspace_core::{CancellationToken, Channel, Transform};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::explore::ExplorerReport;
use crate::application::headquarters::{
    Assignment, Discovery, Headquarters, MissionPlan, ResultCollector,
};
use crate::infrastructure::crew::{CrewError, ExplorerCrew};
use crate::infrastructure::storage::config::{ConfigError, MissionConfig};

/// Error type for [`run_mission`].
#[derive(Debug, Error)]
pub enum MissionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("explorer crew failed: {0}")]
    Crew(#[from] CrewError),

    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{name} panicked")]
    HeadquartersPanicked { name: String },
}

/// Outcome of one mission.
#[derive(Debug, Clone, Default)]
pub struct MissionReport {
    /// Assignments in the plan.
    pub planned: usize,
    /// Pairs that headquarters actually published.
    pub published: usize,
    pub discoveries: Vec<Discovery>,
    /// Results for systems already discovered.
    pub duplicates: usize,
    pub explorers: Vec<ExplorerReport>,
    /// `true` when the token stopped the mission before every result arrived.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl MissionReport {
    /// Every planned system was discovered.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.discoveries.len() == self.planned
    }
}

/// Runs a full mission described by `config`.
///
/// Cancelling `cancel` stops dispatching and collecting early; the report is
/// still returned with `cancelled` set and whatever was discovered so far.
///
/// # Errors
///
/// - [`MissionError::Config`] if `config` fails validation.
/// - [`MissionError::Crew`] / [`MissionError::Spawn`] if a thread cannot be
///   created, or an explorer panics.
/// - [`MissionError::HeadquartersPanicked`] if a headquarters thread panics.
pub fn run_mission(
    config: &MissionConfig,
    transform: Arc<dyn Transform>,
    cancel: CancellationToken,
) -> Result<MissionReport, MissionError> {
    config.validate()?;
    let hash_iterations = config.hash_iterations()?;
    let started = Instant::now();

    let plan = MissionPlan::generate(config.mission.systems, &config.mission.seed_prefix);
    let planned = plan.len();
    info!(
        "mission starting: {planned} systems, {} headquarters, {} explorers",
        config.headquarters.threads, config.explorers.threads
    );

    let channel = Arc::new(Channel::new());
    let crew = ExplorerCrew::launch(
        config.explorers.threads,
        hash_iterations,
        Arc::clone(&channel),
        transform,
    )?;

    let published = dispatch_all(plan.partition(config.headquarters.threads), &channel, &cancel)?;
    debug!("headquarters published {published} of {planned} pairs");

    let mut collector = ResultCollector::new(Arc::clone(&channel));
    let cancelled = collector.collect(published, &cancel).is_err();
    if cancelled {
        warn!(
            "mission cancelled with {} of {published} results collected",
            collector.discoveries().len()
        );
    }

    let explorers = crew.shutdown()?;
    // Results that landed between the last poll and shutdown.
    collector.poll();

    let report = MissionReport {
        planned,
        published,
        duplicates: collector.duplicates(),
        discoveries: collector.into_discoveries(),
        explorers,
        cancelled: cancelled || published < planned,
        elapsed: started.elapsed(),
    };
    info!(
        "mission finished: {} systems discovered in {:?}",
        report.discoveries.len(),
        report.elapsed
    );
    Ok(report)
}

/// Runs one scoped headquarters thread per batch and returns the total number
/// of pairs published.
fn dispatch_all(
    batches: Vec<Vec<Assignment>>,
    channel: &Arc<Channel>,
    cancel: &CancellationToken,
) -> Result<usize, MissionError> {
    thread::scope(|s| -> Result<usize, MissionError> {
        let mut handles = Vec::with_capacity(batches.len());
        for (i, batch) in batches.into_iter().enumerate() {
            let name = format!("headquarters-{i}");
            let hq = Headquarters::new(name.clone(), Arc::clone(channel));
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn_scoped(s, move || dispatch_batch(hq, &batch, cancel))
                .map_err(|source| MissionError::Spawn {
                    name: name.clone(),
                    source,
                })?;
            handles.push((name, handle));
        }

        // Join every thread before reporting, so no panicked thread is left
        // for the scope to re-raise.
        let mut total = 0;
        let mut first_error = None;
        for (name, handle) in handles {
            match handle.join() {
                Ok(published) => total += published,
                Err(_) => {
                    first_error.get_or_insert(MissionError::HeadquartersPanicked { name });
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(total),
        }
    })
}

fn dispatch_batch(mut hq: Headquarters, batch: &[Assignment], cancel: &CancellationToken) -> usize {
    for assignment in batch {
        if cancel.is_cancelled() {
            debug!("{} stopping early", hq.name());
            break;
        }
        hq.dispatch(assignment);
    }
    let published = hq.published();
    if let Some(stranded) = hq.sign_off() {
        warn!("half-pair left staged at sign-off: {stranded}");
    }
    published
}
