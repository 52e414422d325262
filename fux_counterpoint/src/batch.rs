// Parallel batch driver.
//
// Runs many independent exercises at once. A `Job` is a cantus, a position,
// and optionally a counterpoint: with one, the job validates it; without,
// the job generates one. Jobs share nothing but the read-only config and the
// cancel flag, so rayon can spread them across its pool with no locking.
// Reports come back in input order.
//
// Used by the `counterpoint` binary (main.rs), which reads jobs from JSON and
// writes the reports back out.

use crate::analysis::analyse_mode;
use crate::config::EngineConfig;
use crate::line::{Cantus, Counterpoint, Position};
use crate::mode::{Mode, Species};
use crate::rules::{RuleViolation, ValidationError, validate_counterpoint_with};
use crate::search::{CancelFlag, generate_in_mode};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One exercise to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub cantus: Cantus,
    pub position: Position,
    /// A line to validate. Absent means "generate one".
    #[serde(default)]
    pub counterpoint: Option<Counterpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Generated { counterpoint: Counterpoint },
    Valid,
    Invalid { violations: Vec<RuleViolation> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub name: String,
    pub mode: Option<Mode>,
    pub species: Option<Species>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Generated { .. } | Outcome::Valid)
    }
}

/// Run one job on the calling thread.
pub fn run_job(job: &Job, config: &EngineConfig, cancel: &CancelFlag) -> JobReport {
    let analysis = analyse_mode(&job.cantus);
    let (mode, species) = match analysis {
        Ok((mode, species)) => (Some(mode), Some(species)),
        Err(_) => (None, None),
    };

    let outcome = match (&job.counterpoint, analysis) {
        (_, Err(e)) => Outcome::Failed {
            error: e.to_string(),
        },
        (Some(line), Ok(_)) => {
            match validate_counterpoint_with(&job.cantus, line, job.position, config) {
                Ok(()) => Outcome::Valid,
                Err(ValidationError::Violations(violations)) => Outcome::Invalid { violations },
                Err(e) => Outcome::Failed {
                    error: e.to_string(),
                },
            }
        }
        (None, Ok((mode, species))) => {
            match generate_in_mode(&job.cantus, mode, species, job.position, config, cancel) {
                Ok(counterpoint) => Outcome::Generated { counterpoint },
                Err(e) => Outcome::Failed {
                    error: e.to_string(),
                },
            }
        }
    };

    JobReport {
        name: job.name.clone(),
        mode,
        species,
        outcome,
    }
}

/// Run every job in parallel. Reports are returned in job order.
pub fn run_batch(jobs: &[Job], config: &EngineConfig, cancel: &CancelFlag) -> Vec<JobReport> {
    info!("running {} job(s)", jobs.len());
    let reports: Vec<JobReport> = jobs
        .par_iter()
        .map(|job| run_job(job, config, cancel))
        .collect();
    let succeeded = reports.iter().filter(|r| r.succeeded()).count();
    info!("{succeeded}/{} job(s) succeeded", reports.len());
    reports
}
