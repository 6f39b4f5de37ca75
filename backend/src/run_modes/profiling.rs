//! Likelihood profiles
//!
//! For each profile the profiled addressable is disabled and held at each
//! grid value in turn while the minimiser re-optimises the other enabled
//! addressables. Only the profiled addressable is written without a bounds
//! check; the grid may run past its estimation bounds. Its original value
//! and enabled flag are restored once the sweep ends, as are the values of
//! the other addressables.

use crate::drivers::Minimiser;
use crate::model::{Model, ModelError};
use crate::models::RunMode;
use crate::run_modes::evaluator::ModelEvaluator;
use crate::run_modes::{
    Profile, ProfileConfig, ProfilePoint, RunDetail, RunModeStrategy, StrategyOutcome,
};
use tracing::{debug, info, warn};

pub struct ProfilingRun {
    minimiser: Box<dyn Minimiser>,
    profiles: Vec<ProfileConfig>,
}

impl ProfilingRun {
    pub fn new(minimiser: Box<dyn Minimiser>, profiles: Vec<ProfileConfig>) -> Self {
        Self {
            minimiser,
            profiles,
        }
    }
}

impl RunModeStrategy for ProfilingRun {
    fn mode(&self) -> RunMode {
        RunMode::Profiling
    }

    fn execute(&mut self, model: &mut Model) -> Result<StrategyOutcome, ModelError> {
        for profile in &self.profiles {
            profile.validate()?;
            // unknown labels fail before any sweep starts
            model.registry().get(&profile.label)?;
        }

        let mut profiles = Vec::with_capacity(self.profiles.len());
        for profile in &self.profiles {
            if model.stop_requested() {
                warn!(label = %profile.label, "Stopping before profile");
                break;
            }
            let points = profile_one(model, self.minimiser.as_mut(), profile)?;
            profiles.push(Profile {
                label: profile.label.clone(),
                points,
            });
        }

        Ok(StrategyOutcome {
            score: None,
            detail: RunDetail::Profiling { profiles },
        })
    }
}

fn profile_one(
    model: &mut Model,
    minimiser: &mut dyn Minimiser,
    profile: &ProfileConfig,
) -> Result<Vec<ProfilePoint>, ModelError> {
    let label = profile.label.as_str();
    let original = model.registry().get(label)?;
    let was_enabled = model.registry().is_enabled(label)?;
    model.registry_mut().disable(label)?;

    let start = model.registry().enabled_values();
    info!(
        model = %model.instance_id(),
        label,
        steps = profile.steps,
        free = start.len(),
        "Profiling addressable"
    );

    let outcome = sweep(model, minimiser, profile, &start);

    model.registry_mut().set_enabled_values(&start)?;
    model.registry_mut().set_unbounded(label, original)?;
    if was_enabled {
        model.registry_mut().enable(label)?;
    }
    outcome
}

fn sweep(
    model: &mut Model,
    minimiser: &mut dyn Minimiser,
    profile: &ProfileConfig,
    start: &[f64],
) -> Result<Vec<ProfilePoint>, ModelError> {
    let bounds = model.registry().enabled_bounds();
    let mut points = Vec::with_capacity(profile.steps);

    for value in profile.grid() {
        if model.stop_requested() {
            break;
        }
        model.registry_mut().set_unbounded(&profile.label, value)?;
        model.registry_mut().set_enabled_values(start)?;

        let result = {
            let mut evaluator = ModelEvaluator::new(model);
            minimiser.minimise(&mut evaluator, start, &bounds)?
        };
        debug!(label = %profile.label, value, score = result.score, "Profile point");
        points.push(ProfilePoint {
            value,
            score: result.score,
            estimates: result.values,
        });
    }
    Ok(points)
}
