//! Interpreter: runs a Plan against a Provider
//!
//! Effects run one at a time in plan order. Nothing talks to AWS before
//! `apply` is called.

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::resource::{ResourceId, State};

/// What one Effect produced
#[derive(Debug)]
pub enum EffectOutcome {
    Read { state: State },
    Created { state: State },
    Updated { state: State },
    /// The old object was deleted and a new one created
    Replaced { state: State },
    Deleted { id: ResourceId },
    /// Not executed, with the reason why
    Skipped { reason: String },
}

/// Outcomes of a whole Plan, in execution order
#[derive(Debug)]
pub struct ApplyResult {
    pub outcomes: Vec<Result<EffectOutcome, ProviderError>>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterConfig {
    /// Report every Effect as skipped without calling the Provider
    pub dry_run: bool,
    /// Keep going after a failed Effect instead of stopping there
    pub continue_on_error: bool,
}

pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn apply(&self, plan: &Plan) -> ApplyResult {
        let mut result = ApplyResult {
            outcomes: Vec::with_capacity(plan.effects().len()),
            success_count: 0,
            failure_count: 0,
        };

        for effect in plan.effects() {
            let outcome = self.run(effect).await;
            let failed = outcome.is_err();

            if let Err(e) = &outcome {
                log::error!("{} {} failed: {}", effect.action(), effect.resource_id(), e);
                result.failure_count += 1;
            } else {
                result.success_count += 1;
            }
            result.outcomes.push(outcome);

            if failed && !self.config.continue_on_error {
                break;
            }
        }

        result
    }

    async fn run(&self, effect: &Effect) -> ProviderResult<EffectOutcome> {
        if self.config.dry_run {
            return Ok(EffectOutcome::Skipped {
                reason: "dry run".to_string(),
            });
        }

        let id = effect.resource_id().clone();
        log::debug!("{} {}", effect.action(), id);

        let outcome = match effect {
            Effect::Read { resource } => EffectOutcome::Read {
                state: self.provider.read_data(resource).await?,
            },
            Effect::Create(resource) => EffectOutcome::Created {
                state: self.provider.create(resource).await?,
            },
            Effect::Update { from, to, .. } => EffectOutcome::Updated {
                state: self.provider.update(from, to).await?,
            },
            Effect::Replace { from, to, .. } => {
                self.provider.delete(from).await?;
                EffectOutcome::Replaced {
                    state: self.provider.create(to).await?,
                }
            }
            Effect::Delete(state) => {
                self.provider.delete(state).await?;
                EffectOutcome::Deleted { id }
            }
        };

        Ok(outcome)
    }
}
