//! Evaluation of [`Agent`]s during training.
mod config;
use crate::{
    record::{
        Record,
        RecordValue::{DateTime, Scalar},
    },
    Agent, Env, EnvManager, Learner,
};
use anyhow::Result;
use chrono::Local;
pub use config::{EvaluatorConfig, StepBudget};
use log::info;

/// Result of [`Evaluator::eval`].
#[derive(Debug, Clone)]
pub struct EvalOutput {
    /// Whether training should end.
    pub stop: bool,

    /// Mean return of the evaluation episodes.
    pub reward: f32,

    /// Metrics of the evaluation.
    pub record: Record,
}

/// Decides when to evaluate and runs evaluation episodes.
///
/// Evaluation instances should be seeded without dynamic seeding, so that
/// every evaluation plays the same episodes. Training is asked to stop when
/// the mean return reaches the stop value or the [`StepBudget`] runs out.
pub struct Evaluator<E: Env> {
    env: EnvManager<E>,
    n_episode: usize,
    eval_freq: usize,
    stop_value: Option<f32>,
    budget: StepBudget,
    last_eval_iter: Option<usize>,
    best_reward: Option<f32>,
}

impl<E: Env> Evaluator<E> {
    /// Creates an evaluator running `n_episode` episodes per evaluation.
    pub fn new(
        env: EnvManager<E>,
        config: &EvaluatorConfig,
        n_episode: usize,
        stop_value: Option<f32>,
        budget: StepBudget,
    ) -> Self {
        Self {
            env,
            n_episode: n_episode.max(1),
            eval_freq: config.eval_freq.max(1),
            stop_value,
            budget,
            last_eval_iter: None,
            best_reward: None,
        }
    }

    /// The best mean return seen so far.
    pub fn best_reward(&self) -> Option<f32> {
        self.best_reward
    }

    /// Returns `true` if an evaluation is due at `train_iter`.
    ///
    /// The first call is always due. Afterwards an evaluation is due when
    /// `eval_freq` iterations have passed since the last due one, and never
    /// twice for the same iteration.
    pub fn should_eval(&mut self, train_iter: usize) -> bool {
        let due = match self.last_eval_iter {
            None => true,
            Some(last) => train_iter > last && train_iter - last >= self.eval_freq,
        };
        if due {
            self.last_eval_iter = Some(train_iter);
        }
        due
    }

    /// Returns `true` if the step budget has run out.
    pub fn budget_exhausted(&self, train_iter: usize, env_step: usize) -> bool {
        self.budget.is_exhausted(train_iter, env_step)
    }

    /// Forgets the evaluation history.
    pub fn reset(&mut self) {
        self.last_eval_iter = None;
        self.best_reward = None;
        self.env.close();
    }

    /// Runs the evaluation episodes.
    ///
    /// When `learner` is given and the mean return is the best so far, the
    /// agent is saved as checkpoint `best`.
    pub fn eval<A: Agent<E>>(
        &mut self,
        agent: &mut A,
        learner: Option<&Learner>,
        train_iter: usize,
        env_step: usize,
    ) -> Result<EvalOutput> {
        let was_train = agent.is_train();
        agent.eval();
        let returns = self.run_episodes(agent);
        if was_train {
            agent.train();
        }
        let returns = returns?;

        let n = returns.len() as f32;
        let reward = returns.iter().sum::<f32>() / n;
        let std = (returns.iter().map(|r| (r - reward).powi(2)).sum::<f32>() / n).sqrt();
        let max = returns.iter().cloned().fold(f32::MIN, f32::max);
        let min = returns.iter().cloned().fold(f32::MAX, f32::min);

        if self.best_reward.map_or(true, |best| reward > best) {
            self.best_reward = Some(reward);
            if let Some(learner) = learner {
                learner.save_checkpoint(agent, "best")?;
            }
        }

        let reached = self.stop_value.map_or(false, |v| reward >= v);
        let exhausted = self.budget.is_exhausted(train_iter, env_step);
        let stop = reached || exhausted;

        info!(
            "Evaluation at train_iter {}, env_step {}: reward_mean = {:.4}, std = {:.4}",
            train_iter, env_step, reward, std
        );
        if reached {
            info!(
                "Mean return {} reached the stop value {:?}",
                reward, self.stop_value
            );
        } else if exhausted {
            info!("Step budget {:?} is exhausted", self.budget);
        }

        let record = Record::from_slice(&[
            ("eval/reward_mean", Scalar(reward)),
            ("eval/reward_std", Scalar(std)),
            ("eval/reward_max", Scalar(max)),
            ("eval/reward_min", Scalar(min)),
            ("eval/episode_count", Scalar(n)),
            ("eval/train_iter", Scalar(train_iter as f32)),
            ("eval/envstep", Scalar(env_step as f32)),
            ("eval/datetime", DateTime(Local::now())),
        ]);

        Ok(EvalOutput {
            stop,
            reward,
            record,
        })
    }

    fn run_episodes<A: Agent<E>>(&mut self, agent: &mut A) -> Result<Vec<f32>> {
        self.env.launch()?;

        // Episodes are split among instances, earlier ones take the remainder.
        let env_num = self.env.env_num();
        let mut quota = (0..env_num)
            .map(|i| self.n_episode / env_num + (i < self.n_episode % env_num) as usize)
            .collect::<Vec<_>>();
        let mut partial = vec![0f32; env_num];
        let mut returns = Vec::with_capacity(self.n_episode);

        while returns.len() < self.n_episode {
            for env_id in 0..env_num {
                if quota[env_id] == 0 {
                    continue;
                }
                let obs = match self.env.ready_obs(env_id).cloned() {
                    Some(obs) => obs,
                    None => self.env.reset_env(env_id)?.clone(),
                };
                let act = agent.sample(&obs);
                let (step, _) = self.env.step(env_id, &act)?;
                partial[env_id] += step.reward;
                if step.is_done() {
                    returns.push(partial[env_id]);
                    partial[env_id] = 0.0;
                    quota[env_id] -= 1;
                }
            }
        }

        Ok(returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        toy::{CorridorConfig, CorridorEnv, RandomAgent, RandomAgentConfig},
        Configurable, LearnerConfig,
    };
    use tempdir::TempDir;

    fn evaluator(
        eval_freq: usize,
        stop_value: Option<f32>,
        budget: StepBudget,
    ) -> Result<Evaluator<CorridorEnv>> {
        let config = CorridorConfig {
            length: 3,
            max_episode_steps: 8,
        };
        let mut env = EnvManager::<CorridorEnv>::build(&config, 2, 0)?;
        env.seed(0, false);
        let config = EvaluatorConfig::default().eval_freq(eval_freq);
        Ok(Evaluator::new(env, &config, 3, stop_value, budget))
    }

    fn agent() -> Result<RandomAgent> {
        RandomAgent::build(RandomAgentConfig {
            n_actions: 2,
            batch_size: 2,
            seed: 0,
        })
    }

    #[test]
    fn test_should_eval_cadence() -> Result<()> {
        let mut evaluator = evaluator(5, None, StepBudget::unlimited())?;
        let due = (0..=20).filter(|&i| evaluator.should_eval(i)).collect::<Vec<_>>();
        assert_eq!(due, vec![0, 5, 10, 15, 20]);
        Ok(())
    }

    #[test]
    fn test_should_eval_not_twice() -> Result<()> {
        let mut evaluator = evaluator(1, None, StepBudget::unlimited())?;
        assert!(evaluator.should_eval(0));
        assert!(!evaluator.should_eval(0));
        assert!(evaluator.should_eval(1));
        assert!(!evaluator.should_eval(1));
        evaluator.reset();
        assert!(evaluator.should_eval(1));
        Ok(())
    }

    #[test]
    fn test_eval_stop_value() -> Result<()> {
        let dir = TempDir::new("evaluator")?;
        let learner = Learner::new(LearnerConfig::default(), dir.path());
        let mut agent = agent()?;

        // A corridor episode returns 1 or 0.
        let mut evaluator = evaluator(1, Some(-1.0), StepBudget::unlimited())?;
        let out = evaluator.eval(&mut agent, Some(&learner), 0, 0)?;
        assert!(out.stop);
        assert_eq!(out.record.get_scalar("eval/episode_count")?, 3.0);
        assert!(matches!(
            out.record.get("eval/datetime"),
            Some(crate::record::RecordValue::DateTime(_))
        ));
        assert!(dir.path().join("best").exists());
        assert!(agent.is_train());

        let mut evaluator = self::evaluator(1, Some(2.0), StepBudget::unlimited())?;
        let out = evaluator.eval(&mut agent, None, 0, 0)?;
        assert!(!out.stop);
        Ok(())
    }

    #[test]
    fn test_eval_budget() -> Result<()> {
        let budget = StepBudget {
            max_env_step: Some(100),
            max_train_iter: None,
        };
        let mut agent = agent()?;
        let mut evaluator = evaluator(1, None, budget)?;
        assert!(!evaluator.budget_exhausted(1000, 99));
        assert!(!evaluator.eval(&mut agent, None, 0, 99)?.stop);
        assert!(evaluator.budget_exhausted(0, 100));
        assert!(evaluator.eval(&mut agent, None, 0, 100)?.stop);
        Ok(())
    }

    #[test]
    fn test_eval_is_deterministic_with_fixed_seeds() -> Result<()> {
        let mut evaluator = evaluator(1, None, StepBudget::unlimited())?;
        let r1 = evaluator.eval(&mut agent()?, None, 0, 0)?.reward;
        let r2 = evaluator.eval(&mut agent()?, None, 1, 0)?.reward;
        assert_eq!(r1, r2);
        Ok(())
    }
}
