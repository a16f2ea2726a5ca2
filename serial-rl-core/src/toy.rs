//! A toy environment and a non-learning agent.
//!
//! They make the serial loop runnable without external environments or
//! algorithms, for tests and smoke runs of the command line tool.
use crate::{
    config::PolicySection,
    record::{Record, RecordValue},
    Act, Agent, Configurable, Env, Obs, Policy, Step, Transition,
};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Observation of [`CorridorEnv`], the position of the walker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorridorObs(pub usize);

impl Obs for CorridorObs {}

/// Action of [`CorridorEnv`]: `0` moves left, anything else moves right.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorridorAct(pub usize);

impl Act for CorridorAct {}

fn default_length() -> usize {
    5
}

fn default_max_episode_steps() -> usize {
    50
}

/// Configuration of [`CorridorEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CorridorConfig {
    /// The number of cells. The goal is the rightmost one.
    #[serde(default = "default_length")]
    pub length: usize,

    /// Episodes are truncated after this number of steps.
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: usize,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            max_episode_steps: default_max_episode_steps(),
        }
    }
}

/// A walker in a 1-D corridor. Reaching the rightmost cell gives reward 1
/// and terminates the episode. The start cell is drawn from the left half of
/// the corridor with the seeded generator.
pub struct CorridorEnv {
    config: CorridorConfig,
    seed: i64,
    rng: StdRng,
    pos: usize,
    steps: usize,
}

impl CorridorEnv {
    /// The seed given last.
    pub fn current_seed(&self) -> i64 {
        self.seed
    }
}

impl Env for CorridorEnv {
    type Config = CorridorConfig;
    type Obs = CorridorObs;
    type Act = CorridorAct;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.length < 2 {
            anyhow::bail!("Corridor needs at least 2 cells, got {}", config.length);
        }
        Ok(Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed as u64),
            pos: 0,
            steps: 0,
        })
    }

    fn seed(&mut self, seed: i64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed as u64);
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.pos = self.rng.gen_range(0..(self.config.length / 2).max(1));
        self.steps = 0;
        Ok(CorridorObs(self.pos))
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        match a.0 {
            0 => self.pos = self.pos.saturating_sub(1),
            _ => self.pos = (self.pos + 1).min(self.config.length - 1),
        }
        self.steps += 1;
        let is_terminated = self.pos == self.config.length - 1;
        let is_truncated = !is_terminated && self.steps >= self.config.max_episode_steps;
        let reward = if is_terminated { 1.0 } else { 0.0 };
        let step = Step::new(
            CorridorObs(self.pos),
            a.clone(),
            reward,
            is_terminated,
            is_truncated,
        );
        Ok((step, Record::empty()))
    }

    fn random_action(&mut self) -> Self::Act {
        CorridorAct(self.rng.gen_range(0..2))
    }
}

/// Configuration of [`RandomAgent`], read from the `policy` section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(from = "PolicySection")]
pub struct RandomAgentConfig {
    /// The number of actions, `policy.model.action_shape`.
    pub n_actions: usize,

    /// Minibatch size, `policy.learn.batch_size`.
    pub batch_size: usize,

    /// Seed of the action sampler, `policy.seed` if given.
    pub seed: u64,
}

impl From<PolicySection> for RandomAgentConfig {
    fn from(policy: PolicySection) -> Self {
        let seed = policy
            .extra
            .get("seed")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Self {
            n_actions: policy.model.action_shape.numel(),
            batch_size: policy.learn.batch_size,
            seed,
        }
    }
}

/// An agent taking uniformly random actions.
///
/// [`Agent::learn`] only counts minibatches, so the loop can be observed
/// without any learning algorithm.
pub struct RandomAgent {
    config: RandomAgentConfig,
    rng: StdRng,
    train: bool,
    n_updates: usize,
    n_samples_seen: usize,
    last_eps: Option<f64>,
    run_seed: Option<i64>,
}

#[derive(Serialize, Deserialize)]
struct RandomAgentParams {
    n_updates: usize,
    n_samples_seen: usize,
}

const PARAMS_FILE: &str = "params.yaml";

impl RandomAgent {
    /// The number of calls of [`Agent::learn`].
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// The number of samples given to [`Agent::learn`].
    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    /// Epsilon given at the last call of [`Agent::explore`].
    pub fn last_eps(&self) -> Option<f64> {
        self.last_eps
    }

    /// Seed given with [`Agent::seed`].
    pub fn run_seed(&self) -> Option<i64> {
        self.run_seed
    }
}

impl Configurable for RandomAgent {
    type Config = RandomAgentConfig;

    fn build(config: Self::Config) -> Result<Self> {
        if config.n_actions == 0 {
            anyhow::bail!("RandomAgent needs at least one action");
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            train: true,
            n_updates: 0,
            n_samples_seen: 0,
            last_eps: None,
            run_seed: None,
        })
    }
}

impl Policy<CorridorEnv> for RandomAgent {
    fn sample(&mut self, _obs: &CorridorObs) -> CorridorAct {
        CorridorAct(self.rng.gen_range(0..self.config.n_actions))
    }
}

impl Agent<CorridorEnv> for RandomAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn explore(&mut self, obs: &CorridorObs, kwargs: &crate::PolicyKwargs) -> CorridorAct {
        self.last_eps = kwargs.eps;
        self.sample(obs)
    }

    /// Reseeds the action sampler with `policy.seed` offset by the run seed.
    fn seed(&mut self, seed: i64) {
        self.rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(seed as u64));
        self.run_seed = Some(seed);
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn learn(&mut self, batch: Vec<Transition<CorridorEnv>>) -> Result<Record> {
        self.n_updates += 1;
        self.n_samples_seen += batch.len();
        let reward_mean = batch.iter().map(|t| t.reward).sum::<f32>() / batch.len().max(1) as f32;
        Ok(Record::from_slice(&[
            ("learn/batch_reward_mean", RecordValue::Scalar(reward_mean)),
            ("learn/n_updates", RecordValue::Scalar(self.n_updates as f32)),
        ]))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let params = RandomAgentParams {
            n_updates: self.n_updates,
            n_samples_seen: self.n_samples_seen,
        };
        fs::write(path.join(PARAMS_FILE), serde_yaml::to_string(&params)?)?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let s = fs::read_to_string(path.join(PARAMS_FILE))?;
        let params: RandomAgentParams = serde_yaml::from_str(&s)?;
        self.n_updates = params.n_updates;
        self.n_samples_seen = params.n_samples_seen;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_corridor_reaches_goal() -> Result<()> {
        let config = CorridorConfig {
            length: 3,
            max_episode_steps: 10,
        };
        let mut env = CorridorEnv::build(&config, 0)?;
        let obs = env.reset()?;
        assert_eq!(obs, CorridorObs(0));
        let (step, _) = env.step(&CorridorAct(1))?;
        assert!(!step.is_done());
        let (step, _) = env.step(&CorridorAct(1))?;
        assert!(step.is_terminated);
        assert_eq!(step.reward, 1.0);
        Ok(())
    }

    #[test]
    fn test_corridor_truncates() -> Result<()> {
        let config = CorridorConfig {
            length: 4,
            max_episode_steps: 3,
        };
        let mut env = CorridorEnv::build(&config, 1)?;
        env.reset()?;
        let mut last = None;
        for _ in 0..3 {
            last = Some(env.step(&CorridorAct(0))?.0);
        }
        let step = last.unwrap();
        assert!(step.is_truncated && !step.is_terminated);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_start() -> Result<()> {
        let config = CorridorConfig {
            length: 20,
            max_episode_steps: 10,
        };
        let mut env1 = CorridorEnv::build(&config, 0)?;
        let mut env2 = CorridorEnv::build(&config, 5)?;
        env2.seed(0);
        for _ in 0..5 {
            assert_eq!(env1.reset()?, env2.reset()?);
        }
        Ok(())
    }

    #[test]
    fn test_random_agent_params_roundtrip() -> Result<()> {
        let dir = TempDir::new("random_agent")?;
        let config = RandomAgentConfig {
            n_actions: 2,
            batch_size: 2,
            seed: 0,
        };
        let mut agent = RandomAgent::build(config.clone())?;
        let mut env = CorridorEnv::build(&CorridorConfig::default(), 0)?;
        let obs = env.reset()?;
        let act = agent.sample(&obs);
        let (step, _) = env.step(&act)?;
        let tr = Transition {
            obs,
            act,
            next_obs: step.obs,
            reward: step.reward,
            is_terminated: step.is_terminated,
            is_truncated: step.is_truncated,
            env_id: 0,
            collect_iter: 0,
        };
        agent.learn(vec![tr.clone(), tr])?;
        agent.save_params(dir.path())?;

        let mut agent_ = RandomAgent::build(config)?;
        agent_.load_params(dir.path())?;
        assert_eq!(agent_.n_updates(), 1);
        assert_eq!(agent_.n_samples_seen(), 2);
        Ok(())
    }

    #[test]
    fn test_run_seed_changes_actions() -> Result<()> {
        let config = RandomAgentConfig {
            n_actions: 4,
            batch_size: 2,
            seed: 0,
        };
        let obs = CorridorObs(0);
        let actions = |seed: i64| -> Result<Vec<usize>> {
            let mut agent = RandomAgent::build(config.clone())?;
            agent.seed(seed);
            Ok((0..20).map(|_| agent.sample(&obs).0).collect())
        };
        assert_eq!(actions(0)?, actions(0)?);
        assert_ne!(actions(0)?, actions(1)?);
        Ok(())
    }
}
