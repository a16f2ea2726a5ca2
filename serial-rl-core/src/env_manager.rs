//! Management of a set of environment instances.
use crate::{error::SerialRlError, record::Record, Env, Step};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Owns `N` instances of an environment, addressed by index.
///
/// Each instance has its own seed, `seed + env_id`. With dynamic seeding,
/// every reset shifts the seed of the instance by `100 * k`, where `k` is
/// drawn from `1..1000` by a generator seeded with the base seed; without it,
/// every episode of an instance starts from the same seed.
///
/// Instances run in the calling thread, one after another.
pub struct EnvManager<E: Env> {
    envs: Vec<E>,
    env_seeds: Vec<i64>,
    dynamic_seed: bool,
    rng: StdRng,
    ready_obs: Vec<Option<E::Obs>>,
}

impl<E: Env> EnvManager<E> {
    /// Builds `env_num` instances with `env_fn`, given the index of each instance.
    pub fn new<F>(env_num: usize, mut env_fn: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<E>,
    {
        if env_num == 0 {
            return Err(SerialRlError::EmptyEnvManager.into());
        }
        let envs = (0..env_num).map(&mut env_fn).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            envs,
            env_seeds: (0..env_num as i64).collect(),
            dynamic_seed: true,
            rng: StdRng::seed_from_u64(0),
            ready_obs: vec![None; env_num],
        })
    }

    /// Builds `env_num` instances from a configuration.
    pub fn build(config: &E::Config, env_num: usize, seed: i64) -> Result<Self> {
        Self::new(env_num, |ix| E::build(config, seed + ix as i64))
    }

    /// The number of instances.
    pub fn env_num(&self) -> usize {
        self.envs.len()
    }

    /// Sets the seeds of the instances. Takes effect at their next reset.
    pub fn seed(&mut self, seed: i64, dynamic_seed: bool) {
        self.env_seeds = (0..self.envs.len() as i64).map(|i| seed + i).collect();
        self.dynamic_seed = dynamic_seed;
        self.rng = StdRng::seed_from_u64(seed as u64);
    }

    /// The base seed of the instance.
    pub fn env_seed(&self, env_id: usize) -> Option<i64> {
        self.env_seeds.get(env_id).copied()
    }

    fn check_id(&self, env_id: usize) -> Result<()> {
        if env_id >= self.envs.len() {
            return Err(SerialRlError::UnknownEnvId(env_id, self.envs.len()).into());
        }
        Ok(())
    }

    /// Resets the instance and keeps its initial observation ready.
    pub fn reset_env(&mut self, env_id: usize) -> Result<&E::Obs> {
        self.check_id(env_id)?;
        let seed = match self.dynamic_seed {
            true => self.env_seeds[env_id] + 100 * self.rng.gen_range(1..1000),
            false => self.env_seeds[env_id],
        };
        trace!("Reset env {} with seed {}", env_id, seed);
        let env = &mut self.envs[env_id];
        env.seed(seed);
        let obs = env.reset()?;
        let obs = self.ready_obs[env_id].insert(obs);
        Ok(&*obs)
    }

    /// Resets all instances.
    pub fn launch(&mut self) -> Result<()> {
        for env_id in 0..self.envs.len() {
            self.reset_env(env_id)?;
        }
        Ok(())
    }

    /// Returns `true` if every instance has an observation ready.
    pub fn is_launched(&self) -> bool {
        self.ready_obs.iter().all(Option::is_some)
    }

    /// The observation the next action of the instance should be based on.
    pub fn ready_obs(&self, env_id: usize) -> Option<&E::Obs> {
        self.ready_obs.get(env_id).and_then(Option::as_ref)
    }

    /// Applies an action to the instance.
    ///
    /// When the episode ends, the instance is reset and its initial
    /// observation becomes ready; the returned [`Step`] keeps the last
    /// observation of the finished episode.
    pub fn step(&mut self, env_id: usize, act: &E::Act) -> Result<(Step<E>, Record)> {
        self.check_id(env_id)?;
        let (step, record) = self.envs[env_id].step(act)?;
        if step.is_done() {
            self.reset_env(env_id)?;
        } else {
            self.ready_obs[env_id] = Some(step.obs.clone());
        }
        Ok((step, record))
    }

    /// Samples a random action of the instance.
    pub fn random_action(&mut self, env_id: usize) -> Result<E::Act> {
        self.check_id(env_id)?;
        Ok(self.envs[env_id].random_action())
    }

    /// Reference to an instance.
    pub fn env(&self, env_id: usize) -> Option<&E> {
        self.envs.get(env_id)
    }

    /// Drops ready observations, so the next use starts new episodes.
    pub fn close(&mut self) {
        self.ready_obs.iter_mut().for_each(|obs| *obs = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toy::{CorridorAct, CorridorConfig, CorridorEnv};

    fn config() -> CorridorConfig {
        CorridorConfig {
            length: 40,
            max_episode_steps: 2,
        }
    }

    #[test]
    fn test_env_num() -> Result<()> {
        for n in 1..6 {
            let mut manager = EnvManager::<CorridorEnv>::build(&config(), n, 0)?;
            assert_eq!(manager.env_num(), n);
            manager.launch()?;
            assert!((0..n).all(|i| manager.ready_obs(i).is_some()));
            assert!(manager.ready_obs(n).is_none());
            assert!(manager.step(n, &CorridorAct(1)).is_err());
        }
        Ok(())
    }

    #[test]
    fn test_no_env_is_error() {
        assert!(EnvManager::<CorridorEnv>::build(&config(), 0, 0).is_err());
    }

    #[test]
    fn test_fixed_seed() -> Result<()> {
        let mut manager = EnvManager::<CorridorEnv>::build(&config(), 3, 0)?;
        manager.seed(10, false);
        manager.launch()?;
        for i in 0..3 {
            assert_eq!(manager.env(i).unwrap().current_seed(), 10 + i as i64);
        }
        // Truncated after two steps, then reset with the same seed.
        for _ in 0..2 {
            manager.step(1, &CorridorAct(0))?;
        }
        assert_eq!(manager.env(1).unwrap().current_seed(), 11);
        Ok(())
    }

    #[test]
    fn test_dynamic_seed() -> Result<()> {
        let mut manager = EnvManager::<CorridorEnv>::build(&config(), 2, 0)?;
        manager.seed(10, true);
        manager.launch()?;
        for i in 0..2 {
            let seed = manager.env(i).unwrap().current_seed();
            let shift = seed - (10 + i as i64);
            assert!(shift >= 100 && shift < 100_000 && shift % 100 == 0);
        }
        Ok(())
    }

    #[test]
    fn test_step_resets_finished_episode() -> Result<()> {
        let mut manager = EnvManager::<CorridorEnv>::build(&config(), 1, 0)?;
        manager.seed(0, false);
        manager.launch()?;
        let init = manager.ready_obs(0).cloned().unwrap();
        let (step, _) = manager.step(0, &CorridorAct(1))?;
        assert!(!step.is_done());
        assert_eq!(manager.ready_obs(0), Some(&step.obs));
        let (step, _) = manager.step(0, &CorridorAct(1))?;
        assert!(step.is_truncated);
        assert_eq!(manager.ready_obs(0), Some(&init));
        Ok(())
    }
}
