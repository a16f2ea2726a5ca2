//! Collection of samples from environments.
use crate::{
    config::CollectSection,
    record::{Record, RecordValue::Scalar},
    Agent, Env, EnvManager, PolicyKwargs, TrainingContext, Transition,
};
use anyhow::Result;
use log::{debug, info};
use std::time::SystemTime;

/// When a call of [`SampleCollector::collect`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectTarget {
    /// After this number of samples.
    Samples(usize),

    /// After this number of finished episodes; all their samples are returned.
    Episodes(usize),
}

impl CollectTarget {
    /// The target given in `policy.collect`. `n_sample` takes precedence.
    pub fn from_section(section: &CollectSection) -> Self {
        match (section.n_sample, section.n_episode) {
            (Some(n), _) => Self::Samples(n),
            (None, Some(n)) => Self::Episodes(n),
            (None, None) => Self::Samples(1),
        }
    }
}

/// Drives environment instances with a policy to produce [`Transition`]s.
///
/// Instances are stepped in turn. Episodes left unfinished when a call
/// returns are continued by the next call.
pub struct SampleCollector<E: Env> {
    env: EnvManager<E>,
    target: CollectTarget,
    next_env: usize,
    episode_returns: Vec<f32>,
    episode_lens: Vec<usize>,
    episode_buffers: Vec<Vec<Transition<E>>>,
    total_episodes: usize,
}

struct Finished {
    ret: f32,
    len: usize,
}

impl<E: Env> SampleCollector<E> {
    /// Creates a collector on the given instances.
    pub fn new(env: EnvManager<E>, target: CollectTarget) -> Self {
        let n = env.env_num();
        Self {
            env,
            target,
            next_env: 0,
            episode_returns: vec![0.0; n],
            episode_lens: vec![0; n],
            episode_buffers: (0..n).map(|_| vec![]).collect(),
            total_episodes: 0,
        }
    }

    /// The number of episodes finished since the collector was created.
    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// The target of [`SampleCollector::collect`].
    pub fn target(&self) -> CollectTarget {
        self.target
    }

    /// Collects samples with the agent until the target is reached.
    ///
    /// `ctx.train_iter` is attached to the samples and `ctx.eps` is given to
    /// the agent; `ctx.env_step` is advanced by one per environment step.
    pub fn collect<A: Agent<E>>(
        &mut self,
        agent: &mut A,
        ctx: &mut TrainingContext,
    ) -> Result<(Vec<Transition<E>>, Record)> {
        let kwargs = PolicyKwargs { eps: ctx.eps };
        let target = self.target;
        let (samples, mut record) =
            self.run(target, ctx, |_, obs, _| Ok(agent.explore(obs, &kwargs)))?;
        if let Some(eps) = ctx.eps {
            record.insert("collect/eps", Scalar(eps as f32));
        }
        Ok((samples, record))
    }

    /// Collects `n_sample` samples with uniformly random actions.
    ///
    /// Episodes left unfinished are dropped, so the next
    /// [`SampleCollector::collect`] starts new episodes on every instance.
    pub fn collect_random(
        &mut self,
        n_sample: usize,
        ctx: &mut TrainingContext,
    ) -> Result<(Vec<Transition<E>>, Record)> {
        info!("Collects {} samples with random actions", n_sample);
        let out = self.run(CollectTarget::Samples(n_sample), ctx, |env_id, _, env| {
            env.random_action(env_id)
        })?;
        self.drop_unfinished();
        Ok(out)
    }

    fn drop_unfinished(&mut self) {
        self.env.close();
        self.episode_returns.iter_mut().for_each(|r| *r = 0.0);
        self.episode_lens.iter_mut().for_each(|l| *l = 0);
        self.episode_buffers.iter_mut().for_each(Vec::clear);
    }

    fn run<F>(
        &mut self,
        target: CollectTarget,
        ctx: &mut TrainingContext,
        mut choose: F,
    ) -> Result<(Vec<Transition<E>>, Record)>
    where
        F: FnMut(usize, &E::Obs, &mut EnvManager<E>) -> Result<E::Act>,
    {
        if !self.env.is_launched() {
            self.env.launch()?;
        }

        let timer = SystemTime::now();
        let mut samples = vec![];
        let mut finished = vec![];
        let mut n_steps = 0;

        let is_reached = |samples: &Vec<Transition<E>>, finished: &Vec<Finished>| match target {
            CollectTarget::Samples(n) => samples.len() >= n,
            CollectTarget::Episodes(n) => finished.len() >= n,
        };

        while !is_reached(&samples, &finished) {
            let env_id = self.next_env;
            self.next_env = (self.next_env + 1) % self.env.env_num();

            let obs = match self.env.ready_obs(env_id).cloned() {
                Some(obs) => obs,
                None => self.env.reset_env(env_id)?.clone(),
            };
            let act = choose(env_id, &obs, &mut self.env)?;
            let (step, _) = self.env.step(env_id, &act)?;
            ctx.env_step += 1;
            n_steps += 1;

            self.episode_returns[env_id] += step.reward;
            self.episode_lens[env_id] += 1;
            let is_done = step.is_done();
            let tr = Transition {
                obs,
                act,
                next_obs: step.obs,
                reward: step.reward,
                is_terminated: step.is_terminated,
                is_truncated: step.is_truncated,
                env_id,
                collect_iter: ctx.train_iter,
            };

            match target {
                CollectTarget::Samples(_) => samples.push(tr),
                CollectTarget::Episodes(_) => self.episode_buffers[env_id].push(tr),
            }

            if is_done {
                if let CollectTarget::Episodes(_) = target {
                    samples.append(&mut self.episode_buffers[env_id]);
                }
                finished.push(Finished {
                    ret: self.episode_returns[env_id],
                    len: self.episode_lens[env_id],
                });
                debug!(
                    "Env {} finished an episode, return = {}, length = {}",
                    env_id, self.episode_returns[env_id], self.episode_lens[env_id]
                );
                self.episode_returns[env_id] = 0.0;
                self.episode_lens[env_id] = 0;
                self.total_episodes += 1;
            }
        }

        let elapsed = timer.elapsed()?.as_secs_f32();
        let mut record = Record::empty();
        record.insert("collect/envstep", Scalar(ctx.env_step as f32));
        record.insert("collect/n_sample", Scalar(samples.len() as f32));
        record.insert("collect/n_episode", Scalar(finished.len() as f32));
        if elapsed > 0.0 {
            record.insert("collect/fps", Scalar(n_steps as f32 / elapsed));
        }
        if !finished.is_empty() {
            let n = finished.len() as f32;
            let ret = finished.iter().map(|f| f.ret).sum::<f32>() / n;
            let len = finished.iter().map(|f| f.len as f32).sum::<f32>() / n;
            record.insert("collect/reward_mean", Scalar(ret));
            record.insert("collect/episode_len_mean", Scalar(len));
        }

        Ok((samples, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        toy::{CorridorConfig, CorridorEnv, RandomAgent, RandomAgentConfig},
        Configurable,
    };

    fn collector(n_env: usize, target: CollectTarget) -> Result<SampleCollector<CorridorEnv>> {
        let config = CorridorConfig {
            length: 4,
            max_episode_steps: 6,
        };
        let mut env = EnvManager::<CorridorEnv>::build(&config, n_env, 0)?;
        env.seed(0, true);
        Ok(SampleCollector::new(env, target))
    }

    fn agent() -> Result<RandomAgent> {
        RandomAgent::build(RandomAgentConfig {
            n_actions: 2,
            batch_size: 4,
            seed: 0,
        })
    }

    #[test]
    fn test_collect_exact_samples() -> Result<()> {
        let mut collector = collector(3, CollectTarget::Samples(10))?;
        let mut agent = agent()?;
        let mut ctx = TrainingContext::new();
        ctx.train_iter = 7;

        let (samples, record) = collector.collect(&mut agent, &mut ctx)?;
        assert_eq!(samples.len(), 10);
        assert_eq!(ctx.env_step, 10);
        assert!(samples.iter().all(|s| s.collect_iter == 7));
        assert!(samples.iter().all(|s| s.env_id < 3));
        assert_eq!(record.get_scalar("collect/envstep")?, 10.0);

        let (samples, _) = collector.collect(&mut agent, &mut ctx)?;
        assert_eq!(samples.len(), 10);
        assert_eq!(ctx.env_step, 20);
        Ok(())
    }

    #[test]
    fn test_collect_episodes() -> Result<()> {
        let mut collector = collector(2, CollectTarget::Episodes(3))?;
        let mut agent = agent()?;
        let mut ctx = TrainingContext::new();

        let (samples, record) = collector.collect(&mut agent, &mut ctx)?;
        assert_eq!(record.get_scalar("collect/n_episode")?, 3.0);
        assert_eq!(samples.iter().filter(|s| s.is_done()).count(), 3);
        assert!(samples.len() <= ctx.env_step);
        Ok(())
    }

    #[test]
    fn test_eps_is_passed_to_agent() -> Result<()> {
        let mut collector = collector(1, CollectTarget::Samples(1))?;
        let mut agent = agent()?;
        let mut ctx = TrainingContext::new();
        ctx.eps = Some(0.5);
        let (_, record) = collector.collect(&mut agent, &mut ctx)?;
        assert_eq!(agent.last_eps(), Some(0.5));
        assert_eq!(record.get_scalar("collect/eps")?, 0.5);
        Ok(())
    }

    #[test]
    fn test_collect_random() -> Result<()> {
        let mut collector = collector(2, CollectTarget::Samples(4))?;
        let mut ctx = TrainingContext::new();
        let (samples, _) = collector.collect_random(25, &mut ctx)?;
        assert_eq!(samples.len(), 25);
        assert_eq!(ctx.env_step, 25);
        Ok(())
    }

    #[test]
    fn test_episodes_after_random_collect_are_whole() -> Result<()> {
        let config = CorridorConfig {
            length: 30,
            max_episode_steps: 10,
        };
        let mut env = EnvManager::<CorridorEnv>::build(&config, 1, 0)?;
        env.seed(0, true);
        let mut collector = SampleCollector::new(env, CollectTarget::Episodes(1));
        // A single action moves left, so every episode is truncated at 10 steps.
        let mut agent = RandomAgent::build(RandomAgentConfig {
            n_actions: 1,
            batch_size: 4,
            seed: 0,
        })?;
        let mut ctx = TrainingContext::new();

        collector.collect_random(4, &mut ctx)?;
        let (samples, record) = collector.collect(&mut agent, &mut ctx)?;
        assert_eq!(samples.len(), 10);
        assert_eq!(record.get_scalar("collect/episode_len_mean")?, 10.0);
        assert!(samples[9].is_truncated);
        assert!(samples[..9].iter().all(|s| !s.is_done()));
        assert_eq!(ctx.env_step, 14);
        Ok(())
    }
}
