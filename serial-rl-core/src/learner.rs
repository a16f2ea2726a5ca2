//! Optimization of [`Agent`]s with minibatches.
mod config;
use crate::{
    record::{Record, RecordValue::Scalar},
    Agent, Env, TrainingContext, Transition,
};
use anyhow::Result;
pub use config::{HookConfig, LearnerConfig};
use log::info;
use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

/// Runs optimization steps of an agent and the hooks around them.
///
/// Each call of [`Learner::train`] is one training iteration: the agent
/// learns from a minibatch and `train_iter` of the [`TrainingContext`] is
/// incremented. Checkpoints are written under the checkpoint directory,
/// `<root>/<exp_name>/ckpt`.
pub struct Learner {
    hook: HookConfig,
    ckpt_dir: PathBuf,
    opt_steps_for_ops: usize,
    timer_for_ops: Duration,
}

impl Learner {
    /// Creates a learner writing checkpoints in `ckpt_dir`.
    pub fn new(config: LearnerConfig, ckpt_dir: impl Into<PathBuf>) -> Self {
        Self {
            hook: config.hook,
            ckpt_dir: ckpt_dir.into(),
            opt_steps_for_ops: 0,
            timer_for_ops: Duration::new(0, 0),
        }
    }

    /// The checkpoint directory.
    pub fn ckpt_dir(&self) -> &Path {
        &self.ckpt_dir
    }

    /// Performs a training iteration with a minibatch.
    pub fn train<E, A>(
        &mut self,
        agent: &mut A,
        batch: Vec<Transition<E>>,
        ctx: &mut TrainingContext,
    ) -> Result<Record>
    where
        E: Env,
        A: Agent<E>,
    {
        let timer = SystemTime::now();
        let mut record = agent.learn(batch)?;
        self.timer_for_ops += timer.elapsed()?;
        self.opt_steps_for_ops += 1;
        ctx.train_iter += 1;

        record.insert("learn/train_iter", Scalar(ctx.train_iter as f32));

        if self.hook.log_show_after_iter > 0 && ctx.train_iter % self.hook.log_show_after_iter == 0
        {
            info!("[train_iter {}] {}", ctx.train_iter, format_scalars(&record));
        }

        if self.hook.save_ckpt_after_iter > 0
            && ctx.train_iter % self.hook.save_ckpt_after_iter == 0
        {
            self.save_checkpoint(agent, &format!("iteration_{}", ctx.train_iter))?;
        }

        Ok(record)
    }

    /// Returns optimization steps per second since the last call, then resets the counter.
    ///
    /// Returns `None` if no optimization step has been done.
    pub fn opt_steps_per_sec(&mut self) -> Option<f32> {
        let millis = self.timer_for_ops.as_millis() as f32;
        let osps = if self.opt_steps_for_ops == 0 {
            None
        } else {
            Some(1000. * self.opt_steps_for_ops as f32 / millis.max(1.0))
        };
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        osps
    }

    /// Saves the parameters of the agent in `<ckpt_dir>/<name>`.
    pub fn save_checkpoint<E, A>(&self, agent: &A, name: &str) -> Result<PathBuf>
    where
        E: Env,
        A: Agent<E>,
    {
        let path = self.ckpt_dir.join(name);
        agent.save_params(&path)?;
        info!("Saved the checkpoint in {:?}", &path);
        Ok(path)
    }

    /// Loads the checkpoint given in the hook configuration, if any.
    pub fn before_run<E, A>(&self, agent: &mut A) -> Result<()>
    where
        E: Env,
        A: Agent<E>,
    {
        if !self.hook.load_ckpt_before_run.is_empty() {
            let path = Path::new(&self.hook.load_ckpt_before_run);
            agent.load_params(path)?;
            info!("Loaded the checkpoint in {:?}", path);
        }
        Ok(())
    }

    /// Saves the checkpoint `final` if the hook configuration asks for it.
    pub fn after_run<E, A>(&self, agent: &A) -> Result<()>
    where
        E: Env,
        A: Agent<E>,
    {
        if self.hook.save_ckpt_after_run {
            self.save_checkpoint(agent, "final")?;
        }
        Ok(())
    }
}

fn format_scalars(record: &Record) -> String {
    let mut items = record
        .iter()
        .filter_map(|(k, v)| match v {
            Scalar(v) => Some(format!("{} = {:.4}", k, v)),
            _ => None,
        })
        .collect::<Vec<_>>();
    items.sort();
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        toy::{CorridorAct, CorridorEnv, CorridorObs, RandomAgent, RandomAgentConfig},
        Configurable,
    };
    use tempdir::TempDir;

    fn batch(n: usize) -> Vec<Transition<CorridorEnv>> {
        (0..n)
            .map(|i| Transition {
                obs: CorridorObs(i),
                act: CorridorAct(1),
                next_obs: CorridorObs(i + 1),
                reward: 0.0,
                is_terminated: false,
                is_truncated: false,
                env_id: 0,
                collect_iter: 0,
            })
            .collect()
    }

    fn agent() -> Result<RandomAgent> {
        RandomAgent::build(RandomAgentConfig {
            n_actions: 2,
            batch_size: 2,
            seed: 0,
        })
    }

    #[test_log::test]
    fn test_train_increments_train_iter() -> Result<()> {
        let dir = TempDir::new("learner")?;
        let config = LearnerConfig::default().hook(HookConfig::default().log_show_after_iter(1));
        let mut learner = Learner::new(config, dir.path());
        let mut agent = agent()?;
        let mut ctx = TrainingContext::new();

        for _ in 0..3 {
            learner.train(&mut agent, batch(2), &mut ctx)?;
        }
        assert_eq!(ctx.train_iter, 3);
        assert_eq!(ctx.env_step, 0);
        assert_eq!(agent.n_updates(), 3);
        assert!(learner.opt_steps_per_sec().is_some());
        assert!(learner.opt_steps_per_sec().is_none());
        Ok(())
    }

    #[test]
    fn test_checkpoint_hooks() -> Result<()> {
        let dir = TempDir::new("learner")?;
        let hook = HookConfig::default()
            .save_ckpt_after_iter(2)
            .save_ckpt_after_run(true);
        let mut learner = Learner::new(LearnerConfig::default().hook(hook), dir.path());
        let mut agent = agent()?;
        let mut ctx = TrainingContext::new();

        for _ in 0..5 {
            learner.train(&mut agent, batch(2), &mut ctx)?;
        }
        learner.after_run(&agent)?;

        assert!(dir.path().join("iteration_2").join("params.yaml").exists());
        assert!(dir.path().join("iteration_4").join("params.yaml").exists());
        assert!(!dir.path().join("iteration_5").exists());
        assert!(dir.path().join("final").exists());

        let hook = HookConfig::default().load_ckpt_before_run(
            dir.path().join("iteration_4").to_string_lossy().to_string(),
        );
        let learner = Learner::new(LearnerConfig::default().hook(hook), dir.path());
        let mut agent = self::agent()?;
        learner.before_run(&mut agent)?;
        assert_eq!(agent.n_updates(), 4);
        Ok(())
    }
}
