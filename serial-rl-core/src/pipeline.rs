//! The serial training loop.
mod context;
mod options;
use crate::{
    config::CompiledConfig,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    replay_buffer::{ReplayBuffer, ReplayBufferConfig},
    Agent, CollectTarget, Configurable, Env, EnvManager, Evaluator, Learner, SampleCollector,
    StepBudget,
};
use anyhow::Result;
pub use context::TrainingContext;
use log::{debug, info, warn};
pub use options::{PipelineOptions, PipelineReport};
use std::fmt;

/// States of the serial loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Components are built and the replay buffer is filled with random samples.
    Init,

    /// The agent is evaluated, if due.
    Evaluate,

    /// Samples are collected with the agent.
    Collect,

    /// Samples are pushed to the replay buffer.
    Store,

    /// The agent learns from minibatches.
    Train,

    /// The loop has ended.
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Evaluate => "evaluate",
            Self::Collect => "collect",
            Self::Store => "store",
            Self::Train => "train",
            Self::Terminated => "terminated",
        };
        write!(f, "{}", s)
    }
}

fn enter(phase: &mut Phase, next: Phase, ctx: &TrainingContext) {
    debug!(
        "{} -> {} (train_iter = {}, env_step = {})",
        phase, next, ctx.train_iter, ctx.env_step
    );
    *phase = next;
}

/// The replay buffer configuration, its sampler seeded with the run seed
/// unless `policy.other.replay_buffer.seed` is given.
fn replay_buffer_config<E, A>(config: &CompiledConfig<E, A>, seed: i64) -> ReplayBufferConfig
where
    E: Env,
    A: Configurable,
{
    let buffer_config = config.main.policy.other.replay_buffer.clone();
    match buffer_config.seed {
        Some(_) => buffer_config,
        None => buffer_config.seed(seed as u64),
    }
}

/// Builds the agent from the configuration and trains it with [`serial_pipeline_with_agent`].
pub fn serial_pipeline<E, A>(
    config: CompiledConfig<E, A>,
    options: PipelineOptions,
    recorder: &mut Box<dyn AggregateRecorder>,
) -> Result<PipelineReport>
where
    E: Env,
    A: Agent<E> + Configurable,
{
    let mut agent = A::build(config.agent_config.clone())?;
    serial_pipeline_with_agent(&config, &mut agent, options, recorder)
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Trains an agent in the serial loop.
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Init
///     Init --> Evaluate
///     Evaluate --> Collect: not stop
///     Evaluate --> Terminated: stop
///     Collect --> Store
///     Store --> Train
///     Train --> Evaluate
///     Terminated --> [*]
/// ```
///
/// * `Init` builds the collector and evaluator instances (the former with
///   dynamic seeding, the latter with fixed seeds), the replay buffer and the
///   [`Learner`], and passes the run seed to [`Agent::seed`]. When `policy.random_collect_size` is positive, that number of
///   samples with random actions is pushed to the replay buffer.
/// * `Evaluate` runs when [`Evaluator::should_eval`] says so or the step
///   budget has run out. If the evaluator asks to stop, the evaluation
///   history is reset, a final evaluation is done and the loop ends. Training
///   ends in no other way.
/// * `Collect` recomputes epsilon from the environment step counter when
///   `policy.other.eps` is given, then collects with the agent.
/// * `Train` runs up to `policy.learn.update_per_collect` training
///   iterations with minibatches of [`Agent::batch_size`], and stops early
///   when the replay buffer cannot fill a minibatch.
///
/// Records of a round are stored in `recorder`, then flushed with the
/// training iteration as the step.
pub fn serial_pipeline_with_agent<E, A>(
    config: &CompiledConfig<E, A>,
    agent: &mut A,
    options: PipelineOptions,
    recorder: &mut Box<dyn AggregateRecorder>,
) -> Result<PipelineReport>
where
    E: Env,
    A: Agent<E> + Configurable,
{
    let main = &config.main;
    let policy = &main.policy;
    let mut ctx = TrainingContext::new();
    let mut phase = Phase::Init;
    info!("Starts experiment {} with seed {}", main.exp_name, options.seed);

    let exp_dir = options.root_dir.join(&main.exp_name);
    if options.save_cfg {
        config.save(&exp_dir)?;
    }

    let mut collector_env = EnvManager::<E>::build(
        &config.env_config,
        main.env.collector_env_num,
        options.seed,
    )?;
    collector_env.seed(options.seed, true);
    let mut evaluator_env = EnvManager::<E>::build(
        &config.env_config,
        main.env.evaluator_env_num,
        options.seed,
    )?;
    evaluator_env.seed(options.seed, false);

    let batch_size = agent.batch_size();
    let update_per_collect = policy.learn.update_per_collect;
    let buffer_config = replay_buffer_config(config, options.seed);
    if batch_size > buffer_config.replay_buffer_size {
        warn!(
            "batch_size {} exceeds replay_buffer_size {}, the agent will never learn",
            batch_size, buffer_config.replay_buffer_size
        );
    }
    let mut buffer = ReplayBuffer::<E>::build(&buffer_config);
    let mut learner = Learner::new(policy.learn.learner.clone(), exp_dir.join("ckpt"));
    let mut collector =
        SampleCollector::new(collector_env, CollectTarget::from_section(&policy.collect));
    let budget = StepBudget {
        max_env_step: options.max_env_step,
        max_train_iter: options.max_train_iter,
    };
    let mut evaluator = Evaluator::new(
        evaluator_env,
        &policy.eval.evaluator,
        main.env.n_evaluator_episode(),
        main.env.stop_value,
        budget,
    );
    let eps = policy.other.eps.as_ref();

    agent.seed(options.seed);
    learner.before_run(agent)?;
    agent.train();

    if policy.random_collect_size > 0 {
        let (samples, record) = collector.collect_random(policy.random_collect_size, &mut ctx)?;
        buffer.push(samples, ctx.env_step);
        recorder.store(record);
        recorder.store(buffer.record());
        recorder.flush(ctx.train_iter as _);
    }

    loop {
        let mut record = Record::empty();

        enter(&mut phase, Phase::Evaluate, &ctx);
        if evaluator.should_eval(ctx.train_iter)
            || evaluator.budget_exhausted(ctx.train_iter, ctx.env_step)
        {
            let out = evaluator.eval(agent, Some(&learner), ctx.train_iter, ctx.env_step)?;
            record.merge_inplace(out.record);
            if out.stop {
                recorder.store(record);
                recorder.flush(ctx.train_iter as _);
                break;
            }
        }

        enter(&mut phase, Phase::Collect, &ctx);
        ctx.eps = eps.map(|eps| eps.epsilon(ctx.env_step));
        let (samples, record_collect) = collector.collect(agent, &mut ctx)?;
        record.merge_inplace(record_collect);

        enter(&mut phase, Phase::Store, &ctx);
        buffer.push(samples, ctx.env_step);

        enter(&mut phase, Phase::Train, &ctx);
        for _ in 0..update_per_collect {
            match buffer.sample(batch_size, ctx.train_iter) {
                Some(batch) => {
                    let record_learn = learner.train(agent, batch, &mut ctx)?;
                    recorder.store(record_learn);
                }
                None => {
                    debug!(
                        "Replay buffer has {} samples, fewer than batch_size {}",
                        buffer.len(),
                        batch_size
                    );
                    break;
                }
            }
        }
        if let Some(osps) = learner.opt_steps_per_sec() {
            record.insert("learn/opt_steps_per_sec", Scalar(osps));
        }
        record.merge_inplace(buffer.record());

        recorder.store(record);
        recorder.flush(ctx.train_iter as _);
    }

    enter(&mut phase, Phase::Terminated, &ctx);
    let best_reward = evaluator.best_reward();
    evaluator.reset();
    let out = evaluator.eval(agent, None, ctx.train_iter, ctx.env_step)?;
    info!(
        "Finished experiment {}: train_iter = {}, env_step = {}, final reward = {}",
        main.exp_name, ctx.train_iter, ctx.env_step, out.reward
    );
    learner.after_run(agent)?;

    Ok(PipelineReport {
        train_iter: ctx.train_iter,
        env_step: ctx.env_step,
        best_reward,
        final_reward: out.reward,
        exp_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{compile_config, MainConfig, TOTAL_CONFIG_FILE},
        record::BufferedRecorder,
        toy::{CorridorEnv, RandomAgent},
    };
    use std::{cell::RefCell, rc::Rc};
    use tempdir::TempDir;

    const CONFIG: &str = r#"
exp_name: corridor_test
env:
  collector_env_num: 2
  evaluator_env_num: 2
  n_evaluator_episode: 2
  length: 4
  max_episode_steps: 10
policy:
  model: {obs_shape: 1, action_shape: 2}
  learn:
    update_per_collect: 3
    batch_size: 4
    learner:
      hook: {save_ckpt_after_iter: 10}
  collect: {n_sample: 8}
  eval:
    evaluator: {eval_freq: 5}
  other:
    replay_buffer: {replay_buffer_size: 100}
    eps: {type: exp, start: 1.0, end: 0.05, decay: 100}
"#;

    /// Shares the recorded values with the test after the recorder is boxed.
    #[derive(Clone, Default)]
    struct SharedRecorder(Rc<RefCell<BufferedRecorder>>);

    impl AggregateRecorder for SharedRecorder {
        fn store(&mut self, record: Record) {
            self.0.borrow_mut().store(record);
        }

        fn flush(&mut self, step: i64) {
            self.0.borrow_mut().flush(step);
        }
    }

    fn compiled(yaml: &str) -> Result<CompiledConfig<CorridorEnv, RandomAgent>> {
        let main = MainConfig::from_yaml_str(yaml)?;
        Ok(compile_config(main, None)?)
    }

    #[test_log::test]
    fn test_terminates_on_train_iter_budget() -> Result<()> {
        let dir = TempDir::new("pipeline")?;
        let config = compiled(CONFIG)?;
        let options = PipelineOptions::default()
            .root_dir(dir.path())
            .max_train_iter(20);
        let shared = SharedRecorder::default();
        let mut recorder: Box<dyn AggregateRecorder> = Box::new(shared.clone());
        let mut agent = RandomAgent::build(config.agent_config.clone())?;

        let report = serial_pipeline_with_agent(&config, &mut agent, options, &mut recorder)?;

        // Rounds add 3 iterations, the budget is checked at evaluation.
        assert_eq!(report.train_iter, 21);
        assert_eq!(agent.n_updates(), 21);
        assert_eq!(report.env_step, 8 * 7);
        assert!(report.best_reward.is_some());

        // Epsilon is recomputed from env_step before each collection.
        let schedule = config.main.policy.other.eps.clone().unwrap();
        assert_eq!(agent.last_eps(), Some(schedule.epsilon(8 * 6)));

        let exp_dir = dir.path().join("corridor_test");
        assert!(exp_dir.join(TOTAL_CONFIG_FILE).exists());
        assert!(exp_dir.join("ckpt").join("best").exists());
        assert!(exp_dir.join("ckpt").join("iteration_10").exists());
        assert!(exp_dir.join("ckpt").join("iteration_20").exists());

        let recorder = shared.0.borrow();
        let evals = recorder.scalars("eval/train_iter");
        let eval_iters = evals.iter().map(|(_, v)| *v as usize).collect::<Vec<_>>();
        assert_eq!(eval_iters, vec![0, 6, 12, 18, 21]);
        Ok(())
    }

    #[test]
    fn test_terminates_on_stop_value() -> Result<()> {
        let dir = TempDir::new("pipeline")?;
        let yaml = CONFIG.replace(
            "max_episode_steps: 10",
            "max_episode_steps: 10\n  stop_value: 0.0",
        );
        let config = compiled(&yaml)?;
        let options = PipelineOptions::default().root_dir(dir.path());
        let mut recorder: Box<dyn AggregateRecorder> = Box::new(BufferedRecorder::new());

        let report = serial_pipeline(config, options, &mut recorder)?;
        assert_eq!(report.train_iter, 0);
        assert_eq!(report.env_step, 0);
        assert!(report.final_reward >= 0.0);
        Ok(())
    }

    #[test]
    fn test_no_update_below_batch_size() -> Result<()> {
        let dir = TempDir::new("pipeline")?;
        let yaml = CONFIG
            .replace("update_per_collect: 3", "update_per_collect: 64")
            .replace("batch_size: 4", "batch_size: 256")
            .replace("n_sample: 8", "n_sample: 64")
            .replace("replay_buffer_size: 100", "replay_buffer_size: 1000");
        let config = compiled(&yaml)?;
        let options = PipelineOptions::default()
            .root_dir(dir.path())
            .max_env_step(64)
            .save_cfg(false);
        let mut recorder: Box<dyn AggregateRecorder> = Box::new(BufferedRecorder::new());
        let mut agent = RandomAgent::build(config.agent_config.clone())?;

        let report = serial_pipeline_with_agent(&config, &mut agent, options, &mut recorder)?;
        assert_eq!(report.env_step, 64);
        assert_eq!(report.train_iter, 0);
        assert_eq!(agent.n_updates(), 0);
        assert!(!dir.path().join("corridor_test").join(TOTAL_CONFIG_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_random_collect_fills_buffer() -> Result<()> {
        let dir = TempDir::new("pipeline")?;
        let yaml = CONFIG.replace(
            "model: {obs_shape: 1, action_shape: 2}",
            "random_collect_size: 20\n  model: {obs_shape: 1, action_shape: 2}",
        );
        let config = compiled(&yaml)?;
        let options = PipelineOptions::default()
            .root_dir(dir.path())
            .max_env_step(20);
        let mut recorder: Box<dyn AggregateRecorder> = Box::new(BufferedRecorder::new());
        let mut agent = RandomAgent::build(config.agent_config.clone())?;

        let report = serial_pipeline_with_agent(&config, &mut agent, options, &mut recorder)?;
        assert_eq!(report.env_step, 20);
        assert_eq!(report.train_iter, 0);
        assert_eq!(agent.last_eps(), None);
        Ok(())
    }

    #[test]
    fn test_run_seed_reaches_agent_and_sampler() -> Result<()> {
        let dir = TempDir::new("pipeline")?;
        let config = compiled(CONFIG)?;
        let options = PipelineOptions::default()
            .root_dir(dir.path())
            .seed(3)
            .max_env_step(8)
            .save_cfg(false);
        let mut recorder: Box<dyn AggregateRecorder> = Box::new(BufferedRecorder::new());
        let mut agent = RandomAgent::build(config.agent_config.clone())?;
        serial_pipeline_with_agent(&config, &mut agent, options, &mut recorder)?;
        assert_eq!(agent.run_seed(), Some(3));

        assert_eq!(replay_buffer_config(&config, 3).seed, Some(3));
        assert_eq!(replay_buffer_config(&config, 4).seed, Some(4));
        let yaml = CONFIG.replace(
            "replay_buffer_size: 100}",
            "replay_buffer_size: 100, seed: 7}",
        );
        let config = compiled(&yaml)?;
        assert_eq!(replay_buffer_config(&config, 3).seed, Some(7));
        Ok(())
    }
}
