use anyhow::Result;
use clap::Parser;
use log::info;
use serial_rl::{
    config::{CreateConfig, MainConfig},
    create_recorder, PipelineOptions, Registry,
};
use std::path::PathBuf;

/// Run an experiment in the serial training loop
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Main configuration, hyperparameters of the experiment
    #[arg(short, long)]
    config: PathBuf,

    /// Create configuration, types of the environment and the policy
    #[arg(long)]
    create: PathBuf,

    /// Seed of the environment instances
    #[arg(short, long, default_value_t = 0)]
    seed: i64,

    /// Stop at the first evaluation after this number of environment steps
    #[arg(long)]
    max_env_step: Option<usize>,

    /// Stop at the first evaluation after this number of training iterations
    #[arg(long)]
    max_train_iter: Option<usize>,

    /// Directory where the experiment directory is created
    #[arg(long, default_value = ".")]
    root_dir: PathBuf,

    /// Discard records instead of writing them for Tensorboard
    #[arg(long, default_value_t = false)]
    no_tensorboard: bool,

    /// Do not write the compiled configuration
    #[arg(long, default_value_t = false)]
    no_save_cfg: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let main_config = MainConfig::load(&args.config)?;
    let create_config = CreateConfig::load(&args.create)?;

    let mut options = PipelineOptions::default()
        .seed(args.seed)
        .root_dir(&args.root_dir)
        .save_cfg(!args.no_save_cfg);
    if let Some(v) = args.max_env_step {
        options = options.max_env_step(v);
    }
    if let Some(v) = args.max_train_iter {
        options = options.max_train_iter(v);
    }

    let mut recorder = create_recorder(
        &args.root_dir,
        &main_config.exp_name,
        !args.no_tensorboard,
    );
    let report = Registry::with_builtin().launch(main_config, create_config, options, &mut recorder)?;

    info!(
        "train_iter = {}, env_step = {}, best reward = {:?}, final reward = {}",
        report.train_iter, report.env_step, report.best_reward, report.final_reward
    );
    info!("Outputs are in {:?}", report.exp_dir);

    Ok(())
}
