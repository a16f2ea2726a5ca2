/// Counters of a training run, threaded through the phases of the loop.
///
/// The orchestrator owns the context. [`SampleCollector`](crate::SampleCollector)
/// advances `env_step`, [`Learner`](crate::Learner) advances `train_iter`,
/// and the exploration rate is recomputed before every collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingContext {
    /// The number of optimization steps done so far.
    pub train_iter: usize,

    /// The number of environment steps taken by the collector so far.
    pub env_step: usize,

    /// Exploration rate used in the current round, if the policy explores with epsilon.
    pub eps: Option<f64>,
}

impl TrainingContext {
    /// Creates a context with zero counters.
    pub fn new() -> Self {
        Self::default()
    }
}
