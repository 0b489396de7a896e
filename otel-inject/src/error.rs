use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InjectError {
    /// The pod template has no application container to attach the agent to.
    #[error("pod template of {workload} has no application containers")]
    NoApplicationContainer { workload: String },
}
