pub mod step;
pub mod task_engine;

pub use step::{Report, Step, StepContext};
pub use task_engine::{RunReport, StepState, StepSummary, TaskEngine, WorkflowRun};
