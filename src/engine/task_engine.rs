use std::time::Instant;

use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::domain::node::{NodeId, NodeSet};
use crate::engine::step::{Report, Step, StepContext};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// The check found nothing actionable.
    Converged,
    /// Exec ran.
    Executed,
    /// Informational step, nothing to execute.
    Reported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub name: String,
    pub state: StepState,
    pub items: Vec<NodeId>,
    pub flagged: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub steps: Vec<StepSummary>,
}

impl RunReport {
    pub fn step(&self, name: &str) -> Option<&StepSummary> {
        self.steps.iter().find(|summary| summary.name == name)
    }

    pub fn executed(&self) -> impl Iterator<Item = &StepSummary> {
        self.steps.iter().filter(|summary| summary.state == StepState::Executed)
    }

    /// True when no step had to execute anything.
    pub fn is_converged(&self) -> bool {
        self.executed().next().is_none()
    }
}

/// Ordered list of steps, executed front to back.
pub struct WorkflowRun {
    steps: Vec<Box<dyn Step>>,
}

impl WorkflowRun {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        WorkflowRun { steps }
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }
}

/// Runs a [`WorkflowRun`] strictly in order. The first error from any step aborts the run.
pub struct TaskEngine {
    cancel: CancellationToken,
}

impl TaskEngine {
    pub fn new(cancel: CancellationToken) -> Self {
        TaskEngine { cancel }
    }

    pub async fn run(&self, run: &WorkflowRun, nodes: &mut NodeSet) -> Result<RunReport> {
        let mut report = RunReport::default();
        let started = Instant::now();

        for step in run.steps() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let summary = tokio::select! {
                _ = self.cancel.cancelled() => Err(Error::Cancelled),
                summary = self.run_step(step.as_ref(), nodes) => summary,
            };
            match summary {
                Ok(summary) => report.steps.push(summary),
                Err(e) => {
                    log::error!("{} {}: {}", "┗━ ✗".red(), step.name(), e);
                    return Err(e);
                }
            }
        }

        let executed = report.executed().count();
        log::info!(
            "Run finished in {}ms: {} step(s), {} executed, {} converged.",
            started.elapsed().as_millis(),
            report.steps.len(),
            executed,
            report.steps.iter().filter(|s| s.state == StepState::Converged).count()
        );
        Ok(report)
    }

    pub async fn run_step(&self, step: &dyn Step, nodes: &mut NodeSet) -> Result<StepSummary> {
        log::info!("{} {}", "┏━".bold(), step.name().bold());
        let started = Instant::now();

        let (items, state) = match step.check(nodes).await? {
            Some(items) if items.is_empty() => (items, StepState::Converged),
            Some(items) => self.exec_if_registered(step, nodes, items).await?,
            None => {
                let items = step.list(nodes).await?;
                self.exec_if_registered(step, nodes, items).await?
            }
        };

        if !items.is_empty() {
            if let Some(title) = step.list_title() {
                log::info!("┃ {}", title.underline());
            }
        }

        let mut flagged = Vec::new();
        for id in &items {
            match step.report(nodes.get(*id)) {
                Report::Ok(line) => log::info!("┃ {} {}", "✓".green(), line),
                Report::Flagged(line) => {
                    log::warn!("┃ {} {}", "✗".red(), line);
                    flagged.push(*id);
                }
            }
        }

        let elapsed = started.elapsed().as_millis();
        match state {
            StepState::Converged => log::info!("{} converged ({}ms)", "┗━ ✓".green(), elapsed),
            StepState::Executed => log::info!("{} executed on {} node(s) ({}ms)", "┗━ ✓".green(), items.len(), elapsed),
            StepState::Reported => log::info!("{} {} item(s)", "┗━".bold(), items.len()),
        }

        Ok(StepSummary { name: step.name().to_string(), state, items, flagged })
    }

    async fn exec_if_registered(&self, step: &dyn Step, nodes: &mut NodeSet, items: Vec<NodeId>) -> Result<(Vec<NodeId>, StepState)> {
        if !step.has_exec() {
            return Ok((items, StepState::Reported));
        }

        let cx = StepContext { items };
        step.exec(nodes, &cx).await?;
        Ok((cx.items, StepState::Executed))
    }
}
