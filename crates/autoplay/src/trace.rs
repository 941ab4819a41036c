use crate::AutoplayError;
use pitstop_core::{Action, RaceState, StepStatus};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EpisodeStatus {
    Won,
    Lost,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    pub iterations: u32,
    pub nodes: usize,
    pub elapsed_ms: u64,
    pub root_arms_tried: usize,
    pub selected_visits: u32,
    pub selected_value: f64,
    #[serde(default)]
    pub truncated_rollouts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u32,
    pub elapsed_before: u32,
    pub state_before: RaceState,
    pub action: Action,
    pub mcts: SearchStats,
    pub steps_consumed: u32,
    pub state_after: RaceState,
    pub status_after: StepStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub decisions: u32,
    pub steps_used: u32,
    pub max_steps: u32,
    pub final_position: u32,
    pub goal_distance: u32,
    pub total_simulations: u64,
    pub wall_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub status: EpisodeStatus,
    pub seed: u64,
    pub steps: Vec<StepRecord>,
    pub summary: EpisodeSummary,
}

impl EpisodeResult {
    pub fn to_text_report(&self) -> String {
        let mut lines = vec![
            format!("status: {}", episode_status_label(self.status)),
            format!(
                "final: position {}/{} after {} of {} steps",
                self.summary.final_position,
                self.summary.goal_distance,
                self.summary.steps_used,
                self.summary.max_steps
            ),
            format!(
                "summary: decisions={} simulations={} wall_ms={} seed={}",
                self.summary.decisions,
                self.summary.total_simulations,
                self.summary.wall_time_ms,
                self.seed
            ),
            String::new(),
            "steps:".to_string(),
        ];
        for step in &self.steps {
            lines.push(format!(
                "  step {:>4} | t={:>4} | {}",
                step.step,
                step.elapsed_before,
                step.action.short_label()
            ));
            lines.push(format!("    state: {}", step.state_before.stable_key()));
            lines.push(format!(
                "      -> {}{}{} (+{} steps, {})",
                step.state_after.stable_key(),
                if step.state_after.slipped { " [slip]" } else { "" },
                if step.state_after.broken_down {
                    " [breakdown]"
                } else {
                    ""
                },
                step.steps_consumed,
                step_status_label(step.status_after)
            ));
            lines.push(format!(
                "    search: sims={} nodes={} elapsed={}ms arms_tried={} pick_visits={} pick_value={:.4}",
                step.mcts.iterations,
                step.mcts.nodes,
                step.mcts.elapsed_ms,
                step.mcts.root_arms_tried,
                step.mcts.selected_visits,
                step.mcts.selected_value
            ));
        }
        lines.join("\n")
    }
}

/// Success statistics over repeated episodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrialSummary {
    pub trials: u32,
    pub successes: u32,
    pub total_steps_on_success: u64,
}

impl TrialSummary {
    pub fn record(&mut self, result: &EpisodeResult) {
        self.trials += 1;
        if result.status == EpisodeStatus::Won {
            self.successes += 1;
            self.total_steps_on_success += result.summary.steps_used as u64;
        }
    }

    /// Percentage of trials that reached the goal.
    pub fn success_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.successes as f64 * 100.0 / self.trials as f64
        }
    }

    pub fn average_steps_on_success(&self) -> Option<f64> {
        if self.successes == 0 {
            None
        } else {
            Some(self.total_steps_on_success as f64 / self.successes as f64)
        }
    }

    pub fn to_text_report(&self) -> String {
        let average = self
            .average_steps_on_success()
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "n/a".to_string());
        [
            format!("{} episodes successful out of {}", self.successes, self.trials),
            format!("success rate: {:.2}%", self.success_rate()),
            format!("average steps for successful episodes: {average}"),
        ]
        .join("\n")
    }
}

fn episode_status_label(status: EpisodeStatus) -> &'static str {
    match status {
        EpisodeStatus::Won => "won",
        EpisodeStatus::Lost => "lost",
    }
}

fn step_status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::InProgress => "in progress",
        StepStatus::Win => "goal",
        StepStatus::Loss => "out of steps",
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AutoplayError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body)?;
    Ok(())
}

pub fn write_text(path: &Path, report: &str) -> Result<(), AutoplayError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report)?;
    Ok(())
}
