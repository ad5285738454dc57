//! Post-test review: automatic findings plus attention summaries

use crate::aggregate::{heatmap_payload, rank_hotspots, HeatmapPayload, Hotspot};
use crate::config::LabConfig;
use crate::export::{EndReason, TestResults};
use crate::recorder::RecordingStats;
use crate::types::{round_half_up, TrackingMethod};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Finding {
    TaskCompleted,
    TaskNotCompleted,
    HighActivity,
    ModerateActivity,
    LowActivity,
    QuickFind,
    SlowFind,
    PointerApproximation,
}

impl Finding {
    pub fn message(self) -> &'static str {
        match self {
            Finding::TaskCompleted => "Task completed: the participant found and clicked the main call to action.",
            Finding::TaskNotCompleted => "Task not completed: the target was not found within the time limit.",
            Finding::HighActivity => "High visual exploration activity.",
            Finding::ModerateActivity => "Moderate visual exploration activity.",
            Finding::LowActivity => "Low visual exploration activity.",
            Finding::QuickFind => "The target was found quickly, suggesting the call to action is clearly visible.",
            Finding::SlowFind => "The target took a while to find; the visual hierarchy could be improved.",
            Finding::PointerApproximation => "Samples were captured from pointer movement as an approximation of gaze.",
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub fn auto_analysis(results: &TestResults) -> Vec<Finding> {
    let mut findings = Vec::new();
    let stats = &results.stats;

    findings.push(if results.task_completed {
        Finding::TaskCompleted
    } else {
        Finding::TaskNotCompleted
    });

    if stats.total_points > 0 {
        findings.push(match stats.samples_per_second {
            r if r > 20 => Finding::HighActivity,
            r if r > 10 => Finding::ModerateActivity,
            _ => Finding::LowActivity,
        });
    }

    if stats.duration_ms > 0 && results.task_completed {
        let seconds = round_half_up(stats.duration_ms as f64 / 1000.0) as u64;
        if seconds < 15 {
            findings.push(Finding::QuickFind);
        } else if seconds > 30 {
            findings.push(Finding::SlowFind);
        }
    }

    if results.tracking_method == TrackingMethod::Mouse {
        findings.push(Finding::PointerApproximation);
    }

    findings
}

/// Everything the results view shows for one test
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsReport {
    pub status: EndReason,
    pub task_completed: bool,
    pub details: String,
    pub stats: RecordingStats,
    pub hotspots: Vec<Hotspot>,
    pub heatmap: Option<HeatmapPayload>,
    pub findings: Vec<Finding>,
}

impl ResultsReport {
    pub fn build(results: &TestResults, config: &LabConfig) -> Self {
        let agg = &config.aggregation;
        Self {
            status: results.reason,
            task_completed: results.task_completed,
            details: results.details.clone(),
            stats: results.stats,
            hotspots: rank_hotspots(&results.gaze_data, agg.hotspot_cell_px, agg.hotspot_top_n),
            heatmap: heatmap_payload(&results.gaze_data, agg.heatmap_cell_px, &config.heatmap),
            findings: auto_analysis(results),
        }
    }
}

impl fmt::Display for ResultsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            EndReason::Completed => "completed",
            EndReason::Timeout => "timed out",
        };
        writeln!(f, "Status:          {status}")?;
        if self.task_completed {
            writeln!(f, "Task:            done ({})", self.details)?;
        } else {
            writeln!(f, "Task:            not completed")?;
        }
        writeln!(f, "Duration:        {}s", round_half_up(self.stats.duration_ms as f64 / 1000.0))?;
        writeln!(f, "Samples:         {}", self.stats.total_points)?;
        writeln!(f, "Mean position:   ({}, {})", self.stats.avg_x, self.stats.avg_y)?;
        writeln!(f, "Sample rate:     {} samples/s", self.stats.samples_per_second)?;

        if self.hotspots.is_empty() {
            writeln!(f, "Hotspots:        not enough data")?;
        } else {
            writeln!(f, "Hotspots:")?;
            for h in &self.hotspots {
                writeln!(f, "  {}. ({}, {})  {:.2}% of attention", h.rank, h.x, h.y, h.percentage)?;
            }
        }
        if let Some(heatmap) = &self.heatmap {
            writeln!(f, "Heatmap:         {} cells, max {}", heatmap.heatmap.data.len(), heatmap.heatmap.max)?;
        }

        writeln!(f, "Analysis:")?;
        for finding in &self.findings {
            writeln!(f, "  - {finding}")?;
        }
        Ok(())
    }
}
