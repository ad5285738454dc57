//! Grid bucketing of samples into hotspots and heatmap points

use crate::config::HeatmapConfig;
use crate::types::{round2, GazeSample};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One occupied grid cell; `grid_x`/`grid_y` are the cell's top-left corner in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub grid_x: i64,
    pub grid_y: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub rank: usize,
    pub x: i64,
    pub y: i64,
    /// Samples that fell in this cell
    #[serde(rename = "fixations")]
    pub count: u64,
    /// Share of all samples in this cell, two decimals
    pub percentage: f64,
}

/// Point in the shape heatmap renderers expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub x: i64,
    pub y: i64,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub max: u64,
    pub data: Vec<HeatmapPoint>,
}

/// Heatmap data bundled with its rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPayload {
    pub config: HeatmapConfig,
    #[serde(flatten)]
    pub heatmap: HeatmapData,
}

fn cell_origin(v: i64, cell_size: u32) -> i64 {
    let size = i64::from(cell_size.max(1));
    v.div_euclid(size) * size
}

/// Count samples per grid cell, in order of first occupation.
pub fn bucket(samples: &[GazeSample], cell_size: u32) -> Vec<GridCell> {
    let mut index: HashMap<(i64, i64), usize> = HashMap::new();
    let mut cells: Vec<GridCell> = Vec::new();

    for s in samples {
        let key = (cell_origin(s.x, cell_size), cell_origin(s.y, cell_size));
        match index.get(&key) {
            Some(&i) => cells[i].count += 1,
            None => {
                index.insert(key, cells.len());
                cells.push(GridCell {
                    grid_x: key.0,
                    grid_y: key.1,
                    count: 1,
                });
            }
        }
    }

    cells
}

/// Densest cells first; ties keep first-occupation order.
pub fn rank_hotspots(samples: &[GazeSample], cell_size: u32, top_n: usize) -> Vec<Hotspot> {
    let mut cells = bucket(samples, cell_size);
    cells.sort_by(|a, b| b.count.cmp(&a.count));

    let total = samples.len() as f64;
    cells
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, c)| Hotspot {
            rank: i + 1,
            x: c.grid_x,
            y: c.grid_y,
            count: c.count,
            percentage: round2(c.count as f64 / total * 100.0),
        })
        .collect()
}

/// Largest cell count, 0 for no samples.
pub fn max_bucket_value(samples: &[GazeSample], cell_size: u32) -> u64 {
    let mut counts: HashMap<(i64, i64), u64> = HashMap::new();
    for s in samples {
        *counts
            .entry((cell_origin(s.x, cell_size), cell_origin(s.y, cell_size)))
            .or_insert(0) += 1;
    }
    counts.into_values().max().unwrap_or(0)
}

pub fn heatmap_data(samples: &[GazeSample], cell_size: u32) -> Option<HeatmapData> {
    if samples.is_empty() {
        log::warn!("No samples to build a heatmap from");
        return None;
    }

    let data: Vec<HeatmapPoint> = bucket(samples, cell_size)
        .into_iter()
        .map(|c| HeatmapPoint {
            x: c.grid_x,
            y: c.grid_y,
            value: c.count,
        })
        .collect();

    log::debug!("Heatmap built from {} samples in {} cells", samples.len(), data.len());
    Some(HeatmapData {
        max: max_bucket_value(samples, cell_size),
        data,
    })
}

pub fn heatmap_payload(samples: &[GazeSample], cell_size: u32, config: &HeatmapConfig) -> Option<HeatmapPayload> {
    heatmap_data(samples, cell_size).map(|heatmap| HeatmapPayload {
        config: config.clone(),
        heatmap,
    })
}
