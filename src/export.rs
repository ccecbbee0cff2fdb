// Chart.js-shaped JSON for handing a ChartConfig to a web renderer

use crate::series::{AxisId, ChartConfig};
use serde_json::{json, Map, Value};

pub fn chart_js_config(config: &ChartConfig) -> Value {
    let datasets: Vec<Value> = config
        .series
        .iter()
        .map(|s| {
            json!({
                "label": s.label,
                "data": s.values,
                "borderColor": s.color.border_color,
                "backgroundColor": s.color.background_color,
                "yAxisID": s.axis,
            })
        })
        .collect();

    let mut scales = Map::new();
    for (axis, scale) in &config.scales {
        let mut entry = json!({
            "type": "linear",
            "position": scale.position,
        });
        if !scale.draw_on_chart_area {
            entry["grid"] = json!({ "drawOnChartArea": false });
        }
        scales.insert(axis_key(*axis).to_string(), entry);
    }

    json!({
        "type": config.kind,
        "data": {
            "labels": config.labels,
            "datasets": datasets,
        },
        "options": {
            "responsive": true,
            "scales": scales,
            "plugins": {
                "zoom": {
                    "pan": { "enabled": true, "mode": config.zoom_mode },
                    "zoom": {
                        "wheel": { "enabled": true },
                        "pinch": { "enabled": true },
                        "mode": config.zoom_mode,
                    },
                },
            },
        },
    })
}

fn axis_key(axis: AxisId) -> &'static str {
    match axis {
        AxisId::Left => "leftY",
        AxisId::Right => "rightY",
    }
}
