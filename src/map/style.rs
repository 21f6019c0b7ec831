use serde_json::json;

use super::filter::CUISINE_KEY;

/// Colour for cuisines outside every legend group.
pub const DEFAULT_COLOR: &str = "#808080";

pub const CIRCLE_RADIUS: f64 = 6.0;

pub const BUFFER_COLOR: &str = "#1E90FF";
pub const BUFFER_OPACITY: f64 = 0.3;

pub const CLICK_POINT_COLOR: &str = "#000000";

pub struct LegendGroup {
    pub label: &'static str,
    pub color: &'static str,
    pub cuisines: &'static [&'static str],
}

/// Legend groups in display order. Groups only drive colouring, cuisine filtering matches a
/// single literal value.
pub const LEGEND: &[LegendGroup] = &[
    LegendGroup {
        label: "Korean",
        color: "#FF0000",
        cuisines: &["korean"],
    },
    LegendGroup {
        label: "Japanese",
        color: "#800080",
        cuisines: &["japanese", "sushi"],
    },
    LegendGroup {
        label: "Chinese / Asian",
        color: "#FFA500",
        cuisines: &["chinese", "asian"],
    },
    LegendGroup {
        label: "European",
        color: "#008000",
        cuisines: &["italian", "german", "french"],
    },
    LegendGroup {
        label: "Turkish",
        color: "#FF4500",
        cuisines: &["turkish"],
    },
    LegendGroup {
        label: "American / Fast food",
        color: "#0000FF",
        cuisines: &[
            "burger",
            "pizza",
            "fried chicken",
            "american",
            "steak_house",
            "breakfast",
            "chicken",
        ],
    },
    LegendGroup {
        label: "Salad",
        color: "#00FF00",
        cuisines: &["salad"],
    },
    LegendGroup {
        label: "South / Southeast Asian",
        color: "#FFD700",
        cuisines: &["thai", "vietnamese", "malaysian", "filipino", "indian"],
    },
    LegendGroup {
        label: "Ethiopian",
        color: "#800000",
        cuisines: &["ethiopian"],
    },
];

pub fn cuisine_color(cuisine: &str) -> &'static str {
    LEGEND
        .iter()
        .find(|group| group.cuisines.iter().any(|c| *c == cuisine))
        .map_or(DEFAULT_COLOR, |group| group.color)
}

/// `match` expression colouring restaurant circles by their cuisine.
pub fn color_expression() -> serde_json::Value {
    let mut expression = vec![json!("match"), json!(["get", CUISINE_KEY])];
    for group in LEGEND {
        for cuisine in group.cuisines {
            expression.push(json!(cuisine));
            expression.push(json!(group.color));
        }
    }
    expression.push(json!(DEFAULT_COLOR));
    serde_json::Value::Array(expression)
}
