//! Weather category → icon and background gradient.

use std::{collections::HashMap, sync::LazyLock};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionDescriptor {
    /// Icon identifier understood by the view's icon set.
    pub icon: &'static str,
    /// Top and bottom colors of the background gradient.
    pub gradient: [&'static str; 2],
}

const ENTRIES: [(&str, ConditionDescriptor); 7] = [
    ("Clouds", ConditionDescriptor { icon: "weather-cloudy", gradient: ["#D7D2CC", "#304352"] }),
    ("Clear", ConditionDescriptor { icon: "weather-sunny", gradient: ["#FF7300", "#FEF253"] }),
    ("Atmosphere", ConditionDescriptor { icon: "weather-fog", gradient: ["#606C88", "#3F4C6B"] }),
    ("Snow", ConditionDescriptor { icon: "weather-snowy", gradient: ["#7DE2FC", "#B9B6E5"] }),
    ("Rain", ConditionDescriptor { icon: "weather-rainy", gradient: ["#00C6FB", "#005BEA"] }),
    ("Drizzle", ConditionDescriptor { icon: "weather-hail", gradient: ["#89F7FE", "#66A6FF"] }),
    (
        "Thunderstorm",
        ConditionDescriptor { icon: "weather-lightning", gradient: ["#373B44", "#4286F4"] },
    ),
];

static TABLE: LazyLock<HashMap<&'static str, ConditionDescriptor>> =
    LazyLock::new(|| ENTRIES.into_iter().collect());

/// Look up the display descriptor for a category. Unknown categories yield `None`.
pub fn lookup(category: &str) -> Option<&'static ConditionDescriptor> {
    TABLE.get(category)
}

/// Known categories in table order.
pub fn categories() -> impl Iterator<Item = &'static str> {
    ENTRIES.iter().map(|(name, _)| *name)
}
