//! Naming differences between the Windows and macOS automation bindings.
//!
//! Callers always use one vocabulary (the Windows names). On macOS some chart
//! types are spelled differently, so names are translated before they reach
//! the host. On Windows every translation here is the identity.

use std::fmt;
use std::str::FromStr;

use crate::error::HostError;

/// Logical chart-type name → macOS-native name.
const CHART_TYPE_MAPPING: &[(&str, &str)] = &[
    ("column", "column_clustered"),
    ("column_stacked", "column_stacked"),
    ("column_stacked_100", "column_stacked_100_percent"),
    ("bar", "bar_clustered"),
    ("bar_stacked", "bar_stacked"),
    ("bar_stacked_100", "bar_stacked_100_percent"),
    ("line", "line"),
    ("line_markers", "line_markers"),
    ("line_stacked", "line_stacked"),
    ("line_stacked_100", "line_stacked_100_percent"),
    ("pie", "pie"),
    ("doughnut", "doughnut"),
    ("scatter", "scatter_markers"),
    ("area", "area"),
    ("area_stacked", "area_stacked"),
    ("area_stacked_100", "area_stacked_100_percent"),
    ("radar", "radar"),
    ("bubble", "bubble"),
    ("3d_column", "3d_column"),
    ("3d_bar", "3d_bar"),
    ("3d_line", "3d_line"),
    ("3d_pie", "3d_pie"),
    ("3d_area", "3d_area"),
];

/// Chart types the macOS binding accepts.
const MACOS_CHART_TYPES: &[&str] = &[
    "area",
    "area_stacked",
    "area_stacked_100_percent",
    "bar_clustered",
    "bar_stacked",
    "bar_stacked_100_percent",
    "bubble",
    "column_clustered",
    "column_stacked",
    "column_stacked_100_percent",
    "doughnut",
    "line",
    "line_markers",
    "line_stacked",
    "line_stacked_100_percent",
    "pie",
    "radar",
    "scatter_markers",
    "3d_area",
    "3d_bar",
    "3d_column",
    "3d_line",
    "3d_pie",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Windows
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
        }
    }

    /// Translate a chart-type name into this platform's vocabulary.
    ///
    /// Known logical names are translated, native names pass through, and
    /// anything else passes through with a warning.
    pub fn chart_type(self, name: &str) -> String {
        if self == Platform::Windows {
            return name.to_string();
        }
        if let Some((_, native)) = CHART_TYPE_MAPPING.iter().find(|(l, _)| *l == name) {
            tracing::debug!("Mapped chart type '{name}' -> '{native}'");
            return native.to_string();
        }
        if !MACOS_CHART_TYPES.contains(&name) {
            tracing::warn!("Unknown chart type '{name}'");
        }
        name.to_string()
    }

    /// Chart-type names accepted on this platform.
    pub fn supported_chart_types(self) -> Vec<&'static str> {
        match self {
            Platform::Windows => CHART_TYPE_MAPPING.iter().map(|(l, _)| *l).collect(),
            Platform::MacOs => MACOS_CHART_TYPES.to_vec(),
        }
    }
}

/// Whether `name` is a chart type in either vocabulary.
pub fn is_known_chart_type(name: &str) -> bool {
    CHART_TYPE_MAPPING
        .iter()
        .any(|(logical, native)| *logical == name || *native == name)
        || MACOS_CHART_TYPES.contains(&name)
}

impl Default for Platform {
    fn default() -> Self {
        Platform::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(Platform::Windows),
            "macos" | "mac" | "darwin" => Ok(Platform::MacOs),
            _ => Err(HostError::invalid_argument(format!("unknown platform '{s}'"))),
        }
    }
}

/// Where a chart legend sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    Bottom,
    Corner,
    Left,
    Right,
    Top,
}

impl LegendPosition {
    /// Name used by the macOS binding (and by callers).
    pub fn as_str(self) -> &'static str {
        match self {
            LegendPosition::Bottom => "bottom",
            LegendPosition::Corner => "corner",
            LegendPosition::Left => "left",
            LegendPosition::Right => "right",
            LegendPosition::Top => "top",
        }
    }
}

impl FromStr for LegendPosition {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bottom" => Ok(LegendPosition::Bottom),
            "corner" => Ok(LegendPosition::Corner),
            "left" => Ok(LegendPosition::Left),
            "right" => Ok(LegendPosition::Right),
            "top" => Ok(LegendPosition::Top),
            _ => Err(HostError::invalid_argument(format!(
                "invalid legend position '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_is_identity() {
        for name in ["column", "scatter", "pyramid", "column_clustered"] {
            assert_eq!(Platform::Windows.chart_type(name), name);
        }
    }

    #[test]
    fn test_macos_translation() {
        let mac = Platform::MacOs;
        assert_eq!(mac.chart_type("column"), "column_clustered");
        assert_eq!(mac.chart_type("bar_stacked_100"), "bar_stacked_100_percent");
        assert_eq!(mac.chart_type("scatter"), "scatter_markers");
        // already native
        assert_eq!(mac.chart_type("column_clustered"), "column_clustered");
        // unknown passes through
        assert_eq!(mac.chart_type("pyramid"), "pyramid");
    }

    #[test]
    fn test_every_mapped_name_is_native() {
        for (_, native) in CHART_TYPE_MAPPING {
            assert!(MACOS_CHART_TYPES.contains(native), "{native}");
        }
        assert_eq!(Platform::MacOs.supported_chart_types().len(), 23);
        assert!(Platform::Windows.supported_chart_types().contains(&"column"));
    }

    #[test]
    fn test_legend_positions() {
        assert_eq!(
            "bottom".parse::<LegendPosition>().unwrap(),
            LegendPosition::Bottom
        );
        assert_eq!("top".parse::<LegendPosition>().unwrap().as_str(), "top");
        assert!("middle".parse::<LegendPosition>().is_err());
    }

    #[test]
    fn test_parse_platform() {
        assert_eq!("macOS".parse::<Platform>().unwrap(), Platform::MacOs);
        assert_eq!("windows".parse::<Platform>().unwrap(), Platform::Windows);
        assert!("beos".parse::<Platform>().is_err());
    }
}
