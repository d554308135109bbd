//! The contract between method handlers and an automation host.
//!
//! Each trait covers one entity. Calls are synchronous and run on the
//! automation thread (see [`crate::automation`]). Identifiers are primitive:
//! a process id, a workbook name or path, a sheet or chart by name or
//! 0-based index, an A1-style address.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use excel_rpc_protocol::{ChartRef, SheetRef};
use serde::Deserialize;

use crate::error::{HostError, HostResult};
use crate::handle::{AppObject, BookObject, ChartObject, RangeObject, SheetObject};
use crate::platform::LegendPosition;
use crate::value::{DataFrame, HostValue};

pub type AppHandle = Arc<dyn AppObject>;
pub type BookHandle = Arc<dyn BookObject>;
pub type SheetHandle = Arc<dyn SheetObject>;
pub type RangeHandle = Arc<dyn RangeObject>;
pub type ChartHandle = Arc<dyn ChartObject>;

/// Workbook recalculation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationMode {
    Automatic,
    Manual,
    Semiautomatic,
}

impl CalculationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CalculationMode::Automatic => "automatic",
            CalculationMode::Manual => "manual",
            CalculationMode::Semiautomatic => "semiautomatic",
        }
    }
}

impl FromStr for CalculationMode {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "automatic" => Ok(CalculationMode::Automatic),
            "manual" => Ok(CalculationMode::Manual),
            "semiautomatic" => Ok(CalculationMode::Semiautomatic),
            _ => Err(HostError::invalid_argument(format!(
                "Invalid calculation mode: '{s}'. Valid values are: 'automatic', 'manual', 'semiautomatic'"
            ))),
        }
    }
}

/// Quality of an exported PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PdfQuality {
    #[default]
    Standard,
    Minimum,
}

impl FromStr for PdfQuality {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(PdfQuality::Standard),
            "minimum" => Ok(PdfQuality::Minimum),
            _ => Err(HostError::invalid_argument(format!(
                "Invalid quality value: '{s}'. Valid values are: 'standard', 'minimum'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub read_only: bool,
    pub password: Option<String>,
}

/// Where a new sheet goes. With neither set, it is added before the active
/// sheet, as Excel does.
#[derive(Debug, Clone, Default)]
pub struct SheetPlacement {
    pub before: Option<SheetRef>,
    pub after: Option<SheetRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// First row holds column labels.
    pub header: bool,
    /// First column holds row labels.
    pub index: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            header: true,
            index: false,
        }
    }
}

/// Position and size of a new chart, in points. Unset fields use host
/// defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ChartPlacement {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AxisSettings {
    pub title: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Chart customization. Only the fields that are set are applied.
/// `chart_type` is already in the host's vocabulary by the time an adapter
/// sees it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartSettings {
    pub name: Option<String>,
    pub chart_type: Option<String>,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub title: Option<String>,
    pub has_legend: Option<bool>,
    #[serde(skip)]
    pub legend_position: Option<LegendPosition>,
    pub axis_x: Option<AxisSettings>,
    pub axis_y: Option<AxisSettings>,
}

pub trait AppAdapter {
    fn list_apps(&mut self) -> HostResult<Vec<AppHandle>>;
    /// The app with `pid`, or the active app when `pid` is `None`.
    fn get_app(&mut self, pid: Option<u32>) -> HostResult<AppHandle>;
    fn create_app(&mut self, visible: bool, add_book: bool) -> HostResult<AppHandle>;
    fn quit_app(&mut self, pid: u32, save_changes: bool) -> HostResult<()>;
    fn set_calculation(&mut self, pid: u32, mode: CalculationMode) -> HostResult<AppHandle>;
    fn get_calculation(&mut self, pid: u32) -> HostResult<String>;
    fn app_books(&mut self, pid: u32) -> HostResult<Vec<BookHandle>>;
}

pub trait BookAdapter {
    fn list_books(&mut self, pid: Option<u32>) -> HostResult<Vec<BookHandle>>;
    fn get_book(&mut self, name: &str, pid: Option<u32>) -> HostResult<BookHandle>;
    fn open_book(
        &mut self,
        path: &str,
        pid: Option<u32>,
        options: &OpenOptions,
    ) -> HostResult<BookHandle>;
    fn create_book(&mut self, pid: Option<u32>) -> HostResult<BookHandle>;
    fn close_book(
        &mut self,
        name: &str,
        pid: Option<u32>,
        save: bool,
        path: Option<&str>,
    ) -> HostResult<()>;
    fn save_book(
        &mut self,
        name: &str,
        pid: Option<u32>,
        path: Option<&str>,
    ) -> HostResult<BookHandle>;
    fn book_sheets(&mut self, name: &str, pid: Option<u32>) -> HostResult<Vec<SheetHandle>>;
}

/// A sheet inside a workbook inside (optionally) a specific app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPath {
    pub pid: Option<u32>,
    pub book: String,
    pub sheet: SheetRef,
}

pub trait SheetAdapter {
    fn list_sheets(&mut self, book: &str, pid: Option<u32>) -> HostResult<Vec<SheetHandle>>;
    fn get_sheet(&mut self, at: &SheetPath) -> HostResult<SheetHandle>;
    fn add_sheet(
        &mut self,
        book: &str,
        pid: Option<u32>,
        name: Option<&str>,
        placement: &SheetPlacement,
    ) -> HostResult<SheetHandle>;
    fn delete_sheet(&mut self, at: &SheetPath) -> HostResult<()>;
    fn rename_sheet(&mut self, at: &SheetPath, new_name: &str) -> HostResult<SheetHandle>;
    fn clear_sheet(&mut self, at: &SheetPath) -> HostResult<SheetHandle>;
    fn used_range(&mut self, at: &SheetPath) -> HostResult<RangeHandle>;
    fn activate_sheet(&mut self, at: &SheetPath) -> HostResult<SheetHandle>;
}

pub trait RangeAdapter {
    fn get_range(&mut self, at: &SheetPath, address: &str) -> HostResult<RangeHandle>;
    fn get_range_value(&mut self, at: &SheetPath, address: &str) -> HostResult<HostValue>;
    fn set_range_value(
        &mut self,
        at: &SheetPath,
        address: &str,
        value: HostValue,
    ) -> HostResult<RangeHandle>;
    fn get_range_formula(&mut self, at: &SheetPath, address: &str) -> HostResult<HostValue>;
    fn set_range_formula(
        &mut self,
        at: &SheetPath,
        address: &str,
        formula: HostValue,
    ) -> HostResult<RangeHandle>;
    fn clear_range(&mut self, at: &SheetPath, address: &str) -> HostResult<RangeHandle>;
    fn range_as_frame(
        &mut self,
        at: &SheetPath,
        address: &str,
        options: FrameOptions,
    ) -> HostResult<DataFrame>;
    fn set_range_frame(
        &mut self,
        at: &SheetPath,
        address: &str,
        frame: &DataFrame,
        options: FrameOptions,
    ) -> HostResult<RangeHandle>;
}

pub trait ChartAdapter {
    fn list_charts(&mut self, at: &SheetPath) -> HostResult<Vec<ChartHandle>>;
    fn get_chart(&mut self, at: &SheetPath, chart: &ChartRef) -> HostResult<ChartHandle>;
    fn add_chart(&mut self, at: &SheetPath, placement: ChartPlacement) -> HostResult<ChartHandle>;
    fn delete_chart(&mut self, at: &SheetPath, chart: &ChartRef) -> HostResult<()>;
    fn set_source_data(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        range: &str,
    ) -> HostResult<ChartHandle>;
    /// `chart_type` is in the host's own vocabulary.
    fn set_chart_type(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        chart_type: &str,
    ) -> HostResult<ChartHandle>;
    fn export_pdf(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        path: Option<&str>,
        quality: PdfQuality,
    ) -> HostResult<PathBuf>;
    fn export_picture(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        path: Option<&str>,
    ) -> HostResult<PathBuf>;
    fn customize_chart(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        settings: &ChartSettings,
    ) -> HostResult<ChartHandle>;
}

/// Everything a host must provide to serve the full method table.
pub trait ExcelHost:
    AppAdapter + BookAdapter + SheetAdapter + RangeAdapter + ChartAdapter + Send + 'static
{
}

impl<T> ExcelHost for T where
    T: AppAdapter + BookAdapter + SheetAdapter + RangeAdapter + ChartAdapter + Send + 'static
{
}
