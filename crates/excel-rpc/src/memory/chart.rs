//! Charts of the in-memory host.
//!
//! Exports write a small placeholder file describing the chart, so callers
//! get a real path back.

use std::fs;
use std::path::PathBuf;

use excel_rpc_protocol::ChartRef;

use super::address::Block;
use super::model::{ChartData, Loc, SheetData, DEFAULT_CHART_TYPE};
use super::objects::lock;
use super::MemoryHost;
use crate::adapter::{
    ChartAdapter, ChartHandle, ChartPlacement, ChartSettings, PdfQuality, SheetPath,
};
use crate::error::{HostError, HostResult};
use crate::platform::is_known_chart_type;

const DEFAULT_LEFT: f64 = 0.0;
const DEFAULT_TOP: f64 = 0.0;
const DEFAULT_WIDTH: f64 = 355.0;
const DEFAULT_HEIGHT: f64 = 211.0;

fn check_chart_type(chart_type: &str) -> HostResult<()> {
    if is_known_chart_type(chart_type) {
        Ok(())
    } else {
        Err(HostError::invalid_argument(format!(
            "Failed to set chart type: '{chart_type}' is not a supported chart type"
        )))
    }
}

impl MemoryHost {
    /// Run `f` on one chart of the sheet at `at`.
    fn with_chart<T>(
        &self,
        at: &SheetPath,
        chart: &ChartRef,
        f: impl FnOnce(&mut ChartData) -> HostResult<T>,
    ) -> HostResult<(Loc, u64, T)> {
        self.with_sheet_mut(at, |loc, sheet| {
            let position = sheet.chart_position(chart)?;
            let data = &mut sheet.charts[position];
            let out = f(data)?;
            Ok((loc, data.id, out))
        })
    }

    fn export(
        &self,
        at: &SheetPath,
        chart: &ChartRef,
        path: Option<&str>,
        extension: &str,
        body: impl FnOnce(&ChartData) -> String,
    ) -> HostResult<PathBuf> {
        let (contents, default_path) = {
            let state = lock(&self.state);
            let loc = state.resolve_sheet(at)?;
            let book = state.resolved_book(loc.pid, loc.book)?;
            let sheet = state.resolved_sheet(loc)?;
            let data = &sheet.charts[sheet.chart_position(chart)?];

            let dir = book
                .path
                .as_ref()
                .and_then(|p| p.parent().map(PathBuf::from))
                .unwrap_or_else(std::env::temp_dir);
            (body(data), dir.join(format!("{}.{extension}", data.name)))
        };

        let target = path.map_or(default_path, PathBuf::from);
        fs::write(&target, contents)?;
        tracing::debug!("Exported chart to {}", target.display());
        Ok(target)
    }
}

fn next_chart_name(sheet: &mut SheetData) -> String {
    loop {
        sheet.chart_counter += 1;
        let candidate = format!("Chart {}", sheet.chart_counter);
        if !sheet.charts.iter().any(|c| c.name == candidate) {
            return candidate;
        }
    }
}

impl ChartAdapter for MemoryHost {
    fn list_charts(&mut self, at: &SheetPath) -> HostResult<Vec<ChartHandle>> {
        let (loc, ids) = {
            let state = lock(&self.state);
            let loc = state.resolve_sheet(at)?;
            let ids: Vec<u64> = state
                .resolved_sheet(loc)?
                .charts
                .iter()
                .map(|c| c.id)
                .collect();
            (loc, ids)
        };
        Ok(ids.into_iter().map(|id| self.chart_view(loc, id)).collect())
    }

    fn get_chart(&mut self, at: &SheetPath, chart: &ChartRef) -> HostResult<ChartHandle> {
        let (loc, id, ()) = self.with_chart(at, chart, |_| Ok(()))?;
        Ok(self.chart_view(loc, id))
    }

    fn add_chart(&mut self, at: &SheetPath, placement: ChartPlacement) -> HostResult<ChartHandle> {
        let (loc, id) = {
            let mut state = lock(&self.state);
            let loc = state.resolve_sheet(at)?;
            let id = state.next_id();
            let sheet = state.resolved_sheet_mut(loc)?;
            let name = next_chart_name(sheet);
            sheet.charts.push(ChartData {
                id,
                name,
                chart_type: DEFAULT_CHART_TYPE.to_string(),
                left: placement.left.unwrap_or(DEFAULT_LEFT),
                top: placement.top.unwrap_or(DEFAULT_TOP),
                width: placement.width.unwrap_or(DEFAULT_WIDTH),
                height: placement.height.unwrap_or(DEFAULT_HEIGHT),
                source: None,
                title: None,
                has_legend: true,
                legend_position: None,
                axis_x: Default::default(),
                axis_y: Default::default(),
            });
            (loc, id)
        };
        Ok(self.chart_view(loc, id))
    }

    fn delete_chart(&mut self, at: &SheetPath, chart: &ChartRef) -> HostResult<()> {
        self.with_sheet_mut(at, |_, sheet| {
            let position = sheet.chart_position(chart)?;
            let removed = sheet.charts.remove(position);
            tracing::debug!("Deleted chart '{}'", removed.name);
            Ok(())
        })
    }

    fn set_source_data(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        range: &str,
    ) -> HostResult<ChartHandle> {
        let block = Block::parse(range)?;
        let (loc, id, ()) = self.with_chart(at, chart, |data| {
            data.source = Some(block.absolute());
            Ok(())
        })?;
        Ok(self.chart_view(loc, id))
    }

    fn set_chart_type(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        chart_type: &str,
    ) -> HostResult<ChartHandle> {
        check_chart_type(chart_type)?;
        let (loc, id, ()) = self.with_chart(at, chart, |data| {
            data.chart_type = chart_type.to_string();
            Ok(())
        })?;
        Ok(self.chart_view(loc, id))
    }

    fn export_pdf(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        path: Option<&str>,
        quality: PdfQuality,
    ) -> HostResult<PathBuf> {
        self.export(at, chart, path, "pdf", |data| {
            format!(
                "%PDF-1.4\n% chart '{}' ({}), quality {:?}\n",
                data.name, data.chart_type, quality
            )
        })
    }

    fn export_picture(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        path: Option<&str>,
    ) -> HostResult<PathBuf> {
        self.export(at, chart, path, "png", |data| {
            let legend = match (data.has_legend, data.legend_position) {
                (false, _) => "none",
                (true, Some(position)) => position.as_str(),
                (true, None) => "default",
            };
            format!(
                "chart '{}' ({}) {}x{}, legend {}\n",
                data.name, data.chart_type, data.width, data.height, legend
            )
        })
    }

    fn customize_chart(
        &mut self,
        at: &SheetPath,
        chart: &ChartRef,
        settings: &ChartSettings,
    ) -> HostResult<ChartHandle> {
        if let Some(chart_type) = &settings.chart_type {
            check_chart_type(chart_type)?;
        }
        let (loc, id, ()) = self.with_chart(at, chart, |data| {
            if let Some(name) = &settings.name {
                data.name = name.clone();
            }
            if let Some(chart_type) = &settings.chart_type {
                data.chart_type = chart_type.clone();
            }
            data.left = settings.left.unwrap_or(data.left);
            data.top = settings.top.unwrap_or(data.top);
            data.width = settings.width.unwrap_or(data.width);
            data.height = settings.height.unwrap_or(data.height);
            if let Some(title) = &settings.title {
                data.title = Some(title.clone());
            }
            if let Some(has_legend) = settings.has_legend {
                data.has_legend = has_legend;
                // the position only applies alongside an explicit legend
                if has_legend && settings.legend_position.is_some() {
                    data.legend_position = settings.legend_position;
                }
            }
            if let Some(axis) = &settings.axis_x {
                data.axis_x = axis.clone();
            }
            if let Some(axis) = &settings.axis_y {
                data.axis_y = axis.clone();
            }
            Ok(())
        })?;
        Ok(self.chart_view(loc, id))
    }
}
