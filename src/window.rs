use crate::{category_label, ChartStyle, RpmError, TimeRpm};
use eframe::egui::{self, Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use log::info;

pub const WINDOW_SIZE: [f32; 2] = [1200.0, 700.0];

/// eframe app showing one rpm series until the window is closed.
pub struct RpmApp {
    series: TimeRpm,
    style: ChartStyle,
}

impl RpmApp {
    pub fn new(series: TimeRpm, style: ChartStyle) -> Self {
        RpmApp { series, style }
    }
}

impl eframe::App for RpmApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(self.style.title.as_str());
            });
            self.rpm_plot(ui);
        });
    }
}

impl RpmApp {
    fn rpm_plot(&self, ui: &mut Ui) {
        // the axis formatter must own its tick text
        let labels = self.series.time.clone();
        let (xmin, xmax) = self.series.time_axis_range();
        let mut plot = Plot::new("rpm_plot")
            .x_axis_label(self.style.x_desc.as_str())
            .y_axis_label(self.style.y_desc.as_str())
            .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
            .include_x(xmin)
            .include_x(xmax)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true);
        if self.style.legend.is_some() {
            plot = plot.legend(Legend::default());
        }
        plot.show(ui, |plot_ui| {
            for (i, segment) in self.series.segments().into_iter().enumerate() {
                let points: PlotPoints = segment.into_iter().map(|(x, y)| [x, y]).collect();
                let mut line = Line::new(points).color(Color32::BLUE).width(1.5);
                if let (0, Some(name)) = (i, &self.style.legend) {
                    line = line.name(name);
                }
                plot_ui.line(line);
            }
        });
    }
}

/// Opens the chart window and blocks until it is closed.
pub fn show(series: TimeRpm, style: ChartStyle) -> Result<(), RpmError> {
    info!("showing {} rows, close the window to exit", series.len());
    let title = style.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(WINDOW_SIZE)
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(RpmApp::new(series, style)))),
    )
    .map_err(|e| RpmError::Window(e.to_string()))
}
