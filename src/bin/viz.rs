use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};

use vessel_sim::config::VesselConfig;
use vessel_sim::sim::{self, Sample, SimEvent};

fn main() -> eframe::Result {
    let config = VesselConfig::default();
    let (samples, events, name) = match sim::simulate_launch(&config, "STS-101") {
        Ok(s) => (s.samples().to_vec(), s.events().to_vec(), s.primary().name().to_string()),
        Err(e) => {
            eprintln!("simulation failed: {e}");
            (Vec::new(), Vec::new(), String::from("STS-101"))
        }
    };

    let app = SimViz { samples, events, name };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Launch Stack Staging", options, Box::new(|_| Ok(Box::new(app))))
}

struct SimViz {
    samples: Vec<Sample>,
    events: Vec<SimEvent>,
    name: String,
}

impl SimViz {
    fn plot(ui: &mut egui::Ui, id: &str, label: &str, w: f32, h: f32, points: PlotPoints) {
        ui.vertical(|ui| {
            ui.label(label);
            Plot::new(id)
                .width(w)
                .height(h)
                .x_axis_label("Time (s)")
                .show(ui, |plot_ui| {
                    plot_ui.line(Line::new(label, points));
                });
        });
    }
}

impl eframe::App for SimViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let step = (self.samples.len() / 2000).max(1);
        let sampled: Vec<&Sample> = self.samples.iter().step_by(step).collect();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Vessel: {}", self.name));
            ui.label(format!(
                "Final configuration: {}  |  Events: {}  |  Flight: {:.0} s",
                self.samples.last().and_then(|s| s.configuration).unwrap_or(0),
                self.events.len(),
                self.samples.last().map_or(0.0, |s| s.time),
            ));
        });

        egui::SidePanel::right("events").show(ctx, |ui| {
            ui.label("Events");
            for ev in &self.events {
                ui.monospace(ev.to_string());
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                let main: PlotPoints = sampled.iter().map(|s| [s.time, s.main_level]).collect();
                Self::plot(ui, "main", "Main engine level", half_w, half_h, main);

                let srb: PlotPoints = sampled.iter().map(|s| [s.time, s.booster_level]).collect();
                Self::plot(ui, "srb", "Booster level", half_w, half_h, srb);
            });

            ui.horizontal(|ui| {
                let prop: PlotPoints = sampled
                    .iter()
                    .map(|s| [s.time, s.propellant / 1000.0])
                    .collect();
                Self::plot(ui, "prop", "Propellant (t)", half_w, half_h, prop);

                let gimbal: PlotPoints = sampled
                    .iter()
                    .filter_map(|s| s.gimbal_dir.map(|d| [s.time, d.y.atan2(d.z).to_degrees()]))
                    .collect();
                Self::plot(ui, "gimbal", "Upper engine pitch (deg)", half_w, half_h, gimbal);
            });
        });
    }
}
