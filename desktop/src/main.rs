mod app;
mod storage;

use app::MathFactsApp;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 560.0])
            .with_min_inner_size([200.0, 200.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Math Facts",
        options,
        Box::new(|cc| Ok(Box::new(MathFactsApp::new(cc)))),
    )
}
