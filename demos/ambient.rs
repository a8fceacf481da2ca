//! Ambient Example - Full-screen canvas simulation
//!
//! Layers all three ambient effects on one half-block surface:
//! - Drifting gradient blobs underneath
//! - Particle constellation with proximity links
//! - Diagonal shimmer streaks on top
//!
//! Press 't' to toggle light/dark mode, Ctrl+C to exit.
//!
//! Run with: cargo run --example ambient

use glimmer_tui::runtime::driver::{self, Flow};
use glimmer_tui::{
    GradientDrift, KeyState, ParticleField, Presenter, Runtime, RuntimeOptions, ShimmerField,
    ThemeProvider,
};

fn main() -> std::io::Result<()> {
    env_logger::init();

    let runtime = Runtime::new(RuntimeOptions {
        theme: ThemeProvider::system().mode(),
        ..RuntimeOptions::default()
    });

    let mut sim = runtime.simulation();
    sim.add_effect(GradientDrift::new());
    sim.add_effect(ParticleField::new());
    sim.add_effect(ShimmerField::new());
    sim.start();

    let _toggle = runtime.on_key({
        let theme = runtime.theme();
        move |event| {
            if event.key == "t" && event.state != KeyState::Release {
                theme.toggle();
                true
            } else {
                false
            }
        }
    });

    let mut presenter = Presenter::new();
    driver::run(&runtime, |rt| {
        let background = rt.theme().palette().background;
        match sim.with_surface(|surface| presenter.present(surface, background)) {
            Ok(_) => Flow::Continue,
            Err(err) => {
                log::error!("present failed: {err}");
                Flow::Exit
            }
        }
    })
}
