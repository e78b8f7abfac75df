// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

// Generic modules (toolkit independent)
mod lngc_core;
mod lnge_error;
mod lngks_keystore;
mod lngad_appdb;
mod lngpd_paneldb;
mod lngft_tokens;
mod lngfl_filing;
mod lngic_icondb;
mod lngpg_geometry;
mod lngpr_reflow;
mod lngph_hold;
mod lngdv_dialogue;
mod lngtk_toolkit;
mod lngcf_config;
mod lngpe_panel;

// Adapters
mod lnah_headless;
mod lnar_runner;

use single_instance::SingleInstance;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lnah_headless::{HeadlessToolkit, ScriptedDialogue};
use lnar_runner::ShellRunner;
use lngc_core::ScreenSize;
use lngcf_config::Choices;
use lngpe_panel::PanelEngine;

const INSTANCE_NAME: &str = "launcher-panels";
const HEADLESS_SCREEN: ScreenSize = ScreenSize { width: 1920, height: 1080 };

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print every panel's placement and the reflowed position of each button
fn print_layout<R, D>(engine: &PanelEngine<HeadlessToolkit, R, D>)
where
    R: lngtk_toolkit::CommandRunner,
    D: lngtk_toolkit::Dialogue,
{
    let screen = engine.screen();
    println!("\n========== PANEL LAYOUT ({}x{}) ==========\n", screen.width, screen.height);

    for block in engine.blocks() {
        let Some(panel) = engine.panels().get(block.key) else {
            continue;
        };
        let g = &block.geometry;
        println!(
            "Panel '{}' on {} [{}..{}) rows={} columns={} open={}",
            panel.name,
            panel.position,
            g.min_longitude,
            g.max_longitude,
            g.grid.rows,
            g.grid.columns,
            block.is_open()
        );

        for entry in block.icons.list() {
            let Some(button) = engine.apps().get(entry.key) else {
                continue;
            };
            let r = g.window_to_screen(g.cell_rect(entry.position));
            let moved = if entry.position != button.position { " (reflowed)" } else { "" };
            println!(
                "  '{}' cell ({},{}){} -> ({},{}) {}x{}",
                button.name,
                entry.position.x,
                entry.position.y,
                moved,
                r.x0,
                r.y0,
                r.width(),
                r.height()
            );
        }
    }

    let apps = engine.apps();
    let mut unattached = 0;
    let mut prior = None;
    while let Some(key) = apps.next_key(prior) {
        prior = Some(key);
        if apps.get(key).is_some_and(|b| b.panel.is_none()) {
            unattached += 1;
        }
    }
    if unattached > 0 {
        println!("\n{} buttons are not on any panel", unattached);
    }
    println!("\n==========================================\n");
}

fn main() {
    init_logging();

    let instance = match SingleInstance::new(INSTANCE_NAME) {
        Ok(instance) => instance,
        Err(e) => {
            error!("MAIN: could not create instance guard: {}", e);
            std::process::exit(1);
        }
    };
    if !instance.is_single() {
        error!("MAIN: another launcher is already running");
        std::process::exit(1);
    }

    let choices = Choices::load_from_file();
    let buttons = lngcf_config::buttons_path();
    info!("MAIN: buttons file {}", buttons.display());

    let toolkit = HeadlessToolkit::new(HEADLESS_SCREEN);
    let mut engine = PanelEngine::new(toolkit, ShellRunner::new(), ScriptedDialogue::new(), choices);
    let status = engine.load(&buttons);
    if status.is_hard() {
        warn!("MAIN: starting with an empty layout ({:?})", status);
    }
    engine.boot_all();

    print_layout(&engine);

    let problems = engine
        .toolkit()
        .reports()
        .iter()
        .filter(|(severity, _)| *severity == lngtk_toolkit::Severity::Error)
        .count();
    if problems > 0 {
        std::process::exit(2);
    }
    drop(instance);
}
