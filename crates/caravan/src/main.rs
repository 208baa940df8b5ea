// Author: Dustin Pilgrim
// License: MIT

mod alarm;
mod capture;
mod cli;
mod config;
mod error;
mod focus;
mod logging;
mod notify;
mod paths;
mod route;
mod wayland;

use std::path::Path;

use caravan_core::{ScreenLocator, StrideMatcher, TemplateMatcher, FrameSource};
use clap::Parser;
use eventline::{debug, error, info, warn};
use image::GrayImage;

use crate::alarm::SoundAlarm;
use crate::capture::GrimSource;
use crate::cli::{Args, Cmd};
use crate::config::CaravanConfig;
use crate::error::AppError;
use crate::route::{RouteSettings, SEARCH_AREA};
use crate::wayland::{OutputChoice, Session};

fn main() {
    let args = Args::parse();

    swallow_interrupts();

    // Logging should never block the automation itself.
    match logging::init_logging(args.log_file.as_deref(), args.verbose) {
        Ok(path) => debug!("log_path={}", path.display()),
        Err(e) => eprintln!("caravan: failed to init logging: {e}"),
    }

    if let Err(e) = run(args) {
        error!("{e}");
        eprintln!("caravan: {e}");
        std::process::exit(1);
    }
}

// Ctrl-C ends the run quietly with status 0.
extern "C" fn on_interrupt(_: libc::c_int) {
    unsafe { libc::_exit(0) }
}

fn swallow_interrupts() {
    let handler = on_interrupt as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let config_path = args.config.clone().unwrap_or_else(paths::default_config_path);
    debug!("config_path={}", config_path.display());

    let mut cfg = config::load(&config_path).map_err(AppError::Config)?;
    if let Some(t) = args.template {
        cfg.template = t;
    }
    if let Some(n) = args.max_attempts {
        cfg.max_attempts = n;
    }
    if let Some(o) = args.output {
        cfg.output = Some(o);
    }

    match args.cmd.unwrap_or(Cmd::Run) {
        Cmd::Run => run_route(&cfg, args.skip_focus_check),
        Cmd::Outputs => print_outputs(),
        Cmd::Locate => locate_once(&cfg),
    }
}

fn run_route(cfg: &CaravanConfig, skip_focus_check: bool) -> Result<(), AppError> {
    if skip_focus_check {
        warn!("focus check skipped");
    } else if !focus::is_target_app_focused(&cfg.app_id).map_err(AppError::Focus)? {
        return Err(AppError::NotFocused(cfg.app_id.clone()));
    }

    let template = load_template(&cfg.template)?;
    let mut session = open_session(cfg)?;

    let mut locator = ScreenLocator::new(
        GrimSource::new(cfg.capture_program.as_str()),
        StrideMatcher::new(cfg.match_step, cfg.match_tolerance),
        SoundAlarm::new(cfg.alarm_player.as_str(), cfg.alarm_sound.clone(), cfg.notify),
    );
    let settings = RouteSettings {
        max_attempts: cfg.max_attempts,
        scroll_value: cfg.scroll_value,
        settle: cfg.settle,
    };

    route::reestablish(session.pointer(), &mut locator, &template, &settings)?;
    info!("trade route re-established");
    Ok(())
}

fn print_outputs() -> Result<(), AppError> {
    let mut session = Session::connect()?;
    session.resolve_outputs()?;

    for o in session.outputs().outputs() {
        let (x, y) = o.position.unwrap_or((0, 0));
        println!(
            "{}{} {}x{}+{}+{} scale {:.2}",
            if o.current { "* " } else { "  " },
            o.name.as_deref().unwrap_or("(unnamed)"),
            o.width,
            o.height,
            x,
            y,
            o.scale
        );
    }
    Ok(())
}

fn locate_once(cfg: &CaravanConfig) -> Result<(), AppError> {
    let template = load_template(&cfg.template)?;
    let session = open_session(cfg)?;

    let region = session.outputs().transform()?.capture_region(SEARCH_AREA);
    let frame = GrimSource::new(cfg.capture_program.as_str()).capture(&region)?;

    match StrideMatcher::new(cfg.match_step, cfg.match_tolerance).locate(&frame, &template) {
        Some(hit) => {
            let p = region.reproject(&hit);
            println!(
                "found at {},{} in {} (output pixels {},{})",
                hit.left,
                hit.top,
                region.geometry(),
                p.x,
                p.y
            );
        }
        None => println!("not found in {}", region.geometry()),
    }
    Ok(())
}

fn open_session(cfg: &CaravanConfig) -> Result<Session, AppError> {
    let mut session = Session::connect()?;

    let focused = focus::focused_output();
    let choice = match (cfg.output.as_deref(), focused.as_deref()) {
        (Some(name), _) => OutputChoice::Named(name),
        (None, Some(name)) => OutputChoice::Hint(name),
        (None, None) => OutputChoice::Compositor,
    };
    debug!("output choice: {choice:?}");

    session.finish_initialization(choice)?;
    Ok(session)
}

fn load_template(path: &Path) -> Result<GrayImage, AppError> {
    let img = image::open(path).map_err(|source| AppError::Template {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("template {} is {}x{}", path.display(), img.width(), img.height());
    Ok(img.to_luma8())
}
