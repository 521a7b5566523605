use clap::{value_parser, Arg, ArgAction, Command};
use log::{error, info};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use theme_comparison::config::{parse_reference_mode, parse_window_size, AppConfig};
use winit::{
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
mod app;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("theme_comparison_slider")
        .version("1.0")
        .about("Compares light and dark mode screenshots over a background with a draggable divider")
        .arg(
            Arg::new("light")
                .short('l')
                .long("light")
                .action(ArgAction::Set)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Light mode screenshot to load at startup"),
        )
        .arg(
            Arg::new("dark")
                .short('d')
                .long("dark")
                .action(ArgAction::Set)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Dark mode screenshot to load at startup"),
        )
        .arg(
            Arg::new("background")
                .short('b')
                .long("background")
                .action(ArgAction::Set)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Background image to load at startup"),
        )
        .arg(
            Arg::new("window_size")
                .short('w')
                .long("window-size")
                .action(ArgAction::Set)
                .value_name("WIDTHxHEIGHT")
                .help("Window size in format WIDTHxHEIGHT (e.g. 1280x800)")
                .default_value("1280x800"),
        )
        .arg(
            Arg::new("reference")
                .long("reference")
                .action(ArgAction::Set)
                .value_name("MODE")
                .help("Measure the divider against the whole window (viewport) or the image frame (container)")
                .default_value("viewport"),
        )
        .arg(
            Arg::new("reveal_delay_ms")
                .long("reveal-delay-ms")
                .action(ArgAction::Set)
                .value_name("MILLIS")
                .value_parser(value_parser!(u64))
                .help("Delay before the divider sweeps to the middle after opening a comparison")
                .default_value("500"),
        )
        .get_matches();

    let window_size = matches
        .get_one::<String>("window_size")
        .map(String::as_str)
        .unwrap_or("1280x800");
    let (width, height) = parse_window_size(window_size)?;
    let reference_mode = parse_reference_mode(
        matches
            .get_one::<String>("reference")
            .map(String::as_str)
            .unwrap_or("viewport"),
    )?;
    let reveal_delay_ms = matches.get_one::<u64>("reveal_delay_ms").copied().unwrap_or(500);

    let config = AppConfig {
        window_width: width,
        window_height: height,
        reference_mode,
        reveal_delay: Duration::from_millis(reveal_delay_ms),
        light: matches.get_one::<PathBuf>("light").cloned(),
        dark: matches.get_one::<PathBuf>("dark").cloned(),
        background: matches.get_one::<PathBuf>("background").cloned(),
    };

    info!(
        "Starting theme comparison with window size {}x{}, {:?} reference, {} ms reveal",
        width, height, config.reference_mode, reveal_delay_ms
    );

    let event_loop = EventLoop::new();
    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Theme Comparison")
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window_width,
                config.window_height,
            ))
            .build(&event_loop)?,
    );

    let mut app_state = pollster::block_on(app::AppState::new(window.clone(), config))?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        app_state.handle_event(&event);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(VirtualKeyCode::Escape),
                            ..
                        },
                    ..
                } => {
                    if app_state.escape() {
                        *control_flow = ControlFlow::Exit;
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared => {
                app_state.update();
                window.request_redraw();
            }
            Event::RedrawRequested(_) => {
                if let Err(e) = app_state.render() {
                    error!("Render error: {:#}", e);
                }
            }
            _ => {}
        }
    });
}
