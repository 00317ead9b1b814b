//! Interactive line sketch with a mouse-, touch- and wheel-driven camera.
//!
//! Draws three axis lines and lets the user rotate, pan and zoom over them.
//! Uses iced for UI and wgpu for GPU rendering.
//!
//! Usage: `line-sketch [OPTIONS.toml]` or `line-sketch --write-options PATH`.

use std::path::PathBuf;

use iced::widget::{Column, PickList, Row, Shader, text};
use iced::{Element, Length, Settings, Task};

mod camera;
mod error;
mod geometry;
mod input;
mod math;
mod options;
mod renderer;
mod shader_widget;

use camera::Projection;
use error::SketchError;
use options::{ModifierKey, SketchOptions};
use shader_widget::SketchProgram;

/// Main application state - handles UI controls only
#[derive(Debug)]
pub(crate) struct LineSketchApp {
    options: SketchOptions,
}

/// Messages that the application can receive
#[derive(Debug, Clone)]
pub(crate) enum Message {
    PanKey(ModifierKey),
}

impl LineSketchApp {
    pub(crate) fn new(options: SketchOptions) -> Self {
        Self { options }
    }

    pub(crate) fn title(&self) -> &'static str {
        "Line Sketch"
    }

    pub(crate) fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PanKey(key) => {
                self.options.controls.pan_key = key;
            }
        }

        Task::none()
    }

    pub(crate) fn view(&self) -> Element<Message> {
        let pan_key = self.options.controls.pan_key;

        // Left pane with controls
        let controls = Column::new()
            .spacing(20)
            .push(
                Column::new()
                    .spacing(5)
                    .push(text("Pan Key"))
                    .push(
                        PickList::new(&ModifierKey::ALL[..], Some(pan_key), Message::PanKey)
                            .width(200),
                    ),
            )
            .push(
                Column::new()
                    .spacing(5)
                    .push(text("Drag to rotate"))
                    .push(text(format!("Hold {} and drag to pan", pan_key)))
                    .push(text("Scroll to zoom")),
            );

        // Right pane with 3D viewport
        let viewport = Shader::new(SketchProgram::new(self.options.clone()))
            .width(Length::Fill)
            .height(Length::Fill);

        Row::new()
            .spacing(10)
            .padding(10)
            .push(
                iced::widget::container(controls)
                    .width(Length::Shrink)
                    .height(Length::Fill),
            )
            .push(viewport)
            .into()
    }
}

enum Command {
    Run(Option<PathBuf>),
    WriteOptions(PathBuf),
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Command {
    match args.next() {
        Some(flag) if flag == "--write-options" => Command::WriteOptions(
            args.next()
                .map_or_else(|| PathBuf::from("line-sketch.toml"), PathBuf::from),
        ),
        Some(path) => Command::Run(Some(PathBuf::from(path))),
        None => Command::Run(None),
    }
}

fn validate(options: &SketchOptions) -> Result<(), SketchError> {
    options.validate()?;
    Projection::new(&options.camera)?;
    Ok(())
}

fn main() -> Result<(), SketchError> {
    env_logger::builder().format_timestamp(None).init();

    let options = match parse_args(std::env::args().skip(1)) {
        Command::WriteOptions(path) => {
            SketchOptions::default().save(&path)?;
            log::info!("wrote default options to {}", path.display());
            return Ok(());
        }
        Command::Run(Some(path)) => {
            log::info!("loading options from {}", path.display());
            SketchOptions::load(&path)?
        }
        Command::Run(None) => SketchOptions::default(),
    };

    // Reject bad sensitivities, clip range or look-at setup before opening a window.
    validate(&options)?;

    let app = LineSketchApp::new(options);
    iced::application(app.title(), LineSketchApp::update, LineSketchApp::view)
        .settings(Settings {
            antialiasing: true,
            ..Settings::default()
        })
        .run_with(move || (app, Task::none()))?;

    Ok(())
}
