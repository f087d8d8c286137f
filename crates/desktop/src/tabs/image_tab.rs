use std::path::PathBuf;

use iced::widget::{button, column, container, image, row, text, Space};
use iced::{Element, Length, Theme};

use facefinder_core::shared::constants::MAX_DISPLAY_SIZE;
use facefinder_core::shared::frame::Frame;

use crate::app::{scaled, Message};
use crate::display;
use crate::theme::muted_color;

/// Still-image workflow state, owned by the UI thread.
#[derive(Default)]
pub struct ImageTabState {
    pub path: Option<PathBuf>,
    pub uploaded: Option<Frame>,
    /// Most recently displayed image: the upload, or its annotated copy.
    pub shown: Option<Frame>,
    pub handle: Option<image::Handle>,
    pub faces_found: Option<usize>,
}

impl ImageTabState {
    pub fn load(&mut self, path: PathBuf, frame: Frame) {
        self.handle = Some(display::frame_handle(&frame));
        self.shown = Some(frame.clone());
        self.uploaded = Some(frame);
        self.path = Some(path);
        self.faces_found = None;
    }

    pub fn show_result(&mut self, frame: Frame, faces: usize) {
        self.handle = Some(display::frame_handle(&frame));
        self.shown = Some(frame);
        self.faces_found = Some(faces);
    }

    pub fn has_image(&self) -> bool {
        self.uploaded.is_some()
    }

    /// Default save name: `<stem>_faces.jpg` next to the upload.
    pub fn suggested_output(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        let stem = path.file_stem()?.to_string_lossy();
        Some(path.with_file_name(format!("{stem}_faces.jpg")))
    }
}

pub fn view<'a>(fs: f32, state: &'a ImageTabState, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let has_image = state.has_image();

    let actions = row![
        button(text("Upload Image").size(scaled(13.0, fs)))
            .on_press(Message::SelectImage)
            .padding([8, 16]),
        button(text("Detect Faces").size(scaled(13.0, fs)))
            .on_press_maybe(has_image.then_some(Message::DetectFaces))
            .padding([8, 16]),
        button(text("Save Image").size(scaled(13.0, fs)))
            .on_press_maybe(has_image.then_some(Message::SaveImage))
            .style(button::secondary)
            .padding([8, 16]),
    ]
    .spacing(8);

    let caption = match (&state.path, state.faces_found) {
        (None, _) => "No image loaded".to_string(),
        (Some(path), None) => path.display().to_string(),
        (Some(path), Some(n)) => format!("{}: {n} face(s) detected", path.display()),
    };

    let preview: Element<'a, Message> = match &state.handle {
        Some(handle) => image(handle.clone()).into(),
        None => text("Upload a JPEG or PNG image to begin")
            .size(scaled(13.0, fs))
            .color(muted)
            .into(),
    };

    column![
        actions,
        Space::new().height(12),
        text(caption).size(scaled(12.0, fs)).color(muted),
        Space::new().height(8),
        container(preview)
            .width(Length::Fixed(MAX_DISPLAY_SIZE as f32))
            .height(Length::Fixed(MAX_DISPLAY_SIZE as f32))
            .center_x(Length::Fixed(MAX_DISPLAY_SIZE as f32))
            .center_y(Length::Fixed(MAX_DISPLAY_SIZE as f32)),
    ]
    .spacing(0)
    .into()
}
