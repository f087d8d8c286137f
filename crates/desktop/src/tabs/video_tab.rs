use iced::widget::{button, column, container, image, row, text, text_input, Space};
use iced::{Element, Length, Theme};

use facefinder_core::shared::constants::MAX_DISPLAY_SIZE;

use crate::app::{scaled, Message};
use crate::theme::muted_color;

pub struct VideoTabState {
    /// Camera index or video file path.
    pub source: String,
    pub running: bool,
    /// The worker was asked to stop and has not exited yet.
    pub stopping: bool,
    pub handle: Option<image::Handle>,
    pub faces: usize,
}

impl Default for VideoTabState {
    fn default() -> Self {
        Self {
            source: "0".to_string(),
            running: false,
            stopping: false,
            handle: None,
            faces: 0,
        }
    }
}

impl VideoTabState {
    pub fn clear(&mut self) {
        self.running = false;
        self.handle = None;
        self.faces = 0;
    }

    pub fn can_start(&self) -> bool {
        !self.running && !self.stopping
    }
}

pub fn view<'a>(fs: f32, state: &'a VideoTabState, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);

    let source_row = row![
        text("Source").size(scaled(13.0, fs)),
        text_input("0 or path/to/video.mp4", &state.source)
            .on_input_maybe(state.can_start().then_some(Message::SourceEdited))
            .size(scaled(13.0, fs))
            .width(Length::Fixed(260.0)),
        button(text("Browse").size(scaled(13.0, fs)))
            .on_press_maybe(state.can_start().then_some(Message::SelectVideoFile))
            .style(button::secondary)
            .padding([6, 12]),
    ]
    .spacing(12)
    .align_y(iced::Alignment::Center);

    let controls = row![
        button(text("Start Video").size(scaled(13.0, fs)))
            .on_press_maybe(state.can_start().then_some(Message::StartVideo))
            .padding([8, 16]),
        button(text("Stop Video").size(scaled(13.0, fs)))
            .on_press_maybe(state.running.then_some(Message::StopVideo))
            .style(button::danger)
            .padding([8, 16]),
    ]
    .spacing(8);

    let status = if state.running {
        format!("Running: {} face(s) in view", state.faces)
    } else if state.stopping {
        "Stopping...".to_string()
    } else {
        "Stopped".to_string()
    };

    let preview: Element<'a, Message> = match &state.handle {
        Some(handle) => image(handle.clone()).into(),
        None => text("Enter a camera index (0 is the default camera) or a video file path")
            .size(scaled(13.0, fs))
            .color(muted)
            .into(),
    };

    column![
        source_row,
        Space::new().height(12),
        controls,
        Space::new().height(8),
        text(status).size(scaled(12.0, fs)).color(muted),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_allowed_only_when_fully_stopped() {
        let mut state = VideoTabState::default();
        assert!(state.can_start());

        state.running = true;
        assert!(!state.can_start());

        state.clear();
        state.stopping = true;
        assert!(!state.can_start());

        state.stopping = false;
        assert!(state.can_start());
    }

    #[test]
    fn test_clear_resets_display() {
        let mut state = VideoTabState {
            running: true,
            faces: 3,
            ..VideoTabState::default()
        };
        state.clear();
        assert!(!state.running);
        assert_eq!(state.faces, 0);
        assert!(state.handle.is_none());
        assert_eq!(state.source, "0");
    }
}
