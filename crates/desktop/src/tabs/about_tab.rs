use iced::widget::{button, column, text, Space};
use iced::Element;

use crate::app::{scaled, Message};

pub fn view(fs: f32) -> Element<'static, Message> {
    let version = env!("CARGO_PKG_VERSION");

    column![
        text("FaceFinder").size(scaled(22.0, fs)),
        Space::new().height(4),
        text(format!("Version {version}")).size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "Detects faces in photos, camera feeds and video files. \
             Detection uses the SeetaFace frontal face cascade."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(8),
        text(
            "Scale factor controls the step between detection scales; \
             min neighbors raises the confidence a detection needs; \
             min size is the smallest face, in pixels, that is reported."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(16),
        button(text("Detector project page").size(scaled(13.0, fs)))
            .on_press(Message::OpenWebsite)
            .padding([8, 16]),
    ]
    .spacing(0)
    .into()
}
