use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};

use facefinder_core::annotation::infrastructure::rectangle_annotator::RectangleAnnotator;
use facefinder_core::detection::domain::detection_params::SharedParameters;
use facefinder_core::detection::domain::face_detector::FaceDetector;
use facefinder_core::pipeline::detect_image_use_case::DetectImageUseCase;
use facefinder_core::pipeline::frame_pipeline::{
    FramePipeline, PipelineError, PipelineEvent, PipelineReceiver,
};
use facefinder_core::settings::settings_store::SettingsStore;
use facefinder_core::shared::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use facefinder_core::shared::video_source::VideoSource;
use facefinder_core::video::domain::image_reader::ImageReader;
use facefinder_core::video::domain::image_writer::ImageWriter;
use facefinder_core::video::infrastructure::image_file_reader::ImageFileReader;
use facefinder_core::video::infrastructure::image_file_writer::ImageFileWriter;
use facefinder_core::video::infrastructure::reader_factory::reader_for;

use crate::display;
use crate::tabs;
use crate::tabs::image_tab::ImageTabState;
use crate::tabs::settings_tab::{self, ParamInputs};
use crate::tabs::video_tab::VideoTabState;
use crate::theme;
use crate::workers::model_cache::{DetectorCache, ModelStatus};

const PROJECT_URL: &str = "https://github.com/atomashpolskiy/rustface";
const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(15);
const MODEL_POLL_INTERVAL: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Image,
    Video,
    Settings,
    About,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Image, Tab::Video, Tab::Settings, Tab::About];

    fn label(self) -> &'static str {
        match self {
            Tab::Image => "Image",
            Tab::Video => "Video",
            Tab::Settings => "Settings",
            Tab::About => "About",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    OpenWebsite,
    SelectImage,
    ImageSelected(Option<PathBuf>),
    DetectFaces,
    SaveImage,
    SaveTargetSelected(Option<PathBuf>),
    SourceEdited(String),
    SelectVideoFile,
    VideoFileSelected(Option<PathBuf>),
    StartVideo,
    StopVideo,
    PollFrames,
    ScaleFactorEdited(String),
    MinNeighborsEdited(String),
    MinSizeEdited(String),
    SaveSettings,
    PollModel,
    DialogClosed,
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Non-blocking status message shown under the tab content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    theme: Theme,
    store: SettingsStore,
    params: Arc<SharedParameters>,
    inputs: ParamInputs,
    image: ImageTabState,
    video: VideoTabState,
    detector_cache: DetectorCache,
    model_status: ModelStatus,
    pipeline: Option<FramePipeline>,
    events: Option<PipelineReceiver>,
    notice: Option<Notice>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let store = SettingsStore::in_working_dir();
        let loaded = store.load();
        log::info!(
            "Detection settings: scale_factor={} min_neighbors={} min_size={}",
            loaded.scale_factor,
            loaded.min_neighbors,
            loaded.min_size
        );
        let detector_cache = DetectorCache::new();
        let model_status = detector_cache.status();

        (
            Self {
                active_tab: Tab::Image,
                theme: theme::resolve_theme(),
                store,
                params: Arc::new(SharedParameters::new(loaded)),
                inputs: ParamInputs::from_params(&loaded),
                image: ImageTabState::default(),
                video: VideoTabState::default(),
                detector_cache,
                model_status,
                pipeline: None,
                events: None,
                notice: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::OpenWebsite => {
                if let Err(e) = open::that(PROJECT_URL) {
                    log::warn!("Could not open {PROJECT_URL}: {e}");
                }
            }
            Message::SelectImage => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select an image")
                            .add_filter("Images", IMAGE_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::ImageSelected,
                );
            }
            Message::ImageSelected(Some(path)) => match ImageFileReader::new().read(&path) {
                Ok(frame) => {
                    log::info!("Loaded {} ({}x{})", path.display(), frame.width(), frame.height());
                    self.image.load(path, frame);
                    self.notice = None;
                }
                Err(e) => self.notice = Some(Notice::error(e.to_string())),
            },
            Message::ImageSelected(None) => {}
            Message::DetectFaces => self.detect_on_image(),
            Message::SaveImage => {
                if self.image.shown.is_none() {
                    self.notice = Some(Notice::warning("No processed image to save"));
                    return Task::none();
                }
                let suggested = self.image.suggested_output();
                return Task::perform(
                    async move {
                        let mut dialog = rfd::AsyncFileDialog::new()
                            .set_title("Save image as")
                            .add_filter("Images", IMAGE_EXTENSIONS);
                        if let Some(path) = suggested {
                            if let Some(dir) = path.parent() {
                                dialog = dialog.set_directory(dir);
                            }
                            if let Some(name) = path.file_name() {
                                dialog = dialog.set_file_name(name.to_string_lossy());
                            }
                        }
                        dialog.save_file().await.map(|h| h.path().to_path_buf())
                    },
                    Message::SaveTargetSelected,
                );
            }
            Message::SaveTargetSelected(Some(path)) => self.save_image(path),
            Message::SaveTargetSelected(None) => {}
            Message::SourceEdited(source) => {
                self.video.source = source;
            }
            Message::SelectVideoFile => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select a video file")
                            .add_filter("Videos", VIDEO_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::VideoFileSelected,
                );
            }
            Message::VideoFileSelected(Some(path)) => {
                self.video.source = path.display().to_string();
            }
            Message::VideoFileSelected(None) => {}
            Message::StartVideo => return self.start_video(),
            Message::StopVideo => {
                self.finish_video();
            }
            Message::PollFrames => {
                self.drain_frames();
                self.reap_stopped_video();
            }
            Message::ScaleFactorEdited(text) => {
                if let Some(value) =
                    settings_tab::edit(&mut self.inputs.scale_factor, text, settings_tab::parse_scale_factor)
                {
                    self.params.set_scale_factor(value);
                }
            }
            Message::MinNeighborsEdited(text) => {
                if let Some(value) =
                    settings_tab::edit(&mut self.inputs.min_neighbors, text, settings_tab::parse_count)
                {
                    self.params.set_min_neighbors(value);
                }
            }
            Message::MinSizeEdited(text) => {
                if let Some(value) =
                    settings_tab::edit(&mut self.inputs.min_size, text, settings_tab::parse_count)
                {
                    self.params.set_min_size(value);
                }
            }
            Message::SaveSettings => match self.store.save(&self.params.snapshot()) {
                Ok(()) => {
                    let text = if self.inputs.has_errors() {
                        "Settings saved (fields with errors kept their previous values)"
                    } else {
                        "Settings saved"
                    };
                    self.notice = Some(Notice::info(text));
                }
                Err(e) => return error_dialog("Could not save settings", e.to_string()),
            },
            Message::PollModel => {
                self.model_status = self.detector_cache.status();
                if let ModelStatus::Failed(ref reason) = self.model_status {
                    self.notice = Some(Notice::error(format!("Face detector unavailable: {reason}")));
                }
            }
            Message::DialogClosed => {}
        }
        Task::none()
    }

    fn detector(&mut self) -> Option<Arc<dyn FaceDetector>> {
        let detector = self.detector_cache.detector();
        if detector.is_none() {
            self.notice = Some(match &self.model_status {
                ModelStatus::Failed(reason) => {
                    Notice::error(format!("Face detector unavailable: {reason}"))
                }
                _ => Notice::warning("The face detector is still loading, try again shortly"),
            });
        }
        detector
    }

    fn detect_on_image(&mut self) {
        if !self.image.has_image() {
            self.notice = Some(Notice::warning("Please upload an image first"));
            return;
        }
        let Some(detector) = self.detector() else {
            return;
        };
        let Some(uploaded) = &self.image.uploaded else {
            return;
        };

        let use_case = DetectImageUseCase::new(detector, Arc::new(RectangleAnnotator::default()));
        match use_case.execute(uploaded, &self.params.snapshot()) {
            Ok(result) => {
                let count = result.faces.len();
                self.image.show_result(result.frame, count);
                self.notice = Some(Notice::info(format!("Detected {count} face(s)")));
            }
            Err(e) => self.notice = Some(Notice::warning(e.to_string())),
        }
    }

    fn save_image(&mut self, path: PathBuf) {
        let Some(frame) = &self.image.shown else {
            self.notice = Some(Notice::warning("No processed image to save"));
            return;
        };
        self.notice = Some(match ImageFileWriter::new().write(&path, frame, None) {
            Ok(()) => Notice::info(format!("Saved {}", path.display())),
            Err(e) => Notice::error(e.to_string()),
        });
    }

    fn start_video(&mut self) -> Task<Message> {
        if self.video.running || self.video.stopping {
            return Task::none();
        }
        let Some(detector) = self.detector() else {
            return Task::none();
        };
        let params = Arc::clone(&self.params);
        let pipeline = self
            .pipeline
            .get_or_insert_with(|| FramePipeline::new(detector, params));

        let source = VideoSource::parse(&self.video.source);
        let reader = reader_for(&source);
        match pipeline.start(source, reader) {
            Ok(events) => {
                self.events = Some(events);
                self.video.running = true;
                self.notice = None;
            }
            Err(e @ PipelineError::SourceUnavailable { .. }) => {
                log::error!("{e}");
                return error_dialog("Video source unavailable", e.to_string());
            }
            Err(e) => self.notice = Some(Notice::warning(e.to_string())),
        }
        Task::none()
    }

    fn drain_frames(&mut self) {
        let Some(events) = &self.events else {
            return;
        };
        let mut latest = None;
        let mut ended = false;
        for event in events.try_iter() {
            match event {
                PipelineEvent::Frame(annotated) => latest = Some(annotated),
                PipelineEvent::Ended => {
                    ended = true;
                    break;
                }
            }
        }

        if let Some(annotated) = latest {
            self.video.handle = Some(display::frame_handle(&annotated.frame));
            self.video.faces = annotated.faces.len();
        }
        if ended {
            self.finish_video();
            self.notice = Some(Notice::info("Video stream ended"));
        }
    }

    /// Signals the worker and clears the display without waiting for it.
    fn finish_video(&mut self) {
        self.events = None;
        self.video.clear();
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.request_stop();
            self.video.stopping = !pipeline.reap_finished();
        }
    }

    fn reap_stopped_video(&mut self) {
        if !self.video.stopping {
            return;
        }
        if let Some(pipeline) = self.pipeline.as_mut() {
            self.video.stopping = !pipeline.reap_finished();
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = 1.0;

        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let content: Element<'_, Message> = match self.active_tab {
            Tab::Image => tabs::image_tab::view(fs, &self.image, &self.theme),
            Tab::Video => tabs::video_tab::view(fs, &self.video, &self.theme),
            Tab::Settings => tabs::settings_tab::view(fs, &self.inputs, &self.theme),
            Tab::About => tabs::about_tab::view(fs),
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        let mut footer = column![].spacing(2).padding([4, 16]);
        if let Some(notice) = &self.notice {
            footer = footer.push(
                text(notice.text.as_str())
                    .size(scaled(12.0, fs))
                    .color(theme::notice_color(&self.theme, notice.kind)),
            );
        }
        if let Some(status) = model_status_text(&self.model_status) {
            footer = footer.push(
                text(status)
                    .size(scaled(11.0, fs))
                    .color(theme::muted_color(&self.theme)),
            );
        }

        column![tab_bar, tab_content, footer]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    pub fn theme(&self) -> Theme {
        self.theme.clone()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = Vec::new();
        if self.events.is_some() || self.video.stopping {
            subscriptions.push(iced::time::every(FRAME_POLL_INTERVAL).map(|_| Message::PollFrames));
        }
        if matches!(self.model_status, ModelStatus::Loading { .. }) {
            subscriptions.push(iced::time::every(MODEL_POLL_INTERVAL).map(|_| Message::PollModel));
        }
        Subscription::batch(subscriptions)
    }
}

fn error_dialog(title: &'static str, description: String) -> Task<Message> {
    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title(title)
                .set_description(description)
                .set_buttons(rfd::MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::DialogClosed,
    )
}

fn model_status_text(status: &ModelStatus) -> Option<String> {
    match status {
        ModelStatus::Loading { downloaded, total } if *total > 0 => {
            let pct = (*downloaded as f64 / *total as f64 * 100.0) as u32;
            Some(format!("Downloading face detection model... {pct}%"))
        }
        ModelStatus::Loading { .. } => Some("Loading face detection model...".to_string()),
        ModelStatus::Ready => None,
        ModelStatus::Failed(reason) => Some(format!("Face detector unavailable: {reason}")),
    }
}

/// Scale a base font size by the font scale.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_shows_download_percentage() {
        let status = ModelStatus::Loading {
            downloaded: 256,
            total: 1024,
        };
        assert_eq!(
            model_status_text(&status).unwrap(),
            "Downloading face detection model... 25%"
        );
    }

    #[test]
    fn test_status_text_without_total() {
        let status = ModelStatus::Loading {
            downloaded: 0,
            total: 0,
        };
        assert_eq!(
            model_status_text(&status).unwrap(),
            "Loading face detection model..."
        );
    }

    #[test]
    fn test_status_text_hidden_when_ready() {
        assert!(model_status_text(&ModelStatus::Ready).is_none());
    }

    #[test]
    fn test_scaled_rounds() {
        assert_eq!(scaled(13.0, 1.0), 13.0);
        assert_eq!(scaled(13.0, 1.5), 20.0);
    }

    #[test]
    fn test_tab_labels() {
        let labels: Vec<_> = Tab::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["Image", "Video", "Settings", "About"]);
    }
}
