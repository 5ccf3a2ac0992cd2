use std::path::PathBuf;
use std::time::Duration;

use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};

use facelens_core::detection::domain::face_detector::{FaceDetector, NoFaceDetector};
use facelens_core::overlay::domain::overlay_renderer::OverlayRenderer;
use facelens_core::playback::domain::playback_state::{ControlVisibility, PlaybackState};
use facelens_core::playback::domain::video_source::VideoSource;
use facelens_core::playback::frame_loop::{LoopExit, LoopParts, Pacing};
use facelens_core::playback::frame_loop_logger::NullFrameLoopLogger;
use facelens_core::playback::player_session::PlayerSession;
use facelens_core::shared::constants::{DEFAULT_DISPLAY_SIZE, VIDEO_EXTENSIONS};
use facelens_core::shared::dimensions::Dimensions;
use facelens_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

use crate::settings::{Appearance, Settings};
use crate::tabs;
use crate::theme;
use crate::workers::channel_sink::{ChannelSink, PresentedFrame, SinkReceiver};
use crate::workers::detector_loader::{self, DetectorLoader, LoaderMessage};

/// Frames waiting for the UI; anything beyond this is dropped.
const FRAME_QUEUE: usize = 1;
const TICK_INTERVAL: Duration = Duration::from_millis(15);
const WAITING_FOR_DETECTOR: &str = "Playback starts once the face detector has loaded";

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Player,
    Detection,
    Appearance,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Player, Tab::Detection, Tab::Appearance];

    fn label(self) -> &'static str {
        match self {
            Tab::Player => "Player",
            Tab::Detection => "Detection",
            Tab::Appearance => "Appearance",
        }
    }
}

/// The three player controls, for hover tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    FilePicker,
    PlayPause,
    Clear,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    SelectFile,
    FileSelected(Option<PathBuf>),
    TogglePlayback,
    ClearVideo,
    ControlHovered(Control, bool),
    Tick,
    ConfidenceChanged(u32),
    ApplyDetectorSettings,
    ExpressionsChanged(bool),
    LandmarksChanged(bool),
    RestoreDefaults,
    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
    PollSystemTheme,
}

/// Where the detection adapter is in its start-up.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorStatus {
    Loading { downloaded: u64, total: u64 },
    Ready,
    Failed(String),
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    renderer: OverlayRenderer,
    session: Option<PlayerSession>,
    receiver: Option<SinkReceiver>,
    loader: Option<DetectorLoader>,
    detector_status: DetectorStatus,
    /// File chosen before the detector was ready; loaded once it is.
    pending_file: Option<PathBuf>,
    current: Option<PresentedFrame>,
    status: Option<String>,
    hovered: Option<Control>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let mut app = Self::with_settings(Settings::load());
        app.load_detector();
        (app, Task::none())
    }

    /// App with no detector loading yet and no session.
    fn with_settings(settings: Settings) -> Self {
        Self {
            active_tab: Tab::Player,
            renderer: OverlayRenderer::new(settings.overlay_style()),
            settings,
            session: None,
            receiver: None,
            loader: None,
            detector_status: DetectorStatus::Loading {
                downloaded: 0,
                total: 0,
            },
            pending_file: None,
            current: None,
            status: None,
            hovered: None,
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::SelectFile => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select a video")
                            .add_filter("Videos", VIDEO_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::FileSelected,
                );
            }
            Message::FileSelected(Some(path)) => self.select_file(path),
            Message::FileSelected(None) => {}
            Message::TogglePlayback => match self.session.as_mut() {
                Some(session) => {
                    if let Err(e) = session.toggle_play_pause() {
                        self.status = Some(e.to_string());
                    }
                }
                None => self.status = Some(WAITING_FOR_DETECTOR.to_string()),
            },
            Message::ClearVideo => {
                self.pending_file = None;
                self.current = None;
                self.status = None;
                if let Some(session) = self.session.as_mut() {
                    if let Err(e) = session.clear() {
                        self.status = Some(e.to_string());
                    }
                }
            }
            Message::ControlHovered(control, hovered) => {
                self.hovered = if hovered {
                    Some(control)
                } else if self.hovered == Some(control) {
                    None
                } else {
                    self.hovered
                };
            }
            Message::Tick => self.tick(),
            Message::ConfidenceChanged(val) => {
                self.settings.confidence = val;
            }
            Message::ApplyDetectorSettings => {
                self.settings.save();
                self.load_detector();
            }
            Message::ExpressionsChanged(enabled) => {
                self.settings.expressions = enabled;
                self.settings_changed();
                self.load_detector();
            }
            Message::LandmarksChanged(enabled) => {
                self.settings.show_landmarks = enabled;
                self.settings_changed();
            }
            Message::RestoreDefaults => {
                let defaults = Settings::default();
                let reload = self.settings.confidence != defaults.confidence
                    || self.settings.expressions != defaults.expressions;
                self.settings.confidence = defaults.confidence;
                self.settings.expressions = defaults.expressions;
                self.settings.show_landmarks = defaults.show_landmarks;
                self.settings_changed();
                if reload {
                    self.load_detector();
                }
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings_changed();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings_changed();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings_changed();
            }
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render,
                // so just requesting a redraw is enough.
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;

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
            Tab::Player => tabs::player_tab::view(tabs::player_tab::PlayerView {
                font_scale: fs,
                visibility: self.visibility(),
                frame: self.current.as_ref(),
                display: self.display_dimensions(),
                renderer: &self.renderer,
                detector: &self.detector_status,
                status: self.status.as_deref(),
                hovered: self.hovered,
                theme: self.theme(),
            }),
            Tab::Detection => tabs::detection_tab::view(&self.settings),
            Tab::Appearance => tabs::appearance_tab::view(&self.settings),
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        column![tab_bar, tab_content]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let busy = self.loader.is_some() || self.session.as_ref().is_some_and(|s| s.is_running());
        let ticks = if busy {
            iced::time::every(TICK_INTERVAL).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };
        let system_theme = if self.settings.appearance == Appearance::System {
            iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme)
        } else {
            Subscription::none()
        };
        Subscription::batch([ticks, system_theme])
    }

    fn visibility(&self) -> ControlVisibility {
        match &self.session {
            Some(session) => session.visibility(),
            None => {
                // Mirror what the session will show once the detector is
                // ready, minus Play/Pause which has nothing to drive yet
                let mut state = PlaybackState::new();
                if let Some(path) = &self.pending_file {
                    state.select_file(path);
                }
                ControlVisibility {
                    play_pause: None,
                    ..state.visibility()
                }
            }
        }
    }

    fn display_dimensions(&self) -> Dimensions {
        self.session
            .as_ref()
            .and_then(PlayerSession::display_dimensions)
            .unwrap_or(Dimensions::new(DEFAULT_DISPLAY_SIZE, DEFAULT_DISPLAY_SIZE))
    }

    fn select_file(&mut self, path: PathBuf) {
        self.current = None;
        self.status = None;
        let Some(session) = self.session.as_mut() else {
            self.pending_file = Some(path);
            return;
        };
        if let Err(e) = session.select_file(&path) {
            self.status = Some(e.to_string());
        }
    }

    fn settings_changed(&mut self) {
        self.settings.save();
        self.renderer.set_style(self.settings.overlay_style());
    }

    /// (Re)builds the detection adapter. The current session, if any, is
    /// torn down and its file is reloaded once the new adapter is ready.
    fn load_detector(&mut self) {
        if let Some(session) = self.session.take() {
            if let Some(path) = session.state().file() {
                self.pending_file = Some(path.to_path_buf());
            }
        }
        self.receiver = None;
        self.current = None;
        self.detector_status = DetectorStatus::Loading {
            downloaded: 0,
            total: 0,
        };
        self.loader = Some(detector_loader::spawn(
            self.settings.detector_options(),
            self.settings.expression_model(),
        ));
    }

    /// Builds the session around `detector` and loads any file picked
    /// while it was loading.
    fn start_session(&mut self, detector: Box<dyn FaceDetector>) {
        let (sink, receiver) = ChannelSink::new(FRAME_QUEUE);
        let parts = LoopParts {
            source: VideoSource::new(
                Box::new(FfmpegReader::new()),
                Dimensions::new(DEFAULT_DISPLAY_SIZE, DEFAULT_DISPLAY_SIZE),
            ),
            detector,
            sink: Box::new(sink),
            logger: Box::new(NullFrameLoopLogger),
        };
        self.session = Some(PlayerSession::new(parts, Pacing::RealTime));
        self.receiver = Some(receiver);

        if let Some(path) = self.pending_file.take() {
            self.select_file(path);
        }
    }

    fn loader_message(&mut self, message: LoaderMessage) {
        match message {
            LoaderMessage::DownloadProgress(downloaded, total) => {
                self.detector_status = DetectorStatus::Loading { downloaded, total };
            }
            LoaderMessage::Ready(detector) => {
                self.loader = None;
                self.detector_status = DetectorStatus::Ready;
                self.start_session(Box::new(detector));
            }
            LoaderMessage::Error(e) => {
                // Video still plays, without overlays; the failure line stays up
                log::error!("Face detector unavailable: {e}");
                self.loader = None;
                self.detector_status = DetectorStatus::Failed(e);
                self.start_session(Box::new(NoFaceDetector));
            }
        }
    }

    fn tick(&mut self) {
        let loader_messages: Vec<LoaderMessage> = self
            .loader
            .as_ref()
            .map(|l| l.messages.try_iter().collect())
            .unwrap_or_default();
        for message in loader_messages {
            self.loader_message(message);
        }

        if let Some(session) = self.session.as_mut() {
            match session.poll() {
                Ok(Some(LoopExit::Failed(reason))) => self.status = Some(reason),
                Ok(_) => {}
                Err(e) => self.status = Some(e.to_string()),
            }
        }

        if let Some(receiver) = &self.receiver {
            if let Some(frame) = receiver.frames.try_iter().last() {
                self.current = Some(frame);
            }
            if let Some(issue) = receiver.issues.try_iter().last() {
                self.status = Some(issue.to_string());
            }
        }
    }
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::with_settings(Settings::default())
    }

    #[test]
    fn test_play_is_hidden_until_detector_loads() {
        let mut app = app();
        let _ = app.update(Message::FileSelected(Some(PathBuf::from("/videos/clip.mp4"))));

        let vis = app.visibility();
        assert!(!vis.file_picker);
        assert!(vis.clear);
        assert_eq!(vis.play_pause, None);
    }

    #[test]
    fn test_play_before_detector_loads_explains_the_wait() {
        let mut app = app();
        let _ = app.update(Message::FileSelected(Some(PathBuf::from("/videos/clip.mp4"))));
        let _ = app.update(Message::TogglePlayback);

        assert_eq!(app.status.as_deref(), Some(WAITING_FOR_DETECTOR));
        assert_eq!(app.pending_file, Some(PathBuf::from("/videos/clip.mp4")));
    }

    #[test]
    fn test_detector_failure_still_builds_a_session() {
        let mut app = app();
        let missing = PathBuf::from("/nonexistent/clip.mp4");
        let _ = app.update(Message::FileSelected(Some(missing)));

        app.loader_message(LoaderMessage::Error("model download failed".into()));

        assert_eq!(
            app.detector_status,
            DetectorStatus::Failed("model download failed".into())
        );
        assert!(app.session.is_some());
        // The pending file was handed to the session, which reports it
        assert!(app.pending_file.is_none());
        let status = app.status.clone().unwrap_or_default();
        assert!(status.contains("/nonexistent/clip.mp4"), "status was {status:?}");
        assert!(app.visibility().file_picker);
    }

    #[test]
    fn test_toggle_after_detector_failure_reaches_the_session() {
        let mut app = app();
        app.loader_message(LoaderMessage::Error("model download failed".into()));

        // No file loaded: the session ignores the click instead of the app
        let _ = app.update(Message::TogglePlayback);
        assert!(app.status.is_none());
        assert!(app.session.as_ref().is_some_and(|s| !s.is_running()));
    }

    #[test]
    fn test_clear_forgets_pending_file() {
        let mut app = app();
        let _ = app.update(Message::FileSelected(Some(PathBuf::from("/videos/clip.mp4"))));
        let _ = app.update(Message::ClearVideo);

        assert!(app.pending_file.is_none());
        assert!(app.visibility().file_picker);
    }
}
