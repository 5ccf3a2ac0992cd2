use iced::border::Border;
use iced::widget::{column, container, image, progress_bar, row, stack, text, Space};
use iced::{Color, ContentFit, Element, Length, Theme};

use facelens_core::overlay::domain::overlay_renderer::OverlayRenderer;
use facelens_core::playback::domain::playback_state::ControlVisibility;
use facelens_core::shared::dimensions::Dimensions;

use crate::app::{scaled, Control, DetectorStatus, Message};
use crate::theme::{surface_color, tertiary_color};
use crate::widgets::control_button::{control_button, Emphasis};
use crate::widgets::overlay_layer::overlay_layer;
use crate::workers::channel_sink::PresentedFrame;

/// Everything the player tab needs from the app, borrowed for one render.
pub struct PlayerView<'a> {
    pub font_scale: f32,
    pub visibility: ControlVisibility,
    pub frame: Option<&'a PresentedFrame>,
    pub display: Dimensions,
    pub renderer: &'a OverlayRenderer,
    pub detector: &'a DetectorStatus,
    pub status: Option<&'a str>,
    pub hovered: Option<Control>,
    pub theme: Theme,
}

pub fn view(player: PlayerView<'_>) -> Element<'_, Message> {
    let fs = player.font_scale;
    let tertiary = tertiary_color(&player.theme);

    let video: Element<'_, Message> = match player.frame {
        Some(frame) => video_frame(frame, player.renderer),
        None => placeholder(fs, player.display, &player.theme),
    };

    let mut controls = row![].spacing(10).align_y(iced::Alignment::Center);
    if player.visibility.file_picker {
        controls = controls.push(control_button(
            "Choose Video\u{2026}",
            fs,
            Emphasis::Primary,
            Message::SelectFile,
            player.hovered == Some(Control::FilePicker),
            |h| Message::ControlHovered(Control::FilePicker, h),
        ));
    }
    if let Some(label) = player.visibility.play_pause {
        controls = controls.push(control_button(
            label.as_str(),
            fs,
            Emphasis::Primary,
            Message::TogglePlayback,
            player.hovered == Some(Control::PlayPause),
            |h| Message::ControlHovered(Control::PlayPause, h),
        ));
    }
    if player.visibility.clear {
        controls = controls.push(control_button(
            "Clear Video",
            fs,
            Emphasis::Secondary,
            Message::ClearVideo,
            player.hovered == Some(Control::Clear),
            |h| Message::ControlHovered(Control::Clear, h),
        ));
    }

    let mut col = column![video, Space::new().height(16), controls]
        .spacing(0)
        .align_x(iced::Alignment::Center)
        .width(Length::Fill);

    if let Some(detector) = detector_line(fs, player.detector, tertiary) {
        col = col.push(Space::new().height(12)).push(detector);
    }

    if let Some(status) = player.status {
        col = col.push(Space::new().height(12)).push(
            text(status.to_owned())
                .size(scaled(13.0, fs))
                .color(player.theme.palette().danger),
        );
    }

    col.into()
}

/// The decoded frame at display size with its detections stacked on top.
fn video_frame<'a>(frame: &'a PresentedFrame, renderer: &'a OverlayRenderer) -> Element<'a, Message> {
    let (w, h) = (frame.display.width as f32, frame.display.height as f32);
    let picture = image(frame.image.clone())
        .width(Length::Fixed(w))
        .height(Length::Fixed(h))
        .content_fit(ContentFit::Fill);

    stack![picture, overlay_layer(renderer, &frame.faces, frame.display)].into()
}

fn placeholder<'a>(fs: f32, display: Dimensions, theme: &Theme) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let background = surface_color(theme);
    let border_color = Color {
        a: 0.15,
        ..theme.palette().text
    };

    container(
        text("No video playing")
            .size(scaled(14.0, fs))
            .color(tertiary),
    )
    .width(Length::Fixed(display.width as f32))
    .height(Length::Fixed(display.height as f32))
    .center_x(Length::Fixed(display.width as f32))
    .center_y(Length::Fixed(display.height as f32))
    .style(move |_theme: &Theme| container::Style {
        background: Some(iced::Background::Color(background)),
        border: Border {
            color: border_color,
            width: 1.0,
            radius: 12.0.into(),
        },
        ..container::Style::default()
    })
    .into()
}

fn detector_line<'a>(
    fs: f32,
    detector: &DetectorStatus,
    tertiary: Color,
) -> Option<Element<'a, Message>> {
    match detector {
        DetectorStatus::Ready => None,
        DetectorStatus::Loading { downloaded, total } if *total > 0 => {
            let pct = *downloaded as f32 / *total as f32 * 100.0;
            Some(
                column![
                    text(format!("Downloading face model \u{2026} {pct:.0}%"))
                        .size(scaled(13.0, fs))
                        .color(tertiary),
                    progress_bar(0.0..=100.0, pct),
                ]
                .spacing(6)
                .width(Length::Fixed(280.0))
                .into(),
            )
        }
        DetectorStatus::Loading { .. } => Some(
            text("Loading face detector\u{2026}")
                .size(scaled(13.0, fs))
                .color(tertiary)
                .into(),
        ),
        DetectorStatus::Failed(e) => Some(
            text(format!("Face detection unavailable: {e}"))
                .size(scaled(13.0, fs))
                .color(tertiary)
                .into(),
        ),
    }
}
