use iced::widget::{button, checkbox, column, row, slider, text, Space};
use iced::Element;

use crate::app::{scaled, Message};
use crate::settings::Settings;

pub fn view<'a>(settings: &Settings) -> Element<'a, Message> {
    let fs = settings.font_scale;

    column![
        text("Face detection").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Confidence").size(scaled(13.0, fs)),
            slider(10..=95, settings.confidence, Message::ConfidenceChanged)
                .on_release(Message::ApplyDetectorSettings),
            text(format!("{}%", settings.confidence)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(20),
        text("Overlay").size(scaled(16.0, fs)),
        Space::new().height(8),
        checkbox(settings.expressions)
            .label("Show expressions")
            .on_toggle(Message::ExpressionsChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(8),
        checkbox(settings.show_landmarks)
            .label("Show facial landmarks")
            .on_toggle(Message::LandmarksChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(20),
        button(text("Restore defaults").size(scaled(13.0, fs)))
            .on_press(Message::RestoreDefaults)
            .padding([8, 20])
            .style(button::secondary),
    ]
    .spacing(0)
    .into()
}
