use std::time::Duration;

use iced::border::Border;
use iced::widget::{button, container, mouse_area, text};
use iced::{Color, Element, Padding, Shadow, Theme, Vector};
use iced_anim::transition::Easing;
use iced_anim::AnimationBuilder;

use crate::app::scaled;
use crate::theme::{surface_color, tertiary_color};

const HOVER_DARKEN: f32 = 0.05;
const FLOAT_HEIGHT: f32 = 1.0;
const CORNER_RADIUS: f32 = 10.0;
const SHADOW_BLUR_BASE: f32 = 10.0;
const SHADOW_BLUR_HOVER: f32 = 15.0;
const SHADOW_ALPHA_BASE: f32 = 0.25;
const SHADOW_ALPHA_HOVER: f32 = 0.35;
const ANIMATION_DURATION: Duration = Duration::from_millis(200);

/// Filled accent button (file picker, Play/Pause) or outlined neutral
/// button (Clear Video).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Primary,
    Secondary,
}

/// Text button that eases into its hover style.
pub fn control_button<'a, Message: Clone + 'a>(
    label: &'a str,
    font_scale: f32,
    emphasis: Emphasis,
    on_press: Message,
    hovered: bool,
    on_hover: impl Fn(bool) -> Message + 'a,
) -> Element<'a, Message> {
    let target = if hovered { 1.0_f32 } else { 0.0 };

    let animated: Element<'a, Message> = AnimationBuilder::new(target, move |t: f32| {
        build_button(label, font_scale, emphasis, &on_press, t.clamp(0.0, 1.0))
    })
    .animates_layout(true)
    .animation(Easing::EASE_OUT.with_duration(ANIMATION_DURATION))
    .into();

    mouse_area(animated)
        .on_enter(on_hover(true))
        .on_exit(on_hover(false))
        .into()
}

fn build_button<'a, Message: Clone + 'a>(
    label: &'a str,
    font_scale: f32,
    emphasis: Emphasis,
    on_press: &Message,
    hover_amount: f32,
) -> Element<'a, Message> {
    let btn = button(text(label).size(scaled(14.0, font_scale)))
        .on_press(on_press.clone())
        .padding([10, 24])
        .style(move |theme: &Theme, status: button::Status| {
            let amount = if status == button::Status::Pressed {
                1.0
            } else {
                hover_amount
            };
            match emphasis {
                Emphasis::Primary => primary_style(theme, amount),
                Emphasis::Secondary => secondary_style(theme, amount),
            }
        });

    // Primary buttons lift slightly while hovered
    let rise = match emphasis {
        Emphasis::Primary => hover_amount * FLOAT_HEIGHT,
        Emphasis::Secondary => 0.0,
    };
    container(btn)
        .padding(Padding {
            top: FLOAT_HEIGHT - rise,
            bottom: rise,
            ..Padding::ZERO
        })
        .into()
}

fn primary_style(theme: &Theme, t: f32) -> button::Style {
    let base = theme.extended_palette().primary.base.color;
    button::Style {
        background: Some(darken(base, t).into()),
        text_color: Color::WHITE,
        border: Border {
            radius: CORNER_RADIUS.into(),
            ..Border::default()
        },
        shadow: Shadow {
            color: Color {
                a: lerp(SHADOW_ALPHA_BASE, SHADOW_ALPHA_HOVER, t),
                ..base
            },
            offset: Vector::new(0.0, 3.0),
            blur_radius: lerp(SHADOW_BLUR_BASE, SHADOW_BLUR_HOVER, t),
        },
        ..button::Style::default()
    }
}

fn secondary_style(theme: &Theme, t: f32) -> button::Style {
    let text = theme.palette().text;
    let border_base = Color { a: 0.15, ..text };
    button::Style {
        background: Some(darken(surface_color(theme), t).into()),
        text_color: Color { a: 0.8, ..text },
        border: Border {
            color: lerp_color(border_base, tertiary_color(theme), t),
            width: 1.0,
            radius: CORNER_RADIUS.into(),
        },
        ..button::Style::default()
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    Color {
        r: lerp(a.r, b.r, t),
        g: lerp(a.g, b.g, t),
        b: lerp(a.b, b.b, t),
        a: lerp(a.a, b.a, t),
    }
}

fn darken(color: Color, amount: f32) -> Color {
    let shift = HOVER_DARKEN * amount;
    Color {
        r: (color.r - shift).max(0.0),
        g: (color.g - shift).max(0.0),
        b: (color.b - shift).max(0.0),
        a: 1.0,
    }
}
