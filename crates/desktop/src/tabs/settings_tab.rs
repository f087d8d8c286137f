use iced::widget::{button, column, row, text, text_input, Space};
use iced::{Element, Length, Theme};

use facefinder_core::detection::domain::detection_params::DetectionParameters;

use crate::app::{scaled, Message};
use crate::theme::muted_color;

/// Text typed into one parameter field, plus the reason it was rejected.
#[derive(Debug, Clone, Default)]
pub struct ParamField {
    pub text: String,
    pub error: Option<String>,
}

impl ParamField {
    fn with_value(value: impl ToString) -> Self {
        Self {
            text: value.to_string(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParamInputs {
    pub scale_factor: ParamField,
    pub min_neighbors: ParamField,
    pub min_size: ParamField,
}

impl ParamInputs {
    pub fn from_params(params: &DetectionParameters) -> Self {
        Self {
            scale_factor: ParamField::with_value(params.scale_factor),
            min_neighbors: ParamField::with_value(params.min_neighbors),
            min_size: ParamField::with_value(params.min_size),
        }
    }

    pub fn has_errors(&self) -> bool {
        [&self.scale_factor, &self.min_neighbors, &self.min_size]
            .iter()
            .any(|f| f.error.is_some())
    }
}

/// Stores `text` in `field` and returns the parsed value if it is valid.
/// Invalid text stays in the field and is flagged.
pub fn edit<T>(field: &mut ParamField, text: String, parse: fn(&str) -> Result<T, String>) -> Option<T> {
    let result = parse(&text);
    field.text = text;
    match result {
        Ok(value) => {
            field.error = None;
            Some(value)
        }
        Err(e) => {
            field.error = Some(e);
            None
        }
    }
}

pub fn parse_scale_factor(text: &str) -> Result<f64, String> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| "Enter a number such as 1.1".to_string())?;
    if !DetectionParameters::is_valid_scale_factor(value) {
        return Err("Must be greater than 1.0".to_string());
    }
    Ok(value)
}

pub fn parse_count(text: &str) -> Result<u32, String> {
    text.trim()
        .parse()
        .map_err(|_| "Enter a whole number of 0 or more".to_string())
}

pub fn view<'a>(fs: f32, inputs: &'a ParamInputs, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let danger = theme.palette().danger;

    let field_row = |label: &'a str,
                     hint: &'a str,
                     field: &'a ParamField,
                     on_input: fn(String) -> Message|
     -> Element<'a, Message> {
        let mut col = column![
            row![
                text(label).size(scaled(13.0, fs)).width(140),
                text_input(hint, &field.text)
                    .on_input(on_input)
                    .size(scaled(13.0, fs))
                    .width(Length::Fixed(160.0)),
            ]
            .spacing(12)
            .align_y(iced::Alignment::Center),
        ]
        .spacing(4);
        if let Some(error) = &field.error {
            col = col.push(text(error.as_str()).size(scaled(12.0, fs)).color(danger));
        }
        col.into()
    };

    column![
        text("Detection parameters").size(scaled(16.0, fs)),
        Space::new().height(4),
        text("Changes apply to the next detection, including a running video.")
            .size(scaled(12.0, fs))
            .color(muted),
        Space::new().height(12),
        field_row("Scale factor", "1.1", &inputs.scale_factor, Message::ScaleFactorEdited),
        Space::new().height(8),
        field_row("Min neighbors", "5", &inputs.min_neighbors, Message::MinNeighborsEdited),
        Space::new().height(8),
        field_row("Min size (px)", "30", &inputs.min_size, Message::MinSizeEdited),
        Space::new().height(20),
        button(text("Save Settings").size(scaled(13.0, fs)))
            .on_press(Message::SaveSettings)
            .padding([8, 16]),
    ]
    .spacing(0)
    .into()
}
