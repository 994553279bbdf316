//! Backend-specific device controls (calibration, speeds, maintenance)

use serde::{Deserialize, Serialize};

/// Kind of UI control for a device action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Button,
    Toggle,
    Slider,
    Dropdown,
    /// Read-only display
    Info,
}

/// Value carried by toggles, sliders and dropdowns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionValue {
    Bool(bool),
    Number(f32),
    Text(String),
}

impl ActionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ActionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            ActionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ActionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Group of related actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSection {
    pub id: String,
    pub label: String,
    pub display_order: i32,
    #[serde(default)]
    pub description: String,
}

impl DeviceSection {
    pub fn new(id: &str, label: &str, display_order: i32, description: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            display_order,
            description: description.to_string(),
        }
    }
}

/// One device control exposed by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAction {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: String,
    /// Owning [`DeviceSection::id`]
    pub section: String,
    #[serde(default)]
    pub description: String,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<ActionValue>,
    #[serde(default)]
    pub options: Vec<String>,
    pub min_value: f32,
    pub max_value: f32,
    #[serde(default)]
    pub unit: String,
    /// -1 for system-wide actions
    pub slot_index: i32,
    pub enabled: bool,
    #[serde(default)]
    pub disable_reason: String,
}

impl DeviceAction {
    pub fn button(id: &str, label: &str, icon: &str, section: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            section: section.to_string(),
            description: description.to_string(),
            action_type: ActionType::Button,
            current_value: None,
            options: Vec::new(),
            min_value: 0.0,
            max_value: 100.0,
            unit: String::new(),
            slot_index: -1,
            enabled: true,
            disable_reason: String::new(),
        }
    }

    pub fn toggle(id: &str, label: &str, section: &str, value: bool) -> Self {
        Self {
            action_type: ActionType::Toggle,
            current_value: Some(ActionValue::Bool(value)),
            ..Self::button(id, label, "", section, "")
        }
    }

    pub fn slider(
        id: &str,
        label: &str,
        section: &str,
        (min_value, max_value): (f32, f32),
        value: f32,
        unit: &str,
    ) -> Self {
        Self {
            action_type: ActionType::Slider,
            current_value: Some(ActionValue::Number(value)),
            min_value,
            max_value,
            unit: unit.to_string(),
            ..Self::button(id, label, "", section, "")
        }
    }

    pub fn dropdown(id: &str, label: &str, section: &str, options: &[&str], value: &str) -> Self {
        Self {
            action_type: ActionType::Dropdown,
            current_value: Some(ActionValue::Text(value.to_string())),
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::button(id, label, "", section, "")
        }
    }
}
