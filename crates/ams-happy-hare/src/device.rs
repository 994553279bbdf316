//! Happy Hare device controls

use ams_core::{ActionValue, AmsError, AmsResult, DeviceAction, DeviceSection};

const SPEED_RANGE: (f32, f32) = (10.0, 300.0);

const LED_MODES: &[&str] = &["off", "gate_status", "filament_color", "slot_status"];

pub(crate) fn sections() -> Vec<DeviceSection> {
    vec![
        DeviceSection::new("setup", "Setup", 0, "Calibration and LED configuration"),
        DeviceSection::new("speed", "Speed", 1, "Gear and selector motion speeds"),
        DeviceSection::new("maintenance", "Maintenance", 2, "Tests, counters and motors"),
    ]
}

pub(crate) fn actions() -> Vec<DeviceAction> {
    vec![
        DeviceAction::button(
            "calibrate_bowden",
            "Calibrate Bowden",
            "ruler",
            "setup",
            "Measure the bowden tube length",
        ),
        DeviceAction::button(
            "calibrate_encoder",
            "Calibrate Encoder",
            "encoder",
            "setup",
            "Calibrate encoder resolution",
        ),
        DeviceAction::button(
            "calibrate_gear",
            "Calibrate Gear",
            "gear",
            "setup",
            "Calibrate gear stepper rotation distance",
        ),
        DeviceAction::button(
            "calibrate_gates",
            "Calibrate Gates",
            "gate",
            "setup",
            "Calibrate each gate's feed distance",
        ),
        DeviceAction::button(
            "calibrate_servo",
            "Calibrate Servo",
            "servo",
            "setup",
            "Adjust servo positions",
        ),
        DeviceAction::dropdown("led_mode", "LED Mode", "setup", LED_MODES, "gate_status"),
        DeviceAction::slider(
            "gear_load_speed",
            "Gear Load Speed",
            "speed",
            SPEED_RANGE,
            150.0,
            "mm/s",
        ),
        DeviceAction::slider(
            "gear_unload_speed",
            "Gear Unload Speed",
            "speed",
            SPEED_RANGE,
            150.0,
            "mm/s",
        ),
        DeviceAction::slider(
            "selector_speed",
            "Selector Speed",
            "speed",
            SPEED_RANGE,
            200.0,
            "mm/s",
        ),
        DeviceAction::button("test_grip", "Test Grip", "hand", "maintenance", "Test servo grip"),
        DeviceAction::button(
            "test_load",
            "Test Load",
            "download",
            "maintenance",
            "Load and unload a short length of filament",
        ),
        DeviceAction::button(
            "servo_buzz",
            "Buzz Servo",
            "vibrate",
            "maintenance",
            "Move the servo back and forth",
        ),
        DeviceAction::button(
            "reset_servo_counter",
            "Reset Servo Counter",
            "counter",
            "maintenance",
            "Reset the servo operation counter",
        ),
        DeviceAction::button(
            "reset_blade_counter",
            "Reset Blade Counter",
            "counter",
            "maintenance",
            "Reset the cutter blade counter",
        ),
        DeviceAction::toggle("motors_toggle", "Motors", "maintenance", true),
    ]
}

/// Whether the action moves the gear, selector or servo
pub(crate) fn starts_motion(action_id: &str) -> bool {
    matches!(
        action_id,
        "calibrate_bowden"
            | "calibrate_encoder"
            | "calibrate_gear"
            | "calibrate_gates"
            | "calibrate_servo"
            | "test_grip"
            | "test_load"
            | "servo_buzz"
    )
}

fn speed_param(action_id: &str) -> Option<&'static str> {
    match action_id {
        "gear_load_speed" => Some("gear_from_buffer_speed"),
        "gear_unload_speed" => Some("gear_unload_speed"),
        "selector_speed" => Some("selector_move_speed"),
        _ => None,
    }
}

/// G-code for a device action, validating its value
pub(crate) fn action_gcode(action_id: &str, value: Option<&ActionValue>) -> AmsResult<String> {
    let fixed = match action_id {
        "calibrate_bowden" => Some("MMU_CALIBRATE_BOWDEN"),
        "calibrate_encoder" => Some("MMU_CALIBRATE_ENCODER"),
        "calibrate_gear" => Some("MMU_CALIBRATE_GEAR"),
        "calibrate_gates" => Some("MMU_CALIBRATE_GATES"),
        "calibrate_servo" => Some("MMU_SERVO"),
        "test_grip" => Some("MMU_TEST_GRIP"),
        "test_load" => Some("MMU_TEST_LOAD"),
        "servo_buzz" => Some("MMU_SERVO BUZZ=1"),
        "reset_servo_counter" => Some("MMU_STATS COUNTER=servo RESET=1"),
        "reset_blade_counter" => Some("MMU_STATS COUNTER=cutter RESET=1"),
        _ => None,
    };
    if let Some(gcode) = fixed {
        return Ok(gcode.to_string());
    }

    if let Some(param) = speed_param(action_id) {
        let speed = value
            .and_then(ActionValue::as_number)
            .ok_or_else(|| AmsError::InvalidValue(format!("{} requires a number", action_id)))?;
        let (min, max) = SPEED_RANGE;
        if !(min..=max).contains(&speed) {
            return Err(AmsError::InvalidValue(format!(
                "{} must be between {} and {} mm/s",
                action_id, min, max
            )));
        }
        return Ok(format!("MMU_TEST_CONFIG {}={:.0}", param, speed));
    }

    match action_id {
        "led_mode" => {
            let mode = value
                .and_then(ActionValue::as_text)
                .ok_or_else(|| AmsError::InvalidValue("led_mode requires a string".into()))?;
            if !ams_core::gcode::is_safe_param(mode) {
                return Err(AmsError::InvalidValue(format!("Invalid LED mode: {}", mode)));
            }
            Ok(format!("MMU_LED EXIT_EFFECT={}", mode))
        }
        "motors_toggle" => {
            let enabled = value
                .and_then(ActionValue::as_bool)
                .ok_or_else(|| AmsError::InvalidValue("motors_toggle requires a bool".into()))?;
            Ok(if enabled {
                "MMU_MOTORS_OFF HOLD=1".to_string()
            } else {
                "MMU_MOTORS_OFF".to_string()
            })
        }
        _ => Err(AmsError::not_supported(format!("Unknown action: {}", action_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_a_section() {
        let sections = sections();
        for action in actions() {
            assert!(
                sections.iter().any(|s| s.id == action.section),
                "{} has unknown section {}",
                action.id,
                action.section
            );
        }
    }

    #[test]
    fn test_motion_actions() {
        assert!(starts_motion("test_load"));
        assert!(starts_motion("calibrate_servo"));
        assert!(!starts_motion("reset_servo_counter"));
        assert!(!starts_motion("gear_load_speed"));
        assert!(!starts_motion("motors_toggle"));
    }

    #[test]
    fn test_buttons_map_to_gcode() {
        assert_eq!(
            action_gcode("calibrate_bowden", None).as_deref(),
            Ok("MMU_CALIBRATE_BOWDEN")
        );
        assert_eq!(
            action_gcode("reset_blade_counter", None).as_deref(),
            Ok("MMU_STATS COUNTER=cutter RESET=1")
        );
    }

    #[test]
    fn test_speed_slider() {
        assert_eq!(
            action_gcode("gear_load_speed", Some(&ActionValue::Number(120.4))).as_deref(),
            Ok("MMU_TEST_CONFIG gear_from_buffer_speed=120")
        );
        assert_eq!(
            action_gcode("selector_speed", Some(&ActionValue::Number(300.0))).as_deref(),
            Ok("MMU_TEST_CONFIG selector_move_speed=300")
        );
        assert!(matches!(
            action_gcode("gear_unload_speed", Some(&ActionValue::Number(5.0))),
            Err(AmsError::InvalidValue(_))
        ));
        assert!(matches!(
            action_gcode("gear_unload_speed", Some(&ActionValue::Text("fast".into()))),
            Err(AmsError::InvalidValue(_))
        ));
        assert!(matches!(
            action_gcode("gear_unload_speed", None),
            Err(AmsError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_led_and_motors() {
        assert_eq!(
            action_gcode("led_mode", Some(&ActionValue::Text("filament_color".into()))).as_deref(),
            Ok("MMU_LED EXIT_EFFECT=filament_color")
        );
        assert!(matches!(
            action_gcode("led_mode", Some(&ActionValue::Text("x y".into()))),
            Err(AmsError::InvalidValue(_))
        ));
        assert_eq!(
            action_gcode("motors_toggle", Some(&ActionValue::Bool(false))).as_deref(),
            Ok("MMU_MOTORS_OFF")
        );
        assert_eq!(
            action_gcode("motors_toggle", Some(&ActionValue::Bool(true))).as_deref(),
            Ok("MMU_MOTORS_OFF HOLD=1")
        );
    }

    #[test]
    fn test_unknown_action() {
        assert!(matches!(
            action_gcode("self_destruct", None),
            Err(AmsError::NotSupported(_))
        ));
    }
}
