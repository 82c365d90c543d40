//! Integration tests for the LED animation and the commands that drive it.

use smart_leds::RGB8;
use sunstrip::animation::{AnimationEngine, LedMode};
use sunstrip::color::{wheel, BLACK, RAINBOW_PERIOD_MS};
use sunstrip::LightCommand;

fn apply(engine: &mut AnimationEngine, cmd: LightCommand, now_ms: u64) {
    engine.set_mode(cmd.mode, cmd.color, now_ms);
}

// ============================================================================
// Rainbow
// ============================================================================

#[test]
fn rainbow_spreads_wheel_across_strip() {
    let mut engine = AnimationEngine::new(4);
    apply(&mut engine, LightCommand::rainbow(), 0);

    let frame = engine.render(0);
    assert_eq!(frame[0], wheel(0));
    assert_eq!(frame[1], wheel(90));
    assert_eq!(frame[2], wheel(180));
    // 270 wraps onto the wheel
    assert_eq!(frame[3], wheel(14));
}

#[test]
fn rainbow_advances_one_step_per_10ms() {
    let mut engine = AnimationEngine::new(1);
    apply(&mut engine, LightCommand::rainbow(), 5_000);

    assert_eq!(engine.render(5_000)[0], wheel(0));
    assert_eq!(engine.render(5_009)[0], wheel(0));
    assert_eq!(engine.render(5_010)[0], wheel(1));
    assert_eq!(engine.render(6_000)[0], wheel(100));
}

#[test]
fn rainbow_repeats_each_period() {
    let mut engine = AnimationEngine::new(3);
    apply(&mut engine, LightCommand::rainbow(), 0);
    assert_eq!(engine.render(123), engine.render(123 + RAINBOW_PERIOD_MS));
}

#[test]
fn rainbow_ignores_color() {
    let mut a = AnimationEngine::new(5);
    let mut b = AnimationEngine::new(5);
    a.set_mode(LedMode::Rainbow, RGB8::new(255, 0, 0), 0);
    b.set_mode(LedMode::Rainbow, RGB8::new(0, 0, 255), 0);
    assert_eq!(a.render(777), b.render(777));
}

// ============================================================================
// Breathe
// ============================================================================

#[test]
fn breathe_follows_sine() {
    let color = RGB8::new(200, 100, 50);
    let mut engine = AnimationEngine::new(2);
    apply(&mut engine, LightCommand::breathe(color), 10_000);

    // half brightness at the start
    assert_eq!(engine.render(10_000)[0], RGB8::new(100, 50, 25));
    // full at 0.5 s
    assert_eq!(engine.render(10_500)[0], color);
    // dark at 1.5 s
    assert_eq!(engine.render(11_500)[0], BLACK);
}

#[test]
fn breathe_all_pixels_equal() {
    let mut engine = AnimationEngine::new(6);
    apply(&mut engine, LightCommand::breathe(RGB8::new(10, 200, 30)), 0);
    let frame = engine.render(333);
    assert!(frame.iter().all(|p| *p == frame[0]));
}

#[test]
fn breathe_never_exceeds_base_color() {
    let color = RGB8::new(255, 128, 7);
    let mut engine = AnimationEngine::new(1);
    apply(&mut engine, LightCommand::breathe(color), 0);

    for t in (0..4_000).step_by(37) {
        let p = engine.render(t)[0];
        assert!(p.r <= color.r && p.g <= color.g && p.b <= color.b);
    }
}

// ============================================================================
// Command Handling
// ============================================================================

#[test]
fn text_command_switches_mode() {
    let mut engine = AnimationEngine::new(3);

    apply(&mut engine, LightCommand::parse_text("color:ff8000"), 100);
    assert_eq!(engine.render(200), vec![RGB8::new(255, 128, 0); 3]);

    apply(&mut engine, LightCommand::parse_text("off"), 300);
    assert_eq!(engine.render(400), vec![BLACK; 3]);
}

#[test]
fn unknown_command_turns_strip_off() {
    let mut engine = AnimationEngine::new(2);
    apply(&mut engine, LightCommand::solid(RGB8::new(1, 2, 3)), 0);
    apply(&mut engine, LightCommand::parse_text("disco"), 10);
    assert_eq!(engine.mode(), LedMode::Off);
    assert_eq!(engine.render(20), vec![BLACK; 2]);
}

#[test]
fn repeated_command_restarts_phase() {
    let mut engine = AnimationEngine::new(1);
    apply(&mut engine, LightCommand::rainbow(), 0);
    let before = engine.render(1_000);

    apply(&mut engine, LightCommand::rainbow(), 1_000);
    assert_eq!(engine.state().effect_start_ms, 1_000);
    assert_ne!(engine.render(1_000), before);
    assert_eq!(engine.render(1_000)[0], wheel(0));
}

#[test]
fn form_command_matches_text_command() {
    assert_eq!(
        LightCommand::from_form("solid", "#6bffdf"),
        LightCommand::parse_text("color:6bffdf")
    );
    assert_eq!(
        LightCommand::from_form("breathe", "#6bffdf"),
        LightCommand::parse_text("breathe:6bffdf")
    );
}
