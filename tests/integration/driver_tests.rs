//! Integration tests for the pin-level drivers on mock pins.

use std::sync::OnceLock;

use pumpboard::actuator::PumpId;
use pumpboard::app::service::PumpBoard;
use pumpboard::config::BoardConfig;
use pumpboard::drivers::pump::PumpBank;
use pumpboard::drivers::sense::FaultLines;
use pumpboard::drivers::status_led::ActivityLight;
use pumpboard::safety::FaultBank;

use super::mock_hw::{MockPin, RecordingLights, TestBoard, add_ingredient, make_board, run_for};

type PinBoard = PumpBoard<PumpBank<MockPin>, ActivityLight<MockPin>>;

fn pin_board() -> PinBoard {
    PumpBoard::new(
        BoardConfig::default(),
        PumpBank::new(core::array::from_fn(|_| MockPin::default())),
        ActivityLight::new(MockPin::default()),
    )
}

fn pump(raw: u16) -> PumpId {
    PumpId::new(raw).unwrap()
}

// ── Pump bank ─────────────────────────────────────────────────

#[test]
fn pump_bank_starts_with_every_output_low() {
    let bank = PumpBank::new(core::array::from_fn(|_| MockPin {
        high: true,
        ..MockPin::default()
    }));
    for id in PumpId::all() {
        assert!(!bank.output(id).high, "pump {id}");
        assert_eq!(bank.output(id).writes, 1);
    }
    assert_eq!(bank.failed_writes(), 0);
}

#[test]
fn pump_bank_counts_failed_writes() {
    let bank = PumpBank::new(core::array::from_fn(|_| MockPin::broken()));
    assert_eq!(bank.failed_writes(), 20);
}

#[test]
fn dispense_drives_pins_high_then_low() {
    let board = pin_board();
    board.pump_on(7).unwrap();
    assert!(board.with_pumps(|b| b.output(pump(7)).high));
    assert!(!board.with_pumps(|b| b.output(pump(8)).high));

    board.pump_off(7).unwrap();
    assert!(!board.with_pumps(|b| b.output(pump(7)).high));
}

// ── Activity light ────────────────────────────────────────────

#[test]
fn activity_light_follows_any_energized_pump() {
    let board = pin_board();
    assert!(!board.with_lights(ActivityLight::is_lit));
    assert!(board.with_lights(|l| l.active().is_empty()));

    board.pump_on(1).unwrap();
    board.pump_on(2).unwrap();
    assert!(board.with_lights(ActivityLight::is_lit));

    board.pump_off(1).unwrap();
    assert!(board.with_lights(ActivityLight::is_lit));

    board.pump_off(2).unwrap();
    assert!(!board.with_lights(ActivityLight::is_lit));
}

#[test]
fn activity_light_goes_dark_after_dispense() {
    let board = pin_board();
    board.set_pump(3).unwrap();
    board.set_duration(40).unwrap();
    board.store().unwrap();
    board.start().unwrap();
    assert!(board.with_lights(ActivityLight::is_lit));

    run_for(&board, 40);
    assert!(!board.with_lights(ActivityLight::is_lit));
}

#[test]
fn recording_lights_see_every_change() {
    let board = make_board();
    add_ingredient(&board, 1, 10, 0);
    add_ingredient(&board, 2, 20, 0);
    board.start().unwrap();
    run_for(&board, 20);
    assert_eq!(
        board.with_lights(|l: &RecordingLights| l.changes.clone()),
        vec![(1, true), (2, true), (1, false), (2, false)]
    );
}

// ── Fault sense lines ─────────────────────────────────────────

static BOARD: OnceLock<TestBoard> = OnceLock::new();

fn forward_fault(bank: FaultBank) {
    if let Some(board) = BOARD.get() {
        board.on_fault(bank);
    }
}

#[test]
fn latched_fault_reaches_board_on_dispatch() {
    static LINES: FaultLines = FaultLines::new();
    let board = BOARD.get_or_init(make_board);
    for bank in FaultBank::ALL {
        LINES.register(bank, forward_fault);
    }

    board.pump_on(18).unwrap();
    LINES.raise(FaultBank::Bank2);
    assert!(board.energized().contains(pump(18)), "raise only latches");
    assert_eq!(LINES.pending(), FaultBank::Bank2.mask());

    assert_eq!(LINES.dispatch(), FaultBank::Bank2.mask());
    assert!(board.energized().is_empty());
    assert_eq!(board.fault_flags(), FaultBank::Bank2.mask());
    assert_eq!(LINES.pending(), 0);
    assert_eq!(LINES.dispatch(), 0);
}

static DISPENSE_BOARD: OnceLock<TestBoard> = OnceLock::new();

fn forward_dispense_fault(bank: FaultBank) {
    if let Some(board) = DISPENSE_BOARD.get() {
        board.on_fault(bank);
    }
}

#[test]
fn board_reports_run_until_latched_fault_is_dispatched() {
    static LINES: FaultLines = FaultLines::new();
    let board = DISPENSE_BOARD.get_or_init(make_board);
    LINES.register(FaultBank::Bank1, forward_dispense_fault);

    add_ingredient(board, 4, 300, 0);
    board.start().unwrap();
    run_for(board, 10);

    LINES.raise(FaultBank::Bank1);
    assert!(board.is_dispensing(), "latched, not yet dispatched");
    assert!(board.energized().contains(pump(4)));
    assert_eq!(board.fault_flags(), 0);

    // Same order as the tick callback: dispatch, then advance.
    LINES.dispatch();
    run_for(board, 1);
    assert!(!board.is_dispensing());
    assert!(board.energized().is_empty());
    assert_eq!(board.fault_flags(), FaultBank::Bank1.mask());
}
