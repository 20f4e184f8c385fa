//! Integration tests for dispensing through the [`PumpBoard`] service.
//!
//! Exercises the complete path from recipe commands through the deadline
//! timer to the pump outputs, with the 1 ms tick driven by the test.

use pumpboard::app::events::BoardEvent;
use pumpboard::error::{BusyError, Error, ValidationError};
use pumpboard::safety::FaultBank;

use super::mock_hw::{
    TestBoard, TickingDelay, add_ingredient, drain, make_board, pump_is_on, run_for,
};

fn three_pump_board() -> TestBoard {
    let board = make_board();
    add_ingredient(&board, 1, 500, 0);
    add_ingredient(&board, 2, 300, 0);
    add_ingredient(&board, 3, 300, 0);
    board
}

// ── Timing ────────────────────────────────────────────────────

#[test]
fn pumps_stop_at_their_own_durations() {
    let board = three_pump_board();
    assert_eq!(board.start(), Ok(3));
    assert!((1..=3).all(|p| pump_is_on(&board, p)));

    run_for(&board, 299);
    assert!((1..=3).all(|p| pump_is_on(&board, p)), "t=299");

    run_for(&board, 1);
    assert!(pump_is_on(&board, 1), "t=300");
    assert!(!pump_is_on(&board, 2));
    assert!(!pump_is_on(&board, 3));
    assert!(board.is_dispensing());

    run_for(&board, 199);
    assert!(pump_is_on(&board, 1), "t=499");

    run_for(&board, 1);
    assert!(board.energized().is_empty(), "t=500");
    assert!(!board.is_dispensing());

    assert_eq!(
        drain(&board),
        vec![
            BoardEvent::DispenseStarted {
                ingredients: 3,
                at: 0
            },
            BoardEvent::DispenseCompleted {
                at: 500,
                elapsed_ms: 500
            },
        ]
    );
}

#[test]
fn first_ingredient_delay_pushes_later_stops_back() {
    let board = make_board();
    add_ingredient(&board, 1, 100, 50);
    add_ingredient(&board, 2, 200, 0);
    board.start().unwrap();

    let mut stopped_at = [None; 2];
    while board.is_dispensing() && board.now() < 1_000 {
        run_for(&board, 1);
        for (slot, pump) in stopped_at.iter_mut().zip([1, 2]) {
            if slot.is_none() && !pump_is_on(&board, pump) {
                *slot = Some(board.now());
            }
        }
    }
    assert_eq!(stopped_at, [Some(150), Some(250)]);
    assert!(board.energized().is_empty());
}

#[test]
fn only_listed_pumps_are_energized() {
    let board = three_pump_board();
    board.start().unwrap();
    let on: Vec<u8> = board.energized().iter().map(|id| id.get()).collect();
    assert_eq!(on, vec![1, 2, 3]);
    assert_eq!(board.with_pumps(|p| p.on_count()), 3);
}

#[test]
fn go_blocks_until_done_and_consumes_recipe() {
    let board = three_pump_board();
    let mut delay = TickingDelay::new(&board);

    board.go(&mut delay).unwrap();

    assert_eq!(board.now(), 500);
    assert_eq!(delay.ticks, 500);
    assert!(board.energized().is_empty());
    assert!(board.list().is_empty());
}

#[test]
fn go_without_recipe_is_refused() {
    let board = make_board();
    let mut delay = TickingDelay::new(&board);
    assert_eq!(
        board.go(&mut delay),
        Err(Error::Validation(ValidationError::EmptyRecipe))
    );
    assert_eq!(delay.ticks, 0);
    assert!(board.with_pumps(|p| p.history.is_empty()));
}

// ── Busy rules ────────────────────────────────────────────────

#[test]
fn second_start_is_busy_and_leaves_outputs_alone() {
    let board = three_pump_board();
    board.start().unwrap();
    let writes = board.with_pumps(|p| p.history.len());

    assert_eq!(board.start(), Err(Error::Busy(BusyError::Dispensing)));
    assert_eq!(board.with_pumps(|p| p.history.len()), writes);
}

#[test]
fn recipe_is_locked_while_dispensing() {
    let board = three_pump_board();
    board.start().unwrap();

    let busy = Err(Error::Busy(BusyError::Dispensing));
    assert_eq!(board.set_pump(4), busy);
    assert_eq!(board.set_duration(10), busy);
    assert_eq!(board.reset(), busy);
    assert_eq!(board.list().len(), 3);

    run_for(&board, 500);
    assert_eq!(board.set_pump(4), Ok(()));
}

#[test]
fn manual_control_is_refused_while_dispensing() {
    let board = three_pump_board();
    board.start().unwrap();
    assert_eq!(board.pump_off(1), Err(Error::Busy(BusyError::Dispensing)));
    assert!(pump_is_on(&board, 1));
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn fault_stops_everything_and_nothing_restarts() {
    let board = three_pump_board();
    board.start().unwrap();
    run_for(&board, 200);

    board.on_fault(FaultBank::Bank0);
    assert!(board.energized().is_empty());
    assert_eq!(board.with_pumps(|p| p.on_count()), 0);
    assert!(!board.is_dispensing());
    let mark = board.with_pumps(|p| p.history.len());

    run_for(&board, 400);
    assert!(board.with_pumps(|p| p.energized_since(mark)).is_empty());
    assert_eq!(board.with_pumps(|p| p.on_count()), 0);

    let events = drain(&board);
    assert!(events.contains(&BoardEvent::FaultReported {
        bank: FaultBank::Bank0,
        at: 200
    }));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, BoardEvent::DispenseCompleted { .. }))
    );
    assert_eq!(board.fault_flags(), FaultBank::Bank0.mask());
    assert_eq!(board.fault_count(), 1);
}

#[test]
fn fault_during_go_returns_early() {
    let board = three_pump_board();
    let mut delay = TickingDelay::new(&board).with_fault_at(200, FaultBank::Bank2);

    board.go(&mut delay).unwrap();

    assert_eq!(board.now(), 200);
    assert!(board.energized().is_empty());
    assert!(board.list().is_empty());
}

#[test]
fn new_dispense_after_fault_runs_normally() {
    let board = three_pump_board();
    board.start().unwrap();
    run_for(&board, 200);
    board.on_fault(FaultBank::Bank1);

    board.reset().unwrap();
    add_ingredient(&board, 4, 100, 0);
    board.start().unwrap();
    drain(&board);

    run_for(&board, 99);
    assert!(pump_is_on(&board, 4));
    run_for(&board, 1);
    assert!(!pump_is_on(&board, 4));
    assert!(!pump_is_on(&board, 1));
    assert_eq!(
        drain(&board),
        vec![BoardEvent::DispenseCompleted {
            at: 300,
            elapsed_ms: 100
        }]
    );
}

#[test]
fn fault_events_beyond_queue_capacity_are_counted() {
    let board = make_board();
    for _ in 0..20 {
        board.on_fault(FaultBank::Bank0);
    }
    assert_eq!(board.fault_count(), 20);
    assert_eq!(board.events().len(), 16);
    assert_eq!(board.events().dropped(), 4);
}
