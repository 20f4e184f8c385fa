//! Fuzz target: arbitrary operator sequences against `PumpBoard`
//!
//! Every byte pair is decoded into one operation (recipe edit, start,
//! manual switch, fault, ticks).  A fault always leaves every output off,
//! and the physical outputs always match the board's energized set.
//!
//! cargo fuzz run fuzz_board_ops

#![no_main]

use libfuzzer_sys::fuzz_target;
use pumpboard::actuator::PumpId;
use pumpboard::app::ports::PumpPort;
use pumpboard::app::service::PumpBoard;
use pumpboard::config::{BoardConfig, PUMP_COUNT};
use pumpboard::safety::FaultBank;

#[derive(Default)]
struct Levels([bool; PUMP_COUNT]);

impl PumpPort for Levels {
    fn write_pump(&mut self, id: PumpId, on: bool) {
        self.0[id.index()] = on;
    }
}

fuzz_target!(|data: &[u8]| {
    let board = PumpBoard::new(BoardConfig::default(), Levels::default(), ());

    for op in data.chunks_exact(2) {
        let arg = u16::from(op[1]);
        match op[0] % 8 {
            0 => {
                let _ = board.set_pump(arg % 24);
            }
            1 => {
                let _ = board.set_duration(arg * 4);
            }
            2 => {
                let _ = board.store();
            }
            3 => {
                let _ = board.start();
            }
            4 => {
                let _ = board.pump_on(arg % 24);
            }
            5 => {
                let _ = board.pump_off(arg % 24);
            }
            6 => {
                let bank = FaultBank::from_index(usize::from(op[1]) % 3).unwrap();
                board.on_fault(bank);
                assert!(board.energized().is_empty());
                assert!(!board.is_dispensing());
            }
            _ => {
                for _ in 0..arg * 8 {
                    board.on_tick();
                }
            }
        }

        // The recorded set and the physical outputs never disagree.
        let outputs = board.with_pumps(|l| l.0);
        for id in PumpId::all() {
            assert_eq!(outputs[id.index()], board.energized().contains(id));
        }
    }
});
