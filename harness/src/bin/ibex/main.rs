#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use panic_halt as _;

use harness::{Config, Harness, Workload};
use riscv_rt::entry;

#[macro_use]
#[path = "../../fmt.rs"]
mod fmt;

mod board;

extern "C" {
    /// Benchmark entry point, linked in from the workload library.
    fn execute_cw();
}

/// Selects the other run mode when set. Patch it from a debugger or
/// simulator before `main` reads it.
#[no_mangle]
static DEBUG_SKIP_LOOP: AtomicBool = AtomicBool::new(cfg!(feature = "debug-skip-loop"));

struct Benchmark;

impl Workload for Benchmark {
    #[inline(never)]
    fn execute(&mut self) {
        // SAFETY: `execute_cw` takes no arguments and touches only the
        // workload's own state.
        unsafe { execute_cw() }
    }
}

#[entry]
#[allow(clippy::empty_loop)]
fn main() -> ! {
    let config = Config::from_features().with_debug_skip_loop(DEBUG_SKIP_LOOP.load(Ordering::Relaxed));

    let mut harness = Harness::init(config, board::Ibex::take(), Benchmark);

    // single-shot returns here; nothing further is defined
    match harness.run() {
        Ok(status) => info!("workload finished, status {}", status),
        Err(err) => warn!("run command not registered: {}", err),
    }

    loop {}
}
