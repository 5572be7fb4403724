use embedded_io::{Read, Write};
use simpleserial::{
    error::{Error, Register},
    Dispatch, SimpleSerial,
};

use crate::{
    board::Board,
    config::{Config, RunMode, BANNER},
    debug::DebugPrinter,
    handler::{CommandHandler, Status, Workload},
};

/// The harness after initialization.
///
/// The run mode is fixed when the harness is built and never changes.
pub struct Harness<B: Board, W: Workload> {
    config: Config,
    mode: RunMode,
    serial: B::Serial,
    handler: CommandHandler<B::Trigger, W, B::Console>,
    _board: B,
}

impl<B: Board, W: Workload> Harness<B, W> {
    /// Bring up the board and print the banner.
    pub fn init(config: Config, mut board: B, workload: W) -> Self {
        board.platform_init();
        let (serial, console) = board.init_uart();
        let trigger = board.trigger_setup();

        let mut handler = CommandHandler::new(trigger, workload, DebugPrinter::new(console, config.debug));
        handler.printer().print(BANNER);

        let mode = config.run_mode();
        info!("harness up, mode {}", mode);

        Self {
            config,
            mode,
            serial,
            handler,
            _board: board,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enter the selected mode.
    ///
    /// Returns the workload status in single-shot mode; never returns in
    /// serial-loop mode unless the command cannot be registered.
    pub fn run(&mut self) -> Result<Status, Register> {
        match self.mode {
            RunMode::SingleShot => Ok(self.single_shot()),
            RunMode::SerialLoop => self.serve()?.run(),
        }
    }

    /// Run the workload once with the sentinel payload. Nothing is sent
    /// on the serial port.
    pub fn single_shot(&mut self) -> Status {
        let selection = [self.config.sentinel];
        self.handler.perform(&selection)
    }

    /// Register the handler under the run command.
    pub fn serve(&mut self) -> Result<SerialLoop<'_, B::Serial>, Register> {
        let Self {
            config,
            serial,
            handler,
            ..
        } = self;

        let mut port = SimpleSerial::new(serial, config.protocol);
        port.add_cmd(config.command, config.payload_len, handler)?;

        debug!("serving command {}", config.command);

        Ok(SerialLoop { port })
    }
}

/// The command loop, borrowing the harness's port and handler.
pub struct SerialLoop<'h, S: Read + Write> {
    port: SimpleSerial<'h, &'h mut S>,
}

impl<S: Read + Write> SerialLoop<'_, S> {
    /// Block until one command has been serviced.
    pub fn poll(&mut self) -> Result<Dispatch, Error<S::Error>> {
        self.port.poll()
    }

    pub fn run(&mut self) -> ! {
        self.port.run()
    }
}
