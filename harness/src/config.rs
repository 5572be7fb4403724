use simpleserial::Protocol;

/// Printed once when initialization completes.
pub const BANNER: &str = "Starting\n";

/// Printed after every workload run.
pub const CONFIRMATION: &str = "OK!";

/// Polarity of the skip flag.
///
/// Names describe what happens when the flag is left clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuildVariant {
    /// Serve commands; a set flag runs the workload once instead.
    LoopByDefault,
    /// Run once; a set flag serves commands instead.
    SingleShotByDefault,
}

impl BuildVariant {
    /// Mode selected by this variant for a given skip flag.
    pub const fn resolve(self, debug_skip_loop: bool) -> RunMode {
        match (self, debug_skip_loop) {
            (Self::LoopByDefault, false) | (Self::SingleShotByDefault, true) => RunMode::SerialLoop,
            (Self::LoopByDefault, true) | (Self::SingleShotByDefault, false) => RunMode::SingleShot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunMode {
    /// Run the workload once with a synthetic command and stop.
    SingleShot,
    /// Serve the run command over SimpleSerial forever.
    SerialLoop,
}

/// Startup configuration, read once during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub variant: BuildVariant,
    pub debug_skip_loop: bool,
    /// Enables the debug printer.
    pub debug: bool,
    pub protocol: Protocol,
    /// Command byte the workload is registered under.
    pub command: u8,
    /// Payload length expected with the command.
    pub payload_len: usize,
    /// Payload byte used in single-shot mode.
    pub sentinel: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Config {
    pub const DEFAULT: Self = Self {
        variant: BuildVariant::LoopByDefault,
        debug_skip_loop: false,
        debug: true,
        protocol: Protocol::V1_1,
        command: b'1',
        payload_len: 1,
        sentinel: b'A',
    };

    /// The configuration selected by the crate's cargo features.
    pub const fn from_features() -> Self {
        let variant = if cfg!(feature = "spike") {
            BuildVariant::SingleShotByDefault
        } else {
            BuildVariant::LoopByDefault
        };

        let protocol = if cfg!(feature = "ss-v2-1") {
            Protocol::V2_1
        } else if cfg!(feature = "ss-v1-0") {
            Protocol::V1_0
        } else {
            Protocol::V1_1
        };

        Self {
            variant,
            debug_skip_loop: cfg!(feature = "debug-skip-loop"),
            debug: cfg!(feature = "debug-print"),
            protocol,
            ..Self::DEFAULT
        }
    }

    pub const fn with_debug_skip_loop(mut self, debug_skip_loop: bool) -> Self {
        self.debug_skip_loop = debug_skip_loop;
        self
    }

    pub const fn run_mode(&self) -> RunMode {
        self.variant.resolve(self.debug_skip_loop)
    }
}
