use embedded_io::Write;

/// Character output device.
pub trait Console {
    /// Write one character. Failures are the device's concern.
    fn putch(&mut self, byte: u8);
}

impl<C: Console + ?Sized> Console for &mut C {
    fn putch(&mut self, byte: u8) {
        (**self).putch(byte)
    }
}

/// Adapts any [`embedded_io::Write`] into a [`Console`].
pub struct IoConsole<W>(pub W);

impl<W: Write> Console for IoConsole<W> {
    fn putch(&mut self, byte: u8) {
        if self.0.write_all(&[byte]).is_err() {
            warn!("console write failed");
        }
    }
}

/// Writes progress messages to a console, or nothing when disabled.
pub struct DebugPrinter<C> {
    console: C,
    enabled: bool,
}

impl<C: Console> DebugPrinter<C> {
    pub const fn new(console: C, enabled: bool) -> Self {
        Self { console, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Write `message` one character at a time.
    ///
    /// Output stops at the first NUL, so C-style terminated buffers print
    /// without their terminator.
    pub fn print(&mut self, message: impl AsRef<[u8]>) {
        if !self.enabled {
            return;
        }

        message
            .as_ref()
            .iter()
            .take_while(|&&byte| byte != 0)
            .for_each(|&byte| self.console.putch(byte));
    }
}
