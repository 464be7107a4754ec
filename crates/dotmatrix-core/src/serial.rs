use crate::memory::Memory;

pub const SB_ADDR: u16 = 0xFF01;
pub const SC_ADDR: u16 = 0xFF02;

/// SC value that starts a transfer on the internal clock.
const SC_START_INTERNAL: u8 = 0x81;

pub trait LinkPort: Send {
    /// Transfer a byte over the link. Returns the byte received from the
    /// partner.
    fn transfer(&mut self, byte: u8) -> u8;
}

/// A stub link port used when no cable is attached.
/// By default it emulates a "line dead" scenario where incoming bits are all 1,
/// so any transfer receives 0xFF. When `loopback` is true the sent byte is
/// echoed back instead.
#[derive(Default)]
pub struct NullLinkPort {
    loopback: bool,
}

impl NullLinkPort {
    pub fn new(loopback: bool) -> Self {
        Self { loopback }
    }
}

impl LinkPort for NullLinkPort {
    fn transfer(&mut self, byte: u8) -> u8 {
        if self.loopback { byte } else { 0xFF }
    }
}

/// SB/SC registers.
///
/// Transfers complete as soon as they are started; every outgoing byte is
/// also appended to a text sink, which is how test ROMs report results.
pub struct Serial {
    sb: u8,
    sc: u8,
    out_buf: Vec<u8>,
    port: Box<dyn LinkPort>,
    interrupt_pending: bool,
}

impl Serial {
    pub fn new() -> Self {
        Self {
            sb: 0,
            sc: 0x7E,
            out_buf: Vec::new(),
            port: Box::new(NullLinkPort::default()),
            interrupt_pending: false,
        }
    }

    pub fn connect(&mut self, port: Box<dyn LinkPort>) {
        self.port = port;
    }

    /// Bytes sent so far, without draining them.
    pub fn peek_output(&self) -> &[u8] {
        &self.out_buf
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out_buf)
    }

    /// Whether a transfer finished since the last call.
    pub fn take_interrupt(&mut self) -> bool {
        std::mem::take(&mut self.interrupt_pending)
    }

    fn complete_transfer(&mut self) {
        let outgoing = self.sb;
        self.out_buf.push(outgoing);
        self.sb = self.port.transfer(outgoing);
        self.sc &= 0x7F;
        self.interrupt_pending = true;
        log::trace!("serial: sent {outgoing:02X}, received {:02X}", self.sb);
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for Serial {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            SB_ADDR => self.sb,
            SC_ADDR => self.sc | 0x7E,
            _ => 0,
        }
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        match addr {
            SB_ADDR => self.sb = value,
            SC_ADDR => {
                self.sc = value;
                if value & SC_START_INTERNAL == SC_START_INTERNAL {
                    self.complete_transfer();
                }
            }
            _ => {}
        }
    }
}
