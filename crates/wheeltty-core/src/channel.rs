//! Serial channels.
//!
//! Three links share one implementation: the 8-bit host console, which
//! reports flow-control transitions on RTS, and the two 9-bit bus links to
//! the typewriter's Function Board and Printer Board. Bus words are written
//! on a shared open-collector line, so a bus write waits for the line to be
//! idle, mutes its own receiver while sending, and for acknowledged writes
//! waits for the peer's low pulse before returning.

use std::fmt;

use crate::error::LinkError;
use crate::hardware::{Frame, UartPort, wait_until};
use crate::ring::Consumer;

/// Which peer a channel talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    Console,
    FunctionBoard,
    PrinterBoard,
}

impl Link {
    pub const ALL: [Self; 3] = [Self::Console, Self::FunctionBoard, Self::PrinterBoard];

    #[must_use]
    pub const fn framing(self) -> Framing {
        match self {
            Self::Console => Framing::EightBit,
            Self::FunctionBoard | Self::PrinterBoard => Framing::NineBit,
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Console => "console",
            Self::FunctionBoard => "function board",
            Self::PrinterBoard => "printer board",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    EightBit,
    NineBit,
}

impl Framing {
    /// Mask of the bits a unit on this framing can carry.
    #[must_use]
    pub const fn mask(self) -> u16 {
        match self {
            Self::EightBit => 0x0FF,
            Self::NineBit => 0x1FF,
        }
    }
}

/// One serial link: the consumer half of its receive ring plus the port
/// that transmits on it.
#[derive(Debug)]
pub struct SerialChannel<P> {
    link: Link,
    rx: Consumer,
    port: P,
    spin_limit: u32,
}

impl<P: UartPort> SerialChannel<P> {
    #[must_use]
    pub fn new(link: Link, rx: Consumer, port: P, spin_limit: u32) -> Self {
        Self {
            link,
            rx,
            port,
            spin_limit,
        }
    }

    #[must_use]
    pub fn link(&self) -> Link {
        self.link
    }

    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    #[must_use]
    pub fn available(&self) -> bool {
        self.rx.available()
    }

    #[must_use]
    pub fn overruns(&self) -> u32 {
        self.rx.overruns()
    }

    #[must_use]
    pub fn receive_ring(&self) -> &Consumer {
        &self.rx
    }

    /// Take the oldest received unit if there is one.
    pub fn try_read(&mut self) -> Option<u16> {
        let received = self.rx.pop()?;
        if let Some(signal) = received.flow {
            tracing::trace!(link = %self.link, ?signal, "flow control");
            self.port.set_rts(signal.rts_level());
        }
        Some(received.unit & self.link.framing().mask())
    }

    /// Wait until a unit arrives, yielding between polls.
    pub fn read(&mut self) -> u16 {
        loop {
            if let Some(unit) = self.try_read() {
                return unit;
            }
            std::thread::yield_now();
        }
    }

    /// Send one unit without waiting for a bus acknowledge.
    pub fn write(&mut self, unit: u16) -> Result<(), LinkError> {
        self.transmit(unit, false)
    }

    /// Send one unit and, on a bus link, wait for the peer's acknowledge
    /// pulse. Identical to [`write`](Self::write) on the console.
    pub fn write_acked(&mut self, unit: u16) -> Result<(), LinkError> {
        self.transmit(unit, true)
    }

    fn transmit(&mut self, unit: u16, acknowledged: bool) -> Result<(), LinkError> {
        self.wait("transmitter ready", |port| port.tx_complete())?;
        match self.link.framing() {
            Framing::EightBit => {
                self.port.start_tx(Frame::byte((unit & 0xFF) as u8));
                Ok(())
            }
            Framing::NineBit => {
                self.wait("bus idle", |port| port.rx_level().is_high())?;
                self.port.set_receiver(false);
                self.port.start_tx(Frame::word(unit));
                let sent = self.finish_word(acknowledged);
                self.port.set_receiver(true);
                sent
            }
        }
    }

    fn finish_word(&mut self, acknowledged: bool) -> Result<(), LinkError> {
        self.wait("transmit complete", |port| port.tx_complete())?;
        self.wait("bus release", |port| port.rx_level().is_high())?;
        if acknowledged {
            self.wait("acknowledge pulse", |port| !port.rx_level().is_high())?;
            self.wait("acknowledge release", |port| port.rx_level().is_high())?;
        }
        Ok(())
    }

    fn wait(&self, what: &'static str, cond: impl Fn(&P) -> bool) -> Result<(), LinkError> {
        let port = &self.port;
        wait_until(what, self.spin_limit, || cond(port)).map_err(|err| {
            tracing::warn!(link = %self.link, what, spins = err.spins, "wait timed out");
            LinkError::new(self.link, err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_control::Watermarks;
    use crate::hardware::Level;
    use crate::hardware::loopback::LoopbackPort;
    use crate::ring::{Capacity, Producer, ring};

    fn channel(link: Link, port: LoopbackPort) -> (Producer, SerialChannel<LoopbackPort>) {
        let (tx, rx) = ring(Capacity::new(16).unwrap(), None);
        (tx, SerialChannel::new(link, rx, port, 100))
    }

    #[test]
    fn bus_write_carries_ninth_bit_and_restores_receiver() {
        let (_tx, mut ch) = channel(Link::PrinterBoard, LoopbackPort::new());
        ch.write_acked(0x121).unwrap();
        ch.write_acked(0x003).unwrap();
        assert_eq!(ch.port().sent(), &[0x121, 0x003]);
        assert!(ch.port().receiver_enabled());
    }

    #[test]
    fn unacknowledged_writes_do_not_need_a_pulse() {
        let (_tx, mut ch) = channel(Link::FunctionBoard, LoopbackPort::silent());
        ch.write(0x000).unwrap();
        ch.write(0x020).unwrap();
        assert_eq!(ch.port().sent(), &[0x000, 0x020]);
    }

    #[test]
    fn acknowledged_write_times_out_on_silent_peer() {
        let (_tx, mut ch) = channel(Link::PrinterBoard, LoopbackPort::silent());
        let err = ch.write_acked(0x121).unwrap_err();
        assert_eq!(err.link, Link::PrinterBoard);
        assert_eq!(err.source.what, "acknowledge pulse");
        assert_eq!(err.source.spins, 100);
        assert!(ch.port().receiver_enabled());
    }

    #[test]
    fn console_write_truncates_to_a_byte() {
        let (_tx, mut ch) = channel(Link::Console, LoopbackPort::silent());
        ch.write_acked(u16::from(b'A')).unwrap();
        ch.write(0x10D).unwrap();
        assert_eq!(ch.port().sent(), &[0x41, 0x0D]);
    }

    #[test]
    fn reads_are_masked_to_framing() {
        let (tx, mut ch) = channel(Link::Console, LoopbackPort::new());
        tx.push(0x1AB);
        assert!(ch.available());
        assert_eq!(ch.try_read(), Some(0xAB));
        assert_eq!(ch.try_read(), None);

        let (tx, mut bus) = channel(Link::FunctionBoard, LoopbackPort::new());
        tx.push(0x121);
        assert_eq!(bus.read(), 0x121);
    }

    #[test]
    fn console_drives_rts_from_ring_signals() {
        let (tx, rx) = ring(Capacity::new(16).unwrap(), Some(Watermarks::for_capacity(16)));
        let mut ch = SerialChannel::new(Link::Console, rx, LoopbackPort::new(), 100);
        let mut paused = false;
        for byte in 0..14u16 {
            paused |= tx.push(byte).is_some();
        }
        assert!(paused);
        // The producer side reports Pause; the interrupt handler raises RTS.
        ch.port_mut().set_rts(Level::High);
        while ch.try_read().is_some() {}
        assert_eq!(ch.port().rts(), Level::Low);
        assert_eq!(ch.port().rts_changes(), 2);
    }
}
