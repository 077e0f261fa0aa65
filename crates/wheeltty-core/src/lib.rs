#![forbid(unsafe_code)]

//! Core of the Wheelwriter teletype interface.
//!
//! The interface sits between an IBM Wheelwriter's Function Board
//! (keyboard) and Printer Board (print mechanism) and a host serial line.
//! Host output is interpreted as Diablo 630 printer commands and turned
//! into Wheelwriter bus words; keystrokes on the typewriter are decoded
//! back into ASCII for the host.
//!
//! # Layers
//!
//! - [`ring`] and [`channel`]: interrupt-fed receive rings and the three
//!   serial links, with RTS flow control on the console and acknowledged
//!   9-bit writes on the bus.
//! - [`bus`]: bus words, printer command encoding, keystroke decoding and
//!   the printwheel tables.
//! - [`engine`]: the Diablo 630 byte interpreter.
//! - [`session`]: handshake and the steady-state loop.
//!
//! Hardware is reached only through the traits in [`hardware`] and
//! [`clock`]; [`hardware::loopback`] supplies in-memory implementations.

pub mod bus;
pub mod channel;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod flow_control;
pub mod hardware;
pub mod pitch;
pub mod ring;
pub mod session;

pub use bus::{BusWord, KeyDecoder, KeyEvent, Opcode};
pub use channel::{Link, SerialChannel};
pub use clock::{TickCounter, TickSource};
pub use config::SessionConfig;
pub use diagnostics::{DiagEvent, Diagnostics, LogDiagnostics, Recorder, Snapshot};
pub use engine::{Attributes, Emission, EscapeState, PrintEngine};
pub use error::{ConfigError, LinkError, SessionError, WaitTimeout};
pub use hardware::{HardwareIo, Level, Line, UartPort};
pub use pitch::{Pitch, Printwheel};
pub use session::{Interrupts, Mode, Phase, Ports, Session};
