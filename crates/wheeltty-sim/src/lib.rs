#![forbid(unsafe_code)]

//! Host-side simulation of a Wheelwriter fitted with the teletype
//! interface.
//!
//! [`peers`] stands in for the typewriter's two boards: a printer that
//! answers the reset announcement and types onto a [`paper::Paper`], and a
//! keyboard that produces the words the Function Board would send.
//! [`rig::Rig`] wires both to a [`wheeltty_core::Session`] over loopback
//! ports.

pub mod paper;
pub mod peers;
pub mod rig;

pub use paper::{Impression, Paper};
pub use peers::{VirtualKeyboard, VirtualPrinter};
pub use rig::Rig;
