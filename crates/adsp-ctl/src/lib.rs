//! Control-synchronization layer between the host and the audio DSP.
//!
//! User-visible mixer/switch/enum/byte-blob controls are kept in sync
//! with live DSP component state: every get/put translates to a typed
//! IPC exchange, wrapped in a runtime power resume/idle pair, with
//! change detection to suppress redundant traffic.

mod card;
mod control;
mod dai;
mod dsp;
mod error;
mod power;
mod siggen;
mod volume;
mod widget;

pub use card::{Card, CardRuntime, FrontEnd};
pub use control::{Control, ControlConfig, ControlKind, TLV_HDR_SIZE};
pub use dai::{DaiHwConfig, DaiLink};
pub use dsp::Dsp;
pub use error::{CtlError, Result};
pub use power::{PowerError, PowerHandle};
pub use volume::VolumeTable;
pub use widget::{StaticWidgetGraph, WidgetGraph, WidgetType};
