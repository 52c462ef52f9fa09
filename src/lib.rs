// Do this because numerics calls for a lot of non-standard names
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]
pub mod datacube;
pub mod error;
pub mod geometry;
pub mod helper;
pub mod noise;
pub mod radar;
pub mod range_equation;
pub mod rdm;
pub mod returns;
pub mod signal;
pub mod target;
pub mod vbm;
pub mod waveform;

pub use error::{RdmError, Result};
pub use rdm::{generate_rdm, RangeDopplerMap, Scenario};
