#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compare;
pub mod float;
pub mod ordering;
pub mod resolve;
