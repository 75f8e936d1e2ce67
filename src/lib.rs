extern crate byteorder;
extern crate encoding;
extern crate itertools;
#[macro_use] extern crate log;

pub mod geo;
pub mod read;
