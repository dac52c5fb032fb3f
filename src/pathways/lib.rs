#[macro_use] extern crate serde_derive;
#[macro_use] extern crate lazy_static;

pub mod types;
pub mod constants;
pub mod errors;
pub mod cache;
pub mod web;
pub mod api;
pub mod bio;
