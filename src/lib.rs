pub mod args;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod formats;
pub mod normalize;
pub mod reference;
pub mod resolve;
pub mod sheet;
pub mod terminal;
