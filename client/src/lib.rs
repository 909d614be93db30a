mod app;
mod board;
mod config;
mod document;
mod dom;
mod export;
mod math;
mod plotter;
mod state;
mod storage;
mod surface;
mod timer;

pub use app::run;
