// Library exports for sheetgraph

pub mod app;
pub mod command;
pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod graph;
pub mod palette;
pub mod range;
pub mod selection;
pub mod series;
pub mod table;
pub mod view;
