pub mod api;
pub mod app;
pub mod config;
pub mod poll;
pub mod render;
pub mod run;
pub mod session;
pub mod shared;
pub mod stream;
pub mod timeline;
pub mod view;
