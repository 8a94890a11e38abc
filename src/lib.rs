pub mod detector;
pub mod event;
pub mod feed;
pub mod history;
pub mod notify;
pub mod pipeline;
pub mod settings;
pub mod severity;
pub mod web;
