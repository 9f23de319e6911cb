pub mod app;
pub mod event;
pub mod probe;
pub mod session;
pub mod sleep_timer;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;
