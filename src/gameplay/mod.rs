mod thread;

pub use thread::gameplay_thread;
