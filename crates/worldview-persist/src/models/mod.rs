pub mod thread;

pub use thread::ThreadRecord;
