pub mod console;
pub mod snapshotter;
