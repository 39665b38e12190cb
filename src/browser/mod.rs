pub mod chrome;

pub use chrome::ChromeSnapshotSource;
