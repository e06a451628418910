//! Log output.
//!
//! The brain has no environment to configure a logger from, so records at `info` and above
//! are written straight to the serial console, stamped with the time since the program started.
//! On the host `RUST_LOG` picks the level.

#[cfg(target_os = "vexos")]
mod serial {
    use log::{LevelFilter, Log, Metadata, Record};
    use vexide::time::user_uptime;

    struct SerialLogger;

    static LOGGER: SerialLogger = SerialLogger;

    impl Log for SerialLogger {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record<'_>) {
            if self.enabled(record.metadata()) {
                println!(
                    "{:<5} [{:>9.3}s] {} - {}",
                    record.level(),
                    user_uptime().as_secs_f64(),
                    record.target(),
                    record.args()
                );
            }
        }

        fn flush(&self) {}
    }

    pub fn init() {
        if let Err(err) = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info)) {
            println!("logger already installed: {err}");
        }
    }
}

#[cfg(target_os = "vexos")]
pub use serial::init;

/// Installs `pretty_env_logger`, configured from `RUST_LOG`.
#[cfg(not(target_os = "vexos"))]
pub fn init() {
    pretty_env_logger::init();
}
