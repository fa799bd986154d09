// A minimal stderr logger for the `log` facade. Filtering is done through
// `log::set_max_level`, so every record that reaches us is printed.

use log::Log;

#[derive(Debug)]
pub struct Logger;

impl Logger {
    /// Install the logger globally. Fails if another logger is already set.
    pub fn init() -> Result<&'static Logger, log::SetLoggerError> {
        static LOGGER: Logger = Logger;
        log::set_logger(&LOGGER)?;
        Ok(&LOGGER)
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let now = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        match (record.file(), record.line()) {
            (Some(file), Some(line)) => {
                eprintln!("{}|{}|{}:{}: {}", now, record.level(), file, line, record.args());
            }
            (Some(file), None) => {
                eprintln!("{}|{}|{}: {}", now, record.level(), file, record.args());
            }
            _ => {
                eprintln!("{}|{}: {}", now, record.level(), record.args());
            }
        }
    }

    fn flush(&self) {}
}
