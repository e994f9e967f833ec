use lightning_bolt11::util::logger::{Level, Logger, Record};

/// Writes records at or above a level to stderr.
pub struct StderrLogger {
	level: Level,
}

impl StderrLogger {
	pub fn new(level: Level) -> StderrLogger {
		StderrLogger { level }
	}
}

impl Logger for StderrLogger {
	fn log(&self, record: Record) {
		if record.level >= self.level {
			eprintln!("{}", record);
		}
	}
}
