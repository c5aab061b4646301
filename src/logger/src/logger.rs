use std::io::Write;

use env_logger::{fmt::Color, Builder, Env};
use log::{Level, LevelFilter};

/// Console logger. Verbosity is user-driven (`-v` occurrences), with an
/// optional `CONSANG_LOG` environment override.
#[derive(Debug)]
pub struct Logger;

impl Logger {
    pub fn init(verbosity: u8) {
        let env = Env::default().filter("CONSANG_LOG");

        let result = Builder::new()
            .filter_level(Self::u8_to_loglevel(verbosity))
            .format(|buf, record| {
                let traceback: String;
                let set_intensity: bool;
                if record.level() == Level::Error {
                    traceback = format!(
                        "(@ {}:{}) ",
                        record.file().unwrap_or("unknown"),
                        record.line().unwrap_or(0)
                    );
                    set_intensity = true;
                } else {
                    traceback = String::new();
                    set_intensity = false;
                };

                let mut arg_style = buf.style();
                arg_style.set_intense(set_intensity);

                let mut level_style = buf.style();
                let color = match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn => Color::Yellow,
                    Level::Info => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan,
                };
                level_style.set_color(color).set_bold(true);

                writeln!(
                    buf,
                    "[{} {: <5} {}] {traceback}{}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    level_style.value(record.level()),
                    record.target(),
                    arg_style.value(record.args())
                )
            })
            .parse_env(env)
            .try_init();

        // A second init (tests) only adjusts the filter level.
        if result.is_err() {
            Self::set_level(verbosity);
        }
    }

    fn u8_to_loglevel(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            4..=u8::MAX => LevelFilter::Trace,
        }
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::u8_to_loglevel(verbosity));
    }
}
