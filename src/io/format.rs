//! Nice `plodmft` output formatting.

use std::fmt;

use log;

const PLODMFT_BANNER_LENGTH: usize = 82;

/// Logs an error to the `plodmft-output` logger.
macro_rules! plodmft_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "plodmft-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `plodmft-output` logger.
macro_rules! plodmft_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "plodmft-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `plodmft-output` logger.
macro_rules! plodmft_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "plodmft-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {plodmft_error, plodmft_output, plodmft_warn};

/// Logs a nicely formatted section title to the `plodmft-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(PLODMFT_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    plodmft_output!("┌──{bar}──┐");
    plodmft_output!("│§ {title:^length$} §│");
    plodmft_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `plodmft-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    plodmft_output!("{}", subtitle);
    plodmft_output!("{}", bar);
}

/// Logs a nicely formatted stage beginning to the `plodmft-output` logger.
pub(crate) fn log_stage_begin(stage: &str) {
    let width = PLODMFT_BANNER_LENGTH - 14;
    let stage_space = stage.to_string() + " ";
    plodmft_output!("❬❬❬❬❬ [Begin] {stage_space:❬<width$}");
}

/// Logs a nicely formatted stage ending to the `plodmft-output` logger.
pub(crate) fn log_stage_end(stage: &str) {
    let width = PLODMFT_BANNER_LENGTH - 14;
    let stage_space = stage.to_string() + " ";
    plodmft_output!("❭❭❭❭❭ [ End ] {stage_space:❭<width$}");
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging `plodmft` outputs nicely.
pub(crate) trait PlodmftOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            plodmft_output!("{line}");
        })
    }

    /// Logs debug output nicely.
    fn log_output_debug(&self) {
        let lines = format!("{self:?}");
        lines.lines().for_each(|line| {
            plodmft_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> PlodmftOutput for T where T: fmt::Debug + fmt::Display {}
