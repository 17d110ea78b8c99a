//! User facing progress output.
//!
//! Under Concourse stdout carries the JSON result only, so progress goes to
//! stderr. Under GitHub Actions everything goes to stdout and there is no JSON
//! result.

use log::debug;
use std::fmt::{self, Display};
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Concourse,
    GitHubActions,
}

/// Colors are off when `NO_COLOR` is set or the progress stream is not a terminal.
pub fn resolve_color_choice(mode: Mode) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    let is_terminal = match mode {
        Mode::Concourse => io::stderr().is_terminal(),
        Mode::GitHubActions => io::stdout().is_terminal(),
    };
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// A line of text made of differently styled runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Styled {
    spans: Vec<(ColorSpec, String)>,
}

impl Styled {
    pub fn plain(text: impl Display) -> Self {
        Self::with(ColorSpec::new(), text)
    }

    fn with(spec: ColorSpec, text: impl Display) -> Self {
        Self {
            spans: vec![(spec, text.to_string())],
        }
    }

    /// Appends `other` after the current runs.
    pub fn then(mut self, other: impl Into<Styled>) -> Self {
        self.spans.extend(other.into().spans);
        self
    }

    pub fn write_line<W: WriteColor>(&self, out: &mut W) -> io::Result<()> {
        for (spec, text) in &self.spans {
            out.set_color(spec)?;
            write!(out, "{}", text)?;
        }
        out.reset()?;
        writeln!(out)
    }
}

impl Display for Styled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.spans.iter().try_for_each(|(_, text)| f.write_str(text))
    }
}

impl From<&str> for Styled {
    fn from(text: &str) -> Self {
        Styled::plain(text)
    }
}

impl From<String> for Styled {
    fn from(text: String) -> Self {
        Styled::plain(text)
    }
}

impl From<&String> for Styled {
    fn from(text: &String) -> Self {
        Styled::plain(text)
    }
}

fn colored(color: Color, text: impl Display) -> Styled {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color));
    Styled::with(spec, text)
}

pub fn green(text: impl Display) -> Styled {
    colored(Color::Green, text)
}

pub fn yellow(text: impl Display) -> Styled {
    colored(Color::Yellow, text)
}

pub fn red(text: impl Display) -> Styled {
    colored(Color::Red, text)
}

pub fn italic(text: impl Display) -> Styled {
    let mut spec = ColorSpec::new();
    spec.set_italic(true);
    Styled::with(spec, text)
}

#[derive(Debug, Clone, Copy)]
pub struct Console {
    mode: Mode,
    color: ColorChoice,
}

impl Console {
    pub fn new(mode: Mode) -> Self {
        Self::with_color(mode, resolve_color_choice(mode))
    }

    pub fn with_color(mode: Mode, color: ColorChoice) -> Self {
        Self { mode, color }
    }

    fn stream(&self) -> StandardStream {
        match self.mode {
            Mode::Concourse => StandardStream::stderr(self.color),
            Mode::GitHubActions => StandardStream::stdout(self.color),
        }
    }

    pub fn log(&self, message: impl Into<Styled>) {
        let mut stream = self.stream();
        if let Err(e) = message.into().write_line(&mut stream) {
            debug!("Cannot write progress output: {}", e);
        }
    }

    pub fn log_indent(&self, message: impl Into<Styled>) {
        self.log(Styled::plain("    ").then(message));
    }

    pub fn new_line(&self) {
        self.log("");
    }

    /// Emits the JSON result. GitHub Actions has no use for it.
    pub fn out(&self, json: &str) {
        if self.mode == Mode::Concourse {
            println!("{}", json);
        }
    }
}
