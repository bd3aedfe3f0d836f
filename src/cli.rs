// src/cli.rs
use clap::{
    Parser, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};

const HELP_STR: &str = r#"
{before-help}{name} {version}
{author-with-newline}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"#;

// Custom styles for clap
pub fn custom_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightMagenta.on_default() | Effects::BOLD)
        .error(AnsiColor::BrightRed.on_default() | Effects::BOLD)
        .valid(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .invalid(AnsiColor::BrightYellow.on_default() | Effects::BOLD | Effects::UNDERLINE)
        .placeholder(AnsiColor::BrightBlue.on_default())
        .usage(AnsiColor::BrightCyan.on_default() | Effects::BOLD | Effects::UNDERLINE)
}

/// The bundled demonstration programs.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// Print "Hello World" through an imported printf
    Hello,
    /// Recursive sum f(n) = 1 if n == 1 else n + f(n-1), printed via printf
    Factorial,
    /// Ackermann(m, n), computed natively and through the JIT
    Ackermann,
}

#[derive(Parser, Debug)]
#[command(
    version = clap::crate_version!(),
    about,
    long_about = None,
    help_template = HELP_STR,
    styles = custom_styles()
)]
pub struct Args {
    /// Demonstration program to run
    #[arg(long, value_enum)]
    pub demo: Demo,

    /// First Ackermann argument
    #[arg(short = 'm', default_value_t = 3)]
    pub m: i64,

    /// Second Ackermann argument, or the recursion depth for factorial
    #[arg(short = 'n')]
    pub n: Option<i64>,

    /// Hex-dump each generated function
    #[arg(long)]
    pub dump: bool,
}
