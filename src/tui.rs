//! Status line macros for the terminal.
//!
//! Each macro takes the message and, optionally, the `quiet` and
//! `accessible` flags. Quiet suppresses the line entirely, accessible drops
//! the colored prefix so screen readers only read the message.

/// A problem the run recovered from, prefixed with a red `[!]`.
#[macro_export]
macro_rules! warning {
    ($name:expr) => {
        eprintln!("{} {}", ansi_term::Colour::Red.bold().paint("[!]"), $name);
    };
    ($name:expr, $quiet:expr, $accessible:expr) => {
        if !$quiet {
            if $accessible {
                eprintln!("{}", $name);
            } else {
                eprintln!("{} {}", ansi_term::Colour::Red.bold().paint("[!]"), $name);
            }
        }
    };
}

/// Progress information, prefixed with a blue `[*]`.
#[macro_export]
macro_rules! detail {
    ($name:expr) => {
        println!("{} {}", ansi_term::Colour::Blue.bold().paint("[*]"), $name);
    };
    ($name:expr, $quiet:expr, $accessible:expr) => {
        if !$quiet {
            if $accessible {
                println!("{}", $name);
            } else {
                println!("{} {}", ansi_term::Colour::Blue.bold().paint("[*]"), $name);
            }
        }
    };
}

/// A produced artifact, prefixed with a green `[>]`.
#[macro_export]
macro_rules! output {
    ($name:expr) => {
        println!("{} {}", ansi_term::Colour::RGB(0, 255, 9).bold().paint("[>]"), $name);
    };
    ($name:expr, $quiet:expr, $accessible:expr) => {
        if !$quiet {
            if $accessible {
                println!("{}", $name);
            } else {
                println!(
                    "{} {}",
                    ansi_term::Colour::RGB(0, 255, 9).bold().paint("[>]"),
                    $name
                );
            }
        }
    };
}
