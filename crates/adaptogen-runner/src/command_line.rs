//! Joins a base command with caller-supplied arguments.
//!
//! The base command is trusted shell text. Every argument is quoted so the
//! shell sees it as exactly one literal word: quotes, whitespace, `;`, `$()`,
//! backticks and leading dashes inside an argument cannot start a new command.

/// Build the full command line for `command` with `args` appended.
///
/// Returns `command` unchanged when `args` is empty.
#[must_use]
pub fn build_command_line(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        return command.to_string();
    }

    let mut line = String::from(command);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_words::quote(arg));
    }
    line
}
