//! `tristep completions`: shell completion scripts.

use clap::{Command, ValueEnum};
use clap_complete::{generate, shells};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

/// Write the completion script for `shell` to `out`.
pub fn generate_to(cmd: &mut Command, shell: Shell, out: &mut dyn Write) {
    let bin_name = cmd.get_name().to_string();
    match shell {
        Shell::Bash => generate(shells::Bash, cmd, bin_name, out),
        Shell::Zsh => generate(shells::Zsh, cmd, bin_name, out),
        Shell::Fish => generate(shells::Fish, cmd, bin_name, out),
    }
}

pub fn execute(cmd: &mut Command, shell: Shell) {
    generate_to(cmd, shell, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(shell: Shell) -> String {
        let mut cmd = Command::new("tristep").subcommand(Command::new("status"));
        let mut out = Vec::new();
        generate_to(&mut cmd, shell, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bash_completion_names_binary() {
        let script = render(Shell::Bash);
        assert!(script.contains("tristep"));
        assert!(script.contains("status"));
    }

    #[test]
    fn test_fish_completion() {
        assert!(render(Shell::Fish).contains("complete -c tristep"));
    }
}
