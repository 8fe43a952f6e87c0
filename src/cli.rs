use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tubedrop", version, about = "Video download relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Print an argon2 hash for the accounts file
    HashPassword {
        /// Plain-text password to hash
        password: String,
    },
}

impl Cli {
    /// Subcommand to run; no subcommand means serve.
    pub fn command(self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_serves() {
        let cli = Cli::try_parse_from(["tubedrop"]).unwrap();
        assert_eq!(cli.command(), Command::Serve);
    }

    #[test]
    fn hash_password_takes_the_password() {
        let cli = Cli::try_parse_from(["tubedrop", "hash-password", "s3cret"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::HashPassword {
                password: "s3cret".to_string()
            }
        );
    }

    #[test]
    fn hash_password_requires_an_argument() {
        assert!(Cli::try_parse_from(["tubedrop", "hash-password"]).is_err());
    }
}
