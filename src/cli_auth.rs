use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vgs_server::cli_style::get_styles;
use vgs_server::user::{is_valid_username, FileUserStore, UserRecord, UserStore, VgsHasher};

#[derive(Parser, Debug)]
#[command(styles=get_styles(), about = "Manages vgs-server users files")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the JSON record of a new user, ready to be added to the users file.
    /// Prompts for the password when it is not given.
    MakeUser {
        #[clap(long)]
        username: String,

        #[clap(long)]
        password: Option<String>,
    },

    /// Verifies the password of a user of a users file. It doesn't make any
    /// change, it just compares the password hash.
    CheckPassword {
        #[clap(long, env = "VGSSERVER_USER_PATH")]
        users_file: PathBuf,

        #[clap(long)]
        username: String,

        #[clap(long)]
        password: String,
    },
}

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let confirmation =
        rpassword::prompt_password("Repeat password: ").context("Failed to read password")?;
    if password != confirmation {
        bail!("Passwords do not match");
    }
    Ok(password)
}

fn make_user(username: String, password: Option<String>) -> Result<String> {
    if !is_valid_username(&username) {
        bail!("Invalid username {:?}", username);
    }
    let password = match password {
        Some(password) => password,
        None => prompt_new_password()?,
    };
    if password.is_empty() {
        bail!("Password cannot be empty");
    }
    let record = UserRecord {
        username,
        password_hash: VgsHasher::Argon2.hash_password(&password)?,
    };
    Ok(serde_json::to_string_pretty(&record)?)
}

fn check_password(users_file: PathBuf, username: String, password: String) -> Result<bool> {
    let store = FileUserStore::load(&users_file)?;
    Ok(store.resolve_user(&username, &password)?.is_some())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    match cli_args.command {
        Command::MakeUser { username, password } => {
            println!("{}", make_user(username, password)?);
        }
        Command::CheckPassword {
            users_file,
            username,
            password,
        } => {
            if check_password(users_file, username, password)? {
                println!("Password is correct.");
            } else {
                bail!("Wrong username or password.");
            }
        }
    }
    Ok(())
}
