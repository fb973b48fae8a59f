use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, Pagination, UserNew};
use migration::MigratorTrait;
use sea_orm::Database;

#[derive(Parser, Debug)]
#[command(name = "mantia_admin")]
#[command(about = "Admin utilities for Mantia (bootstrap and rescue user accounts)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./mantia.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user, prompting for the password.
    Create(UserCreateArgs),
    /// Set a new password, clearing any lockout.
    ResetPassword(ResetPasswordArgs),
    /// Clear failed attempts and the lockout window.
    Unlock(UsernameArgs),
    /// Replace the pages a user can open.
    GrantPages(GrantPagesArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: Option<String>,
    /// Grant administrator rights.
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug)]
struct ResetPasswordArgs {
    #[arg(long)]
    username: String,
    /// Require a password change on next login.
    #[arg(long)]
    force_change: bool,
}

#[derive(Args, Debug)]
struct UsernameArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct GrantPagesArgs {
    #[arg(long)]
    username: String,
    /// Page names, e.g. `--page repuestos --page ordenes_compra`.
    #[arg(long = "page", required = true)]
    pages: Vec<String>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.trim().is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_engine(database_url: &str) -> Result<Engine, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build().await?)
}

async fn find_user(
    engine: &Engine,
    username: &str,
) -> Result<engine::User, Box<dyn Error + Send + Sync>> {
    match engine.user_by_username(username).await {
        Ok(user) => Ok(user),
        Err(EngineError::KeyNotFound(_)) => {
            eprintln!("user not found: {username}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let engine = connect_engine(&cli.database_url).await?;

    let Command::User(User { command }) = cli.command;
    match command {
        UserCommand::Create(args) => {
            let password = prompt_password_twice()?;
            let created = engine
                .new_user(UserNew {
                    username: args.username,
                    email: args.email,
                    password,
                    full_name: args.full_name,
                    active: true,
                    is_admin: args.admin,
                    role_id: None,
                    must_change_password: false,
                })
                .await;
            match created {
                Ok(user) => println!("created user: {} (id {})", user.username, user.id),
                Err(EngineError::ExistingKey(key)) => {
                    eprintln!("already taken: {key}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        UserCommand::ResetPassword(args) => {
            let user = find_user(&engine, &args.username).await?;
            let password = prompt_password_twice()?;
            engine
                .reset_password(user.id, &password, args.force_change)
                .await?;
            println!("password reset for {}", user.username);
        }
        UserCommand::Unlock(args) => {
            let user = find_user(&engine, &args.username).await?;
            engine.unlock_user(user.id).await?;
            println!("unlocked {}", user.username);
        }
        UserCommand::GrantPages(args) => {
            let user = find_user(&engine, &args.username).await?;
            let pages = engine.list_pages(Pagination::default()).await?;
            let mut page_ids = Vec::with_capacity(args.pages.len());
            for name in &args.pages {
                match pages.iter().find(|page| &page.name == name) {
                    Some(page) => page_ids.push(page.id),
                    None => {
                        eprintln!("page not found: {name}");
                        std::process::exit(2);
                    }
                }
            }
            let granted = engine.assign_pages(user.id, &page_ids).await?;
            let names: Vec<&str> = granted.iter().map(|page| page.name.as_str()).collect();
            println!("{} can open: {}", user.username, names.join(", "));
        }
    }

    Ok(())
}
