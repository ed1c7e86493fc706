//! `lrstore` - CLI for the lading record backend
//!
//! This binary runs the HTTP server and provides maintenance commands for
//! the local database and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use lrstore::cli::{Cli, Command, ConfigCommand, ServeCommand, UsersCommand};
use lrstore::storage::UserStore;
use lrstore::{init_logging, Config, Server, Storage, User};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(load_config(cli.config)?, serve_cmd).await,
        Command::Status(status_cmd) => {
            handle_status(&load_config(cli.config)?, status_cmd.json).await
        }
        Command::Users(users_cmd) => handle_users(&load_config(cli.config)?, users_cmd).await,
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(path).context("failed to load configuration")
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open database at {}", path.display()))
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let storage = open_storage(&config)?;
    Server::new(&config, storage).start().await?;
    Ok(())
}

async fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats().await?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "listen_addr": config.socket_addr(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("lrstore status");
        println!("--------------");
        println!("Database:      {}", storage.path().display());
        println!("Listen addr:   {}", config.socket_addr());
        println!("LR records:    {}", stats.lr_records);
        println!("Items:         {}", stats.items);
        println!("Users:         {}", stats.users);
        println!("Size:          {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

async fn handle_users(config: &Config, cmd: UsersCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let users = UserStore::new(storage.clone());

    match cmd {
        UsersCommand::Add {
            username,
            name,
            email,
            mobile,
            role,
        } => {
            let user = users
                .add(User {
                    email,
                    mobile,
                    role,
                    ..User::new(username, name)
                })
                .await?;
            println!("Added user '{}'", user.username);
        }
        UsersCommand::List { json } => {
            let all = users.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No users.");
            } else {
                for user in &all {
                    println!(
                        "{:<16} {:<24} {}",
                        user.username,
                        user.name,
                        user.role.as_deref().unwrap_or("-")
                    );
                }
            }
        }
    }

    storage.close().await?;
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                if config.server.cors_origins.is_empty() {
                    println!("  CORS origins:       any");
                } else {
                    println!(
                        "  CORS origins:       {}",
                        config.server.cors_origins.join(", ")
                    );
                }
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
