//! CLI argument parsing module
//!
//! This module handles command-line argument parsing and application entry point.

use crate::config::Config;
use crate::error::{EstateError, Result};
use crate::exit_code::exit_code_for_error;
use crate::utils::{FileUtils, StringUtils, UrlUtils};
use clap::{Arg, ArgAction, ArgMatches, Command};

pub mod runner;

/// Main entry point for the CLI application
pub fn run() {
    let matches = create_app().get_matches();
    crate::logging::init(matches.get_flag("verbose"));

    if let Err(err) = run_with_args(&matches) {
        let estate_err = err.downcast_ref::<EstateError>();
        if !matches.get_flag("silent") {
            eprintln!("estate: error: {:#}", err);
            if estate_err.is_some_and(EstateError::is_session_expired) {
                eprintln!("estate: your session has expired, run `estate login` to sign in again");
            }
        }
        std::process::exit(estate_err.map(exit_code_for_error).unwrap_or(1));
    }
}

/// Run estate with parsed command line arguments
fn run_with_args(matches: &ArgMatches) -> anyhow::Result<()> {
    use anyhow::Context;

    let config = build_config_from_args(matches).context("invalid configuration")?;
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| EstateError::Config(format!("Failed to create async runtime: {}", e)))?;
    rt.block_on(runner::dispatch(config, matches))
}

/// Create the CLI application structure
pub fn create_app() -> Command {
    Command::new("estate")
        .version(crate::VERSION)
        .about("Browse listings, manage favorites and follow inquiries on the estate marketplace")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(Arg::new("api-url")
            .long("api-url")
            .value_name("URL")
            .env("ESTATE_API_URL")
            .global(true)
            .help("Base URL of the marketplace API"))
        .arg(Arg::new("token-file")
            .long("token-file")
            .value_name("FILE")
            .env("ESTATE_TOKEN_FILE")
            .global(true)
            .help("Where the access token is kept between runs"))
        .arg(Arg::new("timeout")
            .long("timeout")
            .value_name("SECONDS")
            .global(true)
            .help("Maximum time for each request"))
        .arg(Arg::new("refresh-on-forbidden")
            .long("refresh-on-forbidden")
            .global(true)
            .help("Also refresh the session when the API answers 403")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .global(true)
            .help("Verbose output")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("silent")
            .short('s')
            .long("silent")
            .global(true)
            .help("Silent mode")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("compact")
            .long("compact")
            .global(true)
            .help("Print JSON on a single line")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("FILE")
            .global(true)
            .help("Write output to file"))
        .subcommand(Command::new("login")
            .about("Sign in with email and password")
            .arg(Arg::new("user")
                .short('u')
                .long("user")
                .value_name("EMAIL:PASSWORD")
                .required_unless_present_any(["demo", "password"])
                .conflicts_with_all(["demo", "password"])
                .help("Account credentials"))
            .arg(Arg::new("password")
                .long("password")
                .value_name("PASSWORD")
                .conflicts_with("demo")
                .help("Password for the remembered email"))
            .arg(Arg::new("demo")
                .long("demo")
                .help("Sign in with the demo account (development builds only)")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("remember")
                .long("remember")
                .help("Remember the email for the next sign-in")
                .action(ArgAction::SetTrue)))
        .subcommand(Command::new("oauth-login")
            .about("Hand an OAuth provider profile to the backend")
            .arg(Arg::new("provider")
                .long("provider")
                .value_name("google|facebook")
                .required(true))
            .arg(Arg::new("email").long("email").value_name("EMAIL").required(true))
            .arg(Arg::new("name").long("name").value_name("NAME"))
            .arg(Arg::new("picture").long("picture").value_name("URL").default_value("")))
        .subcommand(Command::new("register")
            .about("Create an account")
            .arg(Arg::new("first-name").long("first-name").value_name("NAME").required(true))
            .arg(Arg::new("last-name").long("last-name").value_name("NAME").required(true))
            .arg(Arg::new("email").long("email").value_name("EMAIL").required(true))
            .arg(Arg::new("password").long("password").value_name("PASSWORD").required(true))
            .arg(Arg::new("role").long("role").value_name("ROLE").default_value("buyer")))
        .subcommand(Command::new("password")
            .about("Change or reset the account password")
            .subcommand_required(true)
            .subcommand(Command::new("change")
                .arg(Arg::new("current").long("current").value_name("PASSWORD").required(true))
                .arg(Arg::new("new").long("new").value_name("PASSWORD").required(true)))
            .subcommand(Command::new("reset")
                .arg(Arg::new("token").long("token").value_name("TOKEN").required(true))
                .arg(Arg::new("new").long("new").value_name("PASSWORD").required(true))))
        .subcommand(Command::new("logout").about("Sign out and forget the stored token"))
        .subcommand(Command::new("me").about("Show the signed-in user"))
        .subcommand(Command::new("refresh").about("Exchange the refresh cookie for a new access token"))
        .subcommand(properties_command())
        .subcommand(Command::new("property")
            .about("Show one property and record it as recently viewed")
            .arg(Arg::new("id").required(true).index(1))
            .arg(Arg::new("similar")
                .long("similar")
                .help("List similar properties instead")
                .action(ArgAction::SetTrue)))
        .subcommand(Command::new("featured").about("List featured properties"))
        .subcommand(Command::new("newest").about("List the newest properties"))
        .subcommand(Command::new("favorite")
            .about("Check or change the favorite flag of a property")
            .subcommand_required(true)
            .subcommand(Command::new("check").arg(Arg::new("id").required(true).index(1)))
            .subcommand(Command::new("toggle").arg(Arg::new("id").required(true).index(1)))
            .subcommand(Command::new("add").arg(Arg::new("id").required(true).index(1)))
            .subcommand(Command::new("remove").arg(Arg::new("id").required(true).index(1)))
            .subcommand(Command::new("list")
                .about("List the favorites of a user (defaults to the signed-in user)")
                .arg(Arg::new("user-id").index(1))))
        .subcommand(Command::new("collections")
            .about("Manage saved collections")
            .subcommand_required(true)
            .subcommand(Command::new("list"))
            .subcommand(Command::new("create")
                .arg(Arg::new("name").required(true).index(1))
                .arg(Arg::new("default")
                    .long("default")
                    .help("Make it the default collection")
                    .action(ArgAction::SetTrue)))
            .subcommand(Command::new("add")
                .arg(Arg::new("collection").required(true).index(1))
                .arg(Arg::new("property").required(true).index(2)))
            .subcommand(Command::new("remove")
                .arg(Arg::new("collection").required(true).index(1))
                .arg(Arg::new("property").required(true).index(2)))
            .subcommand(Command::new("items")
                .arg(Arg::new("collection").required(true).index(1))))
        .subcommand(Command::new("inquiries")
            .about("Follow inquiries and their message threads")
            .subcommand_required(true)
            .subcommand(Command::new("list")
                .arg(Arg::new("search").long("search").value_name("TEXT"))
                .arg(Arg::new("status").long("status").value_name("STATUS")))
            .subcommand(Command::new("show").arg(Arg::new("id").required(true).index(1)))
            .subcommand(Command::new("send")
                .arg(Arg::new("id").required(true).index(1))
                .arg(Arg::new("message").required(true).index(2))))
        .subcommand(Command::new("recent")
            .about("Recently viewed properties")
            .subcommand_required(true)
            .subcommand(Command::new("list"))
            .subcommand(Command::new("remove").arg(Arg::new("id").required(true).index(1)))
            .subcommand(Command::new("clear")))
        .subcommand(Command::new("profile")
            .about("Update the signed-in user's profile")
            .subcommand_required(true)
            .subcommand(Command::new("update")
                .arg(Arg::new("first-name").long("first-name").value_name("NAME"))
                .arg(Arg::new("last-name").long("last-name").value_name("NAME"))
                .arg(Arg::new("username").long("username").value_name("NAME"))
                .arg(Arg::new("phone").long("phone").value_name("PHONE"))
                .arg(Arg::new("avatar").long("avatar").value_name("FILE"))))
}

fn properties_command() -> Command {
    Command::new("properties")
        .about("Search listings")
        .arg(Arg::new("page").long("page").value_name("N"))
        .arg(Arg::new("limit").long("limit").value_name("N"))
        .arg(Arg::new("all")
            .long("all")
            .help("Fetch every listing without pagination")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("sort")
            .long("sort")
            .value_name("recent|price_asc|price_desc"))
        .arg(Arg::new("min-price").long("min-price").value_name("AMOUNT"))
        .arg(Arg::new("max-price").long("max-price").value_name("AMOUNT"))
        .arg(Arg::new("bedrooms").long("bedrooms").value_name("N"))
        .arg(Arg::new("bathrooms").long("bathrooms").value_name("N"))
        .arg(Arg::new("type").long("type").value_name("TYPE"))
        .arg(Arg::new("status").long("status").value_name("STATUS"))
        .arg(Arg::new("city").long("city").value_name("CITY"))
        .arg(Arg::new("search").short('q').long("search").value_name("TEXT"))
        .arg(Arg::new("amenity")
            .long("amenity")
            .value_name("NAME")
            .action(ArgAction::Append))
}

/// Build configuration from the environment overlaid with command line arguments
fn build_config_from_args(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(url) = matches.get_one::<String>("api-url") {
        config.base_url = UrlUtils::normalize_base_url(url)?;
    }

    if let Some(token_file) = matches.get_one::<String>("token-file") {
        config.token_file = Some(FileUtils::expand_path(token_file)?);
    }

    if let Some(timeout_str) = matches.get_one::<String>("timeout") {
        config.timeout = StringUtils::parse_timeout(timeout_str)?;
    }

    if matches.get_flag("refresh-on-forbidden") {
        config.refresh_on_forbidden = true;
    }

    // Configure output
    config.output.verbose = matches.get_flag("verbose");
    config.output.silent = matches.get_flag("silent");
    config.output.format_json = !matches.get_flag("compact");

    if let Some(output_file) = matches.get_one::<String>("output") {
        config.output.file = Some(FileUtils::expand_path(output_file)?);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{build_config_from_args, create_app};
    use std::time::Duration;

    #[test]
    fn command_tree_is_consistent() {
        create_app().debug_assert();
    }

    #[test]
    fn flags_overlay_config() {
        let matches = create_app()
            .try_get_matches_from([
                "estate",
                "--api-url",
                "https://api.example.com/api/",
                "--timeout",
                "2m",
                "--compact",
                "me",
            ])
            .expect("parsed");
        let config = build_config_from_args(&matches).expect("config");
        assert_eq!(config.base_url, "https://api.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(!config.output.format_json);
    }

    #[test]
    fn login_requires_credentials_or_demo() {
        assert!(create_app().try_get_matches_from(["estate", "login"]).is_err());
        assert!(create_app()
            .try_get_matches_from(["estate", "login", "--demo"])
            .is_ok());
        assert!(create_app()
            .try_get_matches_from(["estate", "login", "--demo", "--user", "a@b.c:pw"])
            .is_err());
        assert!(create_app()
            .try_get_matches_from(["estate", "login", "--password", "pw"])
            .is_ok());
        assert!(create_app()
            .try_get_matches_from(["estate", "login", "--password", "pw", "--user", "a@b.c:pw"])
            .is_err());
    }
}
