//! Executes a parsed command line against the API

use crate::api::{InquiryFilter, OAuthProfile, ProfileUpdate, PropertyQuery, Registration, SortKey};
use crate::config::Config;
use crate::error::{EstateError, Result};
use crate::http::auth::Auth;
use crate::http::ApiClient;
use crate::output::OutputWriter;
use crate::recent::LocalStore;
use crate::session::{AuthSession, FileTokenStore};
use crate::toggle::{FavoriteMembership, OptimisticToggle};
use anyhow::Context;
use clap::ArgMatches;
use log::{debug, warn};
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

const TOKEN_FILE: &str = "token.json";

/// Run the selected subcommand
pub async fn dispatch(config: Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let out = OutputWriter::new(config.output.clone());
    let local = config.resolved_data_dir().map(|dir| LocalStore::in_dir(&dir));
    let session = Arc::new(open_session(&config)?);
    let client = ApiClient::new(config, session).context("failed to build HTTP client")?;

    let Some((name, sub)) = matches.subcommand() else {
        return Err(EstateError::Config("no command given".to_string()).into());
    };
    debug!("Running `{}`", name);

    match name {
        "login" => login(&client, &out, local.as_ref(), sub).await?,
        "oauth-login" => oauth_login(&client, &out, sub).await?,
        "register" => {
            let registration = Registration {
                first_name: required(sub, "first-name")?.to_string(),
                last_name: required(sub, "last-name")?.to_string(),
                email: required(sub, "email")?.to_string(),
                password: required(sub, "password")?.to_string(),
                role: required(sub, "role")?.to_string(),
            };
            client.auth().register(&registration).await?;
            out.write_status("Account created, you can now sign in")?;
        }
        "password" => password(&client, &out, sub).await?,
        "logout" => {
            client.auth().logout().await?;
            out.write_status("Signed out")?;
        }
        "me" => out.write_json(&client.auth().me().await?)?,
        "refresh" => {
            client.auth().refresh().await.context("session refresh failed")?;
            out.write_status("Session refreshed")?;
        }
        "properties" => {
            let query = property_query(sub)?;
            out.write_json(&client.properties().list(&query).await?)?;
        }
        "property" => property(&client, &out, local.as_ref(), sub).await?,
        "featured" => out.write_json(&client.properties().featured().await?)?,
        "newest" => out.write_json(&client.properties().newest().await?)?,
        "favorite" => favorite(&client, &out, sub).await?,
        "collections" => collections(&client, &out, sub).await?,
        "inquiries" => inquiries(&client, &out, sub).await?,
        "recent" => recent(&out, local.as_ref(), sub)?,
        "profile" => profile(&client, &out, sub).await?,
        other => {
            return Err(EstateError::Unsupported(format!("unknown command `{}`", other)).into())
        }
    }
    Ok(())
}

fn open_session(config: &Config) -> Result<AuthSession> {
    let token_path: Option<PathBuf> = config
        .token_file
        .clone()
        .or_else(|| config.resolved_data_dir().map(|dir| dir.join(TOKEN_FILE)));
    let session = match token_path {
        Some(path) => AuthSession::new(Box::new(FileTokenStore::new(path, config.token_ttl))),
        None => AuthSession::in_memory(),
    };
    session.prime_from_store()?;
    Ok(session)
}

fn require_local(local: Option<&LocalStore>) -> Result<&LocalStore> {
    local.ok_or_else(|| {
        EstateError::Config("no data directory available, set ESTATE_DATA_DIR".to_string())
    })
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| EstateError::Config(format!("missing argument <{}>", name)))
}

fn parse_opt<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>> {
    matches
        .get_one::<String>(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| EstateError::Config(format!("Invalid value for --{}: '{}'", name, raw)))
        })
        .transpose()
}

async fn login(
    client: &ApiClient,
    out: &OutputWriter,
    local: Option<&LocalStore>,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    let (email, password) = login_credentials(client.config(), local, matches)?;
    let response = client.auth().login(&email, &password).await?;

    if let Some(local) = local {
        let keep = matches.get_flag("remember") || matches.contains_id("password");
        if let Err(err) = local.set_remembered_email(keep.then_some(email.as_str())) {
            warn!("Could not update remembered email: {}", err);
        }
    }
    out.write_status(response.message.as_deref().unwrap_or("Signed in"))?;
    Ok(())
}

/// Email and password for `login`: the demo account, `--user`, or the
/// remembered email with `--password`.
fn login_credentials(
    config: &Config,
    local: Option<&LocalStore>,
    matches: &ArgMatches,
) -> Result<(String, String)> {
    if matches.get_flag("demo") {
        let (email, password) = config.demo_credentials().ok_or_else(|| {
            EstateError::Unsupported("demo credentials are not enabled".to_string())
        })?;
        return Ok((email.to_string(), password.to_string()));
    }
    if let Some(password) = matches.get_one::<String>("password") {
        let email = require_local(local)?.remembered_email()?.ok_or_else(|| {
            EstateError::Auth("no remembered email, sign in with --user first".to_string())
        })?;
        return Ok((email, password.clone()));
    }
    Auth::parse_credentials(required(matches, "user")?)
}

async fn oauth_login(client: &ApiClient, out: &OutputWriter, matches: &ArgMatches) -> anyhow::Result<()> {
    let provider = required(matches, "provider")?.to_ascii_lowercase();
    if client.config().oauth.provider(&provider).is_none() {
        return Err(EstateError::Unsupported(format!(
            "OAuth provider `{}` is not configured",
            provider
        ))
        .into());
    }
    let profile = OAuthProfile {
        email: required(matches, "email")?.to_string(),
        name: matches.get_one::<String>("name").cloned(),
        picture: matches
            .get_one::<String>("picture")
            .cloned()
            .unwrap_or_default(),
        provider,
    };
    client.auth().oauth_login(&profile).await?;
    out.write_status("Signed in")?;
    Ok(())
}

async fn password(client: &ApiClient, out: &OutputWriter, matches: &ArgMatches) -> anyhow::Result<()> {
    let auth = client.auth();
    match matches.subcommand() {
        Some(("change", sub)) => {
            auth.change_password(required(sub, "current")?, required(sub, "new")?)
                .await?;
            out.write_status("Password changed")?;
        }
        Some(("reset", sub)) => {
            let message = auth
                .reset_password(required(sub, "token")?, required(sub, "new")?)
                .await?;
            out.write_status(message.as_deref().unwrap_or("Password reset"))?;
        }
        _ => return Err(EstateError::Config("missing password action".to_string()).into()),
    }
    Ok(())
}

fn property_query(matches: &ArgMatches) -> Result<PropertyQuery> {
    let mut query = PropertyQuery {
        all: matches.get_flag("all").then_some(true),
        page: parse_opt(matches, "page")?,
        limit: parse_opt(matches, "limit")?,
        price_min: parse_opt(matches, "min-price")?,
        price_max: parse_opt(matches, "max-price")?,
        bedrooms: parse_opt(matches, "bedrooms")?,
        bathrooms: parse_opt(matches, "bathrooms")?,
        property_type: matches.get_one::<String>("type").cloned(),
        status: matches.get_one::<String>("status").cloned(),
        city: matches.get_one::<String>("city").cloned(),
        search_query: matches.get_one::<String>("search").cloned(),
        amenities: matches
            .get_many::<String>("amenity")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        ..PropertyQuery::default()
    };
    if let Some(sort) = matches.get_one::<String>("sort") {
        let key = SortKey::from_str(sort)
            .map_err(|_| EstateError::Config(format!("Unknown sort order: {}", sort)))?;
        query = query.sorted(key);
    }
    Ok(query)
}

async fn property(
    client: &ApiClient,
    out: &OutputWriter,
    local: Option<&LocalStore>,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    let id = required(matches, "id")?;
    if matches.get_flag("similar") {
        out.write_json(&client.properties().similar(id).await?)?;
        return Ok(());
    }

    let property = client.properties().get(id).await?;
    if let Some(local) = local {
        if let Err(err) = local.save_viewed(&property) {
            warn!("Could not record recently viewed property: {}", err);
        }
    }
    out.write_json(&property)?;
    Ok(())
}

async fn favorite(client: &ApiClient, out: &OutputWriter, matches: &ArgMatches) -> anyhow::Result<()> {
    let Some((action, sub)) = matches.subcommand() else {
        return Err(EstateError::Config("missing favorite action".to_string()).into());
    };
    let favorites = client.favorites();

    if action == "list" {
        let user_id = match sub.get_one::<String>("user-id") {
            Some(id) => id.clone(),
            None => client
                .auth()
                .me()
                .await?
                .id
                .ok_or_else(|| EstateError::Auth("signed-in user has no id".to_string()))?,
        };
        out.write_json(&favorites.list_for_user(&user_id).await?)?;
        return Ok(());
    }

    let id = required(sub, "id")?;
    let is_favorite = match action {
        "check" => favorites.check(id).await?,
        "add" => {
            favorites.add(id).await?;
            true
        }
        "remove" => {
            favorites.remove(id).await?;
            false
        }
        "toggle" => {
            let toggle = OptimisticToggle::new(FavoriteMembership::new(favorites, id));
            toggle
                .initialize()
                .await
                .context("could not read the current favorite state")?;
            toggle.try_toggle().await?
        }
        other => {
            return Err(EstateError::Unsupported(format!("favorite {}", other)).into());
        }
    };
    out.write_json(&json!({ "propertyId": id, "isFavorite": is_favorite }))?;
    Ok(())
}

async fn collections(client: &ApiClient, out: &OutputWriter, matches: &ArgMatches) -> anyhow::Result<()> {
    let api = client.collections();
    match matches.subcommand() {
        Some(("list", _)) => out.write_json(&api.list().await?)?,
        Some(("create", sub)) => {
            let is_default = sub.get_flag("default").then_some(true);
            out.write_json(&api.create(required(sub, "name")?, is_default).await?)?;
        }
        Some(("add", sub)) => {
            api.add_item(required(sub, "collection")?, required(sub, "property")?)
                .await?;
            out.write_status("Added to collection")?;
        }
        Some(("remove", sub)) => {
            api.remove_item(required(sub, "collection")?, required(sub, "property")?)
                .await?;
            out.write_status("Removed from collection")?;
        }
        Some(("items", sub)) => {
            out.write_json(&api.list_items(required(sub, "collection")?).await?)?;
        }
        _ => return Err(EstateError::Config("missing collections action".to_string()).into()),
    }
    Ok(())
}

async fn inquiries(client: &ApiClient, out: &OutputWriter, matches: &ArgMatches) -> anyhow::Result<()> {
    let api = client.inquiries();
    match matches.subcommand() {
        Some(("list", sub)) => {
            let status = match sub.get_one::<String>("status") {
                Some(raw) => Some(raw.parse().map_err(|_| {
                    EstateError::Config(format!("Unknown inquiry status: {}", raw))
                })?),
                None => None,
            };
            let filter = InquiryFilter {
                search: sub.get_one::<String>("search").cloned(),
                status,
            };
            out.write_json(&api.list(&filter).await?)?;
        }
        Some(("show", sub)) => out.write_json(&api.thread(required(sub, "id")?).await?)?,
        Some(("send", sub)) => {
            let message = api
                .send_message(required(sub, "id")?, required(sub, "message")?)
                .await?;
            out.write_json(&message)?;
        }
        _ => return Err(EstateError::Config("missing inquiries action".to_string()).into()),
    }
    Ok(())
}

fn recent(out: &OutputWriter, local: Option<&LocalStore>, matches: &ArgMatches) -> anyhow::Result<()> {
    let local = require_local(local)?;
    match matches.subcommand() {
        Some(("list", _)) => out.write_json(&local.recently_viewed()?)?,
        Some(("remove", sub)) => out.write_json(&local.remove_viewed(required(sub, "id")?)?)?,
        Some(("clear", _)) => {
            local.clear_viewed()?;
            out.write_status("Cleared recently viewed properties")?;
        }
        _ => return Err(EstateError::Config("missing recent action".to_string()).into()),
    }
    Ok(())
}

async fn profile(client: &ApiClient, out: &OutputWriter, matches: &ArgMatches) -> anyhow::Result<()> {
    let Some(("update", sub)) = matches.subcommand() else {
        return Err(EstateError::Config("missing profile action".to_string()).into());
    };
    let update = ProfileUpdate {
        first_name: sub.get_one::<String>("first-name").cloned(),
        last_name: sub.get_one::<String>("last-name").cloned(),
        username: sub.get_one::<String>("username").cloned(),
        phone: sub.get_one::<String>("phone").cloned(),
    };
    let avatar = sub.get_one::<String>("avatar");
    if update.is_empty() && avatar.is_none() {
        return Err(EstateError::Config("nothing to update".to_string()).into());
    }

    let profile = client.profile();
    let mut user = None;
    if !update.is_empty() {
        user = Some(profile.update_me(&update).await?);
    }
    if let Some(path) = avatar {
        let path = crate::utils::FileUtils::expand_path(path)?;
        user = Some(
            profile
                .upload_avatar(&path)
                .await
                .with_context(|| format!("avatar upload failed for {}", path.display()))?,
        );
    }
    out.write_json(&user)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{login_credentials, property_query};
    use crate::api::SortOrder;
    use crate::cli::create_app;
    use crate::config::Config;
    use crate::error::EstateError;
    use crate::recent::LocalStore;
    use tempfile::TempDir;

    #[test]
    fn login_uses_remembered_email_with_password() {
        let dir = TempDir::new().expect("temp dir");
        let local = LocalStore::in_dir(dir.path());
        let config = Config::default();
        let matches = create_app()
            .try_get_matches_from(["estate", "login", "--password", "s3cret"])
            .expect("parsed");
        let (_, sub) = matches.subcommand().expect("subcommand");

        let err = login_credentials(&config, Some(&local), sub).expect_err("nothing remembered");
        assert!(matches!(err, EstateError::Auth(_)));

        local
            .set_remembered_email(Some("ada@example.com"))
            .expect("remembered");
        let (email, password) = login_credentials(&config, Some(&local), sub).expect("credentials");
        assert_eq!(email, "ada@example.com");
        assert_eq!(password, "s3cret");
    }

    #[test]
    fn login_prefers_explicit_user() {
        let config = Config::default();
        let matches = create_app()
            .try_get_matches_from(["estate", "login", "--user", "bob@example.com:pw"])
            .expect("parsed");
        let (_, sub) = matches.subcommand().expect("subcommand");
        let (email, password) = login_credentials(&config, None, sub).expect("credentials");
        assert_eq!(email, "bob@example.com");
        assert_eq!(password, "pw");
    }

    #[test]
    fn property_query_from_flags() {
        let matches = create_app()
            .try_get_matches_from([
                "estate",
                "properties",
                "--min-price",
                "100000",
                "--bedrooms",
                "3",
                "--amenity",
                "pool",
                "--amenity",
                "garage",
                "--sort",
                "price_desc",
            ])
            .expect("parsed");
        let (_, sub) = matches.subcommand().expect("subcommand");
        let query = property_query(sub).expect("query");
        assert_eq!(query.price_min, Some(100_000));
        assert_eq!(query.bedrooms, Some(3));
        assert_eq!(query.amenities, vec!["pool", "garage"]);
        assert_eq!(query.sort_by.as_deref(), Some("price"));
        assert_eq!(query.order, Some(SortOrder::Desc));
    }

    #[test]
    fn property_query_rejects_bad_numbers() {
        let matches = create_app()
            .try_get_matches_from(["estate", "properties", "--page", "two"])
            .expect("parsed");
        let (_, sub) = matches.subcommand().expect("subcommand");
        assert!(property_query(sub).is_err());
    }
}
