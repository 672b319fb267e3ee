//! OrgDesk entity CLI
//!
//! Talks to any entity endpoint through the same client the screens use,
//! printing each result as JSON.
//!
//! Usage:
//!   orgdesk --api-url https://api.example.com/api --org acme tasks list --page 2
//!   orgdesk --org acme tasks update '{"_id": "t1", "title": "B"}'

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use orgdesk_client::{EntityClient, EntityClientConfig, ReqwestTransport, TransportConfig};
use orgdesk_types::{
    MutationResult, OrgScope, OrganizationId, QueryDescriptor, Scalar, SortDirection,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "orgdesk")]
#[command(about = "Query and mutate OrgDesk entities")]
struct Args {
    /// Base URL of the REST API
    #[arg(long, env = "ORGDESK_API_URL", default_value = "http://localhost:8080/api")]
    api_url: String,

    /// Organization to scope requests to
    #[arg(long, env = "ORGDESK_ORG_ID")]
    org: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Extra request header (`name=value`), repeatable
    #[arg(long = "header", value_name = "NAME=VALUE")]
    headers: Vec<String>,

    /// Entity path, e.g. `tasks` or `admin/feature-flags`
    entity: String,

    /// Treat the entity as tenant-independent (no organizationId)
    #[arg(long)]
    global: bool,

    /// Row id field; `_id` then `id` when omitted
    #[arg(long)]
    id_field: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of rows
    List {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
        /// Field to sort by
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
        #[arg(long)]
        search: Option<String>,
        /// Extra filter (`key=value`), repeatable
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },
    /// Fetch one row
    Get { id: String },
    /// Create a row from a JSON object
    Create { json: String },
    /// Update a row from a JSON object carrying its id
    Update { json: String },
    /// Delete a row
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let transport = ReqwestTransport::new(TransportConfig {
        api_base_url: args.api_url.clone(),
        timeout_secs: args.timeout,
        default_headers: parse_pairs(&args.headers, "header")?,
        ..Default::default()
    })
    .context("failed to build HTTP client")?;

    let mut config = EntityClientConfig::new(&args.entity);
    if !args.global {
        config = config.org_scoped();
    }
    if let Some(field) = &args.id_field {
        config = config.with_id_field(field);
    }
    let client: EntityClient<Value> = EntityClient::new(config, Arc::new(transport));
    let scope = scope_from(args.org.as_deref())?;
    debug!("{} via {} ({:?})", client.entity_name(), args.api_url, scope);

    let output = match args.command {
        Command::List {
            page,
            page_size,
            sort,
            desc,
            search,
            filters,
        } => {
            let mut query = QueryDescriptor::new().with_page(page);
            if let Some(size) = page_size {
                query = query.with_page_size(size);
            }
            if let Some(field) = sort {
                let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
                query = query.with_sort(field, direction);
            }
            if let Some(term) = search {
                query = query.with_search(term);
            }
            for (key, value) in parse_pairs(&filters, "filter")? {
                query = query.with_filter(key, parse_scalar(&value));
            }
            query.validate().context("invalid list options")?;
            render(client.fetch_all(&query, &scope).await)?
        }
        Command::Get { id } => render(client.fetch(Some(id.as_str()), &scope).await)?,
        Command::Create { json } => {
            let body = parse_object(&json)?;
            render(client.create(&body, &scope).await)?
        }
        Command::Update { json } => {
            let body = parse_object(&json)?;
            render(client.update(&body, &scope).await)?
        }
        Command::Delete { id } => render(client.delete(&id, &scope).await)?,
    };

    println!("{output}");
    Ok(())
}

fn scope_from(org: Option<&str>) -> Result<OrgScope> {
    match org {
        Some(raw) => {
            let org = OrganizationId::parse(raw).context("invalid --org")?;
            info!("scoping requests to organization {}", org);
            Ok(OrgScope::Tenant(org))
        }
        None => Ok(OrgScope::Unscoped),
    }
}

/// Pretty JSON for a successful result; an error naming the status otherwise.
fn render<T: serde::Serialize>(result: MutationResult<T>) -> Result<String> {
    if let Some(message) = result.error_message() {
        bail!("request failed ({}): {}", result.status, message);
    }
    let body = match &result.data {
        Some(data) => serde_json::to_value(data)?,
        None => Value::Null,
    };
    Ok(serde_json::to_string_pretty(&body)?)
}

fn parse_pairs(raw: &[String], what: &str) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("{what} `{pair}` is not KEY=VALUE"))?;
            let key = key.trim();
            if key.is_empty() {
                bail!("{what} `{pair}` has an empty key");
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Numbers and booleans are sent as typed scalars, everything else as text.
fn parse_scalar(value: &str) -> Scalar {
    if let Ok(i) = value.parse::<i64>() {
        return Scalar::Int(i);
    }
    match value {
        "true" => Scalar::Bool(true),
        "false" => Scalar::Bool(false),
        _ => Scalar::Text(value.to_string()),
    }
}

fn parse_object(json: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(json).context("body is not valid JSON")?;
    if !value.is_object() {
        bail!("body must be a JSON object");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_on_first_equals() {
        let pairs = parse_pairs(&["a=1".into(), " b = x=y ".into()], "filter").unwrap();
        assert_eq!(pairs.get("a").map(String::as_str), Some("1"));
        assert_eq!(pairs.get("b").map(String::as_str), Some("x=y"));
        assert!(parse_pairs(&["nokey".into()], "filter").is_err());
        assert!(parse_pairs(&["=v".into()], "filter").is_err());
    }

    #[test]
    fn scalars_keep_their_type() {
        assert_eq!(parse_scalar("42"), Scalar::Int(42));
        assert_eq!(parse_scalar("true"), Scalar::Bool(true));
        assert_eq!(parse_scalar("open"), Scalar::Text("open".into()));
    }

    #[test]
    fn render_reports_failures() {
        let ok = render(MutationResult::success(200, serde_json::json!({"a": 1}))).unwrap();
        assert!(ok.contains("\"a\": 1"));
        let err = render::<Value>(MutationResult::failure(404, "not found")).unwrap_err();
        assert_eq!(err.to_string(), "request failed (404): not found");
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "orgdesk", "--org", "acme", "tasks", "list", "--sort", "order", "--desc",
            "--filter", "status=open",
        ])
        .unwrap();
        assert_eq!(args.entity, "tasks");
        assert!(matches!(args.command, Command::List { desc: true, .. }));
    }
}
