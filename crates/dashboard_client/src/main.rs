// Dashboard CLI
//
// Operator front end for the interiors dashboard API.
// Signs in, keeps the token pair on disk and prints resources as JSON.

use anyhow::{anyhow, bail, Context};
use dashboard_client::{ApiError, ContactFilter, DashboardClient, Page, QuoteStatus};
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: dashboard-cli <command> [args]

Commands:
  login <email> [password]         Sign in (password falls back to DASHBOARD_PASSWORD)
  logout                           Forget the stored session
  status                           Show whether a session is stored
  summary                          Dashboard totals
  invoices                         List invoices
  invoice <id>                     Show one invoice
  mark-paid <id>                   Mark an invoice as paid
  receipts                         List receipts
  contacts [status]                List quote requests, optionally by status
  set-quote-status <id> <status>   pending | approved | rejected | converted
  projects [category-slug]         List projects
  newsletter                       List newsletter subscribers
  services                         List services
  testimonials                     List testimonials
  approve-testimonial <id>         Publish a testimonial
  download-invoice <id> <file>     Save an invoice PDF
  download-receipt <id> <file>     Save a receipt PDF

Environment:
  DASHBOARD_API_URL     API root (default https://oplueaswsapi.pythonanywhere.com/api)
  DASHBOARD_TOKEN_FILE  Token file (default ~/.interiors_dashboard/tokens.json)
  RUST_LOG              Log filter (default dashboard_client=info)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "dashboard_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        println!("{USAGE}");
        return Ok(());
    };

    let client = DashboardClient::from_env().context("Failed to initialize API client")?;

    let result = run(&client, command, &args).await;
    if let Err(e) = &result {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_session_expired) {
            eprintln!("[WARN] Session expired. Run `dashboard-cli login <email>` to sign in again.");
        }
    }
    result
}

async fn run(client: &DashboardClient, command: &str, args: &[String]) -> anyhow::Result<()> {
    let arg = |i: usize, name: &str| arg_at(args, i, name);

    match command {
        "login" => {
            let email = arg(1, "email")?;
            let password = match args.get(2) {
                Some(p) => p.clone(),
                None => env::var("DASHBOARD_PASSWORD")
                    .context("Pass a password or set DASHBOARD_PASSWORD")?,
            };
            client.auth().login(email, &password).await?;
            println!("[OK] Signed in as {email}");
            if let Some(path) = client.gate().tokens().path() {
                println!("[OK] Session saved to {}", path.display());
            }
        }
        "logout" => {
            client.auth().logout();
            println!("[OK] Signed out");
        }
        "status" => {
            let tokens = client.gate().tokens();
            match tokens.updated_at() {
                Some(at) => println!("[OK] Signed in (tokens updated {})", at.to_rfc3339()),
                None => println!("[INFO] Not signed in"),
            }
        }
        "summary" => print_json(&client.dashboard().summary::<Value>().await?)?,
        "invoices" => print_page(client.invoices().list(&[]).await?)?,
        "invoice" => print_json(&client.invoices().get::<Value>(arg(1, "id")?).await?)?,
        "mark-paid" => print_json(&client.invoices().mark_paid(arg(1, "id")?).await?)?,
        "receipts" => print_page(client.receipts().list(&[]).await?)?,
        "contacts" => {
            let status = args
                .get(1)
                .map(|s| s.parse::<QuoteStatus>())
                .transpose()
                .map_err(|e| anyhow!(e))?;
            let filter = ContactFilter {
                status,
                page_size: None,
            };
            print_page(client.contacts().list(&filter).await?)?
        }
        "set-quote-status" => {
            let id = arg(1, "id")?;
            let status: QuoteStatus = arg(2, "status")?.parse().map_err(|e: String| anyhow!(e))?;
            print_json(&client.contacts().update_status::<Value>(id, status).await?)?
        }
        "projects" => {
            let page = match args.get(1) {
                Some(slug) => client.projects().list(&[("category__slug", slug.as_str())]).await?,
                None => client.projects().list(&[]).await?,
            };
            print_page(page)?
        }
        "newsletter" => print_page(client.newsletter().subscribers(&[]).await?)?,
        "services" => print_page(client.services().list().await?)?,
        "testimonials" => print_page(client.testimonials().list(&[]).await?)?,
        "approve-testimonial" => {
            print_json(&client.testimonials().approve::<Value>(arg(1, "id")?).await?)?
        }
        "download-invoice" => {
            let pdf = client.invoices().download_pdf(arg(1, "id")?).await?;
            save(arg(2, "file")?, &pdf)?
        }
        "download-receipt" => {
            let pdf = client.receipts().download_pdf(arg(1, "id")?).await?;
            save(arg(2, "file")?, &pdf)?
        }
        "help" | "--help" | "-h" => println!("{USAGE}"),
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    }

    Ok(())
}

fn arg_at<'a>(args: &'a [String], i: usize, name: &str) -> anyhow::Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing <{name}>\n\n{USAGE}"))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_page(page: Page<Value>) -> anyhow::Result<()> {
    match page.count {
        Some(count) => eprintln!("[INFO] {} of {} records", page.len(), count),
        None => eprintln!("[INFO] {} records", page.len()),
    }
    print_json(&Value::Array(page.results))
}

fn save(path: &str, bytes: &[u8]) -> anyhow::Result<()> {
    let path = PathBuf::from(path);
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("[OK] Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
