//! Local smoke test: seeds the SQLite store and posts one comment-created event.
//!
//! Run the server with `NOTIFIER_STORE__MODE=sqlite NOTIFIER_PUSH__MODE=log`,
//! then `cargo run --bin emit`.

use serde_json::{json, Value};
use storage::Db;

use domain::protocol::encode_fields;

const BASE_URL: &str = "http://127.0.0.1:8080";
const DB_URL: &str = "sqlite://data/notifier.db";
const SITE_ID: &str = "demo-site";
const OWNER_ID: &str = "owner-1";
const COMMENTER_ID: &str = "visitor-1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let base_url = std::env::var("NOTIFIER_EMIT_URL").unwrap_or_else(|_| BASE_URL.to_string());
    let db_url = std::env::var("NOTIFIER_STORE__URL").unwrap_or_else(|_| DB_URL.to_string());

    println!("\n[1/3] Seeding {}...", db_url);
    let db = Db::new(&db_url).await?;
    let site = json!({ "userId": OWNER_ID, "siteName": "Demo Site" });
    let owner = json!({ "fcmToken": "demo-device-token" });
    db.put_document("sites", SITE_ID, as_fields(&site)?).await?;
    db.put_document("users", OWNER_ID, as_fields(&owner)?).await?;
    println!("   -> sites/{} owned by {}", SITE_ID, OWNER_ID);

    println!("\n[2/3] Posting comment-created event...");
    let comment = json!({ "userId": COMMENTER_ID, "text": "Nice post!" });
    let event = json!({
        "document": format!("sites/{}/comments/demo-comment", SITE_ID),
        "value": { "fields": encode_fields(as_fields(&comment)?) }
    });

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/events/comment-created", base_url))
        .json(&event)
        .send()
        .await?;

    println!("\n[3/3] Response:");
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        println!("   -> ✅ {} {}", status, body);
    } else {
        println!("   -> ❌ {} {}", status, body);
    }

    Ok(())
}

fn as_fields(value: &Value) -> anyhow::Result<&domain::Fields> {
    value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("expected a JSON object"))
}
