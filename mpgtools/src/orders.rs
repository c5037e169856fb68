use anyhow::{anyhow, Result};
use prettytable::{row, Table};
use reqwest::{Client, StatusCode};
use serde_json::Value;

pub async fn print_health(server: &str) -> Result<()> {
    let body = Client::new().get(format!("{server}/health")).send().await?.error_for_status()?.text().await?;
    print!("{body}");
    Ok(())
}

/// Fetches an order by id. `Ok(None)` means the server answered 404, which is how "webhook has not landed yet"
/// presents itself.
pub async fn fetch_order(client: &Client, server: &str, order_id: &str) -> Result<Option<Value>> {
    let response = client.get(format!("{server}/api/orders/{order_id}")).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = response.error_for_status()?;
    Ok(Some(response.json::<Value>().await?))
}

pub async fn fetch_order_once(server: &str, order_id: &str) -> Result<()> {
    match fetch_order(&Client::new(), server, order_id).await? {
        Some(order) => {
            println!("{}", serde_json::to_string_pretty(&order)?);
            Ok(())
        },
        None => Err(anyhow!("Order {order_id} not found")),
    }
}

pub async fn list_orders(server: &str, api_key: &str) -> Result<()> {
    let orders = Client::new()
        .get(format!("{server}/api/all-orders"))
        .header("x-api-key", api_key)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<Value>>()
        .await?;
    let mut table = Table::new();
    table.add_row(row!["Order", "Status", "Total", "Buyer", "Payment id", "Created"]);
    for order in &orders {
        table.add_row(row![
            order["id"].as_str().unwrap_or("?"),
            order["status"].as_str().unwrap_or("?"),
            format!("${:.2}", order["total"].as_f64().unwrap_or_default()),
            order["user_name"].as_str().unwrap_or(""),
            order["payment_id"].as_str().unwrap_or("-"),
            order["created_at"].as_str().unwrap_or(""),
        ]);
    }
    table.printstd();
    println!("{} orders", orders.len());
    Ok(())
}
