use chrono::NaiveDate;
use serde_json::Value;

use ordertrack_core::resolver::{NotFoundReason, OrderQuery, OrderResolver, Resolution};
use ordertrack_db::{connect_with_settings, migrations, DemoOrderDataset, SqlOrderStore};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

// Demo fixture dates are anchored on Monday 2024-06-10.
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date")
}

async fn seeded_store() -> SeedContractTestResult<SqlOrderStore> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    let store = SqlOrderStore::new(pool);
    DemoOrderDataset::load(&store).await.map_err(|error| format!("seed: {error}"))?;
    Ok(store)
}

fn order_ids(resolution: &Resolution) -> Vec<String> {
    match resolution {
        Resolution::Found(order) => vec![order.order_id.0.clone()],
        Resolution::Ambiguous(ranked) => {
            ranked.iter().map(|candidate| candidate.order.order_id.0.clone()).collect()
        }
        Resolution::Recent { orders, .. } => {
            orders.iter().map(|order| order.order_id.0.clone()).collect()
        }
        Resolution::NotFound(_) => Vec::new(),
    }
}

#[test]
fn demo_fixture_covers_every_status() -> SeedContractTestResult {
    let fixture: Value = serde_json::from_str(DemoOrderDataset::JSON)
        .map_err(|error| format!("demo fixture must parse: {error}"))?;
    let orders = fixture.as_array().ok_or("demo fixture should be an array")?;

    for status in ["processing", "shipped", "delivered", "cancelled"] {
        require!(
            orders.iter().any(|order| order["status"].as_str() == Some(status)),
            "no demo order with status {status}"
        );
    }

    let iphone_orders = orders
        .iter()
        .filter(|order| {
            order["product_name"].as_str().is_some_and(|name| name.starts_with("iPhone"))
        })
        .count();
    require_eq!(iphone_orders, 2, "ambiguous iPhone lookup needs two iPhone orders");
    Ok(())
}

#[tokio::test]
async fn ambiguous_iphone_query_ranks_both_same_day_orders() -> SeedContractTestResult {
    let store = seeded_store().await?;
    let resolver = OrderResolver::default();

    let resolution = resolver
        .resolve(&store, &OrderQuery::natural("my iPhone order from last Friday"), today())
        .await;

    require_eq!(resolution.outcome(), "ambiguous");
    require_eq!(order_ids(&resolution), vec!["ORD-2024-0001", "ORD-2024-0004"]);
    if let Resolution::Ambiguous(ranked) = &resolution {
        require!(ranked.iter().all(|candidate| candidate.match_score == 8));
    }
    Ok(())
}

#[tokio::test]
async fn customer_prefilter_disambiguates_iphone_query() -> SeedContractTestResult {
    let store = seeded_store().await?;
    let query =
        OrderQuery::natural("my iPhone order from last Friday").with_customer_id("CUST-001");

    let resolution = OrderResolver::default().resolve(&store, &query, today()).await;

    require_eq!(resolution.outcome(), "found");
    require_eq!(order_ids(&resolution), vec!["ORD-2024-0001"]);
    Ok(())
}

#[tokio::test]
async fn direct_lookups_resolve_seeded_orders() -> SeedContractTestResult {
    let store = seeded_store().await?;
    let resolver = OrderResolver::default();

    let by_id = resolver.resolve(&store, &OrderQuery::by_order_id("ORD-2024-0006"), today()).await;
    require_eq!(order_ids(&by_id), vec!["ORD-2024-0006"]);

    let by_tracking = resolver
        .resolve(&store, &OrderQuery::by_tracking_id("1Z999AA10123456787"), today())
        .await;
    require_eq!(order_ids(&by_tracking), vec!["ORD-2024-0005"]);
    let address = by_tracking.found().and_then(|order| order.shipping_address.clone());
    require!(address.is_none(), "headphones order is stored without an address");

    let macbook = resolver.resolve(&store, &OrderQuery::natural("macbook"), today()).await;
    require_eq!(order_ids(&macbook), vec!["ORD-2024-0003"]);
    let items = macbook.found().map(|order| order.items.len());
    require_eq!(items, Some(2));
    Ok(())
}

#[tokio::test]
async fn customer_only_query_lists_recent_orders_newest_first() -> SeedContractTestResult {
    let store = seeded_store().await?;

    let query = OrderQuery::by_customer_id("CUST-001");

    let resolution = OrderResolver::default().resolve(&store, &query, today()).await;

    require_eq!(order_ids(&resolution), vec!["ORD-2024-0003", "ORD-2024-0001", "ORD-2024-0002"]);
    if let Resolution::Recent { total, .. } = resolution {
        require_eq!(total, 3);
    } else {
        return Err(format!("expected recent listing, got {}", resolution.outcome()));
    }
    Ok(())
}

#[tokio::test]
async fn unmatched_lookups_explain_why() -> SeedContractTestResult {
    let store = seeded_store().await?;
    let resolver = OrderResolver::default();

    let vague = resolver.resolve(&store, &OrderQuery::natural("something nice"), today()).await;
    require!(
        matches!(vague, Resolution::NotFound(NotFoundReason::NoMatches { .. })),
        "vague query should not match: {vague:?}"
    );

    let unknown = resolver.resolve(&store, &OrderQuery::by_customer_id("CUST-999"), today()).await;
    require!(matches!(unknown, Resolution::NotFound(NotFoundReason::NoCustomerOrders(_))));

    let empty = resolver.resolve(&store, &OrderQuery::default(), today()).await;
    require!(matches!(empty, Resolution::NotFound(NotFoundReason::InsufficientQuery)));
    Ok(())
}
