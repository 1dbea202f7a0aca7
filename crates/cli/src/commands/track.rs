use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::info;

use ordertrack_core::config::LoadOptions;
use ordertrack_core::resolver::{NotFoundReason, OrderQuery, Resolution, ResolutionSummary};
use ordertrack_db::SqlOrderStore;

use crate::commands::{build_runtime, load_config, open_pool, CommandFailure, CommandResult};
use crate::TrackArgs;

pub fn run(options: LoadOptions, args: TrackArgs) -> CommandResult {
    let config = match load_config("track", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("track") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let query = order_query(args);
    let resolver = config.resolver.build_resolver();

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let store = SqlOrderStore::new(pool.clone());
        let resolution = resolver.resolve(&store, &query, today).await;
        pool.close().await;
        Ok::<Resolution, CommandFailure>(resolution)
    });

    let resolution = match result {
        Ok(resolution) => resolution,
        Err(failure) => return CommandResult::from_failure("track", failure),
    };

    if let Resolution::NotFound(reason @ NotFoundReason::StoreUnavailable { .. }) = &resolution {
        return CommandResult::failure("track", "store_unavailable", reason.to_string(), 4);
    }

    let summary = ResolutionSummary::from_resolution(&resolution, config.resolver.display_limit);
    info!(
        event_name = "cli.track.resolved",
        outcome = summary.outcome,
        total = summary.total,
        today = %today,
        "track command resolved"
    );

    let exit_code = if matches!(resolution, Resolution::NotFound(_)) { 1 } else { 0 };
    let message = summary_message(&summary, today);
    let payload = serde_json::to_value(&summary).unwrap_or(Value::Null);
    CommandResult::with_result("track", message, Some(payload), exit_code)
}

fn order_query(args: TrackArgs) -> OrderQuery {
    OrderQuery {
        order_id: args.order_id,
        tracking_id: args.tracking_id,
        customer_id: args.customer_id,
        natural_query: args.query,
    }
}

fn summary_message(summary: &ResolutionSummary, today: NaiveDate) -> String {
    match (summary.outcome, &summary.order, &summary.reason) {
        (_, Some(order), _) => format!("found order {} ({})", order.order_id, order.status),
        (_, _, Some(reason)) => reason.message.clone(),
        ("recent", _, _) => format!("{} recent orders", summary.total),
        _ => format!("{} candidate orders relative to {today}", summary.total),
    }
}
