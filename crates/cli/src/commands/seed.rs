use ordertrack_core::config::LoadOptions;
use ordertrack_db::fixtures::OrderSeedInfo;
use ordertrack_db::{migrations, DemoOrderDataset, SqlOrderStore};

use crate::commands::{build_runtime, load_config, open_pool, CommandFailure, CommandResult};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let store = SqlOrderStore::new(pool.clone());
        let seed_result = DemoOrderDataset::load(&store)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoOrderDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<Vec<OrderSeedInfo>, CommandFailure> = if !verification.all_present {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_failure_message(&failed_checks), 6u8))
        } else {
            Ok(seed_result.orders_seeded)
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(orders) => {
            let descriptions: Vec<String> = orders
                .iter()
                .map(|o| format!("  - {} [{}]: {}", o.order_id, o.customer_id, o.description))
                .collect();
            let message = format!(
                "demo order dataset loaded ({} orders):\n{}",
                orders.len(),
                descriptions.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_failure_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let message = verification_failure_message(&[
            "ORD-2024-0003:item-count",
            "ORD-2024-0003:tracking-presence",
        ]);

        assert_eq!(
            message,
            "Seed verification failed for checks: \
             ORD-2024-0003:item-count, ORD-2024-0003:tracking-presence"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_failure_message(&[]), "Some seed data failed to load");
    }
}
