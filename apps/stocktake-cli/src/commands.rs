//! Subcommand handlers. Each one runs a single controller operation and
//! prints its result to stdout.

use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use stocktake_client::{
    ClientError, ClientResult, ItemFilter, MutationOutcome, ScanOutcome, StatusFilter,
    StockTakeItem, StockTakeSessionController,
};
use stocktake_core::validation::validate_search_text;

use crate::cli::Command;

pub async fn run(controller: &StockTakeSessionController, command: Command) -> ClientResult<()> {
    match command {
        Command::Show { search, status } => show(controller, search, &status).await,
        Command::Counted => {
            print_items(&controller.counted_items().await);
            Ok(())
        }
        Command::Count { item_id, quantity } => {
            match controller.edit_count(&item_id, &quantity).await? {
                MutationOutcome::Applied {
                    item_id,
                    counted_qty,
                } => println!("{}\t{}", item_id, counted_qty),
                MutationOutcome::Superseded { item_id } => println!("{}\tsuperseded", item_id),
            }
            Ok(())
        }
        Command::Scan { barcode } => {
            print_scan(&controller.scan(&barcode).await?);
            Ok(())
        }
        Command::Listen => listen(controller).await,
        Command::AutoComplete => {
            let written = controller.auto_complete().await?;
            println!("{} item(s) auto-completed", written);
            Ok(())
        }
        Command::Save => {
            let written = controller.save_progress().await?;
            println!("{} item(s) saved", written);
            Ok(())
        }
        Command::Complete => {
            let completion = controller.complete().await?;
            println!(
                "completed (return to the list in {} ms)",
                completion.navigate_after.as_millis()
            );
            Ok(())
        }
        Command::Delete => {
            controller.delete().await?;
            println!("deleted {}", controller.session_id());
            Ok(())
        }
        Command::Report => {
            report(controller).await;
            Ok(())
        }
    }
}

async fn show(
    controller: &StockTakeSessionController,
    search: Option<String>,
    status: &str,
) -> ClientResult<()> {
    let status = StatusFilter::from_str(status)?;
    let filter = match search {
        Some(text) => {
            let text = validate_search_text(&text)?;
            ItemFilter::new(text, status)
        }
        None => ItemFilter::status(status),
    };

    let session = controller.session().await;
    println!(
        "# {} {} {} {}",
        session.id,
        session.operating_date,
        session.status,
        session.description.as_deref().unwrap_or("")
    );
    print_items(&controller.filtered(&filter).await);
    Ok(())
}

/// Feeds stdin lines to the scan listener until EOF.
async fn listen(controller: &StockTakeSessionController) -> ClientResult<()> {
    let (event_tx, event_rx) = mpsc::channel::<String>(64);
    let (outcome_tx, mut outcome_rx) = mpsc::channel(64);

    let listener = controller.scan_listener().with_outcomes(outcome_tx);
    let printer = tokio::spawn(async move {
        while let Some(result) = outcome_rx.recv().await {
            match result {
                Ok(outcome) => print_scan(&outcome),
                // already reported through the notifier
                Err(_) => continue,
            }
        }
    });

    let reader = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ClientError::ChannelError(e.to_string()))?
        {
            if event_tx.send(line).await.is_err() {
                break;
            }
        }
        Ok::<_, ClientError>(())
    };

    let (handled, read) = tokio::join!(listener.run(event_rx), reader);
    printer
        .await
        .map_err(|e| ClientError::ChannelError(e.to_string()))?;

    info!(handled, "Scan input closed");
    read
}

async fn report(controller: &StockTakeSessionController) {
    let report = controller.variance_report().await;
    let s = report.summary;

    println!("items\t{}", s.item_count);
    println!("counted\t{}", s.counted_count);
    println!("remaining\t{}", s.remaining_count);
    println!("expected\t{}", s.total_expected);
    println!("total counted\t{}", s.total_counted);
    println!("net difference\t{:+}", s.net_difference);

    if report.is_balanced() {
        println!("no variances");
        return;
    }
    for (label, lines) in [("shortage", &report.shortages), ("overage", &report.overages)] {
        for line in lines {
            println!(
                "{}\t{}\t{}\t{}/{}\t{:+}",
                label,
                line.item_id,
                line.product_name,
                line.counted_qty,
                line.expected_qty,
                line.difference
            );
        }
    }
}

fn print_items(items: &[StockTakeItem]) {
    println!("id\tproduct\tbarcode\texpected\tcounted\tdifference");
    for item in items {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{:+}",
            item.id,
            item.product_name,
            item.barcode.as_deref().unwrap_or("-"),
            item.expected_qty,
            item.counted_qty,
            item.difference()
        );
    }
}

fn print_scan(outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::Ignored => {}
        ScanOutcome::Counted {
            item_id,
            counted_qty,
        } => println!("counted\t{}\t{}", item_id, counted_qty),
        ScanOutcome::UnknownItem { barcode } => println!("unknown\t{}", barcode),
    }
}
