//! Single-product command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. `match --against` is the exception and runs offline.

use std::sync::Arc;

use clap::Args;
use varsync_catalog::CatalogClient;
use varsync_core::{descriptors_match, find_matching_variant, generate_combinations, PriceInput};
use varsync_sync::{PgStore, SyncOrchestrator, SyncRequest, SyncResult};

/// Arguments of the `sync` command.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Parent product code
    #[arg(long)]
    pub code: String,
    /// Product display name
    #[arg(long)]
    pub name: String,
    /// Selling price as typed, e.g. `150` or `150,5`
    #[arg(long, default_value = "0")]
    pub selling_price: String,
    /// Purchase price as typed
    #[arg(long, default_value = "0")]
    pub purchase_price: String,
    /// Image URL; fetched once and sent with the parent
    #[arg(long)]
    pub image_url: Option<String>,
    /// Selected attribute value ids, comma separated. Omit for a simple product.
    #[arg(long = "values", value_delimiter = ',')]
    pub value_ids: Vec<i64>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    fn to_request(&self) -> SyncRequest {
        SyncRequest {
            base_code: self.code.clone(),
            name: self.name.clone(),
            purchase_price: PriceInput::Text(self.purchase_price.clone()),
            selling_price: PriceInput::Text(self.selling_price.clone()),
            image_url: self.image_url.clone(),
            selected_value_ids: self.value_ids.clone(),
        }
    }
}

/// Arguments of the `match` command.
#[derive(Debug, Args)]
pub struct MatchArgs {
    /// Descriptor to look for, e.g. `"Đỏ, S"`
    pub descriptor: String,
    /// Compare against a second descriptor
    #[arg(long, conflicts_with = "parent")]
    pub against: Option<String>,
    /// Search the stored variants of this parent code
    #[arg(long)]
    pub parent: Option<String>,
}

/// Wires the orchestrator to Postgres and the catalog client.
///
/// Returns the store alongside so batch commands can hand it to the
/// dispatcher and tracker.
pub(crate) fn build_orchestrator(
    pool: &sqlx::PgPool,
    config: &varsync_core::AppConfig,
) -> anyhow::Result<(SyncOrchestrator, Arc<PgStore>)> {
    let client = CatalogClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build catalog client: {e}"))?;
    let store = Arc::new(PgStore::new(pool.clone()));
    let orchestrator = SyncOrchestrator::new(store.clone(), Arc::new(client), store.clone())
        .with_price_scale(config.price_scale);
    Ok((orchestrator, store))
}

/// Print the combinations a selection would produce, in catalog order.
///
/// # Errors
///
/// Returns an error if any selected id is unknown or the lookup fails.
pub(crate) async fn run_combos(
    pool: &sqlx::PgPool,
    config: &varsync_core::AppConfig,
    code: &str,
    value_ids: &[i64],
) -> anyhow::Result<()> {
    let (orchestrator, _) = build_orchestrator(pool, config)?;
    let selection = orchestrator.resolve_selection(value_ids).await?;

    if selection.is_empty() {
        println!("{code}: no values selected, simple product");
        return Ok(());
    }

    let combos = generate_combinations(&selection);
    for combo in &combos {
        println!("{}\t{}", combo.storage_descriptor(), combo.display_name(code));
    }
    println!(
        "{} combinations across {} attributes",
        combos.len(),
        selection.attribute_count()
    );
    Ok(())
}

/// Sync one product and print the outcome.
///
/// # Errors
///
/// Returns an error when the sync does not succeed, after printing the
/// result so partial catalog state stays visible.
pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &varsync_core::AppConfig,
    args: &SyncArgs,
) -> anyhow::Result<()> {
    let (orchestrator, _) = build_orchestrator(pool, config)?;
    let request = args.to_request();
    let outcome = orchestrator.sync_product_variants(&request).await;

    if let Ok(report) = &outcome {
        for name in &report.unparseable_variants {
            eprintln!("warning: catalog variant name has no value list: {name}");
        }
        for descriptor in &report.missing_variants {
            eprintln!("warning: planned variant not returned by catalog: {descriptor}");
        }
    }

    let result = SyncResult::from(outcome);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&request.base_code, &result);
    }

    if !result.success {
        anyhow::bail!(
            "sync of {} failed: {}",
            request.base_code,
            result.error_detail.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_result(code: &str, result: &SyncResult) {
    if result.success {
        let verb = if result.already_exists {
            "already existed"
        } else {
            "created"
        };
        println!(
            "{code}: {verb}, {} variants stored (catalog id {})",
            result.variant_count,
            result
                .external_id
                .map_or_else(|| "unknown".to_owned(), |id| id.to_string())
        );
        return;
    }

    if result.reconciliation_required {
        let ids: Vec<String> = result
            .variant_external_ids
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{code}: created in catalog but not stored locally; reconcile catalog id {} variants [{}]",
            result
                .external_id
                .map_or_else(|| "unknown".to_owned(), |id| id.to_string()),
            ids.join(", ")
        );
    }
}

/// Compare descriptors, or find the stored variant matching one.
///
/// # Errors
///
/// Returns an error if neither `--against` nor `--parent` is given, or if
/// the variant lookup fails.
pub(crate) async fn run_match(pool: Option<&sqlx::PgPool>, args: &MatchArgs) -> anyhow::Result<()> {
    if let Some(other) = &args.against {
        let verdict = if descriptors_match(&args.descriptor, other) {
            "match"
        } else {
            "no match"
        };
        println!("{verdict}");
        return Ok(());
    }

    let (Some(pool), Some(parent)) = (pool, args.parent.as_deref()) else {
        anyhow::bail!("match needs --against <descriptor> or --parent <code>");
    };

    let variants: Vec<varsync_core::CatalogVariant> =
        varsync_db::list_variants_for_parent(pool, parent)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

    match find_matching_variant(&args.descriptor, &variants) {
        Some(variant) => println!(
            "{}\t{}\t{}",
            variant.code,
            variant.external_variant_id,
            variant.descriptor.as_deref().unwrap_or_default()
        ),
        None => println!(
            "no variant of {parent} matches '{}' ({} checked)",
            args.descriptor,
            variants.len()
        ),
    }
    Ok(())
}
