use chrono::DateTime;
use phenolink::config::AppConfig;
use phenolink::model::vocabulary::oeev;
use phenolink::model::{DateRange, EntityKind, NewEntity, SearchCriteria, UserContext};
use phenolink::seed::{self, samples};
use phenolink::service::{Backends, EntityService};
use phenolink::store::traits::RecordStore;
use phenolink::store::{MemoryDocumentStore, MemoryGraphStore, MemoryRecordStore, PostgresRecordStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .init();

    println!("phenolink: phenotyping metadata coordinator");

    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: base_uri={}, atomic_batches={}",
        config.identifiers.base_uri, config.writes.atomic_batches
    );

    let records: Arc<dyn RecordStore> = match config.database_url() {
        Some(database_url) => {
            println!("Connecting to PostgreSQL...");
            let store = PostgresRecordStore::new(
                &database_url,
                config.database.max_connections.unwrap_or(20),
            )
            .await?;
            store.migrate(&config.records.table).await?;
            println!("Record table {} ready", config.records.table);
            Arc::new(store)
        }
        None => Arc::new(MemoryRecordStore::new()),
    };

    let graph = Arc::new(MemoryGraphStore::new());
    seed::load_seed_data(graph.as_ref(), true).await?;

    let backends =
        Backends::with_graph_ontology(graph.clone(), Arc::new(MemoryDocumentStore::new()), records);
    let events = EntityService::new(EntityKind::event(), &backends, &config);

    let user = UserContext::system();
    let move_from = NewEntity::of_type(oeev::MOVE_FROM)
        .with_timestamp(DateTime::parse_from_rfc3339("2019-03-05T10:00:00+01:00")?)
        .concerning(samples::PLOT_42);
    let created = events.create(&user, vec![move_from]).await?.into_result()?;
    println!("Created {} event(s): {:?}", created.len(), created);

    for id in &created {
        if let Some(event) = events.get_by_id(id).await? {
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    let criteria = SearchCriteria::new()
        .with_concerned_item(samples::PLOT_42)
        .with_date_range(DateRange::parse(Some("2019-03-01"), Some("2019-03-10"))?);
    let (found, total) = events.search_as(&user, &criteria).await?;
    println!("Search returned {} of {} event(s)", found.len(), total);

    Ok(())
}
