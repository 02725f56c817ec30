use anyhow::Result;
use clap::{Arg, Command};

use mongo_api::{
    models::{Document, FieldValue, Namespace},
    store::{DocumentStore, MongoStore, PoolSettings},
    titanic,
};

fn print_documents(documents: &[Document]) -> Result<()> {
    for document in documents {
        println!("{}", serde_json::to_string(document)?);
    }
    Ok(())
}

fn print_values(values: &[FieldValue]) -> Result<()> {
    println!("{}", serde_json::to_string(values)?);
    Ok(())
}

fn heading(title: &str) {
    println!("\n---------------- {} ----------------", title);
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let matches = Command::new("titanic_explorer")
        .about("Walk through ad-hoc queries against the Titanic passenger dataset")
        .arg(
            Arg::new("uri")
                .help("MongoDB connection string")
                .long("uri")
                .default_value("mongodb://localhost:27017"),
        )
        .arg(
            Arg::new("database")
                .help("Database holding the dataset")
                .long("database")
                .short('d')
                .default_value("titanic"),
        )
        .arg(
            Arg::new("collection")
                .help("Collection holding one document per passenger")
                .long("collection")
                .short('c')
                .default_value("guests"),
        )
        .get_matches();

    let uri = matches.get_one::<String>("uri").map(String::as_str).unwrap_or_default();
    let namespace = Namespace::new(
        matches.get_one::<String>("database").cloned().unwrap_or_default(),
        matches.get_one::<String>("collection").cloned().unwrap_or_default(),
    );

    let store = MongoStore::connect(uri, PoolSettings::default()).await?;
    let session = store.session(&namespace).await?;
    let summary = titanic::summarize(session.as_ref()).await?;

    println!("Total number of documents in '{}': {}", namespace, summary.total);
    if let Some(sample) = &summary.sample {
        println!("{}", serde_json::to_string(sample)?);
    }

    heading("Filtering");
    println!("Survivors: {}", summary.survivors);
    println!("Passengers under 18: {}", summary.minors);
    let surviving_minors = store
        .collection(&namespace)
        .count_documents(titanic::surviving_minors())
        .await?;
    println!("Surviving passengers under 18: {}", surviving_minors);
    println!("Names containing 'Mis': {}", summary.names_with_mis);
    println!("Passengers without a ticket_number: {}", summary.missing_ticket_number);

    heading("Distinct Values");
    print_values(&summary.embarkation_points)?;
    print_values(&summary.classes_travelling_free)?;

    heading("Projections");
    print_documents(&summary.large_families)?;

    heading("Sorting");
    print_documents(&summary.minors_by_survival)?;
    print_documents(&summary.minors_by_class_and_gender)?;

    heading("Limiting & Skipping");
    print_documents(&summary.large_families_second_page)?;

    heading("Aggregation Pipeline");
    println!("Passengers aged 70 or over: {}", summary.elderly);
    for document in store.aggregate(&namespace, titanic::elderly_pipeline()).await? {
        println!("{}", document);
    }

    Ok(())
}
