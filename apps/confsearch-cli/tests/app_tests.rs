use std::io::Write;

use confsearch_cli::App;
use confsearch_core::config::{EmbeddingProvider, Settings};
use confsearch_index::{CancelToken, MEMORY_URL};
use serde_json::json;

fn dry_run_settings() -> Settings {
    let mut settings = Settings::default();
    settings.elasticsearch.url = MEMORY_URL.to_string();
    settings.embedding.provider = EmbeddingProvider::Fake;
    settings.embedding.dimensions = 8;
    settings.indexing.workers = 2;
    settings
}

#[tokio::test]
async fn memory_url_loads_and_searches_without_a_cluster() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "id,groupId,name,description,startDate,endDate,formattedLocation,countryDescription,attendeesCount,companyAttendeesCount,investorAttendeesCount,attendeeNames,industrySectors,industryGroups,industryCodes")?;
    writeln!(file, "a1,7,Web Summit,Tech conference,2024-11-11,2024-11-14,Lisbon,Portugal,70000,2000,1000,,Technology,Software,5112")?;
    writeln!(file, "a2,,Slush,Startup event,2024-11-20,2024-11-21,Helsinki,Finland,13000,,,,,,")?;

    let app = App::new(dry_run_settings(), json!({ "mappings": {} }))?;
    let report = app.service.load_csv(file.path(), &CancelToken::new()).await?;
    assert_eq!(report.documents, 2);
    assert_eq!(report.batches, 1);

    let results = app.service.search("summit", "KEYWORD", 0, 10).await?;
    assert_eq!(results.len(), 2);

    assert!(!app.service.create_index_if_needed().await?, "load already created the index");
    app.shutdown().await;
    Ok(())
}
