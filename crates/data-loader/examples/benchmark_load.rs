use data_loader::{extract_entities, read_rows, DataLoadError, EntityKind};
use std::path::PathBuf;
use std::time::Instant;

fn main() -> Result<(), DataLoadError> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/crawled_movie.csv"));

    println!("Reading {}...\n", path.display());

    let start = Instant::now();
    let rows = read_rows(&path)?;
    let read_elapsed = start.elapsed();

    let start = Instant::now();
    let extraction = extract_entities(&rows);
    let extract_elapsed = start.elapsed();

    println!("=== Load Complete ===");
    println!("Read time: {:?}", read_elapsed);
    println!("Extraction time: {:?}", extract_elapsed);
    println!("Rows: {}", rows.len());
    for kind in EntityKind::ALL {
        println!("{}s: {}", kind, extraction.entities.count(kind));
    }
    println!("Malformed rows: {}", extraction.malformed.len());
    println!("Duplicate titles: {}", extraction.duplicate_titles.len());
    println!(
        "\nPerformance: {:.0} rows/second",
        rows.len() as f64 / extract_elapsed.as_secs_f64()
    );
    Ok(())
}
