use recall_core::TaskMode;
use recall_embed::FakeEmbedder;
use recall_core::EmbeddingProvider;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let embedder = FakeEmbedder::default();
    let doc = embedder.embed("Requests must be submitted by 6pm the prior day.", Some("remote-work"), TaskMode::Document)?;
    let query = embedder.embed("When is the deadline to request remote work?", None, TaskMode::Query)?;
    let dot: f32 = doc.iter().zip(&query).map(|(a, b)| a * b).sum();
    println!("id={} dim={} cos={:.4}", embedder.embedder_id(), embedder.dim(), dot);
    Ok(())
}
