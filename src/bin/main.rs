use findoc_analyzer::{
    analysis::MetricExtractor,
    decomposer::MockDecomposer,
    models::Passage,
    narrative::MockNarrator,
    pipeline::Orchestrator,
    retrieval::index::{DocumentIndex, IndexHandle, IndexRetriever},
    retrieval::RetrievalAggregator,
    validation::create_default_rule_engine,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Financial Document Analyzer starting");

    // Index a sample annual-report extract
    let index = IndexHandle::with_index(DocumentIndex::build(vec![
        Passage::new("Total Current Liabilities of the company stood at 140,300", 6, true),
        Passage::new("Long Term Liabilities of the company stood at 310,200", 8, true),
        Passage::new("Total Debt of the company as at 31 March is 626,130", 12, true),
        Passage::new(
            "Total Equity attributable to the owners of the company is 400,000",
            13,
            true,
        ),
        Passage::new("EBITDA for the year is 96,000", 47, false),
        Passage::new("Finance Costs for the year were 32,000", 48, false),
    ]));

    // Create components
    let decomposer = Box::new(MockDecomposer);
    let retriever = Box::new(IndexRetriever::new(index.clone()));
    let aggregator = RetrievalAggregator::default();
    let extractor = MetricExtractor::default();
    let rule_engine = create_default_rule_engine();
    let narrator = Box::new(MockNarrator);

    // Create orchestrator
    let orchestrator = Orchestrator::new(
        decomposer,
        retriever,
        aggregator,
        extractor,
        rule_engine,
        narrator,
    );

    let question = "What is the company's leverage position and can it service its debt?";
    info!(question = %question, "Running pipeline");

    // Run the pipeline
    let report = orchestrator.run(question).await;

    println!("\n=== ANALYSIS REPORT ===");
    println!("Request ID: {}", report.request_id);
    println!("Confidence: {:.2} ({})", report.confidence, report.confidence_level);
    println!("\nAnswer:\n{}", report.answer);

    println!("\nRisk Flags:");
    for flag in &report.flags {
        println!("  - {}", flag);
    }

    println!("\nSources:");
    for source in &report.sources {
        println!("  page {}: {}", source.page_number, source.snippet);
    }

    println!("\nReasoning Trace:");
    for (i, trace) in report.trace.iter().enumerate() {
        println!("  {}: {}", i + 1, trace);
    }

    Ok(())
}
